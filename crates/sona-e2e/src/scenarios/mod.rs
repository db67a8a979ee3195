//! Scenario suites and shared assertion helpers.
//!
//! Each suite is an ordered list of named async scenarios over a shared
//! [`SuiteContext`], registered with the runner in dependency order:
//! authentication and creation scenarios run before the scenarios that read
//! their tokens and ids out of the session.
//!
//! Assertions are plain `Result` values, not panics: a failed expectation
//! returns a [`ScenarioFailure::Assertion`] with an expected/actual message,
//! and the runner converts it into a failed result at its boundary.

pub mod incidents;
pub mod users;
pub mod webhooks;

use crate::client::ApiResponse;
use crate::models::{ScenarioFailure, truncate};
use crate::session::SuiteContext;
use serde_json::{Value, json};

/// Fails unless the response carries the expected status code.
pub fn expect_status(response: &ApiResponse, expected: u16) -> Result<(), ScenarioFailure> {
    if response.status == expected {
        Ok(())
    } else {
        Err(ScenarioFailure::assertion(format!(
            "expected status {expected}, got {}; body: {}",
            response.status,
            truncate(&response.body, 200)
        )))
    }
}

/// Fails unless `condition` holds.
pub fn ensure(condition: bool, detail: impl Into<String>) -> Result<(), ScenarioFailure> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioFailure::Assertion(detail.into()))
    }
}

/// Reads a string field out of a JSON object.
pub fn str_field<'a>(value: &'a Value, field: &str) -> Result<&'a str, ScenarioFailure> {
    value.get(field).and_then(Value::as_str).ok_or_else(|| {
        ScenarioFailure::assertion(format!("field `{field}`: expected a string, got {value}"))
    })
}

/// Reads an integer field out of a JSON object.
pub fn int_field(value: &Value, field: &str) -> Result<i64, ScenarioFailure> {
    value.get(field).and_then(Value::as_i64).ok_or_else(|| {
        ScenarioFailure::assertion(format!("field `{field}`: expected an integer, got {value}"))
    })
}

/// Reads an array field out of a JSON object.
pub fn array_field<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>, ScenarioFailure> {
    value.get(field).and_then(Value::as_array).ok_or_else(|| {
        ScenarioFailure::assertion(format!("field `{field}`: expected an array, got {value}"))
    })
}

/// Fails unless the string field equals the expected value.
pub fn expect_str(value: &Value, field: &str, expected: &str) -> Result<(), ScenarioFailure> {
    let actual = str_field(value, field)?;
    ensure(
        actual == expected,
        format!("field `{field}`: expected {expected:?}, got {actual:?}"),
    )
}

/// Fails unless the integer field equals the expected value.
pub fn expect_int(value: &Value, field: &str, expected: i64) -> Result<(), ScenarioFailure> {
    let actual = int_field(value, field)?;
    ensure(
        actual == expected,
        format!("field `{field}`: expected {expected}, got {actual}"),
    )
}

/// Fails if the field is present at all. Used for the password, which the
/// service must never echo.
pub fn expect_absent(value: &Value, field: &str) -> Result<(), ScenarioFailure> {
    ensure(
        value.get(field).is_none_or(Value::is_null),
        format!("field `{field}`: expected it to be absent, got {:?}", value.get(field)),
    )
}

/// Authenticates the seeded administrator unless the session already holds
/// its token, and returns the token.
///
/// Keeps the incident and webhook suites runnable without the user suite.
pub(crate) async fn ensure_admin_token(ctx: &mut SuiteContext) -> Result<String, ScenarioFailure> {
    if let Some(token) = &ctx.session.admin_token {
        return Ok(token.clone());
    }

    let response = ctx
        .api
        .post(
            "/sona/v1/authenticate",
            None,
            &json!({
                "emailAddress": ctx.config.admin_email,
                "password": ctx.config.admin_password,
            }),
        )
        .await?;
    expect_status(&response, 200)?;

    let body = response.json()?;
    let token = str_field(&body, "token")?.to_string();
    ctx.session.admin_token = Some(token.clone());
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_json() -> Value {
        json!({
            "id": 1,
            "emailAddress": "aa@b.c",
            "gender": "F",
            "permissions": [],
            "password": null
        })
    }

    #[test]
    fn test_expect_status_mismatch_includes_body() {
        let response = ApiResponse {
            status: 403,
            body: "forbidden".to_string(),
        };
        let err = expect_status(&response, 200).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("expected status 200, got 403"));
        assert!(msg.contains("forbidden"));
    }

    #[test]
    fn test_expect_str_diff_message() {
        let err = expect_str(&user_json(), "gender", "M").unwrap_err();
        assert!(err.to_string().contains(r#"expected "M", got "F""#));
    }

    #[test]
    fn test_expect_int_passes() {
        assert!(expect_int(&user_json(), "id", 1).is_ok());
        assert!(expect_int(&user_json(), "id", 2).is_err());
    }

    #[test]
    fn test_expect_absent_treats_null_as_absent() {
        assert!(expect_absent(&user_json(), "password").is_ok());
        assert!(expect_absent(&user_json(), "firstName").is_ok());
        assert!(expect_absent(&user_json(), "gender").is_err());
    }

    #[test]
    fn test_missing_field_errors_name_the_field() {
        let err = str_field(&user_json(), "userName").unwrap_err();
        assert!(err.to_string().contains("`userName`"));

        let err = array_field(&user_json(), "gender").unwrap_err();
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn test_empty_permissions_is_an_array() {
        let user = user_json();
        let permissions = array_field(&user, "permissions").unwrap();
        assert!(permissions.is_empty());
    }
}
