//! User lifecycle suite.
//!
//! Creates a user, exercises the authentication and permission tiers around
//! mutating and reading it, changes its password, and finally deletes it.
//! Every protected endpoint is probed three ways: no credential (403),
//! valid-but-unprivileged credential (401), privileged credential (200).

use super::{
    array_field, ensure, ensure_admin_token, expect_absent, expect_int, expect_status, expect_str,
    int_field, str_field,
};
use crate::models::ScenarioFailure;
use crate::runner::TestRunner;
use crate::session::SuiteContext;
use serde_json::json;

const USER_EMAIL: &str = "aa@b.c";
const USER_NAME: &str = "TestUser";
const FIRST_NAME: &str = "Test";
const LAST_NAME: &str = "User";
const INITIAL_PASSWORD: &str = "changeme";
const UPDATED_PASSWORD: &str = "1234";
const GRANTED_PERMISSION: &str = "view-incident";

/// The service seeds its administrator as user id 0; reading or deleting it
/// is how the permission tiers are probed without touching the test user.
const ADMIN_USER_ID: i64 = 0;

/// Registers the user lifecycle scenarios in dependency order.
pub fn register(runner: &mut TestRunner) {
    runner.register("Create user", |ctx| Box::pin(create_user(ctx)));
    runner.register("Change user without auth", |ctx| {
        Box::pin(change_user_without_auth(ctx))
    });
    runner.register("Authenticate user", |ctx| Box::pin(authenticate_user(ctx)));
    runner.register("Update user", |ctx| Box::pin(update_user(ctx)));
    runner.register("Update user permissions without auth", |ctx| {
        Box::pin(update_permissions_without_auth(ctx))
    });
    runner.register("Update user permissions without permission", |ctx| {
        Box::pin(update_permissions_without_permission(ctx))
    });
    runner.register("Update user permissions", |ctx| {
        Box::pin(update_permissions(ctx))
    });
    runner.register("Get user without auth", |ctx| {
        Box::pin(get_user_without_auth(ctx))
    });
    runner.register("Get user without permission", |ctx| {
        Box::pin(get_user_without_permission(ctx))
    });
    runner.register("Get user", |ctx| Box::pin(get_user(ctx)));
    runner.register("Change password without auth", |ctx| {
        Box::pin(change_password_without_auth(ctx))
    });
    runner.register("Change password with incorrect old password", |ctx| {
        Box::pin(change_password_wrong_old(ctx))
    });
    runner.register("Change password", |ctx| Box::pin(change_password(ctx)));
    runner.register("Delete user without auth", |ctx| {
        Box::pin(delete_user_without_auth(ctx))
    });
    runner.register("Delete user without permission", |ctx| {
        Box::pin(delete_user_without_permission(ctx))
    });
    runner.register("Delete user", |ctx| Box::pin(delete_user(ctx)));
}

/// Creation echoes every field except the password, assigns an id, and
/// starts the user with an empty permission set.
async fn create_user(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let response = ctx
        .api
        .post(
            "/sona/v1/users",
            None,
            &json!({
                "emailAddress": USER_EMAIL,
                "userName": USER_NAME,
                "firstName": FIRST_NAME,
                "lastName": LAST_NAME,
                "gender": "F",
                "password": INITIAL_PASSWORD,
            }),
        )
        .await?;
    expect_status(&response, 201)?;

    let user = response.json()?;
    expect_str(&user, "emailAddress", USER_EMAIL)?;
    expect_str(&user, "userName", USER_NAME)?;
    expect_str(&user, "firstName", FIRST_NAME)?;
    expect_str(&user, "lastName", LAST_NAME)?;
    expect_str(&user, "gender", "F")?;
    expect_absent(&user, "password")?;

    let permissions = array_field(&user, "permissions")?;
    ensure(
        permissions.is_empty(),
        format!("a fresh user must have no permissions, got {permissions:?}"),
    )?;

    // First user created after the seeded admin (id 0).
    expect_int(&user, "id", 1)?;
    ctx.session.last_user_id = Some(int_field(&user, "id")?);
    Ok(())
}

async fn change_user_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}", ctx.session.last_user_id()?);
    let response = ctx.api.put(&path, None, &json!({"gender": "M"})).await?;
    expect_status(&response, 403)
}

async fn authenticate_user(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let response = ctx
        .api
        .post(
            "/sona/v1/authenticate",
            None,
            &json!({
                "emailAddress": USER_EMAIL,
                "password": INITIAL_PASSWORD,
            }),
        )
        .await?;
    expect_status(&response, 200)?;

    let body = response.json()?;
    let token = str_field(&body, "token")?;
    ensure(
        token.len() > 1,
        format!("token should be non-trivial, got {token:?}"),
    )?;
    ctx.session.user_token = Some(token.to_string());
    Ok(())
}

/// Users may mutate their own record with just a valid token.
async fn update_user(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}", ctx.session.last_user_id()?);
    let response = ctx
        .api
        .put(&path, Some(ctx.session.user_token()?), &json!({"gender": "M"}))
        .await?;
    expect_status(&response, 200)
}

async fn update_permissions_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}/permissions", ctx.session.last_user_id()?);
    let response = ctx.api.put(&path, None, &json!(["*"])).await?;
    expect_status(&response, 403)
}

async fn update_permissions_without_permission(
    ctx: &mut SuiteContext,
) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}/permissions", ctx.session.last_user_id()?);
    let response = ctx
        .api
        .put(&path, Some(ctx.session.user_token()?), &json!(["*"]))
        .await?;
    expect_status(&response, 401)
}

async fn update_permissions(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let admin_token = ensure_admin_token(ctx).await?;
    let path = format!("/sona/v1/users/{}/permissions", ctx.session.last_user_id()?);
    let response = ctx
        .api
        .put(&path, Some(&admin_token), &json!([GRANTED_PERMISSION]))
        .await?;
    expect_status(&response, 200)
}

/// 403 regardless of whether the target user exists.
async fn get_user_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{ADMIN_USER_ID}");
    let response = ctx.api.get(&path, None).await?;
    expect_status(&response, 403)
}

async fn get_user_without_permission(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{ADMIN_USER_ID}");
    let response = ctx.api.get(&path, Some(ctx.session.user_token()?)).await?;
    expect_status(&response, 401)
}

/// The record read back reflects the earlier mutation and the granted
/// permission.
async fn get_user(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let user_id = ctx.session.last_user_id()?;
    let path = format!("/sona/v1/users/{user_id}");
    let response = ctx.api.get(&path, Some(ctx.session.admin_token()?)).await?;
    expect_status(&response, 200)?;

    let user = response.json()?;
    expect_int(&user, "id", user_id)?;
    expect_str(&user, "emailAddress", USER_EMAIL)?;
    expect_str(&user, "userName", USER_NAME)?;
    expect_str(&user, "firstName", FIRST_NAME)?;
    expect_str(&user, "lastName", LAST_NAME)?;
    expect_str(&user, "gender", "M")?;
    expect_absent(&user, "password")?;

    let permissions = array_field(&user, "permissions")?;
    ensure(
        permissions.len() == 1,
        format!("expected exactly the granted permission, got {permissions:?}"),
    )
}

async fn change_password_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}/authentication", ctx.session.last_user_id()?);
    let response = ctx
        .api
        .put(
            &path,
            None,
            &json!({"oldPassword": INITIAL_PASSWORD, "newPassword": UPDATED_PASSWORD}),
        )
        .await?;
    expect_status(&response, 403)
}

/// A wrong old password is an authentication failure, not a permission one.
async fn change_password_wrong_old(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}/authentication", ctx.session.last_user_id()?);
    let response = ctx
        .api
        .put(
            &path,
            Some(ctx.session.user_token()?),
            &json!({"oldPassword": "foobar", "newPassword": UPDATED_PASSWORD}),
        )
        .await?;
    expect_status(&response, 403)
}

async fn change_password(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}/authentication", ctx.session.last_user_id()?);
    let response = ctx
        .api
        .put(
            &path,
            Some(ctx.session.user_token()?),
            &json!({"oldPassword": INITIAL_PASSWORD, "newPassword": UPDATED_PASSWORD}),
        )
        .await?;
    expect_status(&response, 200)
}

async fn delete_user_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}", ctx.session.last_user_id()?);
    let response = ctx.api.delete(&path, None).await?;
    expect_status(&response, 403)
}

async fn delete_user_without_permission(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{ADMIN_USER_ID}");
    let response = ctx
        .api
        .delete(&path, Some(ctx.session.user_token()?))
        .await?;
    expect_status(&response, 401)
}

async fn delete_user(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/users/{}", ctx.session.last_user_id()?);
    let response = ctx
        .api
        .delete(&path, Some(ctx.session.admin_token()?))
        .await?;
    expect_status(&response, 200)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_preserves_lifecycle_order() {
        let mut runner = TestRunner::new();
        register(&mut runner);

        let names = runner.case_names();
        assert_eq!(names.len(), 16);
        assert_eq!(names[0], "Create user");
        assert_eq!(names[2], "Authenticate user");
        assert_eq!(names[15], "Delete user");

        // Negative probes precede the privileged operation they guard.
        let grant = names
            .iter()
            .position(|n| *n == "Update user permissions")
            .unwrap();
        let unauth = names
            .iter()
            .position(|n| *n == "Update user permissions without auth")
            .unwrap();
        let unprivileged = names
            .iter()
            .position(|n| *n == "Update user permissions without permission")
            .unwrap();
        assert!(unauth < unprivileged && unprivileged < grant);
    }
}
