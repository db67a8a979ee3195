//! Incident lifecycle suite.
//!
//! Creates an incident, walks its state through an update, uploads, lists,
//! downloads, and deletes an attachment, reads the incident back, and
//! finishes with a complex filtered listing. As in the user suite, every
//! protected operation is probed without a credential (403), with an
//! unprivileged credential (401), and with a privileged one (200).
//!
//! The unprivileged principal is created on the fly: a fresh user has an
//! empty permission set, which is exactly what the 401 tier needs.

use super::{ensure, ensure_admin_token, expect_status, expect_str, int_field, str_field};
use crate::filter::{Comparison, FilterRequest};
use crate::models::ScenarioFailure;
use crate::runner::TestRunner;
use crate::session::SuiteContext;
use serde_json::json;

const DESCRIPTION: &str = "Something is wrong";
const REPORTER: &str = "TestUser";

const ATTACHMENT_NAME: &str = "attach.txt";
const ATTACHMENT_BYTES: &[u8] = b"conformance attachment payload\n";

const RESTRICTED_EMAIL: &str = "email@address.com";
const RESTRICTED_PASSWORD: &str = "1234";

/// Registers the incident lifecycle scenarios in dependency order.
pub fn register(runner: &mut TestRunner) {
    runner.register("Create incident", |ctx| Box::pin(create_incident(ctx)));
    runner.register("Update incident without auth", |ctx| {
        Box::pin(update_incident_without_auth(ctx))
    });
    runner.register("Update incident without permission", |ctx| {
        Box::pin(update_incident_without_permission(ctx))
    });
    runner.register("Update incident", |ctx| Box::pin(update_incident(ctx)));
    runner.register("Attach to incident without auth", |ctx| {
        Box::pin(attach_without_auth(ctx))
    });
    runner.register("Attach to incident without permission", |ctx| {
        Box::pin(attach_without_permission(ctx))
    });
    runner.register("Attach to incident", |ctx| Box::pin(attach(ctx)));
    runner.register("Get attachments without auth", |ctx| {
        Box::pin(get_attachments_without_auth(ctx))
    });
    runner.register("Get attachments without permission", |ctx| {
        Box::pin(get_attachments_without_permission(ctx))
    });
    runner.register("Get attachments", |ctx| Box::pin(get_attachments(ctx)));
    runner.register("Download attachment without auth", |ctx| {
        Box::pin(download_attachment_without_auth(ctx))
    });
    runner.register("Download attachment without permission", |ctx| {
        Box::pin(download_attachment_without_permission(ctx))
    });
    runner.register("Download attachment", |ctx| {
        Box::pin(download_attachment(ctx))
    });
    runner.register("Delete attachment without auth", |ctx| {
        Box::pin(delete_attachment_without_auth(ctx))
    });
    runner.register("Delete attachment without permission", |ctx| {
        Box::pin(delete_attachment_without_permission(ctx))
    });
    runner.register("Delete attachment", |ctx| Box::pin(delete_attachment(ctx)));
    runner.register("Get incident without auth", |ctx| {
        Box::pin(get_incident_without_auth(ctx))
    });
    runner.register("Get incident without permission", |ctx| {
        Box::pin(get_incident_without_permission(ctx))
    });
    runner.register("Get incident", |ctx| Box::pin(get_incident(ctx)));
    runner.register("Get filtered incidents", |ctx| {
        Box::pin(get_filtered_incidents(ctx))
    });
}

/// Creation echoes the submitted fields and attributes exactly; the server
/// assigns ids sequentially from 0.
async fn create_incident(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let response = ctx
        .api
        .post(
            "/sona/v1/incidents",
            None,
            &json!({
                "description": DESCRIPTION,
                "reporter": REPORTER,
                "state": "open",
                "attributes": {"Test": "Value"},
            }),
        )
        .await?;
    expect_status(&response, 201)?;

    let incident = response.json()?;
    let id = int_field(&incident, "id")?;
    ensure(id == 0, format!("first incident should get id 0, got {id}"))?;
    expect_str(&incident, "description", DESCRIPTION)?;
    expect_str(&incident, "reporter", REPORTER)?;
    expect_str(&incident, "state", "open")?;

    let attributes = incident.get("attributes").ok_or_else(|| {
        ScenarioFailure::assertion(format!("incident has no attributes: {incident}"))
    })?;
    expect_str(attributes, "Test", "Value")?;

    ctx.session.last_incident_id = Some(id);
    Ok(())
}

async fn update_incident_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .put(&path, None, &json!({"state": "In Progress"}))
        .await?;
    expect_status(&response, 403)
}

/// Creates and authenticates a permissionless user, then probes with it.
async fn update_incident_without_permission(
    ctx: &mut SuiteContext,
) -> Result<(), ScenarioFailure> {
    let created = ctx
        .api
        .post(
            "/sona/v1/users",
            None,
            &json!({
                "emailAddress": RESTRICTED_EMAIL,
                "userName": "IncTest",
                "firstName": "Incident",
                "lastName": "User",
                "gender": "F",
                "password": RESTRICTED_PASSWORD,
            }),
        )
        .await?;
    expect_status(&created, 201)?;

    let authenticated = ctx
        .api
        .post(
            "/sona/v1/authenticate",
            None,
            &json!({
                "emailAddress": RESTRICTED_EMAIL,
                "password": RESTRICTED_PASSWORD,
            }),
        )
        .await?;
    expect_status(&authenticated, 200)?;
    let body = authenticated.json()?;
    ctx.session.restricted_token = Some(str_field(&body, "token")?.to_string());

    let path = format!("/sona/v1/incidents/{}", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .put(
            &path,
            Some(ctx.session.restricted_token()?),
            &json!({"state": "In Progress"}),
        )
        .await?;
    expect_status(&response, 401)
}

async fn update_incident(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let admin_token = ensure_admin_token(ctx).await?;
    let path = format!("/sona/v1/incidents/{}", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .put(&path, Some(&admin_token), &json!({"state": "In Progress"}))
        .await?;
    expect_status(&response, 200)
}

async fn attach_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}/attachment", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .upload(&path, None, ATTACHMENT_NAME, ATTACHMENT_BYTES.to_vec())
        .await?;
    expect_status(&response, 403)
}

async fn attach_without_permission(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}/attachment", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .upload(
            &path,
            Some(ctx.session.restricted_token()?),
            ATTACHMENT_NAME,
            ATTACHMENT_BYTES.to_vec(),
        )
        .await?;
    expect_status(&response, 401)
}

async fn attach(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}/attachment", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .upload(
            &path,
            Some(ctx.session.admin_token()?),
            ATTACHMENT_NAME,
            ATTACHMENT_BYTES.to_vec(),
        )
        .await?;
    expect_status(&response, 200)
}

async fn get_attachments_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}/attachments", ctx.session.last_incident_id()?);
    let response = ctx.api.get(&path, None).await?;
    expect_status(&response, 403)
}

async fn get_attachments_without_permission(
    ctx: &mut SuiteContext,
) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}/attachments", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .get(&path, Some(ctx.session.restricted_token()?))
        .await?;
    expect_status(&response, 401)
}

async fn get_attachments(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}/attachments", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .get(&path, Some(ctx.session.admin_token()?))
        .await?;
    expect_status(&response, 200)?;

    let listing = response.json()?;
    let attachments = listing.as_array().ok_or_else(|| {
        ScenarioFailure::assertion(format!("expected an attachment array, got {listing}"))
    })?;
    ensure(
        attachments.len() == 1,
        format!("expected exactly one attachment, got {attachments:?}"),
    )?;
    expect_str(&attachments[0], "filename", ATTACHMENT_NAME)
}

async fn download_attachment_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = attachment_path(ctx)?;
    let response = ctx.api.get(&path, None).await?;
    expect_status(&response, 403)
}

async fn download_attachment_without_permission(
    ctx: &mut SuiteContext,
) -> Result<(), ScenarioFailure> {
    let path = attachment_path(ctx)?;
    let response = ctx
        .api
        .get(&path, Some(ctx.session.restricted_token()?))
        .await?;
    expect_status(&response, 401)
}

/// The downloaded bytes must be exactly what was uploaded.
async fn download_attachment(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = attachment_path(ctx)?;
    let response = ctx
        .api
        .get(&path, Some(ctx.session.admin_token()?))
        .await?;
    expect_status(&response, 200)?;
    ensure(
        response.body.as_bytes() == ATTACHMENT_BYTES,
        format!(
            "downloaded content differs from the uploaded fixture: {:?}",
            response.body
        ),
    )
}

async fn delete_attachment_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = attachment_path(ctx)?;
    let response = ctx.api.delete(&path, None).await?;
    expect_status(&response, 403)
}

async fn delete_attachment_without_permission(
    ctx: &mut SuiteContext,
) -> Result<(), ScenarioFailure> {
    let path = attachment_path(ctx)?;
    let response = ctx
        .api
        .delete(&path, Some(ctx.session.restricted_token()?))
        .await?;
    expect_status(&response, 401)
}

async fn delete_attachment(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = attachment_path(ctx)?;
    let response = ctx
        .api
        .delete(&path, Some(ctx.session.admin_token()?))
        .await?;
    expect_status(&response, 200)
}

async fn get_incident_without_auth(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}", ctx.session.last_incident_id()?);
    let response = ctx.api.get(&path, None).await?;
    expect_status(&response, 403)
}

async fn get_incident_without_permission(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let path = format!("/sona/v1/incidents/{}", ctx.session.last_incident_id()?);
    let response = ctx
        .api
        .get(&path, Some(ctx.session.restricted_token()?))
        .await?;
    expect_status(&response, 401)
}

/// The incident read back reflects the state transition triggered earlier;
/// its id and untouched fields are stable across updates.
async fn get_incident(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let incident_id = ctx.session.last_incident_id()?;
    let path = format!("/sona/v1/incidents/{incident_id}");
    let response = ctx
        .api
        .get(&path, Some(ctx.session.admin_token()?))
        .await?;
    expect_status(&response, 200)?;

    let incident = response.json()?;
    let id = int_field(&incident, "id")?;
    ensure(
        id == incident_id,
        format!("incident id should be stable across updates: expected {incident_id}, got {id}"),
    )?;
    expect_str(&incident, "description", DESCRIPTION)?;
    expect_str(&incident, "reporter", REPORTER)?;
    expect_str(&incident, "state", "In Progress")
}

/// Creates two more incidents with distinct reporters, then filters by
/// `Reporter equals "Jill"` and expects exactly the matching one back.
async fn get_filtered_incidents(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    for (description, reporter) in [
        ("Something else is wrong", "Steve"),
        ("Something new is wrong", "Jill"),
    ] {
        let response = ctx
            .api
            .post(
                "/sona/v1/incidents",
                None,
                &json!({
                    "description": description,
                    "reporter": reporter,
                    "state": "open",
                    "attributes": {"Foo": "Bar"},
                }),
            )
            .await?;
        expect_status(&response, 201)?;
    }

    let filter = FilterRequest::single("Reporter", Comparison::Equals, "Jill");
    let response = ctx
        .api
        .get_query(
            "/sona/v1/incidents",
            &[("filter", filter.to_query_value())],
            Some(ctx.session.admin_token()?),
        )
        .await?;
    expect_status(&response, 200)?;

    let listing = response.json()?;
    let incidents = listing.as_array().ok_or_else(|| {
        ScenarioFailure::assertion(format!("expected an incident array, got {listing}"))
    })?;
    ensure(
        incidents.len() == 1,
        format!("filter should match exactly one incident, got {incidents:?}"),
    )?;
    expect_str(&incidents[0], "description", "Something new is wrong")?;
    expect_str(&incidents[0], "reporter", "Jill")
}

fn attachment_path(ctx: &SuiteContext) -> Result<String, ScenarioFailure> {
    Ok(format!(
        "/sona/v1/incidents/{}/attachment/{ATTACHMENT_NAME}",
        ctx.session.last_incident_id()?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_covers_every_tier() {
        let mut runner = TestRunner::new();
        register(&mut runner);

        let names = runner.case_names();
        assert_eq!(names.len(), 20);
        assert_eq!(names[0], "Create incident");
        assert_eq!(names[19], "Get filtered incidents");

        // Each protected operation gets all three credential tiers.
        for operation in [
            "Update incident",
            "Attach to incident",
            "Get attachments",
            "Download attachment",
            "Delete attachment",
            "Get incident",
        ] {
            assert!(names.contains(&format!("{operation} without auth").as_str()));
            assert!(names.contains(&format!("{operation} without permission").as_str()));
            assert!(names.contains(&operation));
        }
    }

    #[test]
    fn test_attachment_path_requires_incident() {
        let ctx = SuiteContext::new(crate::config::HarnessConfig::default());
        assert!(attachment_path(&ctx).is_err());
    }
}
