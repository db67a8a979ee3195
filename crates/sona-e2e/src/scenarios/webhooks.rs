//! Webhook notification suite.
//!
//! Each case follows the same protocol: clear the collector's recorded-calls
//! store, perform the action that must notify (create, update, attach), poll
//! the collector until the record lands or the deadline passes, then assert
//! that exactly one record of the expected kind exists and that its content
//! matches the triggering action byte for byte.

use super::{ensure_admin_token, expect_status, int_field};
use crate::collector::{CallKind, CallRecord};
use crate::models::ScenarioFailure;
use crate::runner::TestRunner;
use crate::session::SuiteContext;
use serde_json::json;

const HOOK_DESCRIPTION: &str = "Hook Testing";
const HOOK_REPORTER: &str = "captin";
const HOOK_STATE: &str = "In Progress";

const ATTACHMENT_NAME: &str = "attach.txt";
const ATTACHMENT_BYTES: &[u8] = b"conformance attachment payload\n";

const ADDED_SUBJECT: &str = "Incident Created";
const UPDATED_SUBJECT: &str = "Incident Updated";
const ATTACHED_SUBJECT: &str = "Attachment added";

/// Registers the webhook scenarios in dependency order.
pub fn register(runner: &mut TestRunner) {
    runner.register("Incident added notification", |ctx| {
        Box::pin(incident_added(ctx))
    });
    runner.register("Incident updated notification", |ctx| {
        Box::pin(incident_updated(ctx))
    });
    runner.register("Incident attached notification", |ctx| {
        Box::pin(incident_attached(ctx))
    });
}

async fn incident_added(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    ctx.collector.reset().await?;

    let response = ctx
        .api
        .post(
            "/sona/v1/incidents",
            None,
            &json!({
                "description": HOOK_DESCRIPTION,
                "reporter": HOOK_REPORTER,
                "state": "open",
                "attributes": {"Foo": "Bar"},
            }),
        )
        .await?;
    expect_status(&response, 201)?;

    let incident = response.json()?;
    let id = int_field(&incident, "id")?;
    ctx.session.hook_incident_id = Some(id);

    let expected = CallRecord {
        body: added_body(HOOK_REPORTER, HOOK_DESCRIPTION),
        subject: ADDED_SUBJECT.to_string(),
        to: ctx.config.notify_to.clone(),
        incident: id.to_string(),
    };
    verify_single_record(ctx, CallKind::IncidentAdded, &expected).await
}

async fn incident_updated(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let admin_token = ensure_admin_token(ctx).await?;
    ctx.collector.reset().await?;

    let id = ctx.session.hook_incident_id()?;
    let path = format!("/sona/v1/incidents/{id}");
    let response = ctx
        .api
        .put(&path, Some(&admin_token), &json!({"state": HOOK_STATE}))
        .await?;
    expect_status(&response, 200)?;

    let expected = CallRecord {
        // The update carries no description; the hook template substitutes
        // the empty string, which yields the double space.
        body: updated_body(id, "", HOOK_STATE),
        subject: UPDATED_SUBJECT.to_string(),
        to: ctx.config.notify_to.clone(),
        incident: id.to_string(),
    };
    verify_single_record(ctx, CallKind::IncidentUpdated, &expected).await
}

async fn incident_attached(ctx: &mut SuiteContext) -> Result<(), ScenarioFailure> {
    let admin_token = ensure_admin_token(ctx).await?;
    ctx.collector.reset().await?;

    let id = ctx.session.hook_incident_id()?;
    let path = format!("/sona/v1/incidents/{id}/attachment");
    let response = ctx
        .api
        .upload(
            &path,
            Some(&admin_token),
            ATTACHMENT_NAME,
            ATTACHMENT_BYTES.to_vec(),
        )
        .await?;
    expect_status(&response, 200)?;

    let expected = CallRecord {
        body: attached_body(ATTACHMENT_NAME, id),
        subject: ATTACHED_SUBJECT.to_string(),
        to: ctx.config.notify_to.clone(),
        incident: id.to_string(),
    };
    verify_single_record(ctx, CallKind::IncidentAttached, &expected).await
}

/// Polls the collector and asserts exactly one record of `kind` exists with
/// exactly the expected content.
async fn verify_single_record(
    ctx: &SuiteContext,
    kind: CallKind,
    expected: &CallRecord,
) -> Result<(), ScenarioFailure> {
    let calls = ctx
        .collector
        .wait_for(
            kind,
            1,
            ctx.config.webhook_timeout,
            ctx.config.webhook_poll_interval,
        )
        .await?;

    let records = calls.of_kind(kind);
    if records.len() != 1 {
        return Err(ScenarioFailure::assertion(format!(
            "expected exactly one {kind} record, got {}: {records:?}",
            records.len()
        )));
    }

    let record = &records[0];
    if record != expected {
        return Err(ScenarioFailure::assertion(format!(
            "{kind} record mismatch:\n  expected: {expected:?}\n  actual:   {record:?}"
        )));
    }
    Ok(())
}

/// Expected texts mirror the reference deployment's hook templates.
fn added_body(reporter: &str, description: &str) -> String {
    format!("New Incident Created by {reporter} with description {description}.")
}

fn updated_body(id: i64, description: &str, state: &str) -> String {
    format!("Incident {id} updated with description {description} and state {state}.")
}

fn attached_body(filename: &str, id: i64) -> String {
    format!("{filename} Has been attached to Incident {id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_body_text() {
        assert_eq!(
            added_body("captin", "Hook Testing"),
            "New Incident Created by captin with description Hook Testing."
        );
    }

    #[test]
    fn test_updated_body_keeps_empty_description_literal() {
        // Double space is what the template produces for an empty description.
        assert_eq!(
            updated_body(3, "", "In Progress"),
            "Incident 3 updated with description  and state In Progress."
        );
    }

    #[test]
    fn test_attached_body_text() {
        assert_eq!(
            attached_body("attach.txt", 3),
            "attach.txt Has been attached to Incident 3"
        );
    }

    #[test]
    fn test_register_order() {
        let mut runner = TestRunner::new();
        register(&mut runner);
        assert_eq!(
            runner.case_names(),
            vec![
                "Incident added notification",
                "Incident updated notification",
                "Incident attached notification",
            ]
        );
    }
}
