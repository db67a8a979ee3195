//! Client for the webhook collector test double.
//!
//! The collector sits at the receiving end of the service's outbound
//! notifications and records every call it gets. The harness resets it before
//! a triggering action, then polls until the expected record shows up (or a
//! deadline passes) and asserts the recorded content.

use crate::models::ScenarioFailure;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// A single notification the collector recorded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallRecord {
    /// Notification body text.
    pub body: String,

    /// Notification subject line.
    pub subject: String,

    /// Recipient address.
    pub to: String,

    /// Incident id the notification refers to, as the collector stores it
    /// (stringly typed on the wire).
    pub incident: String,
}

/// Which notification kind a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Fired when an incident is created.
    IncidentAdded,
    /// Fired when an incident is updated.
    IncidentUpdated,
    /// Fired when a file is attached to an incident.
    IncidentAttached,
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallKind::IncidentAdded => write!(f, "incidentAdded"),
            CallKind::IncidentUpdated => write!(f, "incidentUpdated"),
            CallKind::IncidentAttached => write!(f, "incidentAttached"),
        }
    }
}

/// Everything the collector has recorded since its last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedCalls {
    #[serde(default)]
    pub incident_added: Vec<CallRecord>,

    #[serde(default)]
    pub incident_updated: Vec<CallRecord>,

    #[serde(default)]
    pub incident_attached: Vec<CallRecord>,
}

impl RecordedCalls {
    /// Returns the records of one notification kind.
    pub fn of_kind(&self, kind: CallKind) -> &[CallRecord] {
        match kind {
            CallKind::IncidentAdded => &self.incident_added,
            CallKind::IncidentUpdated => &self.incident_updated,
            CallKind::IncidentAttached => &self.incident_attached,
        }
    }
}

/// HTTP client for the collector's `/calls` surface.
pub struct CollectorClient {
    http: reqwest::Client,
    base_url: String,
}

impl CollectorClient {
    /// Creates a client for the given collector base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Clears the collector's recorded-calls store.
    pub async fn reset(&self) -> Result<(), ScenarioFailure> {
        let response = self
            .http
            .delete(format!("{}/calls", self.base_url))
            .send()
            .await?;

        if response.status().as_u16() != 200 {
            return Err(ScenarioFailure::assertion(format!(
                "collector reset: expected status 200, got {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }

    /// Fetches everything recorded since the last reset.
    pub async fn fetch(&self) -> Result<RecordedCalls, ScenarioFailure> {
        let response = self
            .http
            .get(format!("{}/calls", self.base_url))
            .send()
            .await?;
        Ok(response.json::<RecordedCalls>().await?)
    }

    /// Polls the collector until at least `count` records of `kind` exist or
    /// the timeout passes, returning the last snapshot either way.
    ///
    /// Notification dispatch is asynchronous in the service under test, so a
    /// record may take a while to land. Content assertions stay with the
    /// caller; a too-slow dispatcher fails those deterministically once the
    /// deadline is reached.
    pub async fn wait_for(
        &self,
        kind: CallKind,
        count: usize,
        timeout: Duration,
        interval: Duration,
    ) -> Result<RecordedCalls, ScenarioFailure> {
        let deadline = Instant::now() + timeout;
        loop {
            let calls = self.fetch().await?;
            if calls.of_kind(kind).len() >= count || Instant::now() >= deadline {
                return Ok(calls);
            }
            debug!(%kind, "expected notification not recorded yet; retrying");
            sleep(interval).await;
        }
    }
}
