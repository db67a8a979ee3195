//! Session state threaded through a suite run.
//!
//! Exactly one [`Session`] exists per run. Authentication and creation
//! scenarios write to it; later scenarios read the credential or resource id
//! they depend on. It is passed `&mut` into every scenario rather than living
//! in globals, so the coupling between scenarios is explicit.

use crate::client::ApiClient;
use crate::collector::CollectorClient;
use crate::config::HarnessConfig;
use crate::models::ScenarioFailure;

/// Mutable values shared across the scenarios of a run.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Token of the ordinary (initially unprivileged) test user.
    pub user_token: Option<String>,

    /// Token of the seeded administrator.
    pub admin_token: Option<String>,

    /// Token of a user that never receives any permission.
    pub restricted_token: Option<String>,

    /// Id of the most recently created user.
    pub last_user_id: Option<i64>,

    /// Id of the most recently created incident.
    pub last_incident_id: Option<i64>,

    /// Id of the incident created to trigger webhook notifications.
    pub hook_incident_id: Option<i64>,
}

impl Session {
    pub fn user_token(&self) -> Result<&str, ScenarioFailure> {
        self.user_token
            .as_deref()
            .ok_or_else(|| missing("user token", "the authenticate scenario"))
    }

    pub fn admin_token(&self) -> Result<&str, ScenarioFailure> {
        self.admin_token
            .as_deref()
            .ok_or_else(|| missing("admin token", "an admin authentication scenario"))
    }

    pub fn restricted_token(&self) -> Result<&str, ScenarioFailure> {
        self.restricted_token
            .as_deref()
            .ok_or_else(|| missing("restricted token", "the restricted-user scenario"))
    }

    pub fn last_user_id(&self) -> Result<i64, ScenarioFailure> {
        self.last_user_id
            .ok_or_else(|| missing("user id", "the create-user scenario"))
    }

    pub fn last_incident_id(&self) -> Result<i64, ScenarioFailure> {
        self.last_incident_id
            .ok_or_else(|| missing("incident id", "the create-incident scenario"))
    }

    pub fn hook_incident_id(&self) -> Result<i64, ScenarioFailure> {
        self.hook_incident_id
            .ok_or_else(|| missing("hook incident id", "the incident-added hook scenario"))
    }
}

fn missing(what: &str, producer: &str) -> ScenarioFailure {
    ScenarioFailure::assertion(format!(
        "no {what} in session; {producer} must run (and pass) first"
    ))
}

/// Everything a scenario needs: the two HTTP clients, the fixture
/// configuration, and the shared session.
pub struct SuiteContext {
    pub api: ApiClient,
    pub collector: CollectorClient,
    pub config: HarnessConfig,
    pub session: Session,
}

impl SuiteContext {
    /// Creates a fresh context with an empty session.
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            api: ApiClient::new(config.base_url.clone()),
            collector: CollectorClient::new(config.collector_url.clone()),
            config,
            session: Session::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session_accessors_fail_with_producer_hint() {
        let session = Session::default();
        let err = session.user_token().unwrap_err();
        assert!(err.to_string().contains("authenticate scenario"));

        let err = session.last_incident_id().unwrap_err();
        assert!(err.to_string().contains("create-incident scenario"));
    }

    #[test]
    fn test_populated_session_reads_back() {
        let session = Session {
            user_token: Some("tok".to_string()),
            last_user_id: Some(1),
            ..Session::default()
        };
        assert_eq!(session.user_token().unwrap(), "tok");
        assert_eq!(session.last_user_id().unwrap(), 1);
        assert!(session.admin_token().is_err());
    }
}
