//! Harness configuration.
//!
//! Connection endpoints and fixture data that belong to the deployment under
//! test rather than to the harness itself: where the service and the webhook
//! collector listen, the seeded administrator credentials, and the recipient
//! address the deployment's hook templates notify.

use std::time::Duration;

/// Configuration for a conformance run.
///
/// Admin credentials and the notification recipient are environment-seeded
/// fixtures; the defaults match the reference deployment.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the service under test.
    pub base_url: String,

    /// Base URL of the webhook collector double.
    pub collector_url: String,

    /// Email address of the seeded administrator account.
    pub admin_email: String,

    /// Password of the seeded administrator account.
    pub admin_password: String,

    /// Recipient address the deployment's hook templates send to.
    pub notify_to: String,

    /// How long to keep polling the collector for an expected notification.
    pub webhook_timeout: Duration,

    /// Delay between collector polls.
    pub webhook_poll_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            collector_url: "http://localhost:5000".to_string(),
            admin_email: "something@somewhere.com".to_string(),
            admin_password: "itsasecret".to_string(),
            notify_to: "foobar@email.com".to_string(),
            webhook_timeout: Duration::from_secs(10),
            webhook_poll_interval: Duration::from_millis(500),
        }
    }
}
