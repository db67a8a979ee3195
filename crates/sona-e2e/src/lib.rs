//! # sona-e2e
//!
//! Black-box conformance harness for the Sona resource-management API.
//!
//! This crate validates a live Sona deployment from the outside: it creates
//! users and incidents over HTTP, exercises the authentication and
//! permission tiers around every protected endpoint, uploads and retrieves
//! attachments, queries with complex filter trees, and verifies the
//! asynchronous outbound notifications through a webhook collector double.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  TestRunner │────▶│  Scenarios  │────▶│  ApiClient  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Reporter   │     │   Session   │     │  Collector  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Scenarios run strictly sequentially in registration order; the one
//! [`Session`] per run carries tokens and resource ids from the scenarios
//! that produce them to the scenarios that need them.

pub use crate::client::{ApiClient, ApiResponse, TOKEN_HEADER};
pub use crate::collector::{CallKind, CallRecord, CollectorClient, RecordedCalls};
pub use crate::config::HarnessConfig;
pub use crate::filter::{Comparison, ComplexFilter, Filter, FilterRequest, Junction};
pub use crate::models::{ScenarioFailure, TestResult};
pub use crate::reporter::{TerminalReporter, Verbosity, create_progress_callback};
pub use crate::runner::{
    ProgressCallback, ProgressEvent, RunConfig, RunResults, RunnerError, ScenarioFn,
    ScenarioFuture, TestRunner,
};
pub use crate::session::{Session, SuiteContext};

pub mod client;
pub mod collector;
pub mod config;
pub mod filter;
pub mod models;
pub mod reporter;
pub mod runner;
pub mod scenarios;
pub mod session;

/// Library version, matching the crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
