//! Sequential test registry and runner.
//!
//! Scenarios are registered as (name, async action) pairs and executed
//! strictly in registration order, each inside a failure boundary: an
//! assertion or transport failure becomes a failed [`TestResult`] and the run
//! continues with the next case. Against a live remote service individual
//! failures are typically independent, so collecting all of them from one run
//! beats short-circuiting on the first.

use crate::models::{ScenarioFailure, TestResult};
use crate::session::SuiteContext;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Future returned by a scenario action; borrows the suite context for the
/// duration of the case.
pub type ScenarioFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ScenarioFailure>> + 'a>>;

/// A registered scenario action.
pub type ScenarioFn =
    Box<dyn for<'a> Fn(&'a mut SuiteContext) -> ScenarioFuture<'a> + Send + Sync>;

/// A named scenario awaiting execution. Identity is registration order.
pub struct TestCase {
    name: String,
    action: ScenarioFn,
}

/// Errors that can escape a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Raised once after every scenario has executed; the only error that
    /// should terminate the process.
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    /// No scenarios matched the filter.
    #[error("no scenarios matched filter: {0}")]
    NoMatchingScenarios(String),
}

/// Configuration for a run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Run only cases whose name contains this pattern (case-insensitive).
    pub filter: Option<String>,
}

impl RunConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Aggregated results of a run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    pub results: Vec<TestResult>,

    /// Total duration of the run.
    pub duration: Duration,
}

impl RunResults {
    /// Returns the number of passed cases.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Returns the number of failed cases.
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Returns the total number of cases executed.
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Returns true if every case passed.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Returns only the failed cases.
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Converts the aggregate outcome into the single error allowed to reach
    /// the process boundary.
    pub fn ensure_all_passed(&self) -> Result<(), RunnerError> {
        if self.all_passed() {
            Ok(())
        } else {
            Err(RunnerError::ScenariosFailed {
                failed: self.failed_count(),
                total: self.total_count(),
            })
        }
    }
}

/// Progress callback for per-case reporting.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted while a run executes.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The run has started.
    RunStarted { total: usize },

    /// A case is about to execute.
    CaseStarted { name: String },

    /// A case has completed.
    CaseFinished { result: TestResult },
}

/// Ordered scenario registry and executor.
#[derive(Default)]
pub struct TestRunner {
    cases: Vec<TestCase>,
    on_progress: Option<ProgressCallback>,
}

impl TestRunner {
    /// Creates an empty runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a case to the run list.
    ///
    /// Cases run in registration order. Duplicate names are permitted and not
    /// deduplicated; each registration is an independent case.
    pub fn register<F>(&mut self, name: impl Into<String>, action: F)
    where
        F: for<'a> Fn(&'a mut SuiteContext) -> ScenarioFuture<'a> + Send + Sync + 'static,
    {
        self.cases.push(TestCase {
            name: name.into(),
            action: Box::new(action),
        });
    }

    /// Sets a callback for progress updates.
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Returns the number of registered cases.
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// Returns the registered case names, in order.
    pub fn case_names(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.name.as_str()).collect()
    }

    /// Executes every registered case matching the configuration, in order.
    ///
    /// Each action runs inside a failure boundary: an `Err` becomes a failed
    /// result with the captured error text and the run continues. The
    /// returned results always cover every selected case.
    pub async fn execute(
        &self,
        ctx: &mut SuiteContext,
        config: &RunConfig,
    ) -> Result<RunResults, RunnerError> {
        let start = Instant::now();
        let selected: Vec<&TestCase> = self
            .cases
            .iter()
            .filter(|c| Self::matches(c, config))
            .collect();

        if selected.is_empty()
            && let Some(filter) = &config.filter
        {
            return Err(RunnerError::NoMatchingScenarios(filter.clone()));
        }

        self.emit(ProgressEvent::RunStarted {
            total: selected.len(),
        });

        let mut results = Vec::with_capacity(selected.len());
        for case in selected {
            self.emit(ProgressEvent::CaseStarted {
                name: case.name.clone(),
            });

            let case_start = Instant::now();
            let outcome = (case.action)(ctx).await;
            let elapsed = case_start.elapsed();

            let result = match outcome {
                Ok(()) => TestResult::passed(&case.name, elapsed),
                Err(e) => TestResult::failed(&case.name, elapsed, e.to_string()),
            };

            self.emit(ProgressEvent::CaseFinished {
                result: result.clone(),
            });
            results.push(result);
        }

        Ok(RunResults {
            results,
            duration: start.elapsed(),
        })
    }

    fn matches(case: &TestCase, config: &RunConfig) -> bool {
        match &config.filter {
            Some(filter) => case
                .name
                .to_lowercase()
                .contains(&filter.to_lowercase()),
            None => true,
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.on_progress {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::models::ScenarioFailure;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_context() -> SuiteContext {
        SuiteContext::new(HarnessConfig::default())
    }

    fn register_passing(runner: &mut TestRunner, name: &str) {
        runner.register(name, |_ctx| Box::pin(async { Ok(()) }));
    }

    fn register_failing(runner: &mut TestRunner, name: &str, detail: &str) {
        let detail = detail.to_string();
        runner.register(name, move |_ctx| {
            let detail = detail.clone();
            Box::pin(async move { Err(ScenarioFailure::assertion(detail)) })
        });
    }

    #[test]
    fn test_run_config_with_filter() {
        let config = RunConfig::new().with_filter("user");
        assert_eq!(config.filter.as_deref(), Some("user"));
    }

    #[test]
    fn test_registration_order_and_duplicates() {
        let mut runner = TestRunner::new();
        register_passing(&mut runner, "Create user");
        register_passing(&mut runner, "Create user");
        register_passing(&mut runner, "Delete user");

        assert_eq!(runner.case_count(), 3);
        assert_eq!(
            runner.case_names(),
            vec!["Create user", "Create user", "Delete user"]
        );
    }

    #[tokio::test]
    async fn test_all_cases_run_despite_failures() {
        let mut runner = TestRunner::new();
        register_passing(&mut runner, "first");
        register_failing(&mut runner, "second", "boom");
        register_passing(&mut runner, "third");

        let mut ctx = test_context();
        let results = runner.execute(&mut ctx, &RunConfig::new()).await.unwrap();

        assert_eq!(results.total_count(), 3);
        assert_eq!(results.passed_count(), 2);
        assert_eq!(results.failed_count(), 1);
        assert!(!results.all_passed());

        // Failure boundary captured the error text; nothing aborted.
        let failures = results.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "second");
        assert_eq!(
            failures[0].detail.as_deref(),
            Some("assertion failed: boom")
        );
    }

    #[tokio::test]
    async fn test_execution_respects_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut runner = TestRunner::new();

        for name in ["a", "b", "c"] {
            let order = order.clone();
            runner.register(name, move |_ctx| {
                let order = order.clone();
                Box::pin(async move {
                    order.lock().unwrap().push(name);
                    Ok(())
                })
            });
        }

        let mut ctx = test_context();
        runner.execute(&mut ctx, &RunConfig::new()).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_scenarios_share_one_session() {
        let mut runner = TestRunner::new();
        runner.register("write token", |ctx| {
            Box::pin(async move {
                ctx.session.user_token = Some("tok".to_string());
                Ok(())
            })
        });
        runner.register("read token", |ctx| {
            Box::pin(async move {
                ctx.session.user_token()?;
                Ok(())
            })
        });

        let mut ctx = test_context();
        let results = runner.execute(&mut ctx, &RunConfig::new()).await.unwrap();
        assert!(results.all_passed());
        assert_eq!(ctx.session.user_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_filter_selects_matching_cases() {
        let mut runner = TestRunner::new();
        register_passing(&mut runner, "Create user");
        register_passing(&mut runner, "Create incident");
        register_passing(&mut runner, "Delete user");

        let mut ctx = test_context();
        let config = RunConfig::new().with_filter("USER");
        let results = runner.execute(&mut ctx, &config).await.unwrap();
        assert_eq!(results.total_count(), 2);
    }

    #[tokio::test]
    async fn test_no_matching_scenarios_error() {
        let mut runner = TestRunner::new();
        register_passing(&mut runner, "Create user");

        let mut ctx = test_context();
        let config = RunConfig::new().with_filter("nonexistent");
        let result = runner.execute(&mut ctx, &config).await;
        assert!(matches!(result, Err(RunnerError::NoMatchingScenarios(_))));
    }

    #[tokio::test]
    async fn test_empty_run_is_vacuously_passing() {
        let runner = TestRunner::new();
        let mut ctx = test_context();
        let results = runner.execute(&mut ctx, &RunConfig::new()).await.unwrap();
        assert_eq!(results.total_count(), 0);
        assert!(results.all_passed());
        assert!(results.ensure_all_passed().is_ok());
    }

    #[tokio::test]
    async fn test_ensure_all_passed_surfaces_aggregate_failure() {
        let mut runner = TestRunner::new();
        register_failing(&mut runner, "one", "x");
        register_failing(&mut runner, "two", "y");
        register_passing(&mut runner, "three");

        let mut ctx = test_context();
        let results = runner.execute(&mut ctx, &RunConfig::new()).await.unwrap();

        let err = results.ensure_all_passed().unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 scenarios failed");
    }

    #[tokio::test]
    async fn test_progress_events() {
        let mut runner = TestRunner::new();
        register_passing(&mut runner, "only");

        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        let runner = runner.on_progress(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let mut ctx = test_context();
        runner.execute(&mut ctx, &RunConfig::new()).await.unwrap();

        // RunStarted, CaseStarted, CaseFinished
        assert_eq!(events.load(Ordering::SeqCst), 3);
    }
}
