//! Terminal reporting for scenario outcomes.

use crate::models::TestResult;
use crate::runner::{ProgressCallback, ProgressEvent, RunResults};
use colored::Colorize;

/// How much the reporter prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only the final summary.
    Quiet,
    /// Per-case lines and the summary.
    #[default]
    Normal,
    /// Everything, including case-start notices.
    Verbose,
}

/// Formats per-case outcomes and the final summary for the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalReporter {
    verbosity: Verbosity,
}

impl TerminalReporter {
    /// Creates a reporter with normal verbosity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reporter with the given verbosity.
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Announces the run size.
    pub fn run_started(&self, total: usize) {
        if self.verbosity != Verbosity::Quiet {
            println!(
                "{}",
                format!(
                    "Running {} scenario{}",
                    total,
                    if total == 1 { "" } else { "s" }
                )
                .dimmed()
            );
        }
    }

    /// Announces a case about to run (verbose only).
    pub fn case_started(&self, name: &str) {
        if self.verbosity == Verbosity::Verbose {
            println!("  {}", format!("running {name}...").dimmed());
        }
    }

    /// Prints the outcome line for one case.
    pub fn case_finished(&self, result: &TestResult) {
        if self.verbosity == Verbosity::Quiet {
            return;
        }

        if result.passed {
            println!(
                "  {} {} {}",
                "✓".green(),
                result.name,
                format!("({:.2?})", result.duration).dimmed()
            );
        } else {
            println!(
                "  {} {} {}",
                "✗".red(),
                result.name.red(),
                format!("({:.2?})", result.duration).dimmed()
            );
            if let Some(detail) = &result.detail {
                println!("      {}", detail.red());
            }
        }
    }

    /// Prints the failed cases with their details.
    pub fn print_failures(&self, results: &RunResults) {
        let failures = results.failures();
        if failures.is_empty() {
            return;
        }

        println!("\n{}", "Failures:".red().bold());
        for failure in failures {
            println!("  {} {}", "✗".red(), failure.name);
            if let Some(detail) = &failure.detail {
                println!("      {detail}");
            }
        }
    }

    /// Prints the final summary line. Always printed, regardless of verbosity.
    pub fn print_summary(&self, results: &RunResults) {
        let line = summary_line(results);
        if results.all_passed() {
            println!("\n{}", line.green().bold());
        } else {
            println!("\n{}", line.red().bold());
        }
    }
}

/// Builds the summary line text.
fn summary_line(results: &RunResults) -> String {
    format!(
        "{} of {} scenarios passed in {:.2?}",
        results.passed_count(),
        results.total_count(),
        results.duration
    )
}

/// Bridges runner progress events onto a terminal reporter.
pub fn create_progress_callback(verbosity: Verbosity) -> ProgressCallback {
    let reporter = TerminalReporter::with_verbosity(verbosity);
    Box::new(move |event| match event {
        ProgressEvent::RunStarted { total } => reporter.run_started(total),
        ProgressEvent::CaseStarted { name } => reporter.case_started(&name),
        ProgressEvent::CaseFinished { result } => reporter.case_finished(&result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn results(passed: usize, failed: usize) -> RunResults {
        let mut results = Vec::new();
        for i in 0..passed {
            results.push(TestResult::passed(
                format!("pass-{i}"),
                Duration::from_millis(10),
            ));
        }
        for i in 0..failed {
            results.push(TestResult::failed(
                format!("fail-{i}"),
                Duration::from_millis(10),
                "expected 200, got 403",
            ));
        }
        RunResults {
            results,
            duration: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_summary_line_counts() {
        let line = summary_line(&results(3, 1));
        assert!(line.starts_with("3 of 4 scenarios passed"));
    }

    #[test]
    fn test_summary_line_all_passed() {
        let line = summary_line(&results(2, 0));
        assert!(line.starts_with("2 of 2 scenarios passed"));
    }

    #[test]
    fn test_progress_callback_handles_all_events() {
        let callback = create_progress_callback(Verbosity::Quiet);
        callback(ProgressEvent::RunStarted { total: 1 });
        callback(ProgressEvent::CaseStarted {
            name: "case".to_string(),
        });
        callback(ProgressEvent::CaseFinished {
            result: TestResult::passed("case", Duration::from_millis(1)),
        });
    }
}
