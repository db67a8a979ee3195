//! Core result and failure types shared by the runner, reporter, and scenarios.

use std::time::Duration;
use thiserror::Error;

/// Why a scenario failed.
///
/// Assertion failures carry a human-readable expected/actual description.
/// Transport failures wrap the underlying HTTP error (connection refused,
/// timeout, malformed response). Both are caught at the runner boundary and
/// converted into a failed [`TestResult`]; neither aborts the remaining
/// scenarios.
#[derive(Debug, Error)]
pub enum ScenarioFailure {
    /// The response diverged from what the contract requires.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ScenarioFailure {
    /// Creates an assertion failure with the given detail message.
    pub fn assertion(detail: impl Into<String>) -> Self {
        Self::Assertion(detail.into())
    }
}

/// Outcome of a single executed scenario.
///
/// Produced by the runner, immutable afterwards, collected in registration
/// order for the final summary.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Scenario name as registered.
    pub name: String,

    /// Whether the scenario passed.
    pub passed: bool,

    /// Wall-clock time the scenario took, including network round trips.
    pub duration: Duration,

    /// Failure description; `None` when the scenario passed.
    pub detail: Option<String>,
}

impl TestResult {
    /// Creates a passing result.
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            duration,
            detail: None,
        }
    }

    /// Creates a failing result with the captured error description.
    pub fn failed(name: impl Into<String>, duration: Duration, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            duration,
            detail: Some(detail.into()),
        }
    }
}

/// Truncates a string to the given length, adding "..." if truncated.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        // `max_len` is a byte count; back off to a valid UTF-8 boundary so
        // slicing cannot panic on multi-byte characters.
        let mut boundary = max_len.min(s.len());
        while boundary > 0 && !s.is_char_boundary(boundary) {
            boundary -= 1;
        }
        format!("{}...", &s[..boundary])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_result() {
        let result = TestResult::passed("Create user", Duration::from_millis(120));
        assert!(result.passed);
        assert_eq!(result.name, "Create user");
        assert!(result.detail.is_none());
    }

    #[test]
    fn test_failed_result_keeps_detail() {
        let result = TestResult::failed(
            "Create user",
            Duration::from_millis(120),
            "expected status 201, got 500",
        );
        assert!(!result.passed);
        assert_eq!(
            result.detail.as_deref(),
            Some("expected status 201, got 500")
        );
    }

    #[test]
    fn test_assertion_failure_display() {
        let failure = ScenarioFailure::assertion("expected status 200, got 403");
        assert_eq!(
            failure.to_string(),
            "assertion failed: expected status 200, got 403"
        );
    }

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("this is a long string", 10), "this is a ...");
    }

    #[test]
    fn test_truncate_does_not_panic_on_multibyte_chars() {
        let s = format!("{}✅{}", "x".repeat(99), "y".repeat(10));
        // Byte 100 falls inside the multi-byte character.
        let out = truncate(&s, 100);
        assert_eq!(out, format!("{}...", "x".repeat(99)));
    }
}
