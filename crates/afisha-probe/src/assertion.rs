//! Assertions and text matching rules.

use crate::result::{ProbeError, ProbeResult};
use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Convert into `Err(AssertionFailure)` when failed
    pub fn into_result(self) -> ProbeResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(ProbeError::AssertionFailure {
                message: self.message,
            })
        }
    }
}

/// Assertion helpers
#[derive(Debug)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert two values differ
    #[must_use]
    pub fn differs<T: PartialEq + Debug>(before: &T, after: &T, what: &str) -> AssertionResult {
        if before == after {
            AssertionResult::fail(format!("{what} did not change: still {after:?}"))
        } else {
            AssertionResult::pass()
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }

    /// Assert a slice is not empty
    #[must_use]
    pub fn not_empty<T>(items: &[T], what: &str) -> AssertionResult {
        if items.is_empty() {
            AssertionResult::fail(format!("{what} is empty"))
        } else {
            AssertionResult::pass()
        }
    }

    /// Assert one string contains the other (either direction)
    #[must_use]
    pub fn related(a: &str, b: &str) -> AssertionResult {
        if either_contains(a, b) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("'{a}' and '{b}' do not contain one another"))
        }
    }
}

/// Trim, turn NBSP into spaces and collapse whitespace runs
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `a` contains `b` or `b` contains `a`
#[must_use]
pub fn either_contains(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// [`either_contains`] after lowercasing both sides
#[must_use]
pub fn either_contains_ignore_case(a: &str, b: &str) -> bool {
    either_contains(&a.to_lowercase(), &b.to_lowercase())
}
