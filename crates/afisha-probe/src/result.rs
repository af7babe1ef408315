//! Result and error types for afisha-probe.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the landing page
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Locator resolved to zero nodes within the wait budget
    #[error("Element not found: {locator} (waited {waited_ms}ms)")]
    ElementNotFound {
        /// Locator description
        locator: String,
        /// Time spent waiting in milliseconds
        waited_ms: u64,
    },

    /// Node is present but never reached the required state
    #[error("Timeout {ms}ms exceeded waiting for {locator} to be {state}")]
    StateTimeout {
        /// Locator description
        locator: String,
        /// Required state (`attached` or `visible`)
        state: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Observed value did not match the expected predicate
    #[error("Assertion failed: {message}")]
    AssertionFailure {
        /// Error message
        message: String,
    },

    /// URL or load state did not change/settle as expected
    #[error("Navigation to URL {url} failed: {message}")]
    NavigationFailure {
        /// URL involved in the navigation
        url: String,
        /// Error message
        message: String,
    },

    /// Whole scenario exceeded its time budget
    #[error("Scenario timeout of {ms}ms exceeded")]
    ScenarioTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Operation called in the wrong scenario state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Session (page/context) error
    #[error("Browser session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// In-page script evaluation failed
    #[error("Script evaluation failed: {message}")]
    Evaluation {
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Build an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailure {
            message: message.into(),
        }
    }

    /// Build a navigation failure
    #[must_use]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NavigationFailure {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Build a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Build a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Report category for this failure
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::NavigationFailure { .. } => FailureCategory::Navigation,
            Self::ElementNotFound { .. } => FailureCategory::ElementNotFound,
            Self::StateTimeout { .. } | Self::ScenarioTimeout { .. } => FailureCategory::Timeout,
            Self::AssertionFailure { .. } => FailureCategory::Assertion,
            _ => FailureCategory::Infrastructure,
        }
    }
}

/// Failure buckets used when grouping scenario results in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Navigation errors
    Navigation,
    /// Element not found
    ElementNotFound,
    /// Timeout errors
    Timeout,
    /// Observed value mismatches
    Assertion,
    /// Browser, IO or configuration problems
    Infrastructure,
}

impl FailureCategory {
    /// All categories in report order
    pub const ALL: [Self; 5] = [
        Self::Navigation,
        Self::ElementNotFound,
        Self::Timeout,
        Self::Assertion,
        Self::Infrastructure,
    ];

    /// Human readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation errors",
            Self::ElementNotFound => "Element not found",
            Self::Timeout => "Timeout errors",
            Self::Assertion => "Assertion failures",
            Self::Infrastructure => "Infrastructure errors",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
