//! Scenario results, suite reports and report sinks.
//!
//! The runner pushes every finished scenario and the final suite report to
//! its [`ReportSink`]s. [`JsonReportWriter`] persists `report.json` plus a
//! PNG per failure screenshot; the CLI adds a console sink.

use crate::driver::Screenshot;
use crate::harness::ScenarioState;
use crate::result::{FailureCategory, ProbeError, ProbeResult};
use crate::rng::Seed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// File name of the JSON report inside the output directory
pub const REPORT_FILE: &str = "report.json";
/// Directory for screenshots inside the output directory
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Scenario outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Passed on the first attempt
    Passed,
    /// Passed after at least one failed attempt
    Flaky,
    /// Failed on every attempt
    Failed,
    /// Not run (fail-fast stopped the suite)
    Skipped,
}

impl ScenarioStatus {
    /// Passed, possibly after retries
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed | Self::Flaky)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario identifier
    pub name: String,
    /// Human readable title
    pub title: String,
    /// Outcome
    pub status: ScenarioStatus,
    /// Attempts made
    pub attempts: u32,
    /// Duration of the last attempt in milliseconds
    pub duration_ms: u64,
    /// Seed of the scenario generator
    pub seed: Seed,
    /// State the last attempt ended in
    pub final_state: ScenarioState,
    /// Error of the last failed attempt
    pub error: Option<String>,
    /// Category of that error
    pub category: Option<FailureCategory>,
    /// Screenshot file name under the artifacts directory
    pub screenshot_file: Option<String>,
    /// Screenshot on failure
    #[serde(skip)]
    pub screenshot: Option<Screenshot>,
}

impl ScenarioResult {
    fn base(name: &str, title: &str, status: ScenarioStatus, seed: Seed) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            status,
            attempts: 0,
            duration_ms: 0,
            seed,
            final_state: ScenarioState::NotStarted,
            error: None,
            category: None,
            screenshot_file: None,
            screenshot: None,
        }
    }

    /// Create a passing result
    #[must_use]
    pub fn passed(name: &str, title: &str, seed: Seed, attempts: u32, duration: Duration) -> Self {
        let status = if attempts > 1 {
            ScenarioStatus::Flaky
        } else {
            ScenarioStatus::Passed
        };
        Self {
            attempts,
            duration_ms: duration.as_millis() as u64,
            final_state: ScenarioState::Completed,
            ..Self::base(name, title, status, seed)
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn failed(
        name: &str,
        title: &str,
        seed: Seed,
        attempts: u32,
        duration: Duration,
        error: &ProbeError,
    ) -> Self {
        Self {
            attempts,
            duration_ms: duration.as_millis() as u64,
            final_state: ScenarioState::Failed,
            error: Some(error.to_string()),
            category: Some(error.category()),
            ..Self::base(name, title, ScenarioStatus::Failed, seed)
        }
    }

    /// Create a skipped result
    #[must_use]
    pub fn skipped(name: &str, title: &str, seed: Seed) -> Self {
        Self::base(name, title, ScenarioStatus::Skipped, seed)
    }

    /// Attach the failure screenshot
    #[must_use]
    pub fn with_screenshot(mut self, screenshot: Screenshot) -> Self {
        self.screenshot_file = Some(format!("{}.png", self.name));
        self.screenshot = Some(screenshot);
        self
    }

    /// Record the lifecycle state of the last attempt
    #[must_use]
    pub const fn with_final_state(mut self, state: ScenarioState) -> Self {
        self.final_state = state;
        self
    }
}

/// Results of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Run seed
    pub seed: Seed,
    /// Site under test
    pub base_url: String,
    /// Results in catalogue order
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    /// Empty report for a run starting now
    #[must_use]
    pub fn new(seed: Seed, base_url: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration_ms: 0,
            seed,
            base_url: base_url.into(),
            results: Vec::new(),
        }
    }

    /// Get number of passed scenarios, flaky included
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    /// Get number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failed()).count()
    }

    /// Scenarios that needed a retry
    #[must_use]
    pub fn flaky_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == ScenarioStatus::Flaky)
            .count()
    }

    /// Scenarios not run
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == ScenarioStatus::Skipped)
            .count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Check if nothing failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get failing scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results
            .iter()
            .filter(|r| r.status.is_failed())
            .collect()
    }

    /// Failure counts per category
    #[must_use]
    pub fn by_category(&self) -> BTreeMap<FailureCategory, usize> {
        let mut counts = BTreeMap::new();
        for category in self.results.iter().filter_map(|r| r.category) {
            *counts.entry(category).or_insert(0) += 1;
        }
        counts
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} flaky, {} skipped of {} ({} ms, seed {})",
            self.passed_count(),
            self.failed_count(),
            self.flaky_count(),
            self.skipped_count(),
            self.total_count(),
            self.duration_ms,
            self.seed
        )
    }
}

/// Receiver of run progress and results
pub trait ReportSink: Send + Sync {
    /// The suite is about to start
    fn suite_started(&self, _total: usize, _seed: Seed) {}

    /// A scenario attempt is starting
    fn scenario_started(&self, _name: &str, _attempt: u32) {}

    /// A scenario reached its final result
    fn scenario_finished(&self, result: &ScenarioResult) -> ProbeResult<()>;

    /// The suite finished
    fn suite_finished(&self, report: &SuiteReport) -> ProbeResult<()>;
}

/// Writes `report.json` and failure screenshots to an output directory
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    dir: PathBuf,
}

impl JsonReportWriter {
    /// Writer into `dir`, created on first use
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSON report
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    /// Path of a screenshot artifact
    #[must_use]
    pub fn artifact_path(&self, file: &str) -> PathBuf {
        self.dir.join(ARTIFACTS_DIR).join(file)
    }

    /// Read a report back
    pub fn read(path: &Path) -> ProbeResult<SuiteReport> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl ReportSink for JsonReportWriter {
    fn scenario_finished(&self, result: &ScenarioResult) -> ProbeResult<()> {
        if let (Some(file), Some(screenshot)) = (&result.screenshot_file, &result.screenshot) {
            let path = self.artifact_path(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &screenshot.data)?;
            tracing::debug!(path = %path.display(), "screenshot written");
        }
        Ok(())
    }

    fn suite_finished(&self, report: &SuiteReport) -> ProbeResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(self.report_path(), json)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn failing(name: &str, error: ProbeError) -> ScenarioResult {
        ScenarioResult::failed(name, "title", Seed(1), 3, Duration::from_millis(40), &error)
    }

    fn report() -> SuiteReport {
        let mut report = SuiteReport::new(Seed(7), "https://afisha.test");
        report.results = vec![
            ScenarioResult::passed("a", "A", Seed(1), 1, Duration::from_millis(5)),
            ScenarioResult::passed("b", "B", Seed(2), 2, Duration::from_millis(5)),
            failing("c", ProbeError::assertion("nope")),
            failing(
                "d",
                ProbeError::ElementNotFound {
                    locator: "x".into(),
                    waited_ms: 10,
                },
            ),
            ScenarioResult::skipped("e", "E", Seed(3)),
        ];
        report
    }

    mod result_tests {
        use super::*;

        #[test]
        fn test_status_from_attempts() {
            let first = ScenarioResult::passed("a", "A", Seed(1), 1, Duration::ZERO);
            let retried = ScenarioResult::passed("a", "A", Seed(1), 3, Duration::ZERO);
            assert_eq!(first.status, ScenarioStatus::Passed);
            assert_eq!(retried.status, ScenarioStatus::Flaky);
            assert!(retried.status.is_passed());
            assert_eq!(first.final_state, ScenarioState::Completed);
        }

        #[test]
        fn test_failed_carries_category() {
            let result = failing("c", ProbeError::ScenarioTimeout { ms: 25_000 });
            assert_eq!(result.category, Some(FailureCategory::Timeout));
            assert!(result.error.unwrap().contains("25000"));
        }

        #[test]
        fn test_screenshot_names_artifact() {
            let result = failing("calendar_scrolls_right", ProbeError::assertion("x"))
                .with_screenshot(Screenshot::new(vec![1, 2], 10, 10));
            assert_eq!(
                result.screenshot_file.as_deref(),
                Some("calendar_scrolls_right.png")
            );
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let report = report();
            assert_eq!(report.passed_count(), 2);
            assert_eq!(report.failed_count(), 2);
            assert_eq!(report.flaky_count(), 1);
            assert_eq!(report.skipped_count(), 1);
            assert_eq!(report.total_count(), 5);
            assert!(!report.all_passed());
            assert_eq!(report.failures().len(), 2);
            assert!(report.summary().starts_with("2 passed, 2 failed, 1 flaky"));
        }

        #[test]
        fn test_by_category() {
            let counts = report().by_category();
            assert_eq!(counts.get(&FailureCategory::Assertion), Some(&1));
            assert_eq!(counts.get(&FailureCategory::ElementNotFound), Some(&1));
            assert_eq!(counts.get(&FailureCategory::Timeout), None);
        }
    }

    mod writer_tests {
        use super::*;

        #[test]
        fn test_writes_report_and_artifacts() {
            let dir = TempDir::new().unwrap();
            let writer = JsonReportWriter::new(dir.path().join("out"));
            let result = failing("banner_scrolls_left", ProbeError::assertion("same"))
                .with_screenshot(Screenshot::new(vec![0x89, b'P', b'N', b'G'], 1, 1));
            writer.scenario_finished(&result).unwrap();

            let mut suite = report();
            suite.results.push(result);
            writer.suite_finished(&suite).unwrap();

            let png = std::fs::read(writer.artifact_path("banner_scrolls_left.png")).unwrap();
            assert_eq!(png, vec![0x89, b'P', b'N', b'G']);

            let back = JsonReportWriter::read(&writer.report_path()).unwrap();
            assert_eq!(back.run_id, suite.run_id);
            assert_eq!(back.results.len(), 6);
            assert!(back.results[5].screenshot.is_none());
            assert_eq!(
                back.results[5].screenshot_file.as_deref(),
                Some("banner_scrolls_left.png")
            );
        }

        #[test]
        fn test_no_screenshot_no_artifact() {
            let dir = TempDir::new().unwrap();
            let writer = JsonReportWriter::new(dir.path());
            writer
                .scenario_finished(&failing("x", ProbeError::assertion("y")))
                .unwrap();
            assert!(!dir.path().join(ARTIFACTS_DIR).exists());
        }
    }
}
