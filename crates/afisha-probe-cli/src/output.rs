//! Output formatting and progress reporting

use afisha_probe::{
    ElementDescriptor, FailureCategory, ProbeResult, ReportSink, Scenario, ScenarioResult,
    ScenarioStatus, Seed, SuiteReport,
};
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Console progress for a suite run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: ProgressBar,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        let progress_bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        };
        Self {
            term: Term::stderr(),
            progress_bar,
            use_color,
            quiet,
        }
    }

    fn line(&self, text: &str) {
        self.progress_bar.suspend(|| {
            let _ = self.term.write_line(text);
        });
    }

    fn prefix(&self, status: ScenarioStatus) -> String {
        let (symbol, plain, style) = match status {
            ScenarioStatus::Passed => ("✓", "PASS", Style::new().green().bold()),
            ScenarioStatus::Flaky => ("~", "FLAKY", Style::new().yellow().bold()),
            ScenarioStatus::Failed => ("✗", "FAIL", Style::new().red().bold()),
            ScenarioStatus::Skipped => ("-", "SKIP", Style::new().dim()),
        };
        if self.use_color {
            style.apply_to(symbol).to_string()
        } else {
            plain.to_string()
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }
        let _ = self.term.write_line("");
        let status = if failed > 0 { "FAILED" } else { "PASSED" };
        let status = if !self.use_color {
            status.to_string()
        } else if failed > 0 {
            style(status).red().bold().to_string()
        } else {
            style(status).green().bold().to_string()
        };
        let _ = self.term.write_line(&format!("{status} {}", report.summary()));

        let categories = report.by_category();
        for category in FailureCategory::ALL {
            if let Some(count) = categories.get(&category) {
                let _ = self.term.write_line(&format!("  {category}: {count}"));
            }
        }
        for failure in report.failures() {
            let _ = self.term.write_line(&format!(
                "  {} [{}]: {}",
                failure.name,
                failure.final_state,
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
}

impl ReportSink for ProgressReporter {
    fn suite_started(&self, total: usize, seed: Seed) {
        self.progress_bar.set_length(total as u64);
        self.info(&format!("running {total} scenario(s) with seed {seed}"));
    }

    fn scenario_started(&self, name: &str, attempt: u32) {
        if attempt > 1 {
            self.warning(&format!("{name}: retry {}", attempt - 1));
        }
        self.progress_bar.set_message(name.to_string());
    }

    fn scenario_finished(&self, result: &ScenarioResult) -> ProbeResult<()> {
        self.progress_bar.inc(1);
        if self.quiet && !result.status.is_failed() {
            return Ok(());
        }
        let mut text = format!(
            "{} {} ({} ms)",
            self.prefix(result.status),
            result.title,
            result.duration_ms
        );
        if let Some(ref error) = result.error {
            text.push_str(&format!("\n    {error}"));
        }
        self.line(&text);
        Ok(())
    }

    fn suite_finished(&self, report: &SuiteReport) -> ProbeResult<()> {
        self.progress_bar.finish_and_clear();
        self.summary(report);
        Ok(())
    }
}

/// One line per scenario: name, title and timeout override
#[must_use]
pub fn render_scenarios(scenarios: &[Scenario]) -> String {
    let width = scenarios.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for scenario in scenarios {
        out.push_str(&format!("{:width$}  {}", scenario.name, scenario.title));
        if let Some(timeout) = scenario.timeout {
            out.push_str(&format!(" [timeout {}s]", timeout.as_secs()));
        }
        out.push('\n');
    }
    out
}

/// One line per registry entry: name and CSS selector
#[must_use]
pub fn render_locators(descriptors: &[ElementDescriptor]) -> String {
    let width = descriptors.iter().map(|d| d.name.len()).max().unwrap_or(0);
    descriptors
        .iter()
        .map(|d| format!("{:width$}  {}\n", d.name, d.selector))
        .collect()
}
