//! Suite execution against a real browser

use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use afisha_probe::scenarios::{main_page_suite, select};
use afisha_probe::{
    JsonReportWriter, ProbeConfig, Scenario, ScenarioRunner, SessionFactory, SuiteReport,
};
use std::sync::Arc;
use tracing::info;

/// Runs the landing page suite with console and JSON reporting
#[derive(Debug)]
pub struct SuiteRunner {
    config: ProbeConfig,
    reporter: Arc<ProgressReporter>,
}

impl SuiteRunner {
    /// Create a new suite runner
    #[must_use]
    pub fn new(config: ProbeConfig, reporter: ProgressReporter) -> Self {
        Self {
            config,
            reporter: Arc::new(reporter),
        }
    }

    /// Run configuration
    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Scenarios selected by `filter`; an empty selection is an error
    pub fn scenarios(filter: Option<&str>) -> CliResult<Vec<Scenario>> {
        let selected = select(&main_page_suite(), filter);
        if selected.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "no scenario matches '{}'",
                filter.unwrap_or_default()
            )));
        }
        Ok(selected)
    }

    /// Run the selected scenarios and write the report
    pub async fn run(&self, filter: Option<&str>) -> CliResult<SuiteReport> {
        let scenarios = Self::scenarios(filter)?;
        self.config.validate()?;
        let report = self.execute(&scenarios).await?;
        info!(
            report = %JsonReportWriter::new(&self.config.output_dir).report_path().display(),
            "report written"
        );
        Ok(report)
    }

    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    fn scenario_runner(&self, factory: Arc<dyn SessionFactory>) -> ScenarioRunner {
        ScenarioRunner::new(factory, self.config.clone())
            .with_sink(self.reporter.clone())
            .with_sink(Arc::new(JsonReportWriter::new(&self.config.output_dir)))
    }

    #[cfg(feature = "browser")]
    async fn execute(&self, scenarios: &[Scenario]) -> CliResult<SuiteReport> {
        use afisha_probe::Browser;

        let browser = Arc::new(Browser::launch(self.config.browser_config()).await?);
        let report = self.scenario_runner(browser.clone()).run(scenarios).await;
        match Arc::try_unwrap(browser) {
            Ok(browser) => {
                if let Err(e) = browser.close().await {
                    self.reporter.warning(&format!("browser did not close cleanly: {e}"));
                }
            }
            Err(_) => self.reporter.warning("browser still in use, not closed"),
        }
        Ok(report?)
    }

    #[cfg(not(feature = "browser"))]
    async fn execute(&self, _scenarios: &[Scenario]) -> CliResult<SuiteReport> {
        Err(CliError::BrowserUnavailable {
            message: "built without the `browser` feature; rebuild with --features browser"
                .to_string(),
        })
    }
}
