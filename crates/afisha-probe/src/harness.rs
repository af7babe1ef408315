//! Scenario lifecycle and runner.
//!
//! Each scenario attempt gets a fresh session from the [`SessionFactory`],
//! the configured viewport and the baseline page, then runs its body under
//! the scenario time budget. Failed attempts are retried up to the
//! configured count; a pass after a failure is reported as flaky.

use crate::config::ProbeConfig;
use crate::driver::{Screenshot, SessionFactory};
use crate::main_page::MainPage;
use crate::reporter::{ReportSink, ScenarioResult, SuiteReport};
use crate::result::{ProbeError, ProbeResult};
use crate::rng::{Seed, SeededRng};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Phase of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    /// Nothing happened yet
    #[default]
    NotStarted,
    /// Baseline page loaded
    PageLoaded,
    /// An interaction was performed
    ActionPerformed,
    /// Page state was sampled
    StateCaptured,
    /// An assertion passed
    Asserted,
    /// Every assertion passed
    Completed,
    /// An assertion, wait or timeout failed
    Failed,
}

impl ScenarioState {
    /// `Completed` or `Failed`
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::PageLoaded => "page loaded",
            Self::ActionPerformed => "action performed",
            Self::StateCaptured => "state captured",
            Self::Asserted => "asserted",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State machine of one scenario attempt.
///
/// `NotStarted -> PageLoaded -> [ActionPerformed -> StateCaptured]* ->
/// Asserted -> Completed | Failed`. Reloading the page, further actions
/// and further assertions may follow an assertion.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: ScenarioState,
    assertions: usize,
}

impl Lifecycle {
    /// Lifecycle in `NotStarted`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ScenarioState::NotStarted,
            assertions: 0,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ScenarioState {
        self.state
    }

    /// Assertions passed so far
    #[must_use]
    pub const fn assertions(&self) -> usize {
        self.assertions
    }

    /// Reject page operations before the page loaded or after the end
    pub fn ensure_loaded(&self) -> ProbeResult<()> {
        match self.state {
            ScenarioState::NotStarted => Err(ProbeError::InvalidState {
                message: "page operation before the page was loaded".to_string(),
            }),
            state if state.is_terminal() => Err(ProbeError::InvalidState {
                message: format!("scenario already {state}"),
            }),
            _ => Ok(()),
        }
    }

    /// Move to `next`
    pub fn transition(&mut self, next: ScenarioState) -> ProbeResult<()> {
        if self.state.is_terminal() {
            return Err(ProbeError::InvalidState {
                message: format!("scenario already {}, cannot move to {next}", self.state),
            });
        }
        match next {
            ScenarioState::NotStarted => {
                return Err(ProbeError::InvalidState {
                    message: "a scenario cannot restart".to_string(),
                })
            }
            ScenarioState::PageLoaded | ScenarioState::Failed => {}
            ScenarioState::ActionPerformed
            | ScenarioState::StateCaptured
            | ScenarioState::Asserted => self.ensure_loaded()?,
            ScenarioState::Completed => {
                if self.state != ScenarioState::Asserted {
                    return Err(ProbeError::InvalidState {
                        message: format!("cannot complete from {}", self.state),
                    });
                }
            }
        }
        if next == ScenarioState::Asserted {
            self.assertions += 1;
        }
        self.state = next;
        Ok(())
    }

    /// Settle the scenario with the outcome of its body.
    ///
    /// A body that returns without ending on an assertion fails.
    pub fn finish(&mut self, outcome: ProbeResult<()>) -> ProbeResult<()> {
        if self.state.is_terminal() {
            return outcome;
        }
        match outcome {
            Ok(()) if self.state == ScenarioState::Asserted => {
                self.state = ScenarioState::Completed;
                Ok(())
            }
            Ok(()) => {
                let message = format!("scenario ended in '{}' without a final assertion", self.state);
                self.state = ScenarioState::Failed;
                Err(ProbeError::InvalidState { message })
            }
            Err(e) => {
                self.state = ScenarioState::Failed;
                Err(e)
            }
        }
    }
}

/// What a scenario body can reach
#[derive(Debug)]
pub struct ScenarioContext {
    /// Landing page facade, already on the baseline page
    pub page: MainPage,
    /// Generator seeded for this scenario
    pub rng: SeededRng,
}

/// Future returned by a scenario body
pub type ScenarioFuture<'a> = Pin<Box<dyn Future<Output = ProbeResult<()>> + Send + 'a>>;

/// Scenario body
pub type ScenarioBody = for<'a> fn(&'a mut ScenarioContext) -> ScenarioFuture<'a>;

/// An independent test case
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Stable identifier, also the artifact name
    pub name: &'static str,
    /// Human readable title
    pub title: &'static str,
    /// Budget override
    pub timeout: Option<Duration>,
    /// Facade calls and assertions
    pub body: ScenarioBody,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Create a scenario with the default budget
    #[must_use]
    pub const fn new(name: &'static str, title: &'static str, body: ScenarioBody) -> Self {
        Self {
            name,
            title,
            timeout: None,
            body,
        }
    }

    /// Override the time budget
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

struct Attempt {
    outcome: ProbeResult<()>,
    state: ScenarioState,
    screenshot: Option<Screenshot>,
}

/// Runs scenarios on isolated sessions
pub struct ScenarioRunner {
    factory: Arc<dyn SessionFactory>,
    config: Arc<ProbeConfig>,
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("config", &self.config)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl ScenarioRunner {
    /// Runner drawing sessions from `factory`
    #[must_use]
    pub fn new(factory: Arc<dyn SessionFactory>, config: ProbeConfig) -> Self {
        Self {
            factory,
            config: Arc::new(config),
            sinks: Vec::new(),
        }
    }

    /// Add a report sink
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run `scenarios` and report to every sink.
    ///
    /// Up to `workers` scenarios run at once; with `fail_fast` they run one
    /// by one and the rest are skipped after the first failure.
    pub async fn run(&self, scenarios: &[Scenario]) -> ProbeResult<SuiteReport> {
        let seed = self.config.seed();
        let mut report = SuiteReport::new(seed, &self.config.base_url);
        let started = Instant::now();
        info!(total = scenarios.len(), %seed, workers = self.config.workers, "suite started");
        for sink in &self.sinks {
            sink.suite_started(scenarios.len(), seed);
        }

        report.results = if self.config.fail_fast {
            self.run_fail_fast(scenarios, seed).await
        } else {
            let mut indexed: Vec<(usize, ScenarioResult)> = stream::iter(scenarios.iter().enumerate())
                .map(|(i, scenario)| async move { (i, self.run_scenario(scenario, seed).await) })
                .buffer_unordered(self.config.workers.max(1))
                .collect()
                .await;
            indexed.sort_by_key(|(i, _)| *i);
            indexed.into_iter().map(|(_, result)| result).collect()
        };

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(summary = %report.summary(), "suite finished");
        for sink in &self.sinks {
            sink.suite_finished(&report)?;
        }
        Ok(report)
    }

    async fn run_fail_fast(&self, scenarios: &[Scenario], seed: Seed) -> Vec<ScenarioResult> {
        let mut results = Vec::with_capacity(scenarios.len());
        let mut stopped = false;
        for scenario in scenarios {
            if stopped {
                let result =
                    ScenarioResult::skipped(scenario.name, scenario.title, seed.derive(scenario.name));
                self.publish(&result);
                results.push(result);
                continue;
            }
            let result = self.run_scenario(scenario, seed).await;
            stopped = result.status.is_failed();
            results.push(result);
        }
        results
    }

    /// Run one scenario with retries
    pub async fn run_scenario(&self, scenario: &Scenario, run_seed: Seed) -> ScenarioResult {
        let seed = run_seed.derive(scenario.name);
        let retries = self.config.retries();
        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            for sink in &self.sinks {
                sink.scenario_started(scenario.name, attempt);
            }
            info!(scenario = scenario.name, attempt, %seed, "scenario started");
            let started = Instant::now();
            let Attempt {
                outcome,
                state,
                screenshot,
            } = self.attempt(scenario, seed).await;
            let duration = started.elapsed();

            match outcome {
                Ok(()) => {
                    info!(scenario = scenario.name, attempt, ms = duration.as_millis() as u64, "scenario passed");
                    break ScenarioResult::passed(scenario.name, scenario.title, seed, attempt, duration);
                }
                Err(error) if attempt > retries => {
                    warn!(scenario = scenario.name, attempt, %error, "scenario failed");
                    let mut result = ScenarioResult::failed(
                        scenario.name,
                        scenario.title,
                        seed,
                        attempt,
                        duration,
                        &error,
                    )
                    .with_final_state(state);
                    if let Some(screenshot) = screenshot {
                        result = result.with_screenshot(screenshot);
                    }
                    break result;
                }
                Err(error) => {
                    warn!(scenario = scenario.name, attempt, %error, "attempt failed, retrying");
                }
            }
        };
        self.publish(&result);
        result
    }

    fn publish(&self, result: &ScenarioResult) {
        for sink in &self.sinks {
            if let Err(e) = sink.scenario_finished(result) {
                warn!(scenario = %result.name, error = %e, "report sink failed");
            }
        }
    }

    async fn attempt(&self, scenario: &Scenario, seed: Seed) -> Attempt {
        let session = match self.factory.new_session().await {
            Ok(session) => session,
            Err(e) => {
                return Attempt {
                    outcome: Err(e),
                    state: ScenarioState::NotStarted,
                    screenshot: None,
                }
            }
        };
        let mut ctx = ScenarioContext {
            page: MainPage::new(session, Arc::clone(&self.config)),
            rng: SeededRng::new(seed),
        };

        let budget = scenario
            .timeout
            .unwrap_or_else(|| self.config.timeouts.scenario());
        let viewport = self.config.viewport;
        let body = scenario.body;
        let run = async {
            ctx.page.session().set_viewport(viewport).await?;
            ctx.page.open_baseline().await?;
            body(&mut ctx).await
        };
        let outcome = match tokio::time::timeout(budget, run).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeError::ScenarioTimeout {
                ms: budget.as_millis() as u64,
            }),
        };

        let outcome = ctx.page.finish(outcome);
        let state = ctx.page.state();
        let screenshot = if outcome.is_err() && self.config.screenshot_on_failure {
            match ctx.page.session().screenshot().await {
                Ok(screenshot) => Some(screenshot),
                Err(e) => {
                    warn!(scenario = scenario.name, error = %e, "failure screenshot not captured");
                    None
                }
            }
        } else {
            None
        };
        if let Err(e) = ctx.page.close().await {
            warn!(scenario = scenario.name, error = %e, "session did not close cleanly");
        }
        Attempt {
            outcome,
            state,
            screenshot,
        }
    }
}
