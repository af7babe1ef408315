//! Run configuration.
//!
//! Layering: defaults, then an optional YAML file, then environment
//! variables. The CLI applies its flags on top.

use crate::browser::BrowserConfig;
use crate::driver::Viewport;
use crate::result::{ProbeError, ProbeResult};
use crate::rng::Seed;
use crate::wait::{Settle, WaitOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default site under test
pub const DEFAULT_BASE_URL: &str = "https://afisha.yandex.ru";
/// Default city landing page
pub const DEFAULT_CITY: &str = "moscow";
/// Retries applied in CI when none are configured
pub const CI_RETRIES: u32 = 2;

/// Timeouts in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Whole scenario budget
    pub scenario_ms: u64,
    /// Expectation waits (`toBeVisible`-style checks)
    pub expect_ms: u64,
    /// Element waits before interaction
    pub action_ms: u64,
    /// Page navigations
    pub navigation_ms: u64,
    /// How long a carousel control may take to attach before the keyboard is used
    pub control_probe_ms: u64,
    /// Poll interval for every wait
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            scenario_ms: 25_000,
            expect_ms: 10_000,
            action_ms: 15_000,
            navigation_ms: 30_000,
            control_probe_ms: 5_000,
            poll_interval_ms: 50,
        }
    }
}

impl Timeouts {
    /// Wait options for element waits
    #[must_use]
    pub const fn action(&self) -> WaitOptions {
        WaitOptions::new_with(self.action_ms, self.poll_interval_ms)
    }

    /// Wait options for expectations
    #[must_use]
    pub const fn expect(&self) -> WaitOptions {
        WaitOptions::new_with(self.expect_ms, self.poll_interval_ms)
    }

    /// Wait options for navigations
    #[must_use]
    pub const fn navigation(&self) -> WaitOptions {
        WaitOptions::new_with(self.navigation_ms, self.poll_interval_ms)
    }

    /// Wait options for the carousel control probe
    #[must_use]
    pub const fn control_probe(&self) -> WaitOptions {
        WaitOptions::new_with(self.control_probe_ms, self.poll_interval_ms)
    }

    /// Scenario budget
    #[must_use]
    pub const fn scenario(&self) -> Duration {
        Duration::from_millis(self.scenario_ms)
    }
}

/// Settle strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    /// Sleep the configured delay
    Fixed,
    /// Poll until two samples agree, bounded by the configured delay
    #[default]
    UntilStable,
}

impl std::str::FromStr for SettleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "stable" | "until_stable" => Ok(Self::UntilStable),
            other => Err(format!("unknown settle mode: {other}")),
        }
    }
}

/// Visual effects that need settling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleEffect {
    /// Hover color transition
    Hover,
    /// Calendar slide
    Calendar,
    /// Banner slide
    Banner,
    /// Top block slide
    TopBlock,
    /// Scroll to a section
    Scroll,
}

/// Settle delays in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// Strategy
    pub mode: SettleMode,
    /// Hover transitions
    pub hover_ms: u64,
    /// Calendar slide
    pub calendar_ms: u64,
    /// Banner slide
    pub banner_ms: u64,
    /// Top block slide
    pub top_block_ms: u64,
    /// Scroll to a section
    pub scroll_ms: u64,
    /// Sampling interval in `until_stable` mode
    pub stable_interval_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            mode: SettleMode::UntilStable,
            hover_ms: 300,
            calendar_ms: 500,
            banner_ms: 1_000,
            top_block_ms: 800,
            scroll_ms: 1_000,
            stable_interval_ms: 50,
        }
    }
}

impl SettleConfig {
    /// Settle strategy for `effect`.
    ///
    /// In `until_stable` mode the fixed delay becomes the polling bound.
    #[must_use]
    pub const fn for_effect(&self, effect: SettleEffect) -> Settle {
        let delay_ms = match effect {
            SettleEffect::Hover => self.hover_ms,
            SettleEffect::Calendar => self.calendar_ms,
            SettleEffect::Banner => self.banner_ms,
            SettleEffect::TopBlock => self.top_block_ms,
            SettleEffect::Scroll => self.scroll_ms,
        };
        match self.mode {
            SettleMode::Fixed => Settle::fixed(delay_ms),
            SettleMode::UntilStable => Settle::until_stable(
                self.stable_interval_ms,
                self.stable_interval_ms,
                delay_ms,
            ),
        }
    }
}

/// Full run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Site origin
    pub base_url: String,
    /// City slug of the baseline page
    pub city: String,
    /// Timeouts
    pub timeouts: Timeouts,
    /// Scenario retries, `None` means 2 in CI and 0 elsewhere
    pub retries: Option<u32>,
    /// Concurrent scenarios
    pub workers: usize,
    /// Viewport applied before every scenario
    pub viewport: Viewport,
    /// Run the browser headless
    pub headless: bool,
    /// Chromium executable, auto-detected when unset
    pub chromium_path: Option<String>,
    /// Chromium sandbox
    pub sandbox: bool,
    /// Settle strategy and delays
    pub settle: SettleConfig,
    /// Run seed, taken from the clock when unset
    pub seed: Option<u64>,
    /// Report and artifact directory
    pub output_dir: PathBuf,
    /// Capture a screenshot when a scenario fails
    pub screenshot_on_failure: bool,
    /// Stop scheduling scenarios after the first failure
    pub fail_fast: bool,
    /// Running under CI (from the `CI` variable)
    #[serde(skip)]
    pub ci: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            city: DEFAULT_CITY.to_string(),
            timeouts: Timeouts::default(),
            retries: None,
            workers: 1,
            viewport: Viewport::default(),
            headless: true,
            chromium_path: None,
            sandbox: true,
            settle: SettleConfig::default(),
            seed: None,
            output_dir: PathBuf::from("target/afisha-probe"),
            screenshot_on_failure: true,
            fail_fast: false,
            ci: false,
        }
    }
}

impl ProbeConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, optional YAML file, then process environment
    ///
    /// The result is not validated; callers layer their own overrides on top
    /// and call [`ProbeConfig::validate`] once.
    pub fn load(path: Option<&Path>) -> ProbeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML file
    pub fn from_yaml_file(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text
    pub fn from_yaml(text: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `AFISHA_*`, `CHROMIUM_PATH` and `CI` overrides from `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> ProbeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("AFISHA_BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = lookup("AFISHA_CITY") {
            self.city = value;
        }
        if let Some(value) = lookup("AFISHA_SEED") {
            self.seed = Some(parse_env("AFISHA_SEED", &value)?);
        }
        if let Some(value) = lookup("AFISHA_WORKERS") {
            self.workers = parse_env("AFISHA_WORKERS", &value)?;
        }
        if let Some(value) = lookup("AFISHA_RETRIES") {
            self.retries = Some(parse_env("AFISHA_RETRIES", &value)?);
        }
        if let Some(value) = lookup("AFISHA_HEADLESS") {
            self.headless = parse_bool("AFISHA_HEADLESS", &value)?;
        }
        if let Some(value) = lookup("CHROMIUM_PATH") {
            self.chromium_path = Some(value);
        }
        if let Some(value) = lookup("CI") {
            self.ci = !matches!(value.as_str(), "" | "0" | "false");
        }
        Ok(())
    }

    /// Reject configurations that cannot run
    pub fn validate(&self) -> ProbeResult<()> {
        let base = self.base()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ProbeError::config(format!(
                "base_url must be an http(s) URL, got {}",
                self.base_url
            )));
        }
        if self.city.trim().is_empty() {
            return Err(ProbeError::config("city must not be empty"));
        }
        if self.workers == 0 {
            return Err(ProbeError::config("workers must be at least 1"));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ProbeError::config("viewport must be non-zero"));
        }
        let t = &self.timeouts;
        if [t.scenario_ms, t.expect_ms, t.action_ms, t.navigation_ms, t.poll_interval_ms]
            .contains(&0)
        {
            return Err(ProbeError::config("timeouts must be non-zero"));
        }
        Ok(())
    }

    /// Effective scenario retries
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
            .unwrap_or(if self.ci { CI_RETRIES } else { 0 })
    }

    /// Effective run seed
    #[must_use]
    pub fn seed(&self) -> Seed {
        self.seed.map_or_else(Seed::from_clock, Seed)
    }

    /// Base URL as a directory, so relative references resolve below its path
    fn base(&self) -> ProbeResult<Url> {
        let mut base = Url::parse(&self.base_url)
            .map_err(|e| ProbeError::config(format!("base_url {}: {e}", self.base_url)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }

    /// Path prefix of the base URL, without the trailing slash
    #[must_use]
    pub fn base_path(&self) -> String {
        self.base()
            .map(|base| base.path().trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    /// Path pattern of a city landing page below the base path
    #[must_use]
    pub fn landing_pattern(&self) -> String {
        format!("{}/:city", self.base_path())
    }

    /// URL of a city landing page
    #[must_use]
    pub fn city_url(&self, city: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), city)
    }

    /// URL of the baseline page
    #[must_use]
    pub fn baseline_url(&self) -> String {
        self.city_url(&self.city)
    }

    /// Resolve `href` against the base URL (RFC 3986 reference resolution)
    pub fn absolute_url(&self, href: &str) -> ProbeResult<String> {
        let url = self.base()?.join(href).map_err(|e| {
            ProbeError::navigation(href, format!("cannot resolve against {}: {e}", self.base_url))
        })?;
        Ok(url.into())
    }

    /// Browser launch options
    #[must_use]
    pub fn browser_config(&self) -> BrowserConfig {
        let mut config = BrowserConfig::default()
            .with_viewport(self.viewport.width, self.viewport.height)
            .with_headless(self.headless)
            .with_navigation_timeout(self.timeouts.navigation_ms);
        if let Some(ref path) = self.chromium_path {
            config = config.with_chromium_path(path.clone());
        }
        if !self.sandbox {
            config = config.with_no_sandbox();
        }
        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> ProbeResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ProbeError::config(format!("{key}: cannot parse {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> ProbeResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ProbeError::config(format!("{key}: expected a boolean, got {value:?}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults_match_suite_settings() {
            let config = ProbeConfig::default();
            assert_eq!(config.base_url, "https://afisha.yandex.ru");
            assert_eq!(config.baseline_url(), "https://afisha.yandex.ru/moscow");
            assert_eq!(config.timeouts.scenario_ms, 25_000);
            assert_eq!(config.timeouts.expect_ms, 10_000);
            assert_eq!(config.timeouts.action_ms, 15_000);
            assert_eq!(config.timeouts.navigation_ms, 30_000);
            assert_eq!(config.viewport, Viewport::new(1920, 1080));
            assert_eq!(config.workers, 1);
            assert_eq!(config.retries(), 0);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_ci_defaults_to_two_retries() {
            let mut config = ProbeConfig::default();
            config.apply_env(env(&[("CI", "true")])).unwrap();
            assert_eq!(config.retries(), 2);
            config.retries = Some(0);
            assert_eq!(config.retries(), 0);
        }

        #[test]
        fn test_ci_false_is_not_ci() {
            let mut config = ProbeConfig::default();
            config.apply_env(env(&[("CI", "false")])).unwrap();
            assert!(!config.ci);
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_env_overrides() {
            let mut config = ProbeConfig::default();
            config
                .apply_env(env(&[
                    ("AFISHA_BASE_URL", "https://afisha.test"),
                    ("AFISHA_CITY", "spb"),
                    ("AFISHA_SEED", "42"),
                    ("AFISHA_WORKERS", "3"),
                    ("AFISHA_HEADLESS", "no"),
                    ("CHROMIUM_PATH", "/usr/bin/chromium"),
                ]))
                .unwrap();
            assert_eq!(config.baseline_url(), "https://afisha.test/spb");
            assert_eq!(config.seed(), Seed(42));
            assert_eq!(config.workers, 3);
            assert!(!config.headless);
            assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        }

        #[test]
        fn test_bad_env_value_is_config_error() {
            let mut config = ProbeConfig::default();
            let err = config
                .apply_env(env(&[("AFISHA_WORKERS", "many")]))
                .unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = ProbeConfig::from_yaml(
                "base_url: https://afisha.test\nworkers: 2\nsettle:\n  mode: fixed\n  hover_ms: 100\n",
            )
            .unwrap();
            assert_eq!(config.workers, 2);
            assert_eq!(config.settle.mode, SettleMode::Fixed);
            assert_eq!(config.settle.hover_ms, 100);
            assert_eq!(config.settle.banner_ms, 1_000);
            assert_eq!(config.timeouts.expect_ms, 10_000);
        }

        #[test]
        fn test_yaml_round_trip_through_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("probe.yaml");
            let mut config = ProbeConfig::default();
            config.seed = Some(7);
            std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
            let loaded = ProbeConfig::from_yaml_file(&path).unwrap();
            assert_eq!(loaded, config);
        }

        #[test]
        fn test_missing_file_is_config_error() {
            let err = ProbeConfig::from_yaml_file(Path::new("/nonexistent/probe.yaml")).unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_rejects_bad_values() {
            let mut config = ProbeConfig::default();
            config.workers = 0;
            assert!(config.validate().is_err());

            let mut config = ProbeConfig::default();
            config.base_url = "afisha.yandex.ru".into();
            assert!(config.validate().is_err());

            let mut config = ProbeConfig::default();
            config.timeouts.expect_ms = 0;
            assert!(config.validate().is_err());

            let mut config = ProbeConfig::default();
            config.viewport = Viewport::new(0, 1080);
            assert!(config.validate().is_err());
        }
    }

    mod url_tests {
        use super::*;

        fn prefixed() -> ProbeConfig {
            let mut config = ProbeConfig::default();
            config.base_url = "https://afisha.test/ru".into();
            config
        }

        #[test]
        fn test_absolute_url() {
            let config = ProbeConfig::default();
            assert_eq!(
                config.absolute_url("/moscow/concert/x").unwrap(),
                "https://afisha.yandex.ru/moscow/concert/x"
            );
            assert_eq!(config.absolute_url("https://other/x").unwrap(), "https://other/x");
        }

        #[test]
        fn test_absolute_url_under_base_path() {
            let config = prefixed();
            assert_eq!(
                config.absolute_url("//cdn.test/x").unwrap(),
                "https://cdn.test/x"
            );
            assert_eq!(
                config.absolute_url("/moscow/x").unwrap(),
                "https://afisha.test/moscow/x"
            );
            assert_eq!(
                config.absolute_url("moscow/x").unwrap(),
                "https://afisha.test/ru/moscow/x"
            );
        }

        #[test]
        fn test_landing_pattern_follows_base_path() {
            assert_eq!(ProbeConfig::default().landing_pattern(), "/:city");
            let config = prefixed();
            assert_eq!(config.landing_pattern(), "/ru/:city");
            assert_eq!(config.baseline_url(), "https://afisha.test/ru/moscow");

            let mut config = prefixed();
            config.base_url = "https://afisha.test/ru/".into();
            assert_eq!(config.landing_pattern(), "/ru/:city");
            assert_eq!(config.baseline_url(), "https://afisha.test/ru/moscow");
        }

        #[test]
        fn test_non_http_base_rejected() {
            let mut config = ProbeConfig::default();
            config.base_url = "ftp://afisha.test".into();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("base_url must be an http(s) URL"));
        }
    }

    mod settle_tests {
        use super::*;

        #[test]
        fn test_effect_delays() {
            let mut settle = SettleConfig::default();
            assert_eq!(
                settle.for_effect(SettleEffect::Banner),
                Settle::until_stable(50, 50, 1_000)
            );
            settle.mode = SettleMode::Fixed;
            assert_eq!(settle.for_effect(SettleEffect::Hover), Settle::fixed(300));
            assert_eq!(settle.for_effect(SettleEffect::TopBlock), Settle::fixed(800));
            assert_eq!("stable".parse::<SettleMode>().unwrap(), SettleMode::UntilStable);
        }
    }
}
