//! Wait and settle primitives.
//!
//! Every facade operation waits for an explicit DOM state before it
//! interacts. Visual effects (hover colors, carousel transforms) are given
//! time to finish through a [`Settle`] strategy before state is re-sampled.

use crate::driver::BrowserSession;
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default timeout for element waits (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }

    /// `document.readyState` values that satisfy this state
    #[must_use]
    pub const fn ready_states(&self) -> &'static [&'static str] {
        match self {
            Self::Load => &["complete"],
            Self::DomContentLoaded => &["interactive", "complete"],
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// DOM state an element must reach before interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    /// Present in the tree
    Attached,
    /// Present and rendered with a non-zero box
    Visible,
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attached => f.write_str("attached"),
            Self::Visible => f.write_str("visible"),
        }
    }
}

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with an explicit timeout and poll interval
    #[must_use]
    pub const fn new_with(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            poll_interval_ms,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll until the first match of `locator` reaches `state`.
///
/// Fails with `ElementNotFound` when nothing ever matched and with
/// `StateTimeout` when a node was present but never reached the state.
pub async fn wait_for_state<S: BrowserSession + ?Sized>(
    session: &S,
    locator: &Locator,
    state: ElementState,
    options: WaitOptions,
) -> ProbeResult<()> {
    let start = Instant::now();
    let mut seen = false;
    loop {
        let count = session.count(locator).await?;
        if count > 0 {
            seen = true;
            let reached = match state {
                ElementState::Attached => true,
                ElementState::Visible => session.is_visible(locator).await?,
            };
            if reached {
                debug!(%locator, %state, elapsed_ms = start.elapsed().as_millis() as u64, "element ready");
                return Ok(());
            }
        }
        if start.elapsed() >= options.timeout() {
            return Err(if seen {
                ProbeError::StateTimeout {
                    locator: locator.to_string(),
                    state: state.to_string(),
                    ms: options.timeout_ms,
                }
            } else {
                ProbeError::ElementNotFound {
                    locator: locator.to_string(),
                    waited_ms: options.timeout_ms,
                }
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Poll until the page URL differs from `initial`, returning the new URL
pub async fn wait_for_url_change<S: BrowserSession + ?Sized>(
    session: &S,
    initial: &str,
    options: WaitOptions,
) -> ProbeResult<String> {
    let start = Instant::now();
    loop {
        let current = session.current_url().await?;
        if current != initial {
            return Ok(current);
        }
        if start.elapsed() >= options.timeout() {
            return Err(ProbeError::navigation(
                initial,
                format!(
                    "URL did not change within {}ms after the click",
                    options.timeout_ms
                ),
            ));
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// How to let a visual effect finish before re-sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Settle {
    /// Sleep for a fixed delay
    Fixed {
        /// Delay in milliseconds
        delay_ms: u64,
    },
    /// Sample until two consecutive samples are equal
    UntilStable {
        /// Delay before the first sample
        min_delay_ms: u64,
        /// Interval between samples
        interval_ms: u64,
        /// Upper bound on total settle time
        max_ms: u64,
    },
}

impl Settle {
    /// Fixed delay
    #[must_use]
    pub const fn fixed(delay_ms: u64) -> Self {
        Self::Fixed { delay_ms }
    }

    /// Stability polling bounded by `max_ms`
    #[must_use]
    pub const fn until_stable(min_delay_ms: u64, interval_ms: u64, max_ms: u64) -> Self {
        Self::UntilStable {
            min_delay_ms,
            interval_ms,
            max_ms,
        }
    }
}

/// What to sample while settling
#[derive(Debug, Clone, PartialEq)]
pub enum SettleProbe {
    /// Computed style property of the first match
    Style {
        /// Element to sample
        locator: Locator,
        /// CSS property
        property: String,
    },
    /// Bounding boxes of every match
    Boxes(Locator),
}

impl SettleProbe {
    /// Computed style probe
    #[must_use]
    pub fn style(locator: Locator, property: impl Into<String>) -> Self {
        Self::Style {
            locator,
            property: property.into(),
        }
    }

    async fn sample<S: BrowserSession + ?Sized>(&self, session: &S) -> ProbeResult<String> {
        match self {
            Self::Style { locator, property } => session.computed_style(locator, property).await,
            Self::Boxes(locator) => {
                let count = session.count(locator).await?;
                let mut sample = String::new();
                for i in 0..count {
                    let bbox = session.bounding_box(&locator.clone().nth(i)).await?;
                    sample.push_str(&format!("{bbox:?};"));
                }
                Ok(sample)
            }
        }
    }
}

/// Apply `settle`, sampling `probe` when polling for stability.
///
/// Reaching the stability bound is not an error; the caller's assertion
/// decides whether the sampled state is acceptable.
pub async fn settle<S: BrowserSession + ?Sized>(
    session: &S,
    settle: Settle,
    probe: &SettleProbe,
) -> ProbeResult<()> {
    match settle {
        Settle::Fixed { delay_ms } => {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(())
        }
        Settle::UntilStable {
            min_delay_ms,
            interval_ms,
            max_ms,
        } => {
            let start = Instant::now();
            tokio::time::sleep(Duration::from_millis(min_delay_ms)).await;
            let mut previous = probe.sample(session).await?;
            let mut samples = 1u32;
            loop {
                if start.elapsed() >= Duration::from_millis(max_ms) {
                    warn!(?probe, samples, max_ms, "state still changing at settle bound");
                    return Ok(());
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                let current = probe.sample(session).await?;
                samples += 1;
                if current == previous {
                    debug!(samples, elapsed_ms = start.elapsed().as_millis() as u64, "settled");
                    return Ok(());
                }
                previous = current;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::{BoundingBox, Selector};
    use crate::mock::{MockElement, MockSession, MockSite};

    fn session_with(body: MockElement) -> MockSession {
        let site = MockSite::new().with_static_page("https://afisha.test/moscow", body);
        MockSession::new(site.into_shared())
    }

    async fn loaded(body: MockElement) -> MockSession {
        let session = session_with(body);
        session
            .navigate("https://afisha.test/moscow", LoadState::Load)
            .await
            .unwrap();
        session
    }

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(60).with_poll_interval(5)
    }

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_event_names() {
            assert_eq!(LoadState::Load.to_string(), "load");
            assert_eq!(LoadState::DomContentLoaded.to_string(), "DOMContentLoaded");
            assert_eq!(LoadState::default(), LoadState::Load);
        }

        #[test]
        fn test_dom_content_loaded_accepts_interactive() {
            assert!(LoadState::DomContentLoaded.ready_states().contains(&"interactive"));
            assert!(!LoadState::Load.ready_states().contains(&"interactive"));
        }

        #[test]
        fn test_wait_options_builder() {
            let opts = WaitOptions::new().with_timeout(10).with_poll_interval(2);
            assert_eq!(opts.timeout(), Duration::from_millis(10));
            assert_eq!(opts.poll_interval(), Duration::from_millis(2));
        }
    }

    mod wait_for_state_tests {
        use super::*;

        #[tokio::test]
        async fn test_attached_and_visible_succeed() {
            let session = loaded(MockElement::new("body").child(
                MockElement::new("h2").test_id("eventsFeed.title").text("Концерты"),
            ))
            .await;
            let title = Locator::new(Selector::test_id("eventsFeed.title"));
            wait_for_state(&session, &title, ElementState::Attached, fast())
                .await
                .unwrap();
            wait_for_state(&session, &title, ElementState::Visible, fast())
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_missing_element_is_not_found() {
            let session = loaded(MockElement::new("body")).await;
            let err = wait_for_state(
                &session,
                &Locator::new(Selector::test_id("nope")),
                ElementState::Attached,
                fast(),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
        }

        #[tokio::test]
        async fn test_hidden_element_times_out_on_visible() {
            let session = loaded(
                MockElement::new("body").child(MockElement::new("div").test_id("hidden").hidden()),
            )
            .await;
            let hidden = Locator::new(Selector::test_id("hidden"));
            wait_for_state(&session, &hidden, ElementState::Attached, fast())
                .await
                .unwrap();
            let err = wait_for_state(&session, &hidden, ElementState::Visible, fast())
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::StateTimeout { ref state, .. } if state == "visible"));
        }
    }

    mod url_change_tests {
        use super::*;

        #[tokio::test]
        async fn test_unchanged_url_is_navigation_failure() {
            let session = loaded(MockElement::new("body")).await;
            let err = wait_for_url_change(&session, "https://afisha.test/moscow", fast())
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::NavigationFailure { .. }));
        }

        #[tokio::test]
        async fn test_changed_url_is_returned() {
            let session = loaded(MockElement::new("body")).await;
            let url = wait_for_url_change(&session, "about:blank", fast())
                .await
                .unwrap();
            assert_eq!(url, "https://afisha.test/moscow");
        }
    }

    mod settle_tests {
        use super::*;

        #[tokio::test]
        async fn test_fixed_settle_sleeps() {
            let session = loaded(MockElement::new("body")).await;
            let probe = SettleProbe::Boxes(Locator::new(Selector::tag("div")));
            let start = std::time::Instant::now();
            settle(&session, Settle::fixed(20), &probe).await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(20));
        }

        #[tokio::test]
        async fn test_until_stable_returns_on_static_page() {
            let session = loaded(MockElement::new("body").child(
                MockElement::new("div")
                    .test_id("card")
                    .bbox(BoundingBox::new(1.0, 1.0, 10.0, 10.0)),
            ))
            .await;
            let probe = SettleProbe::Boxes(Locator::new(Selector::test_id("card")));
            let start = std::time::Instant::now();
            settle(&session, Settle::until_stable(0, 5, 1_000), &probe)
                .await
                .unwrap();
            assert!(start.elapsed() < Duration::from_millis(1_000));
        }

        #[tokio::test]
        async fn test_until_stable_polls_through_transition() {
            let session = loaded(MockElement::new("body").child(
                MockElement::new("svg").test_id("arrow").animate(
                    "stroke",
                    ["rgb(0, 0, 0)", "rgb(64, 0, 0)", "rgb(128, 0, 0)", "rgb(255, 0, 0)"],
                ),
            ))
            .await;
            let arrow = Locator::new(Selector::test_id("arrow"));
            let probe = SettleProbe::style(arrow.clone(), "stroke");
            let start = std::time::Instant::now();
            settle(&session, Settle::until_stable(0, 2, 1_000), &probe)
                .await
                .unwrap();
            assert!(start.elapsed() < Duration::from_millis(1_000));
            // settled only once the last frame was read twice
            assert_eq!(
                session.computed_style(&arrow, "stroke").await.unwrap(),
                "rgb(255, 0, 0)"
            );
        }

        #[tokio::test]
        async fn test_until_stable_gives_up_at_bound() {
            let session = loaded(MockElement::new("body").child(
                MockElement::new("svg")
                    .test_id("arrow")
                    .animate_forever("stroke", ["rgb(0, 0, 0)", "rgb(255, 0, 0)"]),
            ))
            .await;
            let probe = SettleProbe::style(Locator::new(Selector::test_id("arrow")), "stroke");
            let start = std::time::Instant::now();
            settle(&session, Settle::until_stable(0, 2, 40), &probe)
                .await
                .unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(40));
            assert!(elapsed < Duration::from_millis(1_000));
        }

        #[tokio::test]
        async fn test_style_probe_on_missing_element_errors() {
            let session = loaded(MockElement::new("body")).await;
            let probe = SettleProbe::style(Locator::new(Selector::test_id("nope")), "color");
            assert!(settle(&session, Settle::until_stable(0, 5, 50), &probe)
                .await
                .is_err());
        }

        #[test]
        fn test_settle_serde_tagged() {
            let yaml = serde_yaml_ng::to_string(&Settle::fixed(300)).unwrap();
            assert!(yaml.contains("mode: fixed"));
            let back: Settle = serde_yaml_ng::from_str(&yaml).unwrap();
            assert_eq!(back, Settle::fixed(300));
        }
    }
}
