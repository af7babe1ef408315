//! afisha-probe: UI verification harness for the Afisha city landing page
//!
//! The crate drives a browser through the landing page (`/moscow` by
//! default) and checks what a visitor sees: header navigation, hover
//! colors, the calendar, banner and top-block carousels, feed layouts,
//! feed-to-selection navigation and the "recently viewed" block.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐    ┌───────────────┐    ┌────────────────────┐
//! │ ElementId     │    │ MainPage      │    │ BrowserSession     │
//! │ registry      │───►│ facade        │───►│ (CDP or in-memory) │
//! └───────────────┘    └───────────────┘    └────────────────────┘
//!                              ▲
//!                      ┌───────────────┐    ┌────────────────────┐
//!                      │ Scenario      │───►│ ReportSink         │
//!                      │ Runner        │    │ (JSON, console)    │
//!                      └───────────────┘    └────────────────────┘
//! ```
//!
//! Real browsers need the `browser` feature. Without it the
//! [`mock`] session runs the same facade against an in-memory DOM.

#![warn(missing_docs)]

mod assertion;
mod browser;
mod carousel;
mod config;
mod driver;
mod harness;
mod locator;
mod main_page;
mod page_object;
mod registry;
mod reporter;
mod result;
mod rng;
mod viewport;
mod wait;

pub mod mock;
pub mod scenarios;

pub use assertion::{
    either_contains, either_contains_ignore_case, normalize_whitespace, Assertion,
    AssertionResult,
};
#[cfg(feature = "browser")]
pub use browser::{Browser, CdpSession};
pub use browser::BrowserConfig;
pub use carousel::{Carousel, ControlStrategy, Direction};
pub use config::{
    ProbeConfig, SettleConfig, SettleEffect, SettleMode, Timeouts, CI_RETRIES, DEFAULT_BASE_URL,
    DEFAULT_CITY,
};
pub use driver::{BrowserSession, Key, Screenshot, SessionFactory, Viewport};
pub use harness::{
    Lifecycle, Scenario, ScenarioBody, ScenarioContext, ScenarioFuture, ScenarioRunner,
    ScenarioState,
};
pub use locator::{js_string, BoundingBox, Locator, Point, Selector, Step, TEST_ID_ATTRIBUTE};
pub use main_page::{
    events_count, random_titles, FeedSection, MainPage, SAMPLED_CARDS_PER_FEED, TRANSPARENT,
};
pub use page_object::{url_path, PageObject, UrlMatcher};
pub use registry::{
    descriptors, resolve, ElementDescriptor, ElementId, CALENDAR_DAY_ATTRIBUTE,
    CALENDAR_MONTH_ATTRIBUTE, EVENTS_COUNT_PROPERTY, VIEWED_BLOCK_HEADING,
};
pub use reporter::{
    JsonReportWriter, ReportSink, ScenarioResult, ScenarioStatus, SuiteReport, ARTIFACTS_DIR,
    REPORT_FILE,
};
pub use result::{FailureCategory, ProbeError, ProbeResult};
pub use rng::{Seed, SeededRng};
pub use viewport::{CalendarDay, ViewportSnapshot};
pub use wait::{
    settle, wait_for_state, wait_for_url_change, ElementState, LoadState, Settle, SettleProbe,
    WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
