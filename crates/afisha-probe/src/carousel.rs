//! Carousel controls and the direct-control / keyboard strategy.

use crate::driver::{BrowserSession, Key};
use crate::locator::Locator;
use crate::registry::ElementId;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{wait_for_state, ElementState, WaitOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards earlier content
    Left,
    /// Towards later content
    Right,
}

impl Direction {
    /// Arrow key moving the carousel this way
    #[must_use]
    pub const fn key(self) -> Key {
        match self {
            Self::Left => Key::ArrowLeft,
            Self::Right => Key::ArrowRight,
        }
    }

    /// The other direction
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "влево" => Ok(Self::Left),
            "right" | "вправо" => Ok(Self::Right),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Horizontally scrolling blocks of the landing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Carousel {
    /// Horizontal date calendar
    Calendar,
    /// Featured banner slider
    Banner,
    /// Top events block
    TopEvents,
}

impl Carousel {
    /// Control element scrolling this carousel in `direction`
    #[must_use]
    pub const fn control(self, direction: Direction) -> ElementId {
        match (self, direction) {
            (Self::Calendar, Direction::Left) => ElementId::CalendarControlLeft,
            (Self::Calendar, Direction::Right) => ElementId::CalendarControlRight,
            (Self::Banner, Direction::Left) => ElementId::BannerControlLeft,
            (Self::Banner, Direction::Right) => ElementId::BannerControlRight,
            (Self::TopEvents, Direction::Left) => ElementId::TopControlLeft,
            (Self::TopEvents, Direction::Right) => ElementId::TopControlRight,
        }
    }
}

/// How a carousel is advanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStrategy {
    /// Dispatch a click on the directional control
    DirectControl,
    /// Press the arrow key for the direction
    KeyboardFallback,
}

impl ControlStrategy {
    /// Pick a strategy by checking whether `control` attaches within `options`.
    ///
    /// Absence of the control selects the keyboard path; any other session
    /// error is propagated.
    pub async fn probe<S: BrowserSession + ?Sized>(
        session: &S,
        control: &Locator,
        options: WaitOptions,
    ) -> ProbeResult<Self> {
        match wait_for_state(session, control, ElementState::Attached, options).await {
            Ok(()) => Ok(Self::DirectControl),
            Err(ProbeError::ElementNotFound { .. } | ProbeError::StateTimeout { .. }) => {
                info!(%control, "control not attached, using keyboard");
                Ok(Self::KeyboardFallback)
            }
            Err(e) => Err(e),
        }
    }

    /// Advance the carousel once
    pub async fn advance<S: BrowserSession + ?Sized>(
        self,
        session: &S,
        control: &Locator,
        direction: Direction,
    ) -> ProbeResult<()> {
        debug!(strategy = ?self, %direction, "advancing carousel");
        match self {
            Self::DirectControl => session.dispatch_click(control).await,
            Self::KeyboardFallback => session.press_key(direction.key()).await,
        }
    }
}

impl fmt::Display for ControlStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectControl => f.write_str("direct control"),
            Self::KeyboardFallback => f.write_str("keyboard fallback"),
        }
    }
}
