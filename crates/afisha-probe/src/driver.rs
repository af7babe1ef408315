//! Browser session boundary.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BrowserSession (abstract trait)                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐        ┌──────────────────────┐    │
//! │  │  CdpSession          │        │  MockSession         │    │
//! │  │  (feature `browser`) │        │  (in-memory DOM)     │    │
//! │  │  chromiumoxide       │        │  unit/integration    │    │
//! │  └──────────────────────┘        └──────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Element operations act on the first node the locator resolves to and
//! fail with [`ProbeError::ElementNotFound`](crate::ProbeError::ElementNotFound)
//! when there is none. Waiting is layered on top in [`crate::wait`].

use crate::locator::{BoundingBox, Locator};
use crate::result::ProbeResult;
use crate::wait::LoadState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Viewport {
    /// Create a viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether `bbox` lies fully inside this viewport and has a rendered area
    #[must_use]
    pub fn fully_contains(&self, bbox: &BoundingBox) -> bool {
        bbox.has_area()
            && bbox.y >= 0.0
            && bbox.x >= 0.0
            && bbox.bottom() <= f64::from(self.height)
            && bbox.right() <= f64::from(self.width)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Keyboard keys the facade presses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Arrow left
    ArrowLeft,
    /// Arrow right
    ArrowRight,
    /// Escape
    Escape,
}

impl Key {
    /// DOM `key` value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ArrowLeft => "ArrowLeft",
            Self::ArrowRight => "ArrowRight",
            Self::Escape => "Escape",
        }
    }

    /// Windows virtual key code
    #[must_use]
    pub const fn key_code(self) -> i64 {
        match self {
            Self::ArrowLeft => 37,
            Self::ArrowRight => 39,
            Self::Escape => 27,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Timestamp when screenshot was taken
    pub timestamp: std::time::SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: std::time::SystemTime::now(),
        }
    }

    /// Check if screenshot is valid (has data)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }
}

/// One isolated browser session (page in its own context)
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to `url` and wait for `wait_until`
    async fn navigate(&self, url: &str, wait_until: LoadState) -> ProbeResult<()>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Wait until the document reaches `state`
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// Resize the viewport
    async fn set_viewport(&self, viewport: Viewport) -> ProbeResult<()>;

    /// Current `innerWidth`/`innerHeight`
    async fn viewport(&self) -> ProbeResult<Viewport>;

    /// Number of nodes the locator resolves to
    async fn count(&self, locator: &Locator) -> ProbeResult<usize>;

    /// Whether the first match is rendered with a non-zero box
    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool>;

    /// `textContent` of the first match
    async fn text_content(&self, locator: &Locator) -> ProbeResult<Option<String>>;

    /// Attribute value of the first match
    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>>;

    /// Viewport-relative box of the first match, `None` when not rendered
    async fn bounding_box(&self, locator: &Locator) -> ProbeResult<Option<BoundingBox>>;

    /// Computed style property of the first match
    async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<String>;

    /// Scroll the first match into view
    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()>;

    /// Trusted mouse click on the center of the first match
    async fn click(&self, locator: &Locator) -> ProbeResult<()>;

    /// Move the mouse over the first match
    async fn hover(&self, locator: &Locator) -> ProbeResult<()>;

    /// Dispatch a synthetic `click` event on the first match
    async fn dispatch_click(&self, locator: &Locator) -> ProbeResult<()>;

    /// Press and release a key
    async fn press_key(&self, key: Key) -> ProbeResult<()>;

    /// Capture the viewport as PNG
    async fn screenshot(&self) -> ProbeResult<Screenshot>;

    /// Close the session
    async fn close(&self) -> ProbeResult<()>;
}

/// Produces fresh, isolated sessions
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a new session
    async fn new_session(&self) -> ProbeResult<Box<dyn BrowserSession>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod viewport_tests {
        use super::*;

        #[test]
        fn test_default_is_full_hd() {
            assert_eq!(Viewport::default(), Viewport::new(1920, 1080));
            assert_eq!(Viewport::default().to_string(), "1920x1080");
        }

        #[test]
        fn test_item_above_viewport_is_excluded() {
            let vp = Viewport::new(1920, 1080);
            assert!(!vp.fully_contains(&BoundingBox::new(100.0, -10.0, 50.0, 50.0)));
            assert!(vp.fully_contains(&BoundingBox::new(100.0, 0.0, 50.0, 50.0)));
        }

        #[test]
        fn test_edges_are_inclusive() {
            let vp = Viewport::new(100, 100);
            assert!(vp.fully_contains(&BoundingBox::new(0.0, 0.0, 100.0, 100.0)));
            assert!(!vp.fully_contains(&BoundingBox::new(0.5, 0.0, 100.0, 100.0)));
        }

        #[test]
        fn test_zero_area_is_excluded() {
            let vp = Viewport::new(100, 100);
            assert!(!vp.fully_contains(&BoundingBox::new(10.0, 10.0, 0.0, 10.0)));
        }
    }

    mod key_tests {
        use super::*;

        #[test]
        fn test_arrow_keys() {
            assert_eq!(Key::ArrowRight.as_str(), "ArrowRight");
            assert_eq!(Key::ArrowLeft.key_code(), 37);
            assert_eq!(Key::Escape.to_string(), "Escape");
        }
    }

    mod screenshot_tests {
        use super::*;

        #[test]
        fn test_validity() {
            assert!(Screenshot::new(vec![1, 2, 3], 10, 10).is_valid());
            assert!(!Screenshot::new(vec![], 10, 10).is_valid());
            assert!(!Screenshot::new(vec![1], 0, 10).is_valid());
        }
    }

    proptest! {
        #[test]
        fn prop_contained_boxes_are_visible(
            x in 0.0f64..1800.0,
            y in 0.0f64..1000.0,
            w in 1.0f64..120.0,
            h in 1.0f64..80.0,
        ) {
            let vp = Viewport::new(1920, 1080);
            prop_assert!(vp.fully_contains(&BoundingBox::new(x, y, w, h)));
        }

        #[test]
        fn prop_negative_origin_is_never_visible(
            x in -500.0f64..-0.001,
            y in -500.0f64..1000.0,
            w in 1.0f64..400.0,
            h in 1.0f64..80.0,
        ) {
            let vp = Viewport::new(1920, 1080);
            prop_assert!(!vp.fully_contains(&BoundingBox::new(x, y, w, h)));
            prop_assert!(!vp.fully_contains(&BoundingBox::new(y.abs(), x, w, h)));
        }
    }
}
