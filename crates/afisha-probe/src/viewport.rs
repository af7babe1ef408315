//! Before/after snapshots of carousel contents.

use crate::carousel::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar day identity read from `data-test-day` / `data-test-month`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDay {
    /// Day of month
    pub day: u32,
    /// Month number
    pub month: u32,
}

impl CalendarDay {
    /// Create a calendar day
    #[must_use]
    pub const fn new(day: u32, month: u32) -> Self {
        Self { day, month }
    }

    /// Parse from the two attribute values, `None` when either is missing or not numeric
    #[must_use]
    pub fn from_attributes(day: Option<&str>, month: Option<&str>) -> Option<Self> {
        let day = day?.trim().parse().ok()?;
        let month = month?.trim().parse().ok()?;
        Some(Self { day, month })
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}", self.day, self.month)
    }
}

/// Ordered items captured at one instant, used only for comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSnapshot<T> {
    items: Vec<T>,
}

impl<T> ViewportSnapshot<T> {
    /// Wrap captured items
    #[must_use]
    pub const fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Captured items in order
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// First captured item
    #[must_use]
    pub fn leading(&self) -> Option<&T> {
        self.items.first()
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: PartialEq> ViewportSnapshot<T> {
    /// Whether the leading item differs between two snapshots
    #[must_use]
    pub fn leading_changed(&self, after: &Self) -> bool {
        self.leading() != after.leading()
    }
}

impl ViewportSnapshot<f64> {
    /// Whether some item moved in the direction content travels when scrolling `direction`.
    ///
    /// Scrolling right moves content left, so some position must have
    /// decreased; scrolling left requires some position to increase.
    #[must_use]
    pub fn shifted(&self, after: &Self, direction: Direction) -> bool {
        self.items
            .iter()
            .zip(after.items.iter())
            .any(|(before, after)| match direction {
                Direction::Right => after < before,
                Direction::Left => after > before,
            })
    }
}

impl<T> From<Vec<T>> for ViewportSnapshot<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod calendar_day_tests {
        use super::*;

        #[test]
        fn test_parse_and_display() {
            let day = CalendarDay::from_attributes(Some("1"), Some("11")).unwrap();
            assert_eq!(day, CalendarDay::new(1, 11));
            assert_eq!(day.to_string(), "01.11");
        }

        #[test]
        fn test_missing_attribute_is_skipped() {
            assert_eq!(CalendarDay::from_attributes(None, Some("11")), None);
            assert_eq!(CalendarDay::from_attributes(Some("3"), None), None);
            assert_eq!(CalendarDay::from_attributes(Some("x"), Some("1")), None);
        }
    }

    mod snapshot_tests {
        use super::*;

        #[test]
        fn test_leading_changed() {
            let before = ViewportSnapshot::new(vec![CalendarDay::new(1, 11), CalendarDay::new(2, 11)]);
            let same = before.clone();
            let after = ViewportSnapshot::new(vec![CalendarDay::new(8, 11)]);
            assert!(!before.leading_changed(&same));
            assert!(before.leading_changed(&after));
            let empty: ViewportSnapshot<CalendarDay> = ViewportSnapshot::new(vec![]);
            assert!(!empty.leading_changed(&empty.clone()));
            assert!(empty.is_empty());
        }

        #[test]
        fn test_shifted_right_and_left() {
            let before = ViewportSnapshot::new(vec![40.0, 340.0, 640.0]);
            let moved_left = ViewportSnapshot::new(vec![-260.0, 40.0, 340.0]);
            assert!(before.shifted(&moved_left, Direction::Right));
            assert!(!before.shifted(&moved_left, Direction::Left));
            assert!(moved_left.shifted(&before, Direction::Left));
            assert!(!before.shifted(&before.clone(), Direction::Right));
        }

        #[test]
        fn test_shifted_compares_common_prefix() {
            let before = ViewportSnapshot::new(vec![10.0, 20.0]);
            let after = ViewportSnapshot::new(vec![10.0]);
            assert!(!before.shifted(&after, Direction::Right));
            assert_eq!(before.len(), 2);
        }
    }
}
