//! Selectors and relational locators.
//!
//! A [`Selector`] is a structured CSS expression. A [`Locator`] chains
//! selectors with relational steps (text filter, nth, parent, closest
//! ancestor, first following element) and renders to a JavaScript
//! expression that evaluates to the array of matched elements.
//!
//! ```text
//! Locator::new(title)           [data-test-id="eventsFeed.title"]
//!     .has_text("Концерты")     >> has-text("Концерты")
//!     .ancestor(container)      >> ancestor(div.iHSQLP)
//!     .locator(card)            >> [data-test-id="eventCard.root"]
//!     .nth(2)                   >> nth=2
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute carrying stable test identifiers on the site
pub const TEST_ID_ATTRIBUTE: &str = "data-test-id";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `[data-test-id="…"]`
    TestId(String),
    /// `[data-test-id*="…"]`
    TestIdContains(String),
    /// Optional tag plus zero or more classes, e.g. `h3.zLWwiG`
    Compound {
        /// Tag name, any tag when `None`
        tag: Option<String>,
        /// Required classes
        classes: Vec<String>,
    },
    /// `[class*="…"]`
    ClassContains(String),
    /// `ancestor descendant`
    Descendant {
        /// Ancestor selector
        ancestor: Box<Selector>,
        /// Descendant selector
        descendant: Box<Selector>,
    },
    /// `a, b, …`
    AnyOf(Vec<Selector>),
}

impl Selector {
    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a test ID substring selector
    #[must_use]
    pub fn test_id_contains(fragment: impl Into<String>) -> Self {
        Self::TestIdContains(fragment.into())
    }

    /// Create a bare tag selector
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Compound {
            tag: Some(tag.into()),
            classes: Vec::new(),
        }
    }

    /// Create a `tag.class` selector
    #[must_use]
    pub fn tag_class(tag: impl Into<String>, class: impl Into<String>) -> Self {
        Self::Compound {
            tag: Some(tag.into()),
            classes: vec![class.into()],
        }
    }

    /// Create a selector requiring every listed class
    #[must_use]
    pub fn classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Compound {
            tag: None,
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a single class selector
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self::classes([class])
    }

    /// Create a class substring selector
    #[must_use]
    pub fn class_contains(fragment: impl Into<String>) -> Self {
        Self::ClassContains(fragment.into())
    }

    /// Scope `descendant` under `self`
    #[must_use]
    pub fn descendant(self, descendant: Self) -> Self {
        Self::Descendant {
            ancestor: Box::new(self),
            descendant: Box::new(descendant),
        }
    }

    /// Render as a CSS selector list
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::TestId(id) => format!("[{TEST_ID_ATTRIBUTE}=\"{id}\"]"),
            Self::TestIdContains(fragment) => format!("[{TEST_ID_ATTRIBUTE}*=\"{fragment}\"]"),
            Self::Compound { tag, classes } => {
                let mut css = tag.clone().unwrap_or_default();
                for class in classes {
                    css.push('.');
                    css.push_str(class);
                }
                if css.is_empty() {
                    css.push('*');
                }
                css
            }
            Self::ClassContains(fragment) => format!("[class*=\"{fragment}\"]"),
            Self::Descendant {
                ancestor,
                descendant,
            } => format!("{} {}", ancestor.to_css(), descendant.to_css()),
            Self::AnyOf(options) => options
                .iter()
                .map(Self::to_css)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// One step of a locator chain
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Descendants of every current node matching the selector
    Select(Selector),
    /// Keep nodes whose text contains the needle (case-insensitive, whitespace-normalized)
    HasText(String),
    /// Keep only the n-th node
    Nth(usize),
    /// Parent element of every current node
    Parent,
    /// Closest proper ancestor matching the selector
    Ancestor(Selector),
    /// First element after the node in document order (outside its subtree) matching the selector
    Following(Selector),
}

/// Relational element locator
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    /// Locate all elements in the document matching `selector`
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            steps: vec![Step::Select(selector)],
        }
    }

    /// Scope a further selector under the current matches
    #[must_use]
    pub fn locator(mut self, selector: Selector) -> Self {
        self.steps.push(Step::Select(selector));
        self
    }

    /// Filter by contained text
    #[must_use]
    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::HasText(text.into()));
        self
    }

    /// Keep the n-th match
    #[must_use]
    pub fn nth(mut self, index: usize) -> Self {
        self.steps.push(Step::Nth(index));
        self
    }

    /// Keep the first match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Move to parent elements
    #[must_use]
    pub fn parent(mut self) -> Self {
        self.steps.push(Step::Parent);
        self
    }

    /// Move to the closest matching ancestor
    #[must_use]
    pub fn ancestor(mut self, selector: Selector) -> Self {
        self.steps.push(Step::Ancestor(selector));
        self
    }

    /// Move to the first following element matching `selector`
    #[must_use]
    pub fn following(mut self, selector: Selector) -> Self {
        self.steps.push(Step::Following(selector));
        self
    }

    /// Steps of this locator
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// JavaScript expression evaluating to the array of matched elements
    #[must_use]
    pub fn to_js(&self) -> String {
        let mut js = String::from(
            "(() => { \
             const uniq = (xs) => Array.from(new Set(xs)); \
             const norm = (s) => (s || '').replace(/\\s+/g, ' ').trim().toLowerCase(); \
             let nodes = [document]; ",
        );
        for step in &self.steps {
            let line = match step {
                Step::Select(selector) => format!(
                    "nodes = uniq(nodes.flatMap((n) => Array.from(n.querySelectorAll({}))));",
                    js_string(&selector.to_css())
                ),
                Step::HasText(text) => format!(
                    "nodes = nodes.filter((n) => norm(n.textContent).includes(norm({})));",
                    js_string(text)
                ),
                Step::Nth(index) => {
                    format!("nodes = nodes.length > {index} ? [nodes[{index}]] : [];")
                }
                Step::Parent => {
                    "nodes = uniq(nodes.map((n) => n.parentElement).filter(Boolean));".to_string()
                }
                Step::Ancestor(selector) => format!(
                    "nodes = uniq(nodes.map((n) => n.parentElement && n.parentElement.closest({})).filter(Boolean));",
                    js_string(&selector.to_css())
                ),
                Step::Following(selector) => format!(
                    "nodes = uniq(nodes.map((n) => Array.from(document.querySelectorAll({})).find((m) => \
                     (n.compareDocumentPosition(m) & Node.DOCUMENT_POSITION_FOLLOWING) && !n.contains(m))).filter(Boolean));",
                    js_string(&selector.to_css())
                ),
            };
            js.push_str(&line);
            js.push(' ');
        }
        js.push_str("return nodes; })()");
        js
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::new(selector)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            match step {
                Step::Select(selector) => write!(f, "{selector}")?,
                Step::HasText(text) => write!(f, "has-text({text:?})")?,
                Step::Nth(index) => write!(f, "nth={index}")?,
                Step::Parent => f.write_str("parent")?,
                Step::Ancestor(selector) => write!(f, "ancestor({selector})")?,
                Step::Following(selector) => write!(f, "following({selector})")?,
            }
        }
        Ok(())
    }
}

/// Quote a string as a JavaScript string literal
#[must_use]
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""))
}

/// Point in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box for an element, relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Whether the box has a rendered area
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}
