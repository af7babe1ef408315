//! Arena DOM with selector and locator evaluation.

use crate::assertion::normalize_whitespace;
use crate::driver::Key;
use crate::locator::{BoundingBox, Locator, Selector, Step, TEST_ID_ATTRIBUTE};
use std::collections::{BTreeMap, HashMap};

/// Side effect triggered by a click or key press
#[derive(Debug, Clone, PartialEq)]
pub enum MockAction {
    /// Load another page of the site
    Navigate(String),
    /// Shift every node matching `target` horizontally
    TranslateX {
        /// Nodes to move
        target: Selector,
        /// Offset in pixels
        dx: f64,
    },
    /// Overwrite a style property on every node matching `target`
    SetStyle {
        /// Nodes to restyle
        target: Selector,
        /// CSS property
        property: String,
        /// New value
        value: String,
    },
    /// Several effects in order
    Sequence(Vec<MockAction>),
}

/// Style property whose value advances on every read
#[derive(Debug, Clone, PartialEq)]
struct Animation {
    frames: Vec<String>,
    looped: bool,
    cursor: usize,
}

impl Animation {
    fn next_frame(&mut self) -> String {
        let index = if self.looped {
            self.cursor % self.frames.len()
        } else {
            self.cursor.min(self.frames.len() - 1)
        };
        self.cursor = self.cursor.saturating_add(1);
        self.frames[index].clone()
    }
}

/// Declarative element tree used to build pages
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    bounding_box: Option<BoundingBox>,
    styles: BTreeMap<String, String>,
    hover_styles: BTreeMap<String, String>,
    animations: BTreeMap<String, Animation>,
    on_click: Option<MockAction>,
    children: Vec<MockElement>,
}

impl MockElement {
    /// Element with a default 100x20 box at the origin
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            text: String::new(),
            bounding_box: Some(BoundingBox::new(0.0, 0.0, 100.0, 20.0)),
            styles: BTreeMap::new(),
            hover_styles: BTreeMap::new(),
            animations: BTreeMap::new(),
            on_click: None,
            children: Vec::new(),
        }
    }

    /// Set `data-test-id`
    #[must_use]
    pub fn test_id(self, id: impl Into<String>) -> Self {
        self.attr(TEST_ID_ATTRIBUTE, id)
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a class
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the viewport-relative box
    #[must_use]
    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    /// Not rendered (`display: none`)
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.bounding_box = None;
        self
    }

    /// Set a computed style property
    #[must_use]
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    /// Style property applied while this element or an ancestor is hovered
    #[must_use]
    pub fn hover_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.hover_styles.insert(property.into(), value.into());
        self
    }

    /// Style property that yields one of `frames` per read, then holds the last
    #[must_use]
    pub fn animate<I, S>(self, property: impl Into<String>, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_animation(property.into(), frames, false)
    }

    /// Style property that cycles through `frames` on every read and never settles
    #[must_use]
    pub fn animate_forever<I, S>(self, property: impl Into<String>, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_animation(property.into(), frames, true)
    }

    fn with_animation<I, S>(mut self, property: String, frames: I, looped: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let frames: Vec<String> = frames.into_iter().map(Into::into).collect();
        if !frames.is_empty() {
            self.animations.insert(
                property,
                Animation {
                    frames,
                    looped,
                    cursor: 0,
                },
            );
        }
        self
    }

    /// Effect of clicking this element (bubbles from descendants)
    #[must_use]
    pub fn on_click(mut self, action: MockAction) -> Self {
        self.on_click = Some(action);
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A page: element tree plus document-level key bindings
#[derive(Debug, Clone, PartialEq)]
pub struct MockDocument {
    body: MockElement,
    key_bindings: HashMap<Key, MockAction>,
}

impl MockDocument {
    /// Document with `body` as its root element
    #[must_use]
    pub fn new(body: MockElement) -> Self {
        Self {
            body,
            key_bindings: HashMap::new(),
        }
    }

    /// React to `key` presses with `action`
    #[must_use]
    pub fn with_key_binding(mut self, key: Key, action: MockAction) -> Self {
        self.key_bindings.insert(key, action);
        self
    }
}

impl From<MockElement> for MockDocument {
    fn from(body: MockElement) -> Self {
        Self::new(body)
    }
}

pub(crate) type NodeId = usize;

const DOCUMENT: NodeId = 0;

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    bounding_box: Option<BoundingBox>,
    styles: BTreeMap<String, String>,
    hover_styles: BTreeMap<String, String>,
    animations: BTreeMap<String, Animation>,
    on_click: Option<MockAction>,
    parent: Option<NodeId>,
    last_descendant: NodeId,
    offset_x: f64,
}

/// Live DOM of the current page. Node ids follow document order.
#[derive(Debug, Clone)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
    key_bindings: HashMap<Key, MockAction>,
    hovered: Option<NodeId>,
}

impl Dom {
    pub(crate) fn empty() -> Self {
        Self::from_document(MockDocument::new(MockElement::new("body").hidden()))
    }

    pub(crate) fn from_document(document: MockDocument) -> Self {
        let mut dom = Self {
            nodes: vec![Node {
                tag: "#document".to_string(),
                attributes: BTreeMap::new(),
                classes: Vec::new(),
                text: String::new(),
                bounding_box: None,
                styles: BTreeMap::new(),
                hover_styles: BTreeMap::new(),
                animations: BTreeMap::new(),
                on_click: None,
                parent: None,
                last_descendant: DOCUMENT,
                offset_x: 0.0,
            }],
            key_bindings: document.key_bindings,
            hovered: None,
        };
        let last = dom.insert(document.body, DOCUMENT);
        dom.nodes[DOCUMENT].last_descendant = last;
        dom
    }

    fn insert(&mut self, element: MockElement, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: element.tag,
            attributes: element.attributes,
            classes: element.classes,
            text: element.text,
            bounding_box: element.bounding_box,
            styles: element.styles,
            hover_styles: element.hover_styles,
            animations: element.animations,
            on_click: element.on_click,
            parent: Some(parent),
            last_descendant: id,
            offset_x: 0.0,
        });
        let mut last = id;
        for child in element.children {
            last = self.insert(child, id);
        }
        self.nodes[id].last_descendant = last;
        last
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id].parent, move |&p| self.nodes[p].parent)
            .filter(|&p| p != DOCUMENT)
    }

    fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        id > ancestor && id <= self.nodes[ancestor].last_descendant
    }

    pub(crate) fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        if id == DOCUMENT {
            return false;
        }
        let node = &self.nodes[id];
        match selector {
            Selector::TestId(value) => {
                node.attributes.get(TEST_ID_ATTRIBUTE).map(String::as_str) == Some(value.as_str())
            }
            Selector::TestIdContains(fragment) => node
                .attributes
                .get(TEST_ID_ATTRIBUTE)
                .is_some_and(|v| v.contains(fragment.as_str())),
            Selector::Compound { tag, classes } => {
                tag.as_ref()
                    .map_or(true, |t| node.tag.eq_ignore_ascii_case(t))
                    && classes.iter().all(|c| node.classes.contains(c))
            }
            Selector::ClassContains(fragment) => node.classes.join(" ").contains(fragment.as_str()),
            Selector::Descendant {
                ancestor,
                descendant,
            } => {
                self.matches(id, descendant) && self.ancestors(id).any(|a| self.matches(a, ancestor))
            }
            Selector::AnyOf(options) => options.iter().any(|s| self.matches(id, s)),
        }
    }

    fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        (1..self.nodes.len())
            .filter(|&id| self.matches(id, selector))
            .collect()
    }

    /// Evaluate a locator to the matched nodes
    pub(crate) fn resolve(&self, locator: &Locator) -> Vec<NodeId> {
        let mut nodes = vec![DOCUMENT];
        for step in locator.steps() {
            nodes = match step {
                Step::Select(selector) => uniq(nodes.iter().flat_map(|&n| {
                    (n + 1..=self.nodes[n].last_descendant).filter(|&m| self.matches(m, selector))
                })),
                Step::HasText(needle) => {
                    let needle = normalize_whitespace(needle).to_lowercase();
                    nodes
                        .into_iter()
                        .filter(|&n| {
                            normalize_whitespace(&self.text_content(n))
                                .to_lowercase()
                                .contains(&needle)
                        })
                        .collect()
                }
                Step::Nth(index) => nodes.get(*index).copied().into_iter().collect(),
                Step::Parent => uniq(
                    nodes
                        .iter()
                        .filter_map(|&n| self.nodes[n].parent)
                        .filter(|&p| p != DOCUMENT),
                ),
                Step::Ancestor(selector) => uniq(
                    nodes
                        .iter()
                        .filter_map(|&n| self.ancestors(n).find(|&a| self.matches(a, selector))),
                ),
                Step::Following(selector) => uniq(nodes.iter().filter_map(|&n| {
                    (self.nodes[n].last_descendant + 1..self.nodes.len())
                        .find(|&m| self.matches(m, selector))
                })),
            };
        }
        nodes.retain(|&n| n != DOCUMENT);
        nodes
    }

    pub(crate) fn first(&self, locator: &Locator) -> Option<NodeId> {
        self.resolve(locator).first().copied()
    }

    pub(crate) fn text_content(&self, id: NodeId) -> String {
        let end = self.nodes[id].last_descendant;
        (id..=end).map(|n| self.nodes[n].text.as_str()).collect()
    }

    pub(crate) fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let node = &self.nodes[id];
        if name == "class" {
            return (!node.classes.is_empty()).then(|| node.classes.join(" "));
        }
        node.attributes.get(name).cloned()
    }

    pub(crate) fn bounding_box(&self, id: NodeId) -> Option<BoundingBox> {
        if self.ancestors(id).any(|a| self.nodes[a].bounding_box.is_none()) {
            return None;
        }
        self.nodes[id].bounding_box
    }

    pub(crate) fn is_visible(&self, id: NodeId) -> bool {
        self.bounding_box(id).is_some_and(|b| b.has_area())
    }

    /// Computed value of `property`; animated properties advance one frame per read
    pub(crate) fn computed_style(&mut self, id: NodeId, property: &str) -> String {
        if let Some(hovered) = self.hovered {
            if hovered == id || self.is_descendant_of(id, hovered) {
                if let Some(value) = self.nodes[id].hover_styles.get(property) {
                    return value.clone();
                }
            }
        }
        if let Some(animation) = self.nodes[id].animations.get_mut(property) {
            return animation.next_frame();
        }
        let node = &self.nodes[id];
        if let Some(value) = node.styles.get(property) {
            return value.clone();
        }
        if property == "transform" {
            return if node.offset_x == 0.0 {
                "none".to_string()
            } else {
                format!("matrix(1, 0, 0, 1, {}, 0)", node.offset_x)
            };
        }
        String::new()
    }

    pub(crate) fn hover(&mut self, id: NodeId) {
        self.hovered = Some(id);
    }

    /// Click handler of the node or its closest ancestor
    pub(crate) fn click_action(&self, id: NodeId) -> Option<MockAction> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.nodes[n].on_click.clone())
    }

    pub(crate) fn key_action(&self, key: Key) -> Option<MockAction> {
        self.key_bindings.get(&key).cloned()
    }

    pub(crate) fn translate_x(&mut self, target: &Selector, dx: f64) {
        for id in self.select_all(target) {
            let node = &mut self.nodes[id];
            node.offset_x += dx;
            if let Some(bbox) = node.bounding_box.as_mut() {
                bbox.x += dx;
            }
        }
    }

    pub(crate) fn set_style(&mut self, target: &Selector, property: &str, value: &str) {
        for id in self.select_all(target) {
            self.nodes[id]
                .styles
                .insert(property.to_string(), value.to_string());
        }
    }
}

fn uniq(ids: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
