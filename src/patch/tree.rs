//! Explicit slot subtree model.
//!
//! The layout-locked slot invariant lives here: every slot has exactly one
//! outer element (a `span` for inline slots) and exactly one inner wrapper,
//! marked by a stable attribute, which owns the actual content. The tree is
//! host-agnostic; projecting it to real UI is the renderer's job
//! (see `patch::render`).

use std::collections::BTreeMap;

use crate::slot::model::SlotValue;

/// Attribute marking a slot's outer element.
pub const SLOT_ID_ATTR: &str = "data-flux-id";
/// Attribute marking the content-owning inner wrapper.
pub const SLOT_INNER_ATTR: &str = "data-flux-slot-inner";
/// Attribute marking a transient transition layer (`from`/`to`).
pub const SLOT_LAYER_ATTR: &str = "data-flux-layer";

/// An element in the slot subtree.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotNode {
    /// Tag name (`span`, `div`, `img`, ...).
    pub tag: String,
    /// Attributes, sorted for stable projection.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Inline styles, sorted for stable projection.
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
    /// Direct text content, rendered before children.
    #[serde(default)]
    pub text: String,
    /// Child elements.
    #[serde(default)]
    pub children: Vec<SlotNode>,
}

impl SlotNode {
    /// New empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Attribute lookup.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Inline style lookup.
    pub fn style(&self, key: &str) -> Option<&str> {
        self.styles.get(key).map(String::as_str)
    }

    /// Set one inline style.
    pub fn set_style(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.styles.insert(key.into(), value.into());
    }

    /// Whether this slot renders inline (outer is a `span`).
    pub fn is_inline(&self) -> bool {
        self.tag == "span"
    }
}

/// Coerce a non-`span` outer element to `span` in place, preserving
/// attributes, styles, and children. Some markup sources render inline slots
/// as other elements; pagination relies on the outer staying inline.
pub fn normalize_inline_slot_outer(outer: &mut SlotNode) {
    if outer.tag != "span" {
        outer.tag = "span".to_string();
    }
}

/// Idempotently create or reuse the inner wrapper, migrating any stray
/// direct children (and stray outer text) into it. After any number of
/// calls, exactly one element in the subtree carries [`SLOT_INNER_ATTR`].
/// Returns the inner's child index (always the only child).
pub fn ensure_inner_wrapper(outer: &mut SlotNode) -> usize {
    let inline = outer.is_inline();
    let existing = outer
        .children
        .iter()
        .position(|c| c.attrs.contains_key(SLOT_INNER_ATTR));

    let mut inner = match existing {
        Some(i) => outer.children.remove(i),
        None => SlotNode::new(if inline { "span" } else { "div" })
            .with_attr(SLOT_INNER_ATTR, ""),
    };
    if inline {
        inner.tag = "span".to_string();
    }

    // Everything still sitting directly under the outer is stray content
    // that belongs to the inner. A duplicate inner marker on a stray (seen
    // with copy-pasted markup) is demoted to plain content.
    for mut stray in outer.children.drain(..) {
        stray.attrs.remove(SLOT_INNER_ATTR);
        inner.children.push(stray);
    }
    if !outer.text.is_empty() {
        inner.text.push_str(&std::mem::take(&mut outer.text));
    }

    outer.children.push(inner);
    outer.children.len() - 1
}

/// Number of elements in the subtree carrying the inner-wrapper marker.
pub fn inner_wrapper_count(node: &SlotNode) -> usize {
    let own = usize::from(node.attrs.contains_key(SLOT_INNER_ATTR));
    own + node.children.iter().map(inner_wrapper_count).sum::<usize>()
}

/// Content mutation applied to a slot's inner wrapper.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SlotPatch {
    /// Replace content with text.
    Text(String),
    /// Replace content with an image element.
    Asset {
        /// Image source path/URL.
        src: String,
        /// Alt text / label.
        alt: String,
    },
}

impl SlotPatch {
    /// Patch equivalent of a resolved slot value.
    pub fn from_value(value: &SlotValue) -> Self {
        match value {
            SlotValue::Text { text } => Self::Text(text.clone()),
            SlotValue::Asset { asset, label } => match asset {
                Some(a) => Self::Asset {
                    src: a.path.clone(),
                    alt: label.clone(),
                },
                None => Self::Text(label.clone()),
            },
        }
    }
}

/// Set the inner wrapper's content directly (no animation).
pub fn apply_content(inner: &mut SlotNode, patch: &SlotPatch) {
    inner.children.clear();
    match patch {
        SlotPatch::Text(text) => {
            inner.text = text.clone();
        }
        SlotPatch::Asset { src, alt } => {
            inner.text.clear();
            inner.children.push(
                SlotNode::new("img")
                    .with_attr("src", src.clone())
                    .with_attr("alt", alt.clone()),
            );
        }
    }
}
