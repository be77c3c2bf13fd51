//! Animated slot patching.
//!
//! The engine owns the in-flight transitions for a document's slots, keyed by
//! slot id. It is single-threaded and host-driven: the caller supplies
//! `now_ms` on every call, and [`TransitionEngine::advance`] both writes the
//! current layer styles and finalizes once the deadline has passed. The
//! deadline at `duration + FINALIZE_SLACK_MS` is authoritative; per-tick
//! style writes are an optimization only, so a slot converges even if no
//! intermediate tick ever runs.

use std::collections::BTreeMap;

use kurbo::Size;

use crate::patch::tree::{
    SLOT_ID_ATTR, SLOT_LAYER_ATTR, SlotNode, SlotPatch, apply_content, ensure_inner_wrapper,
};
use crate::policy::model::{Ease, TransitionKind, WipeDir};

/// Slack added to the animation duration before the authoritative finalize.
pub const FINALIZE_SLACK_MS: f64 = 30.0;

/// Host motion preference. `Reduced` turns every patch into a direct patch,
/// and doubles as the headless fallback when no renderer is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionPreference {
    /// Animate transitions.
    Full,
    /// Skip animations; always patch directly.
    Reduced,
}

/// Inline styles the transition overwrites on the inner wrapper; restored
/// exactly on teardown.
#[derive(Clone, Debug, Default, PartialEq)]
struct SavedStyles {
    position: Option<String>,
    overflow: Option<String>,
    min_width: Option<String>,
    min_height: Option<String>,
}

const FROZEN_KEYS: [&str; 4] = ["position", "overflow", "min-width", "min-height"];

impl SavedStyles {
    fn capture(inner: &SlotNode) -> Self {
        Self {
            position: inner.style("position").map(str::to_string),
            overflow: inner.style("overflow").map(str::to_string),
            min_width: inner.style("min-width").map(str::to_string),
            min_height: inner.style("min-height").map(str::to_string),
        }
    }

    fn restore(&self, inner: &mut SlotNode) {
        let values = [
            &self.position,
            &self.overflow,
            &self.min_width,
            &self.min_height,
        ];
        for (key, value) in FROZEN_KEYS.iter().zip(values) {
            match value {
                Some(v) => inner.set_style(*key, v.clone()),
                None => {
                    inner.styles.remove(*key);
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
struct ActiveTransition {
    kind: TransitionKind,
    patch: SlotPatch,
    started_ms: f64,
    finalize_at_ms: f64,
    saved: SavedStyles,
}

/// Orchestrates layered slot transitions with guaranteed cleanup.
#[derive(Debug)]
pub struct TransitionEngine {
    motion: MotionPreference,
    active: BTreeMap<String, ActiveTransition>,
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new(MotionPreference::Full)
    }
}

impl TransitionEngine {
    /// Engine with the given motion preference.
    pub fn new(motion: MotionPreference) -> Self {
        Self {
            motion,
            active: BTreeMap::new(),
        }
    }

    /// Whether a transition is currently in flight for the slot.
    pub fn is_transitioning(&self, slot_id: &str) -> bool {
        self.active.contains_key(slot_id)
    }

    /// Apply a patch to a slot, animating per `transition`.
    ///
    /// Falls back to the direct patch for `none`/`appear`/zero duration, for
    /// reduced motion, and for outers that lack a slot id. A patch on a slot
    /// with a transition already in flight finalizes the old one first:
    /// latest patch wins, transitions never queue.
    pub fn apply(
        &mut self,
        outer: &mut SlotNode,
        patch: SlotPatch,
        transition: &TransitionKind,
        now_ms: f64,
        measured: Option<Size>,
    ) {
        let inner_idx = ensure_inner_wrapper(outer);

        let Some(slot_id) = outer.attr(SLOT_ID_ATTR).map(str::to_string) else {
            apply_content(&mut outer.children[inner_idx], &patch);
            return;
        };

        if self.motion == MotionPreference::Reduced || transition.is_instant() {
            self.finalize_slot(&slot_id, outer);
            let inner_idx = ensure_inner_wrapper(outer);
            apply_content(&mut outer.children[inner_idx], &patch);
            return;
        }

        // Supersede any in-flight transition before starting a new one.
        self.finalize_slot(&slot_id, outer);
        let inner_idx = ensure_inner_wrapper(outer);
        let inner = &mut outer.children[inner_idx];

        let saved = SavedStyles::capture(inner);
        inner.set_style("position", "relative");
        inner.set_style("overflow", "hidden");
        if let Some(size) = measured {
            // Freeze the box so surrounding layout cannot shift mid-swap.
            inner.set_style("min-width", format!("{}px", fmt_px(size.width)));
            inner.set_style("min-height", format!("{}px", fmt_px(size.height)));
        }

        let mut from_layer = SlotNode::new(inner.tag.clone()).with_attr(SLOT_LAYER_ATTR, "from");
        from_layer.text = std::mem::take(&mut inner.text);
        from_layer.children = std::mem::take(&mut inner.children);
        from_layer.set_style("position", "relative");

        let mut to_layer = SlotNode::new(inner.tag.clone()).with_attr(SLOT_LAYER_ATTR, "to");
        apply_content(&mut to_layer, &patch);
        to_layer.set_style("position", "absolute");
        to_layer.set_style("inset", "0");

        inner.children.push(from_layer);
        inner.children.push(to_layer);

        let duration = transition.duration_ms();
        let entry = ActiveTransition {
            kind: transition.clone(),
            patch,
            started_ms: now_ms,
            finalize_at_ms: now_ms + duration + FINALIZE_SLACK_MS,
            saved,
        };
        self.style_layers(&entry, &mut outer.children[inner_idx], now_ms);
        self.active.insert(slot_id, entry);
    }

    /// Advance one slot's in-flight transition to `now_ms`: write the eased
    /// layer styles, and finalize once the deadline has passed.
    pub fn advance(&mut self, outer: &mut SlotNode, now_ms: f64) {
        let Some(slot_id) = outer.attr(SLOT_ID_ATTR).map(str::to_string) else {
            return;
        };
        let Some(entry) = self.active.get(&slot_id) else {
            return;
        };

        if now_ms >= entry.finalize_at_ms {
            tracing::trace!(slot_id = %slot_id, "transition finalize");
            self.finalize_slot(&slot_id, outer);
            return;
        }

        let entry = entry.clone();
        let inner_idx = ensure_inner_wrapper(outer);
        self.style_layers(&entry, &mut outer.children[inner_idx], now_ms);
    }

    /// Force-complete the slot's in-flight transition, if any: tear down the
    /// layers, restore saved styles exactly, apply the pending patch.
    pub fn finalize_slot(&mut self, slot_id: &str, outer: &mut SlotNode) {
        let Some(entry) = self.active.remove(slot_id) else {
            return;
        };
        let inner_idx = ensure_inner_wrapper(outer);
        let inner = &mut outer.children[inner_idx];
        clear_transition_layers(inner);
        entry.saved.restore(inner);
        apply_content(inner, &entry.patch);
    }

    fn style_layers(&self, entry: &ActiveTransition, inner: &mut SlotNode, now_ms: f64) {
        let duration = entry.kind.duration_ms();
        let linear = if duration > 0.0 {
            ((now_ms - entry.started_ms) / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let (from_styles, to_styles) = layer_styles(&entry.kind, linear);
        for child in &mut inner.children {
            match child.attr(SLOT_LAYER_ATTR) {
                Some("from") => {
                    for (k, v) in &from_styles {
                        child.set_style(*k, v.clone());
                    }
                }
                Some("to") => {
                    for (k, v) in &to_styles {
                        child.set_style(*k, v.clone());
                    }
                }
                _ => {}
            }
        }
    }
}

/// Remove transition layer children, leaving the inner empty for the final
/// content. Safe to call redundantly.
pub fn clear_transition_layers(inner: &mut SlotNode) {
    inner
        .children
        .retain(|c| !c.attrs.contains_key(SLOT_LAYER_ATTR));
}

/// Styles for the `from`/`to` layers at linear progress `t`.
fn layer_styles(kind: &TransitionKind, t: f64) -> (Vec<(&'static str, String)>, Vec<(&'static str, String)>) {
    match kind {
        TransitionKind::None | TransitionKind::Appear => (Vec::new(), Vec::new()),
        TransitionKind::Fade { ease, .. } => {
            let p = ease.apply(t);
            (
                vec![("opacity", fmt_unit(1.0 - p))],
                vec![("opacity", fmt_unit(p))],
            )
        }
        TransitionKind::Wipe { dir, ease, .. } => {
            let p = ease.apply(t);
            let remaining = (1.0 - p) * 100.0;
            let inset = match dir {
                WipeDir::Left => format!("inset(0 {}% 0 0)", fmt_pct(remaining)),
                WipeDir::Right => format!("inset(0 0 0 {}%)", fmt_pct(remaining)),
                WipeDir::Up => format!("inset(0 0 {}% 0)", fmt_pct(remaining)),
                WipeDir::Down => format!("inset({}% 0 0 0)", fmt_pct(remaining)),
            };
            (Vec::new(), vec![("clip-path", inset), ("opacity", fmt_unit(1.0))])
        }
        TransitionKind::Flash { .. } => {
            // Dip the old content to transparent, then raise the new one.
            let p = Ease::InOut.apply(t);
            let from = (1.0 - 2.0 * p).max(0.0);
            let to = (2.0 * p - 1.0).max(0.0);
            (
                vec![("opacity", fmt_unit(from))],
                vec![("opacity", fmt_unit(to))],
            )
        }
    }
}

fn fmt_unit(v: f64) -> String {
    format!("{:.4}", v.clamp(0.0, 1.0))
}

fn fmt_pct(v: f64) -> String {
    format!("{:.3}", v.clamp(0.0, 100.0))
}

fn fmt_px(v: f64) -> String {
    format!("{:.2}", v.max(0.0))
}
