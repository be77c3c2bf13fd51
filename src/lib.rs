//! Fluxslot is the slot runtime simulator behind the Flux guided editor.
//!
//! A slot is a layout-reserved region of a document whose content changes
//! over time without disturbing surrounding layout. Fluxslot computes,
//! previews, and deterministically replays how a slot evolves under its
//! declared refresh policy, and maps that discrete event timeline onto
//! patching of a slot subtree with animated transitions.
//!
//! # Pipeline overview
//!
//! 1. **Parse**: policy/transition text (`every(1.2s, 0.4s)`, `fade(220ms, inOut)`)
//!    into canonical sum types ([`parse_refresh_policy`], [`parse_transition`])
//! 2. **Schedule**: `RefreshPolicy + RuntimeInputs -> bucket / event index / next event`
//!    ([`refresh_bucket`], [`event_index_for_runtime`], [`next_slot_event`])
//! 3. **Resolve**: `GeneratorSpec + event index -> SlotValue`
//!    ([`resolve_slot_value_for_index`])
//! 4. **Advance**: incremental per-tick playback with change detection
//!    ([`advance_slot_playback_state`])
//! 5. **Patch**: apply resolved values to the slot subtree, animated per the
//!    transition spec ([`TransitionEngine`])
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: resolution and scheduling are pure
//!   functions of `(seed, slot id, event index)`; identical inputs replay
//!   bit-identically across platforms and restarts.
//! - **Incremental-by-design**: the playback state machine is safe to call on
//!   every animation frame; the deterministic no-change path is O(1).
//! - **No IO**: the simulator never blocks and never touches a clock; the
//!   host supplies time, docstep, and seed explicitly.
#![forbid(unsafe_code)]

mod foundation;
mod patch;
mod playback;
mod policy;
mod schedule;
mod slot;

pub use foundation::error::{FluxError, FluxResult};
pub use patch::engine::{
    FINALIZE_SLACK_MS, MotionPreference, TransitionEngine, clear_transition_layers,
};
pub use patch::render::render_html;
pub use patch::tree::{
    SLOT_ID_ATTR, SLOT_INNER_ATTR, SLOT_LAYER_ATTR, SlotNode, SlotPatch, apply_content,
    ensure_inner_wrapper, inner_wrapper_count, normalize_inline_slot_outer,
};
pub use playback::state::{PlaybackAdvance, SlotPlaybackState, advance_slot_playback_state};
pub use policy::model::{
    ChanceCadence, Ease, RefreshPolicy, TimeSpan, TimeUnit, TransitionKind, WipeDir,
};
pub use policy::text::{
    format_refresh_policy, format_time_span, format_transition, parse_refresh_policy,
    parse_time_span, parse_transition,
};
pub use schedule::scheduler::{
    EVENT_SCAN_CAP, POISSON_BUCKET_SECS, SlotEvent, event_index_for_runtime, next_slot_event,
    refresh_bucket,
};
pub use schedule::simulate::{SimulatedChange, simulate_slot_changes};
pub use slot::fingerprint::hash_slot_value;
pub use slot::model::{AssetItem, GeneratorSpec, RuntimeInputs, SlotValue};
pub use slot::resolve::resolve_slot_value_for_index;
