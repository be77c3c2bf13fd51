//! Forward simulation: "preview the next N changes".

use crate::policy::model::RefreshPolicy;
use crate::schedule::scheduler::next_slot_event;
use crate::slot::fingerprint::hash_slot_value;
use crate::slot::model::{AssetItem, GeneratorSpec, RuntimeInputs, SlotValue};
use crate::slot::resolve::resolve_slot_value_for_index;

/// One upcoming slot change discovered by [`simulate_slot_changes`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulatedChange {
    /// Runtime inputs at the moment of the change.
    pub runtime: RuntimeInputs,
    /// Bucket in which the change occurs.
    pub bucket: i64,
    /// Event index after the change.
    pub event_index: i64,
    /// Resolved value at that event index.
    pub value: SlotValue,
    /// Change-detection fingerprint of `value`.
    pub hash: String,
}

/// List the next `count` changes for a slot, advancing a local cursor copy to
/// each discovered event. Side-effect free: the caller's runtime inputs are
/// never mutated, and identical arguments yield deeply equal results.
///
/// The list is shorter than `count` when the policy stops firing within the
/// observable horizon (`never`, a spent `at`/`atEach`, or a probabilistic
/// scan that exhausts its cap).
#[tracing::instrument(skip(spec, policy, assets))]
pub fn simulate_slot_changes(
    spec: &GeneratorSpec,
    policy: &RefreshPolicy,
    runtime: &RuntimeInputs,
    slot_id: &str,
    assets: &[AssetItem],
    count: usize,
) -> Vec<SimulatedChange> {
    let mut cursor = *runtime;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(ev) = next_slot_event(policy, &cursor, slot_id) else {
            break;
        };
        let value = resolve_slot_value_for_index(spec, cursor.seed, slot_id, ev.event_index, assets);
        let hash = hash_slot_value(&value);
        out.push(SimulatedChange {
            runtime: ev.runtime,
            bucket: ev.bucket,
            event_index: ev.event_index,
            value,
            hash,
        });
        cursor = ev.runtime;
    }
    out
}
