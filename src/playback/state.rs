//! Incremental playback: the per-tick entry point.
//!
//! `advance_slot_playback_state` is designed to be called on every animation frame or polling
//! tick. The deterministic fast path is O(1); the probabilistic path only
//! scans the bucket delta since the previous state (capped), which is why the
//! incremental form exists at all: recomputing from time zero each tick
//! would grow unboundedly with playback duration.

use crate::policy::model::RefreshPolicy;
use crate::schedule::scheduler::{
    EVENT_SCAN_CAP, bucket_fires, event_index_for_runtime, refresh_bucket,
};
use crate::slot::fingerprint::hash_slot_value;
use crate::slot::model::{AssetItem, GeneratorSpec, RuntimeInputs, SlotValue};
use crate::slot::resolve::resolve_slot_value_for_index;

/// Minimal state carried between incremental advances.
///
/// Owned by the UI component driving one slot's preview; recreated fresh
/// whenever the slot identity or spec changes, and never shared across slots
/// (the stream is seeded by the slot identity string precisely to avoid
/// cross-slot correlation).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotPlaybackState {
    /// Bucket the state was last advanced to.
    pub bucket: i64,
    /// Count of firings up to `bucket`.
    pub event_index: i64,
    /// Value visible at `event_index`.
    pub value: SlotValue,
    /// Fingerprint of `value`, used for change detection.
    pub hash: String,
}

/// Result of one incremental advance.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackAdvance {
    /// Next playback state.
    pub state: SlotPlaybackState,
    /// Whether the visible value changed (hash differs, or first paint).
    pub changed: bool,
}

/// Advance one slot's playback state to the given runtime inputs.
#[tracing::instrument(skip(prev, spec, policy, assets))]
pub fn advance_slot_playback_state(
    prev: Option<&SlotPlaybackState>,
    spec: Option<&GeneratorSpec>,
    policy: &RefreshPolicy,
    runtime: &RuntimeInputs,
    slot_id: &str,
    assets: &[AssetItem],
) -> PlaybackAdvance {
    let Some(spec) = spec else {
        // No generator: the slot renders empty text. Still report a change on
        // the first paint or when the previous value was something else.
        let value = SlotValue::empty_text();
        let hash = hash_slot_value(&value);
        let changed = prev.is_none_or(|p| p.hash != hash);
        return PlaybackAdvance {
            state: SlotPlaybackState {
                bucket: refresh_bucket(policy, runtime),
                event_index: 0,
                value,
                hash,
            },
            changed,
        };
    };

    let bucket = refresh_bucket(policy, runtime);

    let Some(prev) = prev else {
        let event_index = event_index_for_runtime(policy, runtime, slot_id);
        let value = resolve_slot_value_for_index(spec, runtime.seed, slot_id, event_index, assets);
        let hash = hash_slot_value(&value);
        return PlaybackAdvance {
            state: SlotPlaybackState {
                bucket,
                event_index,
                value,
                hash,
            },
            changed: true,
        };
    };

    if bucket <= prev.bucket {
        // No new bucket: nothing can have fired. Cheap per-frame no-op.
        return PlaybackAdvance {
            state: prev.clone(),
            changed: false,
        };
    }

    let event_index = if policy.is_probabilistic() {
        prev.event_index + count_firings_capped(policy, runtime.seed, slot_id, prev.bucket + 1, bucket)
    } else {
        bucket
    };

    if event_index == prev.event_index {
        // Bucket advanced but nothing fired; carry the bucket forward so the
        // next call scans only the new delta.
        return PlaybackAdvance {
            state: SlotPlaybackState {
                bucket,
                ..prev.clone()
            },
            changed: false,
        };
    }

    let value = resolve_slot_value_for_index(spec, runtime.seed, slot_id, event_index, assets);
    let hash = hash_slot_value(&value);
    let changed = hash != prev.hash;
    PlaybackAdvance {
        state: SlotPlaybackState {
            bucket,
            event_index,
            value,
            hash,
        },
        changed,
    }
}

fn count_firings_capped(
    policy: &RefreshPolicy,
    seed: u32,
    slot_id: &str,
    from: i64,
    to: i64,
) -> i64 {
    // Degenerate jumps (e.g. a scrubbed timeline) are bounded by the same cap
    // as the scheduler's scans.
    let from = from.max(to - EVENT_SCAN_CAP + 1);
    let mut fired = 0;
    for b in from..=to {
        if bucket_fires(policy, seed, slot_id, b) {
            fired += 1;
        }
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::model::{ChanceCadence, TimeSpan, TimeUnit};

    fn rt(time_sec: f64, docstep: u64) -> RuntimeInputs {
        RuntimeInputs::new(21, time_sec, docstep)
    }

    fn cycle_spec() -> GeneratorSpec {
        GeneratorSpec::Cycle {
            values: vec!["a".into(), "b".into()],
            period: None,
        }
    }

    #[test]
    fn first_advance_always_reports_change() {
        let adv = advance_slot_playback_state(
            None,
            Some(&cycle_spec()),
            &RefreshPolicy::Docstep,
            &rt(0.0, 0),
            "s",
            &[],
        );
        assert!(adv.changed);
        assert_eq!(adv.state.value, SlotValue::text("a"));
    }

    #[test]
    fn identical_runtime_is_a_no_change_fast_path() {
        let policy = RefreshPolicy::Every {
            period: TimeSpan::new(1.0, TimeUnit::S),
            phase: None,
        };
        let spec = cycle_spec();
        let first = advance_slot_playback_state(None, Some(&spec), &policy, &rt(0.5, 0), "s", &[]);
        let second = advance_slot_playback_state(
            Some(&first.state),
            Some(&spec),
            &policy,
            &rt(0.5, 0),
            "s",
            &[],
        );
        assert!(!second.changed);
        assert_eq!(second.state, first.state);
    }

    #[test]
    fn deterministic_advance_follows_the_bucket() {
        let spec = cycle_spec();
        let policy = RefreshPolicy::Docstep;
        let first = advance_slot_playback_state(None, Some(&spec), &policy, &rt(0.0, 0), "s", &[]);
        let second = advance_slot_playback_state(
            Some(&first.state),
            Some(&spec),
            &policy,
            &rt(0.0, 1),
            "s",
            &[],
        );
        assert!(second.changed);
        assert_eq!(second.state.bucket, 1);
        assert_eq!(second.state.event_index, 1);
        assert_eq!(second.state.value, SlotValue::text("b"));
    }

    #[test]
    fn incremental_advance_matches_from_scratch_evaluation() {
        let spec = GeneratorSpec::Choose {
            values: (0..10).map(|i| i.to_string()).collect(),
        };
        let policy = RefreshPolicy::Chance {
            p: 0.4,
            cadence: ChanceCadence::Docstep,
        };
        let mut state: Option<SlotPlaybackState> = None;
        for step in 0..50u64 {
            let runtime = rt(0.0, step);
            let adv = advance_slot_playback_state(state.as_ref(), Some(&spec), &policy, &runtime, "slot", &[]);
            let from_scratch = event_index_for_runtime(&policy, &runtime, "slot");
            assert_eq!(adv.state.event_index, from_scratch, "step {step}");
            state = Some(adv.state);
        }
    }

    #[test]
    fn probabilistic_non_firing_buckets_do_not_report_change() {
        let policy = RefreshPolicy::Poisson { rate_per_sec: 0.0 };
        let spec = cycle_spec();
        let first = advance_slot_playback_state(None, Some(&spec), &policy, &rt(0.0, 0), "s", &[]);
        let later = advance_slot_playback_state(
            Some(&first.state),
            Some(&spec),
            &policy,
            &rt(10.0, 0),
            "s",
            &[],
        );
        assert!(!later.changed);
        assert_eq!(later.state.event_index, first.state.event_index);
        // The bucket still moves forward so the next scan stays incremental.
        assert!(later.state.bucket > first.state.bucket);
    }

    #[test]
    fn missing_spec_renders_empty_text_once() {
        let first = advance_slot_playback_state(None, None, &RefreshPolicy::Docstep, &rt(0.0, 0), "s", &[]);
        assert!(first.changed);
        assert_eq!(first.state.value, SlotValue::empty_text());
        let second = advance_slot_playback_state(
            Some(&first.state),
            None,
            &RefreshPolicy::Docstep,
            &rt(0.0, 5),
            "s",
            &[],
        );
        assert!(!second.changed);
    }
}
