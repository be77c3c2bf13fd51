//! Bucket and event-index evaluation.
//!
//! A bucket is a coarse discretization of time/docstep; the event index is
//! the count of times a policy actually fired. For the deterministic policies
//! they coincide. For poisson/chance every bucket runs an independent
//! Bernoulli trial seeded by `(seed, slot_id, bucket)`, so establishing the
//! event index conceptually replays every bucket since zero; the scan is
//! capped at [`EVENT_SCAN_CAP`] buckets and cap exhaustion is a valid
//! "no further event" result, not an error.

use crate::foundation::math::{SALT_TRIAL, unit_float};
use crate::policy::model::{ChanceCadence, RefreshPolicy, TimeSpan};
use crate::slot::model::RuntimeInputs;

/// Fixed bucket granularity for the poisson refresh policy.
// Tunable in principle; kept fixed so stored seeds replay identically.
pub const POISSON_BUCKET_SECS: f64 = 0.25;

/// Hard cap on probabilistic bucket scans.
///
/// Known limitation: a very low poisson rate can exhaust the cap without a
/// hit, which reads as "no further event" within the observable horizon.
pub const EVENT_SCAN_CAP: i64 = 10_000;

/// A scheduled future firing, with the runtime cursor advanced to it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotEvent {
    /// Bucket in which the firing occurs.
    pub bucket: i64,
    /// Event index after the firing.
    pub event_index: i64,
    /// Runtime inputs at the moment of the firing.
    pub runtime: RuntimeInputs,
}

/// Current bucket for a policy at the given runtime inputs.
///
/// Monotonically non-decreasing as `time_sec`/`docstep` advance. `every` can
/// sit at a negative bucket before its phase offset has elapsed.
pub fn refresh_bucket(policy: &RefreshPolicy, runtime: &RuntimeInputs) -> i64 {
    match policy {
        RefreshPolicy::Never => 0,
        RefreshPolicy::Docstep => runtime.docstep as i64,
        RefreshPolicy::Every { period, phase } => {
            let p = period.secs();
            if !(p > 0.0) {
                return 0;
            }
            let ph = phase.map_or(0.0, TimeSpan::secs);
            ((runtime.time_sec - ph) / p).floor() as i64
        }
        RefreshPolicy::At { at } => i64::from(runtime.time_sec >= at.secs()),
        RefreshPolicy::AtEach { times } => {
            let times = sorted_secs(times);
            times.iter().filter(|&&t| t <= runtime.time_sec).count() as i64
        }
        RefreshPolicy::Poisson { .. } => (runtime.time_sec / POISSON_BUCKET_SECS).floor() as i64,
        RefreshPolicy::Chance { cadence, .. } => match cadence {
            ChanceCadence::Docstep => runtime.docstep as i64,
            ChanceCadence::Every { period } => {
                let p = period.secs();
                if !(p > 0.0) {
                    return 0;
                }
                (runtime.time_sec / p).floor() as i64
            }
        },
    }
}

/// Per-bucket firing probability, or `None` for deterministic policies.
fn bucket_fire_probability(policy: &RefreshPolicy) -> Option<f64> {
    match policy {
        RefreshPolicy::Poisson { rate_per_sec } => {
            let rate = if rate_per_sec.is_finite() {
                rate_per_sec.max(0.0)
            } else {
                0.0
            };
            Some(1.0 - (-rate * POISSON_BUCKET_SECS).exp())
        }
        RefreshPolicy::Chance { p, .. } => {
            let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
            Some(p)
        }
        _ => None,
    }
}

/// Bernoulli trial for one bucket of a probabilistic policy.
pub(crate) fn bucket_fires(policy: &RefreshPolicy, seed: u32, slot_id: &str, bucket: i64) -> bool {
    let Some(p) = bucket_fire_probability(policy) else {
        // Every bucket transition of a deterministic policy is a firing.
        return true;
    };
    unit_float(seed, slot_id, bucket, SALT_TRIAL) < p
}

/// Event index (count of firings) at the given runtime inputs.
pub fn event_index_for_runtime(policy: &RefreshPolicy, runtime: &RuntimeInputs, slot_id: &str) -> i64 {
    let bucket = refresh_bucket(policy, runtime);
    if !policy.is_probabilistic() {
        return bucket;
    }
    count_firings(policy, runtime.seed, slot_id, 0, bucket)
}

/// Count firing buckets in `[from, to]`, scanning at most [`EVENT_SCAN_CAP`]
/// buckets.
pub(crate) fn count_firings(
    policy: &RefreshPolicy,
    seed: u32,
    slot_id: &str,
    from: i64,
    to: i64,
) -> i64 {
    let mut count = 0;
    let mut scanned = 0i64;
    let mut b = from;
    while b <= to && scanned < EVENT_SCAN_CAP {
        if bucket_fires(policy, seed, slot_id, b) {
            count += 1;
        }
        b += 1;
        scanned += 1;
    }
    if b <= to {
        tracing::debug!(slot_id, from, to, "bucket scan truncated at cap");
    }
    count
}

/// Next firing strictly after the given runtime inputs, or `None` when the
/// policy guarantees (or the capped scan concludes) there is none.
pub fn next_slot_event(
    policy: &RefreshPolicy,
    runtime: &RuntimeInputs,
    slot_id: &str,
) -> Option<SlotEvent> {
    match policy {
        RefreshPolicy::Never => None,
        RefreshPolicy::Docstep => {
            let step = runtime.docstep + 1;
            Some(SlotEvent {
                bucket: step as i64,
                event_index: step as i64,
                runtime: RuntimeInputs {
                    docstep: step,
                    ..*runtime
                },
            })
        }
        RefreshPolicy::Every { period, phase } => {
            let p = period.secs();
            if !(p > 0.0) {
                return None;
            }
            let ph = phase.map_or(0.0, TimeSpan::secs);
            let b = refresh_bucket(policy, runtime) + 1;
            let t = time_for_bucket(ph, p, b);
            Some(SlotEvent {
                bucket: b,
                event_index: b,
                runtime: RuntimeInputs {
                    time_sec: t,
                    ..*runtime
                },
            })
        }
        RefreshPolicy::At { at } => {
            let t = at.secs();
            if runtime.time_sec >= t {
                return None;
            }
            Some(SlotEvent {
                bucket: 1,
                event_index: 1,
                runtime: RuntimeInputs {
                    time_sec: t,
                    ..*runtime
                },
            })
        }
        RefreshPolicy::AtEach { times } => {
            let times = sorted_secs(times);
            let idx = times.iter().position(|&t| t > runtime.time_sec)?;
            Some(SlotEvent {
                bucket: idx as i64 + 1,
                event_index: idx as i64 + 1,
                runtime: RuntimeInputs {
                    time_sec: times[idx],
                    ..*runtime
                },
            })
        }
        RefreshPolicy::Poisson { .. } => next_probabilistic_event(policy, runtime, slot_id, |b| {
            RuntimeInputs {
                time_sec: time_for_bucket(0.0, POISSON_BUCKET_SECS, b),
                ..*runtime
            }
        }),
        RefreshPolicy::Chance { cadence, .. } => match cadence {
            ChanceCadence::Docstep => next_probabilistic_event(policy, runtime, slot_id, |b| {
                RuntimeInputs {
                    docstep: b.max(0) as u64,
                    ..*runtime
                }
            }),
            ChanceCadence::Every { period } => {
                let p = period.secs();
                if !(p > 0.0) {
                    return None;
                }
                next_probabilistic_event(policy, runtime, slot_id, |b| RuntimeInputs {
                    time_sec: time_for_bucket(0.0, p, b),
                    ..*runtime
                })
            }
        },
    }
}

/// Scan future buckets of a probabilistic policy for the next firing.
fn next_probabilistic_event(
    policy: &RefreshPolicy,
    runtime: &RuntimeInputs,
    slot_id: &str,
    runtime_at: impl Fn(i64) -> RuntimeInputs,
) -> Option<SlotEvent> {
    let current = refresh_bucket(policy, runtime);
    let index = event_index_for_runtime(policy, runtime, slot_id);
    for b in (current + 1)..=(current + EVENT_SCAN_CAP) {
        if bucket_fires(policy, runtime.seed, slot_id, b) {
            return Some(SlotEvent {
                bucket: b,
                event_index: index + 1,
                runtime: runtime_at(b),
            });
        }
    }
    tracing::debug!(slot_id, current, "no firing within scan cap");
    None
}

/// Earliest time whose bucket is `b` for a `phase + b * period` grid.
///
/// `phase + b * period` can round below the bucket boundary; nudge upward
/// until the bucket arithmetic agrees.
fn time_for_bucket(phase: f64, period: f64, b: i64) -> f64 {
    let mut t = phase + (b as f64) * period;
    while (((t - phase) / period).floor() as i64) < b {
        t = t.next_up();
    }
    t
}

fn sorted_secs(times: &[TimeSpan]) -> Vec<f64> {
    let mut out: Vec<f64> = times.iter().map(|t| t.secs()).collect();
    out.sort_by(f64::total_cmp);
    out
}
