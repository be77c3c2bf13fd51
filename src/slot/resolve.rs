//! Deterministic value resolution.
//!
//! `resolve_slot_value_for_index` is a pure function of `(spec, seed, slot_id,
//! event_index, assets)`: repeated calls in any order give bit-identical
//! results, with no memoization visible to the caller.

use crate::foundation::math::unit_float;
use crate::slot::model::{AssetItem, GeneratorSpec, SlotValue};

/// Text shown by the poisson generator when a bucket does not fire.
const POISSON_QUIET_TEXT: &str = "—";

/// Resolve the slot's value for one event index.
pub fn resolve_slot_value_for_index(
    spec: &GeneratorSpec,
    seed: u32,
    slot_id: &str,
    event_index: i64,
    assets: &[AssetItem],
) -> SlotValue {
    match spec {
        GeneratorSpec::Literal { text } => SlotValue::text(text.clone()),
        GeneratorSpec::Choose { values } => {
            if values.is_empty() {
                return SlotValue::empty_text();
            }
            let f = unit_float(seed, slot_id, event_index, 0);
            let idx = pick_index(f, values.len());
            SlotValue::text(values[idx].clone())
        }
        GeneratorSpec::Cycle { values, period } => {
            if values.is_empty() {
                return SlotValue::empty_text();
            }
            let period = period.unwrap_or(1).max(1) as i64;
            let step = event_index.div_euclid(period);
            let idx = step.rem_euclid(values.len() as i64) as usize;
            SlotValue::text(values[idx].clone())
        }
        GeneratorSpec::AssetsPick { tags, bank } => {
            let candidates: Vec<&AssetItem> = assets
                .iter()
                .filter(|a| {
                    tags.iter().all(|t| a.tags.contains(t))
                        && bank
                            .as_ref()
                            .is_none_or(|b| a.bank_name.as_deref() == Some(b.as_str()))
                })
                .collect();
            if candidates.is_empty() {
                return SlotValue::Asset {
                    asset: None,
                    label: String::new(),
                };
            }
            let f = unit_float(seed, slot_id, event_index, 0);
            let idx = pick_index(f, candidates.len());
            let picked = candidates[idx];
            SlotValue::Asset {
                asset: Some(picked.clone()),
                label: picked.name.clone(),
            }
        }
        GeneratorSpec::Poisson { rate_per_sec } => {
            let rate = rate_per_sec.max(0.0);
            let rate = if rate.is_finite() { rate } else { 0.0 };
            let p = (rate / 2.0).min(1.0);
            let f = unit_float(seed, slot_id, event_index, 0);
            if f < p {
                SlotValue::text("event")
            } else {
                SlotValue::text(POISSON_QUIET_TEXT)
            }
        }
        GeneratorSpec::At { values, .. } => {
            if values.is_empty() {
                return SlotValue::empty_text();
            }
            let idx = event_index.clamp(0, values.len() as i64 - 1) as usize;
            SlotValue::text(values[idx].clone())
        }
        GeneratorSpec::Every => SlotValue::text(event_index.max(0).to_string()),
    }
}

/// Map a unit-interval float onto a list index, clamped to the last element.
fn pick_index(f: f64, len: usize) -> usize {
    ((f * len as f64) as usize).min(len - 1)
}
