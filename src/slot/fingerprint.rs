//! Change-detection fingerprints for slot values.
//!
//! The hash is a cheap, stable fingerprint used to decide whether a resolved
//! value differs from the previously painted one. It is not a security-grade
//! digest; an (extremely rare) collision reads as "unchanged" and is accepted
//! as a reliability trade-off.

use crate::foundation::math::Fnv1a64;
use crate::slot::model::SlotValue;

/// Stable hex fingerprint of a slot value.
pub fn hash_slot_value(value: &SlotValue) -> String {
    let mut h = Fnv1a64::new_default();
    match value {
        SlotValue::Text { text } => {
            h.write_u8(0);
            h.write_str(text);
        }
        SlotValue::Asset { asset, label } => {
            h.write_u8(1);
            h.write_str(label);
            match asset {
                None => h.write_u8(0),
                Some(a) => {
                    h.write_u8(1);
                    h.write_str(&a.id);
                    h.write_str(&a.path);
                }
            }
        }
    }
    format!("{:016x}", mix64(h.finish()))
}

/// SplitMix64 finalizer.
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
