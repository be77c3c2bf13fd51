use crate::policy::model::TimeSpan;

/// The only external state the resolver and scheduler depend on. Identical
/// inputs always yield identical outputs; there are no hidden clocks.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeInputs {
    /// Determinism seed for the slot's pseudo-random stream.
    pub seed: u32,
    /// Wallclock time in seconds, `>= 0`.
    pub time_sec: f64,
    /// Externally driven document step counter.
    pub docstep: u64,
}

impl RuntimeInputs {
    /// Build runtime inputs, coalescing NaN/negative time to 0.
    pub fn new(seed: u32, time_sec: f64, docstep: u64) -> Self {
        let time_sec = if time_sec.is_finite() {
            time_sec.max(0.0)
        } else {
            0.0
        };
        Self {
            seed,
            time_sec,
            docstep,
        }
    }
}

/// What value a slot takes at a given event index.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GeneratorSpec {
    /// Fixed text.
    Literal {
        /// The text.
        text: String,
    },
    /// Seeded uniform pick among the listed values.
    Choose {
        /// Candidate values.
        values: Vec<String>,
    },
    /// Deterministic round-robin by event index; no randomness.
    Cycle {
        /// Values cycled through.
        values: Vec<String>,
        /// Events each value is held for (default 1).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        period: Option<u64>,
    },
    /// Seeded pick among assets filtered by tag/bank membership.
    AssetsPick {
        /// Every listed tag must be present on a candidate.
        tags: Vec<String>,
        /// Candidates must belong to this bank when given.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bank: Option<String>,
    },
    /// Binary "event"/"—" text indicator. Distinct from the refresh-policy
    /// poisson semantics.
    Poisson {
        /// Nominal events per second.
        rate_per_sec: f64,
    },
    /// Scheduled values: the nth firing takes the nth value (clamped to the
    /// last one).
    At {
        /// Schedule times (informational; firing is the refresh policy's job).
        times: Vec<TimeSpan>,
        /// Values taken in order.
        values: Vec<String>,
    },
    /// Tick counter: renders the event index itself.
    Every,
}

/// A resolved slot value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SlotValue {
    /// Plain text content.
    Text {
        /// The text.
        text: String,
    },
    /// A picked asset, or none when no candidate matched.
    Asset {
        /// The picked asset, if any.
        asset: Option<AssetItem>,
        /// Display label (asset name, or empty when unmatched).
        label: String,
    },
}

impl SlotValue {
    /// Empty-text value, used for absent/unknown generator specs.
    pub fn empty_text() -> Self {
        Self::Text {
            text: String::new(),
        }
    }

    /// Text value.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// An asset supplied by the host document store; read-only to this crate.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetItem {
    /// Stable asset identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Asset kind tag (e.g. `image`).
    pub kind: String,
    /// Source path or URL.
    pub path: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Bank the asset belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
}
