use crate::foundation::error::{FluxError, FluxResult};

/// Time unit accepted by the duration grammar (`ms`, `s`, `m`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Milliseconds.
    Ms,
    /// Seconds.
    S,
    /// Minutes.
    M,
}

impl TimeUnit {
    /// Multiplier converting an amount in this unit to seconds.
    pub fn factor_secs(self) -> f64 {
        match self {
            Self::Ms => 1e-3,
            Self::S => 1.0,
            Self::M => 60.0,
        }
    }

    /// Grammar suffix for this unit.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Ms => "ms",
            Self::S => "s",
            Self::M => "m",
        }
    }
}

/// A duration literal: amount plus unit (`1.2s`, `400ms`, `2m`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeSpan {
    /// Numeric amount in `unit`.
    pub amount: f64,
    /// Unit of `amount`.
    pub unit: TimeUnit,
}

impl TimeSpan {
    /// Build a span.
    pub fn new(amount: f64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    /// Span value in seconds. Non-finite amounts coalesce to 0 rather than
    /// propagating NaN through bucket arithmetic.
    pub fn secs(self) -> f64 {
        if !self.amount.is_finite() {
            return 0.0;
        }
        self.amount * self.unit.factor_secs()
    }

    /// Span value in milliseconds, computed without passing through seconds
    /// so millisecond literals stay exact.
    pub fn millis(self) -> f64 {
        if !self.amount.is_finite() {
            return 0.0;
        }
        match self.unit {
            TimeUnit::Ms => self.amount,
            TimeUnit::S => self.amount * 1e3,
            TimeUnit::M => self.amount * 60e3,
        }
    }
}

/// Cadence underlying a `chance(p, ...)` policy.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChanceCadence {
    /// One trial per docstep increment (the default).
    Docstep,
    /// One trial per elapsed period.
    Every {
        /// Trial period.
        period: TimeSpan,
    },
}

/// When a slot's value changes.
///
/// Every policy resolves to a monotonically non-decreasing bucket number as
/// time/docstep advance; for the probabilistic policies the event index (count
/// of actual firings) is itself monotone and never exceeds the bucket count.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RefreshPolicy {
    /// Value fixed after initial load.
    Never,
    /// Changes exactly once per integer docstep increment.
    Docstep,
    /// Periodic with optional phase offset.
    Every {
        /// Refresh period.
        period: TimeSpan,
        /// Optional phase offset delaying the first firing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase: Option<TimeSpan>,
    },
    /// Fires once when wallclock time passes the given moment.
    At {
        /// Firing time.
        at: TimeSpan,
    },
    /// Fires once per listed time. Times are sorted ascending at evaluation
    /// time, not at parse time.
    AtEach {
        /// Firing times.
        times: Vec<TimeSpan>,
    },
    /// Stochastic: each fixed-size time bucket independently fires with
    /// probability `1 - exp(-rate * bucket_secs)`.
    Poisson {
        /// Expected events per second.
        rate_per_sec: f64,
    },
    /// Each tick of the underlying cadence independently fires with
    /// probability `p`.
    Chance {
        /// Per-trial success probability, clamped to `[0, 1]` at evaluation.
        p: f64,
        /// Trial cadence (docstep when omitted in the textual form).
        #[serde(rename = "every")]
        cadence: ChanceCadence,
    },
}

impl RefreshPolicy {
    /// Whether firings are decided by per-bucket Bernoulli trials rather than
    /// every bucket transition.
    pub fn is_probabilistic(&self) -> bool {
        matches!(self, Self::Poisson { .. } | Self::Chance { .. })
    }

    /// Reject non-finite numeric fields. Evaluation additionally clamps
    /// rates/probabilities defensively, so a validated policy never produces
    /// NaN buckets.
    pub fn validate(&self) -> FluxResult<()> {
        match self {
            Self::Never | Self::Docstep => Ok(()),
            Self::Every { period, phase } => {
                require_finite("every period", period.amount)?;
                if let Some(phase) = phase {
                    require_finite("every phase", phase.amount)?;
                }
                Ok(())
            }
            Self::At { at } => require_finite("at time", at.amount),
            Self::AtEach { times } => {
                for t in times {
                    require_finite("atEach time", t.amount)?;
                }
                Ok(())
            }
            Self::Poisson { rate_per_sec } => require_finite("poisson rate", *rate_per_sec),
            Self::Chance { p, cadence } => {
                require_finite("chance p", *p)?;
                match cadence {
                    ChanceCadence::Docstep => Ok(()),
                    ChanceCadence::Every { period } => {
                        require_finite("chance period", period.amount)
                    }
                }
            }
        }
    }
}

fn require_finite(what: &str, v: f64) -> FluxResult<()> {
    if !v.is_finite() {
        return Err(FluxError::validation(format!("{what} must be finite")));
    }
    Ok(())
}

/// Easing curve applied to transition progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    /// Identity.
    Linear,
    /// Accelerate from rest.
    In,
    /// Decelerate to rest.
    Out,
    /// Accelerate then decelerate.
    InOut,
}

impl Ease {
    /// Apply the curve to `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::In => t * t,
            Self::Out => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
        }
    }
}

/// Direction the incoming content enters from during a wipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WipeDir {
    /// Reveal grows rightward from the left edge.
    Left,
    /// Reveal grows leftward from the right edge.
    Right,
    /// Reveal grows downward from the top edge.
    Up,
    /// Reveal grows upward from the bottom edge.
    Down,
}

/// How the DOM animates between successive slot values.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransitionKind {
    /// Immediate swap, no animation.
    None,
    /// Immediate swap; semantically an instant "appear".
    Appear,
    /// Cross-opacity between old and new content.
    Fade {
        /// Animation duration in milliseconds.
        duration_ms: f64,
        /// Easing curve.
        ease: Ease,
    },
    /// New content slides in behind a moving clip edge.
    Wipe {
        /// Edge the new content enters from.
        dir: WipeDir,
        /// Animation duration in milliseconds.
        duration_ms: f64,
        /// Easing curve.
        ease: Ease,
    },
    /// Opacity dip then rise across the swap.
    Flash {
        /// Animation duration in milliseconds.
        duration_ms: f64,
    },
}

impl TransitionKind {
    /// Animation duration in milliseconds; 0 for the instant kinds.
    pub fn duration_ms(&self) -> f64 {
        match self {
            Self::None | Self::Appear => 0.0,
            Self::Fade { duration_ms, .. }
            | Self::Wipe { duration_ms, .. }
            | Self::Flash { duration_ms } => *duration_ms,
        }
    }

    /// Whether applying this transition reduces to a direct patch.
    pub fn is_instant(&self) -> bool {
        !(self.duration_ms() > 0.0)
    }

    /// Reject non-finite or negative durations.
    pub fn validate(&self) -> FluxResult<()> {
        let d = self.duration_ms();
        if !d.is_finite() || d < 0.0 {
            return Err(FluxError::validation(
                "transition duration must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_span_secs_by_unit() {
        assert_eq!(TimeSpan::new(250.0, TimeUnit::Ms).secs(), 0.25);
        assert_eq!(TimeSpan::new(1.5, TimeUnit::S).secs(), 1.5);
        assert_eq!(TimeSpan::new(2.0, TimeUnit::M).secs(), 120.0);
    }

    #[test]
    fn time_span_millis_stay_exact() {
        assert_eq!(TimeSpan::new(220.0, TimeUnit::Ms).millis(), 220.0);
        assert_eq!(TimeSpan::new(1.5, TimeUnit::S).millis(), 1500.0);
        assert_eq!(TimeSpan::new(1.0, TimeUnit::M).millis(), 60_000.0);
    }

    #[test]
    fn non_finite_span_coalesces_to_zero() {
        assert_eq!(TimeSpan::new(f64::NAN, TimeUnit::S).secs(), 0.0);
        assert_eq!(TimeSpan::new(f64::INFINITY, TimeUnit::Ms).secs(), 0.0);
    }

    #[test]
    fn validate_rejects_non_finite_fields() {
        assert!(
            RefreshPolicy::Poisson {
                rate_per_sec: f64::NAN
            }
            .validate()
            .is_err()
        );
        assert!(
            RefreshPolicy::Every {
                period: TimeSpan::new(f64::INFINITY, TimeUnit::S),
                phase: None,
            }
            .validate()
            .is_err()
        );
        assert!(RefreshPolicy::Docstep.validate().is_ok());
    }

    #[test]
    fn ease_endpoints_are_fixed() {
        for ease in [Ease::Linear, Ease::In, Ease::Out, Ease::InOut] {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
            assert_eq!(ease.apply(-1.0), 0.0);
            assert_eq!(ease.apply(2.0), 1.0);
        }
    }

    #[test]
    fn instant_kinds_have_zero_duration() {
        assert!(TransitionKind::None.is_instant());
        assert!(TransitionKind::Appear.is_instant());
        assert!(
            TransitionKind::Fade {
                duration_ms: 0.0,
                ease: Ease::Linear
            }
            .is_instant()
        );
        assert!(
            !TransitionKind::Flash { duration_ms: 120.0 }.is_instant()
        );
    }

    #[test]
    fn probabilistic_discrimination() {
        assert!(RefreshPolicy::Poisson { rate_per_sec: 1.0 }.is_probabilistic());
        assert!(
            RefreshPolicy::Chance {
                p: 0.5,
                cadence: ChanceCadence::Docstep
            }
            .is_probabilistic()
        );
        assert!(!RefreshPolicy::Docstep.is_probabilistic());
        assert!(!RefreshPolicy::Never.is_probabilistic());
    }
}
