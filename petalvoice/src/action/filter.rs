use crate::device::FilterKind;
use crate::error::{PetalVoiceError, Result};
use std::ops::RangeInclusive;

pub const CUTOFF_RANGE: RangeInclusive<f32> = 10.0..=22000.0;
pub const RESONANCE_RANGE: RangeInclusive<f32> = 1.0..=10.0;

/// Parameters of a `HighPassFilter` or `LowPassFilter` action.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterParams {
    pub cutoff_frequency: f32,
    pub resonance_q: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            cutoff_frequency: 5000.0,
            resonance_q: 1.0,
        }
    }
}

impl FilterParams {
    pub fn new(cutoff_frequency: f32, resonance_q: f32) -> Self {
        Self {
            cutoff_frequency,
            resonance_q,
        }
    }

    /// Rejects cutoffs outside 10 Hz..=22 kHz and resonance outside 1..=10.
    pub fn validate(&self, kind: FilterKind) -> Result<()> {
        let action = match kind {
            FilterKind::HighPass => "HighPassFilter",
            FilterKind::LowPass => "LowPassFilter",
        };
        if !CUTOFF_RANGE.contains(&self.cutoff_frequency) {
            return Err(PetalVoiceError::malformed(
                action,
                format!(
                    "cutoff {} Hz is outside {:?}",
                    self.cutoff_frequency, CUTOFF_RANGE
                ),
            ));
        }
        if !RESONANCE_RANGE.contains(&self.resonance_q) {
            return Err(PetalVoiceError::malformed(
                action,
                format!("resonance {} is outside {:?}", self.resonance_q, RESONANCE_RANGE),
            ));
        }
        Ok(())
    }
}
