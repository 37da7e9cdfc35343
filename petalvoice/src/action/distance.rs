use crate::error::{PetalVoiceError, Result};

/// Distance window of a `VolumeByDistance` or `SpatialBlendByDistance` action, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceRange {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for DistanceRange {
    fn default() -> Self {
        Self {
            min_distance: 1.0,
            max_distance: 20.0,
        }
    }
}

impl DistanceRange {
    pub fn new(min_distance: f32, max_distance: f32) -> Self {
        Self {
            min_distance,
            max_distance,
        }
    }

    pub(crate) fn validate(&self, action: &'static str) -> Result<()> {
        if !self.min_distance.is_finite() || !self.max_distance.is_finite() {
            return Err(PetalVoiceError::malformed(action, "distance range is not finite"));
        }
        if self.min_distance < 0.0 {
            return Err(PetalVoiceError::malformed(
                action,
                format!("min distance {} is negative", self.min_distance),
            ));
        }
        Ok(())
    }
}
