/// How an event's voices fall off with distance when played positionally.
///
/// `amount` is the spatial blend handed to the playback device (0.0 = fully 2D,
/// 1.0 = fully 3D). The distance range feeds the device's own rolloff.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttenuationSettings {
    pub amount: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for AttenuationSettings {
    fn default() -> Self {
        Self {
            amount: 0.0,
            min_distance: 1.0,
            max_distance: 300.0,
        }
    }
}

impl AttenuationSettings {
    pub fn new(amount: f32, min_distance: f32, max_distance: f32) -> Self {
        Self {
            amount: amount.clamp(0.0, 1.0),
            min_distance,
            max_distance,
        }
    }

    /// Fully 3D attenuation over the given range.
    pub fn spatial(min_distance: f32, max_distance: f32) -> Self {
        Self::new(1.0, min_distance, max_distance)
    }

    /// Returns true if the device should run its 3D panner for these settings.
    pub fn is_spatial(&self) -> bool {
        self.amount > 0.0
    }
}
