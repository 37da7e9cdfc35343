/// A distance-driven curve attached to a voice by a `VolumeByDistance` or
/// `SpatialBlendByDistance` action.
///
/// `ceiling` is the value the curve scales: the voice's volume (or spatial blend) at the moment
/// the action ran.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceCurve {
    pub min_distance: f32,
    pub max_distance: f32,
    pub ceiling: f32,
}

impl DistanceCurve {
    pub fn new(min_distance: f32, max_distance: f32, ceiling: f32) -> Self {
        Self {
            min_distance,
            max_distance,
            ceiling,
        }
    }

    /// 0.0 at or inside `min_distance`, 1.0 at or beyond `max_distance`, linear in between.
    /// A degenerate range (max <= min) is a step at `min_distance`.
    pub fn progress(&self, distance: f32) -> f32 {
        let span = self.max_distance - self.min_distance;
        if span <= f32::EPSILON {
            return if distance <= self.min_distance { 0.0 } else { 1.0 };
        }
        ((distance - self.min_distance) / span).clamp(0.0, 1.0)
    }

    /// Full ceiling up close, fading to silence at `max_distance`.
    pub fn falloff(&self, distance: f32) -> f32 {
        (1.0 - self.progress(distance)) * self.ceiling
    }

    /// Zero up close, rising to the ceiling at `max_distance`.
    pub fn rise(&self, distance: f32) -> f32 {
        self.progress(distance) * self.ceiling
    }
}
