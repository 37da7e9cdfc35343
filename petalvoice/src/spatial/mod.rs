//! Positional helpers for voices: follow targets, distance curves and the listener boundary.
//!
//! Geometry beyond a straight-line distance (regions, occlusion, raycasts) belongs to the host.

mod anchor;
mod distance;

pub use anchor::{Anchor, WeakAnchor};
pub use distance::DistanceCurve;

use crate::math::Vec3;

/// Anything that can report where the listener is this frame.
///
/// Returning `None` means "no listener registered": distance-dependent updates are skipped for
/// that tick rather than treated as an error.
pub trait ListenerProvider {
    fn listener_position(&self) -> Option<Vec3>;
}

impl<T: ListenerProvider> ListenerProvider for Option<T> {
    fn listener_position(&self) -> Option<Vec3> {
        self.as_ref().and_then(ListenerProvider::listener_position)
    }
}

impl ListenerProvider for Vec3 {
    fn listener_position(&self) -> Option<Vec3> {
        Some(*self)
    }
}
