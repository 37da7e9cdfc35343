use crate::math::{Pose, Vec3};
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// A movable point that voices can follow, typically a game object the host updates each
/// frame.
///
/// The host keeps the `Anchor`; voices only ever hold a [`WeakAnchor`]. Dropping the anchor
/// detaches every voice following it, and they stay where they last were.
#[derive(Debug, Clone, Default)]
pub struct Anchor {
    pose: Rc<Cell<Pose>>,
}

/// Non-owning reference to an [`Anchor`].
#[derive(Debug, Clone, Default)]
pub struct WeakAnchor {
    pose: Weak<Cell<Pose>>,
}

impl Anchor {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose: Rc::new(Cell::new(pose)),
        }
    }

    pub fn at(position: Vec3) -> Self {
        Self::new(Pose::from_position(position))
    }

    pub fn pose(&self) -> Pose {
        self.pose.get()
    }

    pub fn position(&self) -> Vec3 {
        self.pose.get().position
    }

    pub fn set_pose(&self, pose: Pose) {
        self.pose.set(pose);
    }

    pub fn set_position(&self, position: Vec3) {
        let mut pose = self.pose.get();
        pose.position = position;
        self.pose.set(pose);
    }

    pub fn downgrade(&self) -> WeakAnchor {
        WeakAnchor {
            pose: Rc::downgrade(&self.pose),
        }
    }
}

impl WeakAnchor {
    /// Current pose of the anchor, or `None` once it has been dropped.
    pub fn pose(&self) -> Option<Pose> {
        self.pose.upgrade().map(|pose| pose.get())
    }

    pub fn is_alive(&self) -> bool {
        self.pose.strong_count() > 0
    }
}
