//! Object pool state resources.
//!
//! These resources live in the object pool's ECS world and back the query
//! surface exposed to scripts: world bound, super pause countdown, world
//! masks and the object currently being updated.

use bevy_ecs::prelude::{Entity, Resource};

/// Mask with every world bit set.
pub const ALL_WORLDS: u32 = u32::MAX;

/// Two world masks share a world when any bit overlaps.
pub const fn is_same_world(a: u32, b: u32) -> bool {
    a & b != 0
}

/// World bounding rectangle. Objects flagged `bound` are despawned when they
/// leave it.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WorldBound {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Default for WorldBound {
    fn default() -> Self {
        WorldBound {
            left: -100.0,
            right: 100.0,
            bottom: -100.0,
            top: 100.0,
        }
    }
}

impl WorldBound {
    pub fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }

    /// `(left, right, bottom, top)`
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.left, self.right, self.bottom, self.top)
    }
}

/// Deferred frame-skip countdown.
///
/// `next` is what scripts read and write; it is copied into `current` at the
/// start of every frame and then counts down. Object updates are skipped
/// while `current` is positive, so a value set during frame T first applies
/// to frame T+1.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuperPause {
    current: i64,
    next: i64,
}

impl SuperPause {
    /// Swap in the next-frame value. Call once at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.current = self.next.max(0);
        self.next = (self.next - 1).max(0);
    }

    /// Value that will apply from the next frame on.
    pub fn next(&self) -> i64 {
        self.next
    }

    pub fn set_next(&mut self, frames: i64) {
        self.next = frames;
    }

    pub fn add_next(&mut self, frames: i64) {
        self.next = self.next.saturating_add(frames);
    }

    /// Value in effect for the frame being processed.
    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn is_paused(&self) -> bool {
        self.current > 0
    }
}

/// Multi-world configuration, chosen when the pool is constructed.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldMask {
    /// Whether world masks take part in updates at all.
    pub enabled: bool,
    /// World flag given to newly spawned objects.
    pub flag: u32,
    /// Worlds whose objects are updated each frame.
    pub active: u32,
}

impl WorldMask {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            flag: 1,
            active: ALL_WORLDS,
        }
    }

    /// Whether an object with `world` mask is updated this frame.
    pub fn is_active(&self, world: u32) -> bool {
        !self.enabled || is_same_world(world, self.active)
    }
}

impl Default for WorldMask {
    fn default() -> Self {
        Self::new(false)
    }
}

/// The object currently being updated. `None` outside update traversal.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentObject(pub Option<Entity>);
