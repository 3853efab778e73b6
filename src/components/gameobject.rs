//! Live game object components.
//!
//! Every object managed by the [`GameObjectPool`](crate::objectpool::GameObjectPool)
//! carries a [`GameObject`] tag and an [`ObjectPosition`].

use bevy_ecs::prelude::Component;

/// Tag for objects owned by the object pool.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameObject {
    /// World mask; an object belongs to every world whose bit is set.
    pub world: u32,
    /// Despawn the object once it leaves the world bound.
    pub bound: bool,
    /// Number of update frames this object has received.
    pub timer: u32,
}

impl GameObject {
    pub fn new(world: u32) -> Self {
        Self {
            world,
            bound: true,
            timer: 0,
        }
    }
}

/// Position, velocity and per-refresh displacement of an object.
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct ObjectPosition {
    pub x: f64,
    pub y: f64,
    /// Position at the last coordinate refresh.
    pub last_x: f64,
    pub last_y: f64,
    /// Displacement between the last two coordinate refreshes.
    pub dx: f64,
    pub dy: f64,
    pub vx: f64,
    pub vy: f64,
}

impl ObjectPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            last_x: x,
            last_y: y,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    /// Record displacement since the last refresh and rebase on the current
    /// position.
    pub fn refresh(&mut self) {
        self.dx = self.x - self.last_x;
        self.dy = self.y - self.last_y;
        self.last_x = self.x;
        self.last_y = self.y;
    }
}
