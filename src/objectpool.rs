//! Live game object pool and its query surface.
//!
//! [`GameObjectPool`] owns a private bevy_ecs [`World`] holding every live
//! object plus the pool-wide state resources (world bound, super pause,
//! world masks, current object). Scripts reach it through the
//! [`LuaRuntime`](crate::resources::lua_runtime::LuaRuntime) binding; the host
//! drives it once per frame with [`GameObjectPool::tick`] or, when it needs
//! per-object callbacks, with [`begin_frame`](GameObjectPool::begin_frame) /
//! [`enter_object`](GameObjectPool::enter_object) /
//! [`end_frame`](GameObjectPool::end_frame).
//!
//! Multi-world support is chosen at construction. When disabled,
//! [`GameObjectPool::multi_world`] returns `None` and world masks are ignored
//! by updates.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::gameobject::{GameObject, ObjectPosition};
use crate::resources::objectpool::{
    ALL_WORLDS, CurrentObject, SuperPause, WorldBound, WorldMask, is_same_world,
};
use crate::systems::objectpool::{
    advance_super_pause, bound_check, integrate_velocity, refresh_coordinates,
};

/// Construction-time options for a [`GameObjectPool`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ObjectPoolSettings {
    pub multi_world: bool,
    pub bound: WorldBound,
}

pub struct GameObjectPool {
    world: World,
    frame_start: Schedule,
    frame_end: Schedule,
    refresh: Schedule,
    in_frame: bool,
}

impl GameObjectPool {
    pub fn new(settings: ObjectPoolSettings) -> Self {
        let mut world = World::new();
        world.insert_resource(settings.bound);
        world.insert_resource(WorldMask::new(settings.multi_world));
        world.init_resource::<SuperPause>();
        world.init_resource::<CurrentObject>();

        let mut frame_start = Schedule::default();
        frame_start.add_systems(advance_super_pause);

        let mut frame_end = Schedule::default();
        frame_end.add_systems((integrate_velocity, bound_check).chain());

        let mut refresh = Schedule::default();
        refresh.add_systems(refresh_coordinates);

        debug!(
            "Object pool created (multi_world={}, bound={:?})",
            settings.multi_world,
            settings.bound.as_tuple()
        );

        Self {
            world,
            frame_start,
            frame_end,
            refresh,
            in_frame: false,
        }
    }

    /// Spawns an object in the current world flag and returns its id.
    pub fn spawn(&mut self, x: f64, y: f64, vx: f64, vy: f64, bound: bool) -> Entity {
        let flag = self.world.resource::<WorldMask>().flag;
        let mut obj = GameObject::new(flag);
        obj.bound = bound;
        self.world
            .spawn((obj, ObjectPosition::new(x, y).with_velocity(vx, vy)))
            .id()
    }

    /// Removes an object. Returns `false` if it is not a live object.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }
        let Ok(entity_mut) = self.world.get_entity_mut(entity) else {
            return false;
        };
        entity_mut.despawn();
        let mut current = self.world.resource_mut::<CurrentObject>();
        if current.0 == Some(entity) {
            current.0 = None;
        }
        true
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.get::<GameObject>(entity).is_some()
    }

    pub fn position(&self, entity: Entity) -> Option<(f64, f64)> {
        self.world.get::<ObjectPosition>(entity).map(|p| (p.x, p.y))
    }

    pub fn set_position(&mut self, entity: Entity, x: f64, y: f64) -> bool {
        match self.world.get_mut::<ObjectPosition>(entity) {
            Some(mut p) => {
                p.x = x;
                p.y = y;
                true
            }
            None => false,
        }
    }

    pub fn velocity(&self, entity: Entity) -> Option<(f64, f64)> {
        self.world.get::<ObjectPosition>(entity).map(|p| (p.vx, p.vy))
    }

    pub fn set_velocity(&mut self, entity: Entity, vx: f64, vy: f64) -> bool {
        match self.world.get_mut::<ObjectPosition>(entity) {
            Some(mut p) => {
                p.vx = vx;
                p.vy = vy;
                true
            }
            None => false,
        }
    }

    /// Displacement between the two most recent coordinate refreshes.
    pub fn displacement(&self, entity: Entity) -> Option<(f64, f64)> {
        self.world.get::<ObjectPosition>(entity).map(|p| (p.dx, p.dy))
    }

    /// Number of update frames the object has received.
    pub fn object_timer(&self, entity: Entity) -> Option<u32> {
        self.world.get::<GameObject>(entity).map(|o| o.timer)
    }

    pub fn object_count(&mut self) -> usize {
        self.world.query::<&GameObject>().iter(&self.world).count()
    }

    pub fn set_bound(&mut self, left: f64, right: f64, bottom: f64, top: f64) {
        *self.world.resource_mut::<WorldBound>() = WorldBound::new(left, right, bottom, top);
    }

    /// `(left, right, bottom, top)`
    pub fn bound(&self) -> (f64, f64, f64, f64) {
        self.world.resource::<WorldBound>().as_tuple()
    }

    /// Records each object's displacement since the previous refresh.
    pub fn refresh_coordinates(&mut self) {
        self.refresh.run(&mut self.world);
    }

    /// Super pause value that applies from the next frame.
    pub fn super_pause(&self) -> i64 {
        self.world.resource::<SuperPause>().next()
    }

    pub fn set_super_pause(&mut self, frames: i64) {
        self.world.resource_mut::<SuperPause>().set_next(frames);
    }

    pub fn add_super_pause(&mut self, frames: i64) {
        self.world.resource_mut::<SuperPause>().add_next(frames);
    }

    /// Super pause value in effect for the current frame.
    pub fn elapsed_super_pause(&self) -> i64 {
        self.world.resource::<SuperPause>().current()
    }

    pub fn is_paused(&self) -> bool {
        self.world.resource::<SuperPause>().is_paused()
    }

    /// Starts a frame and returns the objects due for a per-object update.
    ///
    /// Empty while the super pause is in effect. Objects outside the active
    /// worlds are left out when multi-world is enabled.
    pub fn begin_frame(&mut self) -> Vec<Entity> {
        self.frame_start.run(&mut self.world);
        self.in_frame = true;
        if self.is_paused() {
            return Vec::new();
        }
        let mask = *self.world.resource::<WorldMask>();
        self.world
            .query::<(Entity, &GameObject)>()
            .iter(&self.world)
            .filter(|(_, obj)| mask.is_active(obj.world))
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Marks `entity` as the object being updated. Returns `false` if it is
    /// gone or no frame is in progress.
    pub fn enter_object(&mut self, entity: Entity) -> bool {
        if !self.in_frame || !self.contains(entity) {
            return false;
        }
        self.world.resource_mut::<CurrentObject>().0 = Some(entity);
        true
    }

    /// Finishes the frame: integrates velocity and despawns out-of-bound
    /// objects.
    pub fn end_frame(&mut self) {
        self.world.resource_mut::<CurrentObject>().0 = None;
        self.in_frame = false;
        self.frame_end.run(&mut self.world);
    }

    pub fn tick(&mut self) {
        self.tick_with(|_, _| {});
    }

    /// Runs one frame, calling `update` for each object due for an update
    /// while it is the current object.
    pub fn tick_with<F>(&mut self, mut update: F)
    where
        F: FnMut(&mut GameObjectPool, Entity),
    {
        for entity in self.begin_frame() {
            if self.enter_object(entity) {
                update(self, entity);
            }
        }
        self.end_frame();
    }

    /// World-mask operations, available only when multi-world is enabled.
    pub fn multi_world(&mut self) -> Option<MultiWorld<'_>> {
        if self.world.resource::<WorldMask>().enabled {
            Some(MultiWorld { pool: self })
        } else {
            None
        }
    }

    pub fn is_multi_world(&self) -> bool {
        self.world.resource::<WorldMask>().enabled
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for GameObjectPool {
    fn default() -> Self {
        Self::new(ObjectPoolSettings::default())
    }
}

/// Borrowed view over a multi-world [`GameObjectPool`].
pub struct MultiWorld<'a> {
    pool: &'a mut GameObjectPool,
}

impl MultiWorld<'_> {
    /// World flag given to newly spawned objects.
    pub fn world_flag(&self) -> u32 {
        self.pool.world.resource::<WorldMask>().flag
    }

    pub fn set_world_flag(&mut self, flag: u32) {
        self.pool.world.resource_mut::<WorldMask>().flag = flag;
    }

    pub fn active_worlds(&self) -> u32 {
        self.pool.world.resource::<WorldMask>().active
    }

    /// Restricts updates to worlds in `mask`. Zero selects every world.
    pub fn set_active_worlds(&mut self, mask: u32) {
        self.pool.world.resource_mut::<WorldMask>().active =
            if mask == 0 { ALL_WORLDS } else { mask };
    }

    pub fn is_same_world(&self, a: u32, b: u32) -> bool {
        is_same_world(a, b)
    }

    /// The object being updated, `None` outside an update traversal.
    pub fn current_object(&self) -> Option<Entity> {
        self.pool.world.resource::<CurrentObject>().0
    }

    pub fn object_world(&self, entity: Entity) -> Option<u32> {
        self.pool.world.get::<GameObject>(entity).map(|o| o.world)
    }

    pub fn set_object_world(&mut self, entity: Entity, world: u32) -> bool {
        match self.pool.world.get_mut::<GameObject>(entity) {
            Some(mut obj) => {
                obj.world = world;
                true
            }
            None => false,
        }
    }
}
