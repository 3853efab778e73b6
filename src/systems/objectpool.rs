//! Object pool frame systems.
//!
//! A frame of the [`GameObjectPool`](crate::objectpool::GameObjectPool) runs:
//!
//! 1. [`advance_super_pause`] swaps the super pause countdown
//! 2. per-object callbacks (driven by the pool itself, not a system)
//! 3. [`integrate_velocity`] moves objects in active worlds
//! 4. [`bound_check`] despawns bound objects that left the world rectangle
//!
//! [`refresh_coordinates`] runs on demand.

use bevy_ecs::prelude::*;

use crate::components::gameobject::{GameObject, ObjectPosition};
use crate::resources::objectpool::{SuperPause, WorldBound, WorldMask};

/// Copies the next-frame super pause value into the current frame.
pub fn advance_super_pause(mut pause: ResMut<SuperPause>) {
    pause.begin_frame();
}

/// Adds velocity to position for every object in an active world.
///
/// Skipped entirely while the super pause is in effect.
pub fn integrate_velocity(
    pause: Res<SuperPause>,
    mask: Res<WorldMask>,
    mut query: Query<(&mut GameObject, &mut ObjectPosition)>,
) {
    if pause.is_paused() {
        return;
    }
    for (mut obj, mut pos) in query.iter_mut() {
        if !mask.is_active(obj.world) {
            continue;
        }
        pos.x += pos.vx;
        pos.y += pos.vy;
        obj.timer = obj.timer.wrapping_add(1);
    }
}

/// Despawns objects flagged `bound` whose position left the world bound.
pub fn bound_check(
    bound: Res<WorldBound>,
    query: Query<(Entity, &GameObject, &ObjectPosition)>,
    mut commands: Commands,
) {
    for (entity, obj, pos) in query.iter() {
        if obj.bound && !bound.contains(pos.x, pos.y) {
            commands.entity(entity).try_despawn();
        }
    }
}

/// Recomputes per-object displacement since the previous refresh.
pub fn refresh_coordinates(mut query: Query<&mut ObjectPosition>) {
    for mut pos in query.iter_mut() {
        pos.refresh();
    }
}
