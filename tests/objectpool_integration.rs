//! Object Pool Integration Tests
//!
//! Drives [`GameObjectPool`] frame by frame and checks the query surface
//! scripts rely on.
//!
//! # Test Categories
//!
//! 1. **Super Pause** - deferred countdown and skipped frames
//! 2. **World Bound** - despawning of bound objects
//! 3. **Multi-World** - world flags and active world masks
//! 4. **Coordinates** - displacement refresh
//! 5. **Systems** - the frame systems on a bare `World`
//!
//! ```sh
//! cargo test --test objectpool_integration
//! ```

use bevy_ecs::prelude::*;

use stagepool::components::gameobject::{GameObject, ObjectPosition};
use stagepool::objectpool::{GameObjectPool, ObjectPoolSettings};
use stagepool::resources::objectpool::{ALL_WORLDS, SuperPause, WorldBound, WorldMask};
use stagepool::systems::objectpool::{advance_super_pause, bound_check, integrate_velocity};

fn multi_world_pool() -> GameObjectPool {
    GameObjectPool::new(ObjectPoolSettings {
        multi_world: true,
        ..Default::default()
    })
}

/// Runs one frame and returns how many objects received an update callback.
fn run_frame(pool: &mut GameObjectPool) -> usize {
    let mut updated = 0;
    pool.tick_with(|_, _| updated += 1);
    updated
}

// =============================================================================
// Super Pause
// =============================================================================

#[test]
fn super_pause_skips_exactly_n_following_frames() {
    let mut pool = GameObjectPool::default();
    let e = pool.spawn(0.0, 0.0, 1.0, 0.0, false);

    // Frame T: set during the frame, still runs
    let mut updated = 0;
    pool.tick_with(|p, _| {
        p.set_super_pause(3);
        updated += 1;
    });
    assert_eq!(updated, 1);
    assert_eq!(pool.position(e), Some((1.0, 0.0)));

    for _ in 0..3 {
        assert_eq!(run_frame(&mut pool), 0);
        assert!(pool.is_paused());
    }
    assert_eq!(pool.position(e), Some((1.0, 0.0)));
    assert_eq!(pool.object_timer(e), Some(1));

    assert_eq!(run_frame(&mut pool), 1);
    assert!(!pool.is_paused());
    assert_eq!(pool.position(e), Some((2.0, 0.0)));
}

#[test]
fn super_pause_counts_down_after_being_read() {
    let mut pool = GameObjectPool::default();
    pool.set_super_pause(2);
    assert_eq!(pool.super_pause(), 2);
    assert_eq!(pool.elapsed_super_pause(), 0);

    pool.tick();
    assert_eq!(pool.elapsed_super_pause(), 2);
    assert_eq!(pool.super_pause(), 1);

    pool.tick();
    assert_eq!(pool.elapsed_super_pause(), 1);
    assert_eq!(pool.super_pause(), 0);

    pool.tick();
    assert_eq!(pool.elapsed_super_pause(), 0);
    assert!(!pool.is_paused());
}

#[test]
fn super_pause_additions_extend_the_pause() {
    let mut pool = GameObjectPool::default();
    pool.spawn(0.0, 0.0, 0.0, 0.0, false);
    pool.set_super_pause(1);
    pool.add_super_pause(2);
    assert_eq!(pool.super_pause(), 3);

    let skipped = (0..5).filter(|_| run_frame(&mut pool) == 0).count();
    assert_eq!(skipped, 3);
}

#[test]
fn negative_super_pause_does_not_pause() {
    let mut pool = GameObjectPool::default();
    pool.spawn(0.0, 0.0, 0.0, 0.0, false);
    pool.set_super_pause(-5);
    assert_eq!(run_frame(&mut pool), 1);
    assert_eq!(pool.elapsed_super_pause(), 0);
    assert_eq!(pool.super_pause(), 0);
}

// =============================================================================
// World Bound
// =============================================================================

#[test]
fn bound_objects_leaving_the_rect_are_despawned() {
    let mut pool = GameObjectPool::default();
    let leaving = pool.spawn(99.0, 0.0, 2.0, 0.0, true);
    let edge = pool.spawn(98.0, 0.0, 2.0, 0.0, true);
    let free = pool.spawn(99.0, 0.0, 2.0, 0.0, false);

    pool.tick();

    assert!(!pool.contains(leaving));
    assert!(pool.contains(edge));
    assert_eq!(pool.position(edge), Some((100.0, 0.0)));
    assert!(pool.contains(free));
    assert_eq!(pool.object_count(), 2);
}

#[test]
fn set_bound_applies_to_the_next_check() {
    let mut pool = GameObjectPool::default();
    let e = pool.spawn(5.0, 5.0, 0.0, 0.0, true);
    pool.set_bound(-1.0, 1.0, -1.0, 1.0);
    assert_eq!(pool.bound(), (-1.0, 1.0, -1.0, 1.0));
    pool.tick();
    assert!(!pool.contains(e));
}

#[test]
fn despawned_ids_are_rejected_by_accessors() {
    let mut pool = GameObjectPool::default();
    let e = pool.spawn(0.0, 0.0, 0.0, 0.0, true);
    assert!(pool.despawn(e));
    assert_eq!(pool.position(e), None);
    assert!(!pool.set_velocity(e, 1.0, 1.0));
    assert!(!pool.set_position(e, 1.0, 1.0));
}

// =============================================================================
// Multi-World
// =============================================================================

#[test]
fn only_objects_in_active_worlds_update() {
    let mut pool = multi_world_pool();
    pool.multi_world().unwrap().set_world_flag(0b01);
    let a = pool.spawn(0.0, 0.0, 1.0, 0.0, false);
    pool.multi_world().unwrap().set_world_flag(0b10);
    let b = pool.spawn(0.0, 0.0, 1.0, 0.0, false);
    pool.multi_world().unwrap().set_world_flag(0b11);
    let both = pool.spawn(0.0, 0.0, 1.0, 0.0, false);

    pool.multi_world().unwrap().set_active_worlds(0b01);
    let mut seen = Vec::new();
    pool.tick_with(|_, e| seen.push(e));

    assert!(seen.contains(&a));
    assert!(!seen.contains(&b));
    assert!(seen.contains(&both));
    assert_eq!(pool.position(a), Some((1.0, 0.0)));
    assert_eq!(pool.position(b), Some((0.0, 0.0)));
    assert_eq!(pool.position(both), Some((1.0, 0.0)));
}

#[test]
fn world_masks_are_ignored_without_multi_world() {
    let mut pool = GameObjectPool::default();
    assert!(pool.multi_world().is_none());
    let e = pool.spawn(0.0, 0.0, 1.0, 1.0, false);
    pool.world_mut().resource_mut::<WorldMask>().active = 0b1000;
    assert_eq!(run_frame(&mut pool), 1);
    assert_eq!(pool.position(e), Some((1.0, 1.0)));
}

#[test]
fn moving_an_object_between_worlds() {
    let mut pool = multi_world_pool();
    let e = pool.spawn(0.0, 0.0, 0.0, 0.0, false);
    let mut mw = pool.multi_world().unwrap();
    assert_eq!(mw.active_worlds(), ALL_WORLDS);
    assert_eq!(mw.object_world(e), Some(1));
    assert!(mw.set_object_world(e, 0b100));
    mw.set_active_worlds(0b011);
    assert!(!mw.is_same_world(0b100, mw.active_worlds()));
    assert_eq!(run_frame(&mut pool), 0);
}

// =============================================================================
// Coordinates
// =============================================================================

#[test]
fn refresh_reports_displacement_between_refreshes() {
    let mut pool = GameObjectPool::default();
    let e = pool.spawn(0.0, 0.0, 1.5, -0.5, false);
    pool.tick();
    pool.tick();
    assert_eq!(pool.displacement(e), Some((0.0, 0.0)));

    pool.refresh_coordinates();
    assert_eq!(pool.displacement(e), Some((3.0, -1.0)));

    pool.refresh_coordinates();
    assert_eq!(pool.displacement(e), Some((0.0, 0.0)));
}

// =============================================================================
// Systems
// =============================================================================

#[test]
fn frame_systems_run_on_a_bare_world() {
    let mut world = World::new();
    world.insert_resource(WorldBound::new(-10.0, 10.0, -10.0, 10.0));
    world.insert_resource(WorldMask::new(false));
    world.init_resource::<SuperPause>();

    let inside = world
        .spawn((
            GameObject::new(1),
            ObjectPosition::new(0.0, 0.0).with_velocity(1.0, 0.0),
        ))
        .id();
    let outside = world
        .spawn((
            GameObject::new(1),
            ObjectPosition::new(10.0, 0.0).with_velocity(1.0, 0.0),
        ))
        .id();

    let mut schedule = Schedule::default();
    schedule.add_systems((advance_super_pause, integrate_velocity, bound_check).chain());
    schedule.run(&mut world);

    assert_eq!(world.get::<ObjectPosition>(inside).unwrap().x, 1.0);
    assert_eq!(world.get::<GameObject>(inside).unwrap().timer, 1);
    assert!(world.get_entity(outside).is_err());

    world.resource_mut::<SuperPause>().set_next(1);
    schedule.run(&mut world);
    assert_eq!(world.get::<ObjectPosition>(inside).unwrap().x, 1.0);
    schedule.run(&mut world);
    assert_eq!(world.get::<ObjectPosition>(inside).unwrap().x, 2.0);
}
