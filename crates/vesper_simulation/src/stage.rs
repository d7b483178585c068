//! Stage — спавн акторов и уборка
//!
//! Владелец акторов — стейдж: он спавнит, он и удаляет (выбывшие снаряды,
//! собранные gems, мёртвых акторов). Respawn мёртвого актора — это
//! destroy + заново spawn, не реанимация.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::Rng;

use crate::actors::collectible::Gem;
use crate::actors::counterparts::{Npc, Player};
use crate::actors::projectile::Shot;
use crate::actors::spitter::Spitter;
use crate::actors::{Actor, ActorKind, SpawnParams};
use crate::clock::Clock;
use crate::logger;
use crate::physics::bridge;
use crate::physics::contacts::GemCollected;
use crate::physics::shapes::{BodyPool, ShapeRegistry};
use crate::DeterministicRng;

/// Startup: игровой clock стартует вместе с симуляцией
pub fn start_simulation_clock(mut clock: ResMut<Clock>) {
    clock.start();
}

/// Первая система каждого шага: один `Clock::update` на тик
pub fn tick_clock(mut clock: ResMut<Clock>) {
    clock.update();
}

pub fn spawn_player(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            Player::default(),
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(0.5, 0.4),
            bridge::actor_groups(),
            ActiveEvents::CONTACT_FORCE_EVENTS | ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

pub fn spawn_npc(commands: &mut Commands, position: Vec3, max_hp: u32, effect_data: i32) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            Npc::new(max_hp, effect_data),
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(0.5, 0.4),
            bridge::actor_groups(),
            ActiveEvents::CONTACT_FORCE_EVENTS,
        ))
        .id()
}

pub fn spawn_spitter(
    commands: &mut Commands,
    shapes: &mut ShapeRegistry,
    params: &SpawnParams,
) -> Entity {
    let mut spitter = Spitter::new(params);
    spitter.enable();
    let entity = commands
        .spawn((
            Transform::from_translation(params.world_position())
                .with_rotation(params.world_rotation()),
            spitter,
            RigidBody::KinematicPositionBased,
            shapes.collider(ActorKind::Spitter),
            bridge::actor_groups(),
            ActiveEvents::CONTACT_FORCE_EVENTS,
        ))
        .id();
    logger::log(&format!(
        "Spawned spitter {:?} at grid ({}, {})",
        entity, params.grid_x, params.grid_y
    ));
    entity
}

/// Gem — kinematic-сенсор с shared shape из registry
pub fn spawn_gem(commands: &mut Commands, shapes: &mut ShapeRegistry, position: Vec3) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            Gem::new(position),
            shapes.collider(ActorKind::Gem),
            Sensor,
            bridge::pickup_groups(),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

/// Разбросать gems по квадрату (детерминированно от seed)
pub fn scatter_gems(
    commands: &mut Commands,
    shapes: &mut ShapeRegistry,
    rng: &mut DeterministicRng,
    count: usize,
    half_extent: f32,
) -> Vec<Entity> {
    (0..count)
        .map(|_| {
            let x = rng.rng.gen_range(-half_extent..half_extent);
            let z = rng.rng.gen_range(-half_extent..half_extent);
            spawn_gem(commands, shapes, Vec3::new(x, 0.5, z))
        })
        .collect()
}

/// Система: уборка выбывших акторов (конец шага)
///
/// - снаряды вне симуляции: слот пула назад, ссылка spitter'а отпускается
/// - собранные gems удаляются владельцем
/// - мёртвые акторы удаляются (respawn — только заново через spawn)
pub fn cleanup_actors(
    mut commands: Commands,
    mut pool: ResMut<BodyPool>,
    shots: Query<(Entity, &Shot)>,
    mut spitters: Query<(Entity, &mut Spitter)>,
    gems: Query<(Entity, &Gem)>,
    mut pickups: EventReader<GemCollected>,
) {
    let mut resolved: Vec<Entity> = Vec::new();
    for (entity, shot) in shots.iter() {
        if shot.lifecycle().is_enabled() {
            continue;
        }
        pool.release();
        commands.entity(entity).despawn();
        resolved.push(entity);
    }

    for (entity, mut spitter) in spitters.iter_mut() {
        for shot in &resolved {
            spitter.shot_resolved(*shot);
        }
        if spitter.lifecycle().is_dead() {
            commands.entity(entity).despawn();
            logger::log(&format!("Dead spitter {:?} removed", entity));
        }
    }

    for pickup in pickups.read() {
        if gems.get(pickup.gem).is_ok() {
            commands.entity(pickup.gem).despawn();
            logger::log_info(&format!(
                "✓ Gem {:?} collected by {:?}",
                pickup.gem, pickup.player
            ));
        }
    }

    for (entity, gem) in gems.iter() {
        if gem.lifecycle().is_dead() {
            commands.entity(entity).despawn();
        }
    }
}

/// Teardown уровня: shared shapes и слоты пула освобождаются один раз
/// здесь, не при удалении отдельных акторов.
pub fn teardown_level(shapes: &mut ShapeRegistry, pool: &mut BodyPool) {
    shapes.clear();
    pool.reset();
    logger::log_info("Level teardown: shapes and body pool released");
}
