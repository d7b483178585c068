//! Transform-мост: logical поза актора ⇄ трансформ физического тела
//!
//! Kinematic-акторы (spitter, gem) — движок читает их позу каждый шаг
//! (`get_world_transform`), обратно ничего не пишет. Dynamic-тела (shot) —
//! движок после интеграции пишет позу назад (`set_world_transform`).
//! Logical и physical позиции могут расходиться (см. Spitter::real_position).

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::actors::collectible::Gem;
use crate::actors::projectile::Shot;
use crate::actors::spitter::Spitter;

/// Трансформ в представлении физического движка
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl BodyTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };
}

impl From<&Transform> for BodyTransform {
    fn from(t: &Transform) -> Self {
        Self {
            translation: t.translation,
            rotation: t.rotation,
        }
    }
}

/// Синхронный callback-интерфейс, через который движок читает/пишет позу.
/// Движок зовёт через ссылку, которой не владеет — ownership остаётся у
/// симуляции.
pub trait MotionState {
    /// Где тело логически находится (kinematic-driven body / инициализация)
    fn get_world_transform(&self, out: &mut BodyTransform);

    /// Движок записывает интегрированную позу назад. По умолчанию no-op:
    /// kinematic-акторы engine-written трансформы не принимают.
    fn set_world_transform(&mut self, _world_transform: &BodyTransform) {}
}

// Collision groups: акторы, снаряды и сенсоры в разных слоях
pub fn actor_groups() -> CollisionGroups {
    CollisionGroups::new(Group::GROUP_1, Group::ALL)
}

pub fn shot_groups() -> CollisionGroups {
    // Снаряды не сталкиваются друг с другом
    CollisionGroups::new(Group::GROUP_2, Group::ALL & !Group::GROUP_2)
}

pub fn pickup_groups() -> CollisionGroups {
    CollisionGroups::new(Group::GROUP_3, Group::GROUP_1)
}

/// Система: logical поза spitter'а → rapier Transform (до physics step)
pub fn push_spitter_transforms(mut spitters: Query<(&Spitter, &mut Transform)>) {
    let mut body = BodyTransform::IDENTITY;
    for (spitter, mut transform) in spitters.iter_mut() {
        spitter.get_world_transform(&mut body);
        transform.translation = body.translation;
        transform.rotation = body.rotation;
    }
}

/// Система: logical поза gem'а → rapier Transform (до physics step)
pub fn push_gem_transforms(mut gems: Query<(&Gem, &mut Transform)>) {
    let mut body = BodyTransform::IDENTITY;
    for (gem, mut transform) in gems.iter_mut() {
        gem.get_world_transform(&mut body);
        transform.translation = body.translation;
        transform.rotation = body.rotation;
    }
}

/// Система: интегрированный rapier Transform → logical поза шота
/// (после physics writeback)
pub fn pull_shot_transforms(mut shots: Query<(&mut Shot, &Transform)>) {
    for (mut shot, transform) in shots.iter_mut() {
        let body = BodyTransform::from(transform);
        shot.set_world_transform(&body);
    }
}
