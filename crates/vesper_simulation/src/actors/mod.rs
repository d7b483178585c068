//! Акторы симуляции
//!
//! Закрытый набор видов (никаких глубоких иерархий — композиция:
//! Lifecycle + MotionState + ContactDispatch + kind-specific данные):
//! - spitter: враг, периодически бросающий снаряд
//! - projectile: сам снаряд (одноразовый)
//! - collectible: gem, простейший актор с shared collision shape
//! - counterparts: Player/NPC — внешние collaborators, ядро видит только
//!   их публичную contact-reaction поверхность

pub mod collectible;
pub mod counterparts;
pub mod projectile;
pub mod spitter;

pub use collectible::Gem;
pub use counterparts::{Health, Npc, Player};
pub use projectile::Shot;
pub use spitter::{ElectricShock, Shocked, ShotThrown, Spitter, ThrowCommand};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::lifecycle::Lifecycle;

/// Размер ячейки сетки уровня (метры) — spawn-конфигурация приходит
/// в grid-координатах
pub const GRID_CELL_SIZE: f32 = 1.0;

/// Закрытый набор видов акторов. Также ключ shape registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ActorKind {
    Spitter,
    Shot,
    Gem,
}

/// Spawn-конфигурация из level data (парсинг вне ядра, сюда приходит
/// уже десериализованной — ядро потребляет только численную позу)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnParams {
    pub grid_x: i16,
    pub grid_y: i16,
    /// Четверть-обороты вокруг вертикали
    pub rotation: u8,
    pub width: i16,
    pub height: i16,
    /// Opaque script reference (потребляется script-подсистемой, не ядром)
    pub script: String,
}

impl SpawnParams {
    pub fn at_grid(grid_x: i16, grid_y: i16) -> Self {
        Self {
            grid_x,
            grid_y,
            rotation: 0,
            width: 1,
            height: 1,
            script: String::new(),
        }
    }

    pub fn world_position(&self) -> Vec3 {
        Vec3::new(
            self.grid_x as f32 * GRID_CELL_SIZE,
            0.0,
            self.grid_y as f32 * GRID_CELL_SIZE,
        )
    }

    pub fn world_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation as f32 * std::f32::consts::FRAC_PI_2)
    }
}

/// Общий capability-интерфейс всех акторов
///
/// Lifecycle-переходы вступают в силу на ближайшей границе update/callback,
/// не preemptively mid-call — это единственный способ прервать in-flight
/// поведение актора.
pub trait Actor {
    fn enable(&mut self);
    fn disable(&mut self);

    /// Вернуть kind-specific состояние к spawn-time значениям.
    /// Enabled/disabled НЕ меняет; мёртвого актора не оживляет.
    fn reset(&mut self);

    /// Необратимо: освобождает ссылку на дочерний актор (если есть) и
    /// помечает instance для удаления владельцем.
    fn kill(&mut self);

    /// Продвинуть kind-specific поведение на сглаженном delta.
    /// No-op если актор не enabled.
    fn update(&mut self, clock: &Clock);

    fn lifecycle(&self) -> &Lifecycle;

    /// Logical позиция для игровых правил — может расходиться с позицией
    /// физического тела (см. Spitter mid-throw).
    fn real_position(&self) -> Vec3;

    /// Capability-предикат: применим ли к актору электрический stun.
    /// Фиксированный ответ вида, не state-переход.
    fn affected_by_electricity(&self) -> bool {
        false
    }
}
