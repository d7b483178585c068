//! Shape registry и body pool — ресурсы физического движка
//!
//! Collision shape один на вид актора, не на instance: registry строит shape
//! лениво при первом запросе и переиспользует его для всех последующих
//! (у gem'ов это принципиально — N штук на уровне, shape один). Teardown
//! явный, в конце уровня — не language-level static.

use bevy::prelude::*;
use std::collections::HashMap;
use bevy_rapier3d::prelude::*;
use bevy_rapier3d::rapier::prelude::SharedShape;
use std::fmt;

use crate::actors::ActorKind;
use crate::logger;

const SPITTER_HALF_EXTENTS: (f32, f32, f32) = (0.5, 0.6, 0.5);
const SHOT_RADIUS: f32 = 0.15;
const GEM_RADIUS: f32 = 0.3;

/// Process-wide реестр shared collision shapes, ключ — вид актора
#[derive(Resource, Default)]
pub struct ShapeRegistry {
    shapes: HashMap<ActorKind, SharedShape>,
    builds: u32,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared shape вида: первый запрос строит, остальные переиспользуют
    pub fn shape(&mut self, kind: ActorKind) -> SharedShape {
        if let Some(shape) = self.shapes.get(&kind) {
            return shape.clone();
        }
        let shape = match kind {
            ActorKind::Spitter => {
                let (hx, hy, hz) = SPITTER_HALF_EXTENTS;
                SharedShape::cuboid(hx, hy, hz)
            }
            ActorKind::Shot => SharedShape::ball(SHOT_RADIUS),
            ActorKind::Gem => SharedShape::ball(GEM_RADIUS),
        };
        self.builds += 1;
        logger::log(&format!("ShapeRegistry: built shape for {:?}", kind));
        self.shapes.insert(kind, shape.clone());
        shape
    }

    /// Collider для spawn'а (shape под ним shared)
    pub fn collider(&mut self, kind: ActorKind) -> Collider {
        Collider::from(self.shape(kind))
    }

    /// Сколько shape'ов реально построено (для тестов и диагностики)
    pub fn build_count(&self) -> u32 {
        self.builds
    }

    /// Teardown уровня: все shapes освобождаются один раз здесь,
    /// не при уничтожении отдельных акторов.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.builds = 0;
    }
}

/// Ошибка: свободных слотов под dynamic body нет
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolExhausted;

impl fmt::Display for PoolExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dynamic body pool exhausted")
    }
}

impl std::error::Error for PoolExhausted {}

/// Пул слотов под dynamic-тела
///
/// Единственная восстановимая ошибка ядра: исчерпание пула откладывает
/// бросок до следующего eligible-кадра (cadence timer не сбрасывается).
#[derive(Resource, Debug)]
pub struct BodyPool {
    capacity: usize,
    in_use: usize,
}

impl Default for BodyPool {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl BodyPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: 0,
        }
    }

    pub fn try_acquire(&mut self) -> Result<(), PoolExhausted> {
        if self.in_use >= self.capacity {
            return Err(PoolExhausted);
        }
        self.in_use += 1;
        Ok(())
    }

    pub fn release(&mut self) {
        self.in_use = self.in_use.saturating_sub(1);
    }

    /// Teardown уровня: все слоты разом (тела уже despawn'утся со сценой)
    pub fn reset(&mut self) {
        self.in_use = 0;
    }

    pub fn available(&self) -> usize {
        self.capacity - self.in_use
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }
}
