//! Gem — простейший collectible
//!
//! Мутабельного состояния сверх Actor-полей нет (только фаза idle-вращения).
//! Collision shape общий на все instances вида — см. ShapeRegistry.

use bevy::prelude::*;

use crate::actors::Actor;
use crate::clock::Clock;
use crate::lifecycle::Lifecycle;
use crate::physics::bridge::{BodyTransform, MotionState};

/// Скорость idle-вращения (рад/с)
const GEM_SPIN_RATE: f32 = 1.2;

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Gem {
    lifecycle: Lifecycle,
    position: Vec3,
    rotation: Quat,
    spawn_position: Vec3,
    spin_phase: f32,
}

impl Gem {
    pub fn new(position: Vec3) -> Self {
        let mut lifecycle = Lifecycle::new();
        lifecycle.enable();
        Self {
            lifecycle,
            position,
            rotation: Quat::IDENTITY,
            spawn_position: position,
            spin_phase: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }
}

impl Actor for Gem {
    fn enable(&mut self) {
        self.lifecycle.enable();
    }

    fn disable(&mut self) {
        self.lifecycle.disable();
    }

    fn reset(&mut self) {
        if self.lifecycle.is_dead() {
            return;
        }
        self.position = self.spawn_position;
        self.rotation = Quat::IDENTITY;
        self.spin_phase = 0.0;
    }

    fn kill(&mut self) {
        self.lifecycle.kill();
    }

    fn update(&mut self, clock: &Clock) {
        if !self.lifecycle.is_enabled() {
            return;
        }
        self.spin_phase += GEM_SPIN_RATE * clock.delta_time();
        self.rotation = Quat::from_rotation_y(self.spin_phase);
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn real_position(&self) -> Vec3 {
        self.position
    }
}

impl MotionState for Gem {
    // Kinematic-сенсор: движку нужна только поза
    fn get_world_transform(&self, out: &mut BodyTransform) {
        out.translation = self.position;
        out.rotation = self.rotation;
    }
}

/// Система: idle-вращение gem'ов
pub fn update_gems(clock: Res<Clock>, mut gems: Query<&mut Gem>) {
    for mut gem in gems.iter_mut() {
        gem.update(&clock);
    }
}
