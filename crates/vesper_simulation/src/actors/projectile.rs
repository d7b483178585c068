//! Shot — снаряд spitter'а
//!
//! Одноразовый: первый осмысленный контакт выполняет реакцию и выводит
//! снаряд из симуляции, повторное использование не предполагается. Помимо
//! lifecycle и physics-synced позы состояния нет.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::actors::counterparts::{Npc, Player};
use crate::actors::spitter::ThrowCommand;
use crate::actors::{Actor, ActorKind};
use crate::clock::Clock;
use crate::lifecycle::Lifecycle;
use crate::logger;
use crate::physics::bridge::{self, BodyTransform, MotionState};
use crate::physics::contacts::{ContactDispatch, MIN_CONTACT_IMPULSE};
use crate::physics::shapes::ShapeRegistry;

pub const SHOT_DAMAGE: u32 = 15;
pub const SHOT_SPEED: f32 = 8.0;
/// Снаряд, ни во что не попавший за это время, снимается с симуляции
pub const SHOT_LIFETIME: f32 = 5.0;
/// Effect-код кислотного снаряда в асимметричных contact-данных
pub const SHOT_EFFECT_CODE: i32 = 1;

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Shot {
    lifecycle: Lifecycle,
    position: Vec3,
    rotation: Quat,

    shooter: Entity,
    /// Effect-данные этой стороны асимметричной contact-пары
    effect_data: i32,

    lifetime: f32,
    /// Одноразовость: реакция уже отработала, дальнейшие контакты этого
    /// шага игнорируются
    spent: bool,
}

impl Shot {
    pub fn new(shooter: Entity, origin: Vec3, rotation: Quat, effect_data: i32) -> Self {
        let mut lifecycle = Lifecycle::new();
        // Спавн = attach к физическому телу, снаряд сразу в симуляции
        lifecycle.enable();
        Self {
            lifecycle,
            position: origin,
            rotation,
            shooter,
            effect_data,
            lifetime: SHOT_LIFETIME,
            spent: false,
        }
    }

    pub fn shooter(&self) -> Entity {
        self.shooter
    }

    pub fn effect_data(&self) -> i32 {
        self.effect_data
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Реакция отработала — снаряд выбывает (detach делает cleanup-система)
    fn consume(&mut self) {
        self.spent = true;
        self.lifecycle.disable();
    }
}

impl Actor for Shot {
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
        self.lifetime = SHOT_LIFETIME;
        self.spent = false;
    }

    fn kill(&mut self) {
        self.lifecycle.kill();
    }

    fn update(&mut self, clock: &Clock) {
        if !self.lifecycle.is_enabled() {
            return;
        }
        self.lifetime -= clock.delta_time();
        if self.lifetime <= 0.0 {
            // Истёк без контакта — без реакции
            self.lifecycle.disable();
        }
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn real_position(&self) -> Vec3 {
        self.position
    }
}

impl MotionState for Shot {
    fn get_world_transform(&self, out: &mut BodyTransform) {
        out.translation = self.position;
        out.rotation = self.rotation;
    }

    /// Dynamic body: движок пишет интегрированную позу назад.
    /// Callback для выбывшего снаряда — silent no-op.
    fn set_world_transform(&mut self, world_transform: &BodyTransform) {
        if !self.lifecycle.is_enabled() {
            return;
        }
        self.position = world_transform.translation;
        self.rotation = world_transform.rotation;
    }
}

impl ContactDispatch for Shot {
    fn contact_with_player(&mut self, player: &mut Player, impulse: f32, clock: &Clock) {
        if self.spent || !self.lifecycle.is_enabled() || impulse < MIN_CONTACT_IMPULSE {
            return;
        }
        if player.take_hit(SHOT_DAMAGE, clock) {
            logger::log(&format!(
                "💥 Shot hit player: HP {} (impulse {:.2})",
                player.health().current,
                impulse
            ));
        }
        self.consume();
    }

    fn contact_with_player_nuke(
        &mut self,
        player: &mut Player,
        _impulse: f32,
        _clock: &Clock,
        charge: i32,
    ) {
        if self.spent || !self.lifecycle.is_enabled() {
            return;
        }
        // Nuke поглощает снаряд без урона
        player.consume_nuke_charge();
        self.consume();
        logger::log(&format!("Shot absorbed by nuke (charge {})", charge));
    }

    fn contact_with_npc(
        &mut self,
        npc: &mut Npc,
        impulse: f32,
        _clock: &Clock,
        own_data: i32,
        other_data: i32,
    ) {
        if self.spent || !self.lifecycle.is_enabled() || impulse < MIN_CONTACT_IMPULSE {
            return;
        }
        npc.take_projectile_hit(SHOT_DAMAGE, own_data);
        self.consume();
        logger::log(&format!(
            "Shot hit NPC: HP {} (effect {} vs {})",
            npc.health().current,
            own_data,
            other_data
        ));
    }
}

/// Спавн снаряда по ThrowCommand (слот пула уже получен вызывающим)
pub fn spawn_shot(
    commands: &mut Commands,
    shapes: &mut ShapeRegistry,
    shooter: Entity,
    cmd: &ThrowCommand,
) -> Entity {
    commands
        .spawn((
            Transform::from_translation(cmd.origin).with_rotation(cmd.final_rotation),
            Shot::new(shooter, cmd.origin, cmd.final_rotation, SHOT_EFFECT_CODE),
            RigidBody::Dynamic,
            shapes.collider(ActorKind::Shot),
            Velocity::linear(cmd.dir * SHOT_SPEED),
            bridge::shot_groups(),
            ActiveEvents::CONTACT_FORCE_EVENTS,
        ))
        .id()
}

/// Система: lifetime снарядов
pub fn update_shots(clock: Res<Clock>, mut shots: Query<&mut Shot>) {
    for mut shot in shots.iter_mut() {
        shot.update(&clock);
    }
}
