//! Spitter — враг, бросающий снаряд с фиксированной каденцией
//!
//! Каденция считается от accumulated clock time (сглаженного источника),
//! не от wall-clock. Если пул физических тел исчерпан, попытка броска
//! отменяется БЕЗ сброса cadence-таймера — retry на следующем eligible
//! кадре, цикл броска не теряется молча.

use bevy::prelude::*;

use crate::actors::counterparts::Player;
use crate::actors::projectile;
use crate::actors::{Actor, SpawnParams};
use crate::clock::Clock;
use crate::lifecycle::Lifecycle;
use crate::logger;
use crate::physics::bridge::{BodyTransform, MotionState};
use crate::physics::contacts::{ContactDispatch, MIN_CONTACT_IMPULSE};
use crate::physics::shapes::{BodyPool, ShapeRegistry};

/// Минимальный интервал между бросками (секунды)
pub const SPIT_CADENCE: f32 = 0.2;

/// Урон игроку при касании самого spitter'а
const TOUCH_DAMAGE: u32 = 10;

/// Длительность электрического stun'а
pub const SHOCK_STUN_SECS: f32 = 1.5;

/// Готовый к исполнению бросок: origin, направление, терминальная
/// ориентация снаряда в полёте
#[derive(Debug, Clone, Copy)]
pub struct ThrowCommand {
    pub origin: Vec3,
    pub dir: Vec3,
    pub final_rotation: Quat,
}

/// Событие: бросок состоялся (для cue-подсистем: звук, анимация).
/// При отменённой из-за пула попытке НЕ эмитится.
#[derive(Event, Debug, Clone)]
pub struct ShotThrown {
    pub spitter: Entity,
    pub shot: Entity,
    pub origin: Vec3,
    pub dir: Vec3,
}

/// Событие: на актора воздействует электричество
#[derive(Event, Debug, Clone)]
pub struct ElectricShock {
    pub target: Entity,
}

/// Stun-маркер, тикает на сглаженном delta
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Shocked {
    pub remaining: f32,
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Spitter {
    lifecycle: Lifecycle,
    position: Vec3,
    rotation: Quat,

    spawn_position: Vec3,
    spawn_rotation: Quat,

    last_throw_time: f32,
    /// Терминальная ориентация снаряда (прекомпьютится при прицеливании)
    final_rotation: Quat,
    start_throw_position: Vec3,
    throw_dir: Vec3,

    /// Живой дочерний снаряд (ноль-или-один, без обратного владения)
    active_shot: Option<Entity>,
}

impl Spitter {
    pub fn new(params: &SpawnParams) -> Self {
        let position = params.world_position();
        let rotation = params.world_rotation();
        Self {
            lifecycle: Lifecycle::new(),
            position,
            rotation,
            spawn_position: position,
            spawn_rotation: rotation,
            last_throw_time: 0.0,
            final_rotation: rotation,
            start_throw_position: position,
            throw_dir: rotation * Vec3::Z,
            active_shot: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn facing_dir(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn active_shot(&self) -> Option<Entity> {
        self.active_shot
    }

    pub fn last_throw_time(&self) -> f32 {
        self.last_throw_time
    }

    /// Каденция выдержана и актор участвует в симуляции?
    pub fn ready_to_throw(&self, clock: &Clock) -> bool {
        self.lifecycle.is_enabled() && clock.actual_time() - self.last_throw_time >= SPIT_CADENCE
    }

    /// Прицелиться: направление на цель (или по facing, если цели нет)
    /// из текущего трансформа. Не мутирует — бросок фиксируется только
    /// после успешного спавна снаряда (`commit_throw`).
    pub fn aim(&self, target: Option<Vec3>) -> ThrowCommand {
        let origin = self.position;
        let dir = target
            .map(|t| (t - origin).normalize_or_zero())
            .filter(|d| *d != Vec3::ZERO)
            .unwrap_or_else(|| self.facing_dir());
        ThrowCommand {
            origin,
            dir,
            final_rotation: Quat::from_rotation_arc(Vec3::Z, dir),
        }
    }

    /// Зафиксировать состоявшийся бросок: каденция сбрасывается,
    /// real_position замораживается на origin до конца полёта.
    pub fn commit_throw(&mut self, cmd: &ThrowCommand, now: f32, shot: Entity) {
        self.last_throw_time = now;
        self.start_throw_position = cmd.origin;
        self.throw_dir = cmd.dir;
        self.final_rotation = cmd.final_rotation;
        self.active_shot = Some(shot);
    }

    /// Дочерний снаряд выбыл из симуляции
    pub fn shot_resolved(&mut self, shot: Entity) {
        if self.active_shot == Some(shot) {
            self.active_shot = None;
        }
    }
}

impl Actor for Spitter {
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
        self.rotation = self.spawn_rotation;
        self.last_throw_time = 0.0;
        self.final_rotation = self.spawn_rotation;
        self.start_throw_position = self.spawn_position;
        self.throw_dir = self.spawn_rotation * Vec3::Z;
        self.active_shot = None;
    }

    fn kill(&mut self) {
        self.lifecycle.kill();
        // Ссылка на дочерний снаряд отпускается; сам снаряд долетает
        self.active_shot = None;
    }

    fn update(&mut self, _clock: &Clock) {
        if !self.lifecycle.is_enabled() {
            return;
        }
        // Вне полёта real_position следует за телом
        if self.active_shot.is_none() {
            self.start_throw_position = self.position;
        }
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Пока снаряд в полёте — origin броска, не позиция тела: зависимые
    /// системы (aim assist, камера) в это окно ведут точку запуска.
    fn real_position(&self) -> Vec3 {
        self.start_throw_position
    }

    fn affected_by_electricity(&self) -> bool {
        true
    }
}

impl MotionState for Spitter {
    // Kinematic: движок только читает позу, запись не принимается
    fn get_world_transform(&self, out: &mut BodyTransform) {
        out.translation = self.position;
        out.rotation = self.rotation;
    }
}

impl ContactDispatch for Spitter {
    fn contact_with_player(&mut self, player: &mut Player, impulse: f32, clock: &Clock) {
        if !self.lifecycle.is_enabled() || impulse < MIN_CONTACT_IMPULSE {
            return;
        }
        if player.take_hit(TOUCH_DAMAGE, clock) {
            logger::log(&format!(
                "Spitter touch: player HP {} (impulse {:.2})",
                player.health().current,
                impulse
            ));
        }
    }

    fn contact_with_player_nuke(
        &mut self,
        player: &mut Player,
        _impulse: f32,
        _clock: &Clock,
        charge: i32,
    ) {
        if !self.lifecycle.is_enabled() {
            return;
        }
        // Nuke-empowered игрок уничтожает врага касанием
        player.consume_nuke_charge();
        self.kill();
        logger::log_info(&format!("💥 Spitter destroyed by nuke (charge {})", charge));
    }
}

/// Система: каденция бросков
///
/// Прицеливание по игроку (fallback — facing). При `PoolExhausted` попытка
/// отменяется без сброса таймера и без `ShotThrown` — cue-подсистемы про
/// отменённую попытку не узнают.
pub fn update_spitters(
    mut commands: Commands,
    clock: Res<Clock>,
    mut pool: ResMut<BodyPool>,
    mut shapes: ResMut<ShapeRegistry>,
    players: Query<&Transform, With<Player>>,
    mut spitters: Query<(Entity, &mut Spitter)>,
    mut thrown: EventWriter<ShotThrown>,
) {
    let target = players.iter().next().map(|t| t.translation);

    for (entity, mut spitter) in spitters.iter_mut() {
        spitter.update(&clock);

        if !spitter.ready_to_throw(&clock) {
            continue;
        }

        let cmd = spitter.aim(target);
        match pool.try_acquire() {
            Ok(()) => {
                let shot = projectile::spawn_shot(&mut commands, &mut shapes, entity, &cmd);
                spitter.commit_throw(&cmd, clock.actual_time(), shot);
                thrown.write(ShotThrown {
                    spitter: entity,
                    shot,
                    origin: cmd.origin,
                    dir: cmd.dir,
                });
            }
            Err(err) => {
                // Таймер не тронут — retry на следующем кадре
                logger::log_warning(&format!(
                    "Spitter {:?}: throw deferred ({})",
                    entity, err
                ));
            }
        }
    }
}

/// Система: применение электрического stun'а
///
/// Срабатывает только на акторах, чей capability-предикат отвечает true.
pub fn apply_electric_shocks(
    mut commands: Commands,
    mut events: EventReader<ElectricShock>,
    mut spitters: Query<&mut Spitter>,
) {
    for event in events.read() {
        let Ok(mut spitter) = spitters.get_mut(event.target) else {
            continue;
        };
        if !spitter.affected_by_electricity() || !spitter.lifecycle().is_enabled() {
            continue;
        }
        spitter.disable();
        commands.entity(event.target).insert(Shocked {
            remaining: SHOCK_STUN_SECS,
        });
        logger::log(&format!("⚡ Spitter {:?} stunned", event.target));
    }
}

/// Система: выход из stun'а по сглаженному delta
pub fn recover_from_shock(
    mut commands: Commands,
    clock: Res<Clock>,
    mut shocked: Query<(Entity, &mut Shocked, &mut Spitter)>,
) {
    for (entity, mut shock, mut spitter) in shocked.iter_mut() {
        shock.remaining -= clock.delta_time();
        if shock.remaining <= 0.0 {
            commands.entity(entity).remove::<Shocked>();
            spitter.enable();
        }
    }
}
