//! Player / NPC — counterpart-акторы контактов
//!
//! Внутренности обоих вне зоны ядра: ядро зовёт только публичную
//! contact-reaction поверхность ниже и не лезет глубже.

use bevy::prelude::*;

use crate::clock::Clock;

/// Окно неуязвимости игрока после попадания (секунды, по clock)
pub const HIT_GRACE_SECS: f32 = 0.5;

/// Здоровье
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Debug, Clone, Copy, Reflect)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }
}

/// Игрок (contact-reaction поверхность)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Player {
    health: Health,
    /// Some(level) пока активен nuke power-up
    nuke_charge: Option<i32>,
    last_hit_time: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Player {
    pub fn new(max_hp: u32) -> Self {
        Self {
            health: Health::new(max_hp),
            nuke_charge: None,
            last_hit_time: f32::NEG_INFINITY,
        }
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn nuke_charge(&self) -> Option<i32> {
        self.nuke_charge
    }

    pub fn arm_nuke(&mut self, charge: i32) {
        self.nuke_charge = Some(charge.max(1));
    }

    /// Один уровень заряда сгорает при каждом поглощённом контакте
    pub fn consume_nuke_charge(&mut self) {
        self.nuke_charge = match self.nuke_charge {
            Some(charge) if charge > 1 => Some(charge - 1),
            _ => None,
        };
    }

    /// Принять попадание. Возвращает false если попадание съедено
    /// grace-окном (урон не прошёл).
    pub fn take_hit(&mut self, damage: u32, clock: &Clock) -> bool {
        let now = clock.actual_time();
        if now - self.last_hit_time < HIT_GRACE_SECS {
            return false;
        }
        self.health.take_damage(damage);
        self.last_hit_time = now;
        true
    }
}

/// NPC (contact-reaction поверхность)
///
/// `effect_data` — сторона NPC в асимметричной паре effect-данных контакта
/// (вторую сторону несёт снаряд).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Npc {
    health: Health,
    effect_data: i32,
    last_effect_received: i32,
}

impl Npc {
    pub fn new(max_hp: u32, effect_data: i32) -> Self {
        Self {
            health: Health::new(max_hp),
            effect_data,
            last_effect_received: 0,
        }
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn effect_data(&self) -> i32 {
        self.effect_data
    }

    pub fn last_effect_received(&self) -> i32 {
        self.last_effect_received
    }

    /// Принять попадание снаряда; `effect` — effect-данные стороны снаряда
    pub fn take_projectile_hit(&mut self, damage: u32, effect: i32) {
        self.health.take_damage(damage);
        self.last_effect_received = effect;
    }
}
