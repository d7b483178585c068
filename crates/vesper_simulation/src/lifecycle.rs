//! Lifecycle state machine, общий для всех видов акторов
//!
//! `Disabled ⇄ Enabled`, терминальный `Dead` (absorbing — из Dead не выводит
//! никакая операция, только полный respawn владельцем). Невалидные переходы —
//! silent no-op: physics может доставить последний in-flight callback после
//! kill в том же кадре.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum LifecycleState {
    #[default]
    Disabled,
    Enabled,
    Dead,
}

/// Встраивается в каждый актор; актор не участвует в update и contact
/// dispatch вне состояния `Enabled`.
#[derive(Debug, Clone, Copy, Default, Reflect)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == LifecycleState::Enabled
    }

    pub fn is_dead(&self) -> bool {
        self.state == LifecycleState::Dead
    }

    pub fn enable(&mut self) {
        if self.state == LifecycleState::Disabled {
            self.state = LifecycleState::Enabled;
        }
    }

    pub fn disable(&mut self) {
        if self.state == LifecycleState::Enabled {
            self.state = LifecycleState::Disabled;
        }
    }

    /// Необратимо. Достижимо только из Enabled; у мёртвого и так Dead.
    pub fn kill(&mut self) {
        if self.state == LifecycleState::Enabled {
            self.state = LifecycleState::Dead;
        }
    }
}
