//! Contact dispatch — типизированные реакции на столкновения
//!
//! Правила игры качественно различаются по тому, КТО задет (player vs NPC vs
//! nuke-empowered player), поэтому вместо одного generic on-collision
//! handler'а — закрытый набор типизированных реакций. Это не plugin-surface:
//! новые виды counterpart'ов не предполагаются.
//!
//! Поток: rapier `ContactForceEvent`/`CollisionEvent` → `collect_contact_events`
//! классифицирует counterpart → `ContactEvent` → `dispatch_contacts` зовёт
//! реакцию актора. Реакции выполняются на critical path шага симуляции —
//! никакого blocking I/O и unbounded work внутри.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::actors::collectible::Gem;
use crate::actors::counterparts::{Npc, Player};
use crate::actors::projectile::Shot;
use crate::actors::spitter::Spitter;
use crate::actors::Actor;
use crate::clock::Clock;
use crate::logger;

/// Контакты со слабее этого closing impulse игнорируются (grazing touch)
pub const MIN_CONTACT_IMPULSE: f32 = 0.05;

/// Кто оказался по другую сторону контакта
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartKind {
    Player,
    /// Специальный усиленный вариант контакта с игроком под nuke
    /// (несёт уровень заряда)
    PlayerNuke { charge: i32 },
    /// NPC несёт собственные effect-данные (вторая сторона асимметричной пары)
    Npc { data: i32 },
}

/// Контакт, доставленный физическим движком
#[derive(Event, Debug, Clone)]
pub struct ContactEvent {
    /// Актор, которому адресована реакция
    pub actor: Entity,
    pub counterpart: Entity,
    pub kind: CounterpartKind,
    /// Closing impulse magnitude
    pub impulse: f32,
}

/// Событие: игрок подобрал gem (sensor overlap)
#[derive(Event, Debug, Clone)]
pub struct GemCollected {
    pub gem: Entity,
    pub player: Entity,
}

/// Типизированные contact-реакции актора
///
/// Каждая получает closing impulse и активный Clock — реакции могут быть
/// impulse-threshold-gated и планировать отложенные по времени эффекты.
/// Defaults — silent no-op: каждый вид актора переопределяет ровно свой
/// поднабор (движок может доставить контакт, на который данный вид не
/// реагирует).
pub trait ContactDispatch {
    fn contact_with_player(&mut self, _player: &mut Player, _impulse: f32, _clock: &Clock) {}

    fn contact_with_player_nuke(
        &mut self,
        _player: &mut Player,
        _impulse: f32,
        _clock: &Clock,
        _charge: i32,
    ) {
    }

    fn contact_with_npc(
        &mut self,
        _npc: &mut Npc,
        _impulse: f32,
        _clock: &Clock,
        _own_data: i32,
        _other_data: i32,
    ) {
    }
}

/// Система: классификация rapier-событий в типизированные `ContactEvent`
///
/// Для каждой пары коллайдеров пробуем обе ориентации (actor, counterpart) —
/// contact force event не упорядочен. Пары без dispatching-актора или без
/// известного counterpart'а молча отбрасываются.
pub fn collect_contact_events(
    mut force_events: EventReader<ContactForceEvent>,
    mut collision_events: EventReader<CollisionEvent>,
    shots: Query<(), With<Shot>>,
    spitters: Query<(), With<Spitter>>,
    players: Query<&Player>,
    npcs: Query<&Npc>,
    gems: Query<(), With<Gem>>,
    mut contacts: EventWriter<ContactEvent>,
    mut pickups: EventWriter<GemCollected>,
) {
    for event in force_events.read() {
        let pair = [
            (event.collider1, event.collider2),
            (event.collider2, event.collider1),
        ];
        for (actor, counterpart) in pair {
            if !shots.contains(actor) && !spitters.contains(actor) {
                continue;
            }
            let kind = if let Ok(player) = players.get(counterpart) {
                match player.nuke_charge() {
                    Some(charge) => CounterpartKind::PlayerNuke { charge },
                    None => CounterpartKind::Player,
                }
            } else if let Ok(npc) = npcs.get(counterpart) {
                CounterpartKind::Npc {
                    data: npc.effect_data(),
                }
            } else {
                continue;
            };

            contacts.write(ContactEvent {
                actor,
                counterpart,
                kind,
                impulse: event.total_force_magnitude,
            });
        }
    }

    // Gem pickup — sensor overlap, импульса нет
    for event in collision_events.read() {
        let CollisionEvent::Started(e1, e2, _) = event else {
            continue;
        };
        for (gem, player) in [(*e1, *e2), (*e2, *e1)] {
            if gems.contains(gem) && players.contains(player) {
                pickups.write(GemCollected { gem, player });
            }
        }
    }
}

/// Система: роутинг `ContactEvent` в типизированные реакции
///
/// Контакты для disabled/dead акторов — silent no-op: движок может доставить
/// последний in-flight callback после kill, выданного в том же кадре.
pub fn dispatch_contacts(
    clock: Res<Clock>,
    mut contact_events: EventReader<ContactEvent>,
    mut shots: Query<&mut Shot>,
    mut spitters: Query<&mut Spitter>,
    mut players: Query<&mut Player>,
    mut npcs: Query<&mut Npc>,
) {
    for event in contact_events.read() {
        if let Ok(mut shot) = shots.get_mut(event.actor) {
            if !shot.lifecycle().is_enabled() {
                continue;
            }
            match event.kind {
                CounterpartKind::Player => {
                    if let Ok(mut player) = players.get_mut(event.counterpart) {
                        shot.contact_with_player(&mut player, event.impulse, &clock);
                    }
                }
                CounterpartKind::PlayerNuke { charge } => {
                    if let Ok(mut player) = players.get_mut(event.counterpart) {
                        shot.contact_with_player_nuke(&mut player, event.impulse, &clock, charge);
                    }
                }
                CounterpartKind::Npc { data } => {
                    if let Ok(mut npc) = npcs.get_mut(event.counterpart) {
                        let own_data = shot.effect_data();
                        shot.contact_with_npc(&mut npc, event.impulse, &clock, own_data, data);
                    }
                }
            }
            continue;
        }

        if let Ok(mut spitter) = spitters.get_mut(event.actor) {
            if !spitter.lifecycle().is_enabled() {
                continue;
            }
            match event.kind {
                CounterpartKind::Player => {
                    if let Ok(mut player) = players.get_mut(event.counterpart) {
                        spitter.contact_with_player(&mut player, event.impulse, &clock);
                    }
                }
                CounterpartKind::PlayerNuke { charge } => {
                    if let Ok(mut player) = players.get_mut(event.counterpart) {
                        spitter.contact_with_player_nuke(
                            &mut player,
                            event.impulse,
                            &clock,
                            charge,
                        );
                    }
                }
                // Spitter на NPC-контакты не реагирует (default no-op),
                // событие даже не роутим
                CounterpartKind::Npc { .. } => {}
            }
            continue;
        }

        logger::log(&format!(
            "Contact for unknown/removed actor {:?} dropped",
            event.actor
        ));
    }
}
