//! Integration test симуляции
//!
//! Headless App + ManualTicks: время двигает тест, расписания гоняем
//! напрямую (FixedUpdate → FixedPostUpdate) — полный детерминизм без
//! зависимости от wall-clock. Contact-события движка подаём руками —
//! физический движок внешний collaborator, здесь он застаблен.

use bevy::prelude::*;
use vesper_simulation::*;

fn create_sim_app(seed: u64) -> (App, ManualTicks) {
    let ticks = ManualTicks::new();
    let mut clock = Clock::with_source(
        ClockConfig {
            smoothing: SmoothingWindow::Wide,
            track_fps: false,
        },
        Box::new(ticks.clone()),
    );
    clock.start();

    let mut app = create_headless_app(seed);
    app.insert_resource(clock);
    app.add_plugins(SimulationPlugin);
    (app, ticks)
}

/// Один шаг симуляции: продвинуть время, прогнать оба расписания
fn step(app: &mut App, ticks: &ManualTicks, dt: f32) {
    ticks.advance(dt);
    app.world_mut().run_schedule(FixedUpdate);
    app.world_mut().run_schedule(FixedPostUpdate);
}

fn with_stage<R>(
    world: &mut World,
    f: impl FnOnce(&mut Commands, &mut ShapeRegistry, &mut DeterministicRng) -> R,
) -> R {
    let result = world.resource_scope(|world, mut shapes: Mut<ShapeRegistry>| {
        world.resource_scope(|world, mut rng: Mut<DeterministicRng>| {
            let mut commands = world.commands();
            f(&mut commands, &mut shapes, &mut rng)
        })
    });
    world.flush();
    result
}

fn shot_entities(app: &mut App) -> Vec<Entity> {
    let world = app.world_mut();
    world
        .query_filtered::<Entity, With<Shot>>()
        .iter(world)
        .collect()
}

#[test]
fn test_throw_cadence_end_to_end() {
    let (mut app, ticks) = create_sim_app(42);

    with_stage(app.world_mut(), |commands, shapes, _| {
        stage::spawn_spitter(commands, shapes, &SpawnParams::at_grid(0, 0))
    });

    // 12 шагов по 0.016s — каденция 0.2s ещё не выдержана
    for _ in 0..12 {
        step(&mut app, &ticks, 0.016);
    }
    assert_eq!(shot_entities(&mut app).len(), 0, "throw fired early");

    // 13-й шаг: accumulated 0.208 >= 0.2 — ровно один бросок
    step(&mut app, &ticks, 0.016);
    assert_eq!(shot_entities(&mut app).len(), 1);

    // Два броска никогда не ближе каденции: к 25-му шагу второго ещё нет,
    // на 26-м — есть
    for _ in 13..25 {
        step(&mut app, &ticks, 0.016);
    }
    assert_eq!(shot_entities(&mut app).len(), 1);
    step(&mut app, &ticks, 0.016);
    assert_eq!(shot_entities(&mut app).len(), 2);

    // Cue-событие на каждый состоявшийся бросок
    let events = app.world().resource::<Events<ShotThrown>>();
    assert_eq!(events.len(), 2);
}

#[test]
fn test_pool_exhaustion_defers_throw_without_losing_it() {
    let (mut app, ticks) = create_sim_app(42);
    app.insert_resource(BodyPool::with_capacity(0));

    with_stage(app.world_mut(), |commands, shapes, _| {
        stage::spawn_spitter(commands, shapes, &SpawnParams::at_grid(0, 0))
    });

    // Каденция давно выдержана, но пул пуст — бросков нет
    for _ in 0..30 {
        step(&mut app, &ticks, 0.016);
    }
    assert_eq!(shot_entities(&mut app).len(), 0);
    assert!(app.world().resource::<Events<ShotThrown>>().is_empty());

    // Пул освободился — retry срабатывает на первом же eligible кадре
    app.insert_resource(BodyPool::with_capacity(8));
    step(&mut app, &ticks, 0.016);
    assert_eq!(shot_entities(&mut app).len(), 1);
}

#[test]
fn test_projectile_single_use_through_dispatch() {
    let (mut app, ticks) = create_sim_app(42);

    let player = with_stage(app.world_mut(), |commands, _, _| {
        stage::spawn_player(commands, Vec3::new(3.0, 0.0, 0.0))
    });
    with_stage(app.world_mut(), |commands, shapes, _| {
        stage::spawn_spitter(commands, shapes, &SpawnParams::at_grid(0, 0))
    });

    // Догоняем до первого броска
    for _ in 0..13 {
        step(&mut app, &ticks, 0.016);
    }
    let shots = shot_entities(&mut app);
    assert_eq!(shots.len(), 1);
    let shot = shots[0];
    assert_eq!(app.world().resource::<BodyPool>().in_use(), 1);

    // Движок доставляет два контакта в одном шаге — реакция ровно одна
    app.world_mut().send_event(ContactEvent {
        actor: shot,
        counterpart: player,
        kind: CounterpartKind::Player,
        impulse: 1.0,
    });
    app.world_mut().send_event(ContactEvent {
        actor: shot,
        counterpart: player,
        kind: CounterpartKind::Player,
        impulse: 1.0,
    });
    step(&mut app, &ticks, 0.016);

    let hp = app.world().get::<Player>(player).unwrap().health().current;
    assert_eq!(hp, 85, "exactly one reaction must land");

    // Одноразовый снаряд убран владельцем, слот пула вернулся
    assert!(app.world().get_entity(shot).is_err());
    assert_eq!(app.world().resource::<BodyPool>().in_use(), 0);
}

#[test]
fn test_late_contact_for_removed_shot_is_silent() {
    let (mut app, ticks) = create_sim_app(42);

    let player = with_stage(app.world_mut(), |commands, _, _| {
        stage::spawn_player(commands, Vec3::new(3.0, 0.0, 0.0))
    });
    with_stage(app.world_mut(), |commands, shapes, _| {
        stage::spawn_spitter(commands, shapes, &SpawnParams::at_grid(0, 0))
    });

    for _ in 0..13 {
        step(&mut app, &ticks, 0.016);
    }
    let shot = shot_entities(&mut app)[0];

    app.world_mut().send_event(ContactEvent {
        actor: shot,
        counterpart: player,
        kind: CounterpartKind::Player,
        impulse: 1.0,
    });
    step(&mut app, &ticks, 0.016);
    assert!(app.world().get_entity(shot).is_err());

    // Запоздавший callback после удаления — no-op, не паника
    app.world_mut().send_event(ContactEvent {
        actor: shot,
        counterpart: player,
        kind: CounterpartKind::Player,
        impulse: 1.0,
    });
    step(&mut app, &ticks, 0.016);
    let hp = app.world().get::<Player>(player).unwrap().health().current;
    assert_eq!(hp, 85);
}

#[test]
fn test_kill_absorbs_all_further_behavior() {
    let (mut app, ticks) = create_sim_app(42);

    let spitter = with_stage(app.world_mut(), |commands, shapes, _| {
        stage::spawn_spitter(commands, shapes, &SpawnParams::at_grid(0, 0))
    });

    {
        let mut component = app.world_mut().get_mut::<Spitter>(spitter).unwrap();
        Actor::kill(&mut *component);
    }

    // Времени проходит с запасом на десяток бросков — ни одного
    for _ in 0..60 {
        step(&mut app, &ticks, 0.016);
    }
    assert_eq!(shot_entities(&mut app).len(), 0);

    // Мёртвого актора удаляет владелец
    assert!(app.world().get_entity(spitter).is_err());
}

#[test]
fn test_gems_share_one_shape_and_get_collected() {
    let (mut app, ticks) = create_sim_app(42);

    let player = with_stage(app.world_mut(), |commands, _, _| {
        stage::spawn_player(commands, Vec3::ZERO)
    });
    let gems = with_stage(app.world_mut(), |commands, shapes, rng| {
        stage::scatter_gems(commands, shapes, rng, 5, 6.0)
    });
    assert_eq!(gems.len(), 5);

    // N gem'ов → ровно одно построение shared shape
    assert_eq!(app.world().resource::<ShapeRegistry>().build_count(), 1);

    // Сенсорный overlap (застабленный) → gem собран и удалён владельцем
    app.world_mut().send_event(GemCollected {
        gem: gems[0],
        player,
    });
    step(&mut app, &ticks, 0.016);
    assert!(app.world().get_entity(gems[0]).is_err());

    // Остальные на месте
    for gem in &gems[1..] {
        assert!(app.world().get_entity(*gem).is_ok());
    }
}

#[test]
fn test_electric_shock_stuns_then_recovers() {
    let (mut app, ticks) = create_sim_app(42);

    let spitter = with_stage(app.world_mut(), |commands, shapes, _| {
        stage::spawn_spitter(commands, shapes, &SpawnParams::at_grid(0, 0))
    });

    app.world_mut().send_event(ElectricShock { target: spitter });
    step(&mut app, &ticks, 0.016);

    {
        let world = app.world();
        let component = world.get::<Spitter>(spitter).unwrap();
        assert!(!component.lifecycle().is_enabled(), "stun must disable");
        assert!(world.get::<Shocked>(spitter).is_some());
    }

    // Stunned spitter не бросает
    for _ in 0..10 {
        step(&mut app, &ticks, 0.016);
    }
    assert_eq!(shot_entities(&mut app).len(), 0);

    // Пересиживаем stun с запасом (smoothed delta греется с нуля)
    for _ in 0..40 {
        step(&mut app, &ticks, 0.1);
    }
    let world = app.world();
    assert!(world.get::<Shocked>(spitter).is_none());
    assert!(world
        .get::<Spitter>(spitter)
        .unwrap()
        .lifecycle()
        .is_enabled());
}
