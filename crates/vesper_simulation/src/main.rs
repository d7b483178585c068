//! Headless симуляция VESPER
//!
//! Запускает Bevy App без рендера: spitter обстреливает игрока,
//! gems разбросаны по уровню. Для smoke-прогонов и проверки детерминизма.

use bevy::prelude::*;
use vesper_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting VESPER headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    setup_demo_level(app.world_mut());

    // Прогоняем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let world = app.world_mut();
            let entity_count = world.entities().len();
            let clock = world.resource::<Clock>();
            println!(
                "Tick {}: {} entities, t={:.2}s, fps={:.0}",
                tick,
                entity_count,
                clock.actual_time(),
                clock.fps()
            );
        }
    }

    // Teardown уровня: shared shapes и пул освобождаются один раз
    let world = app.world_mut();
    world.resource_scope(|world, mut shapes: Mut<ShapeRegistry>| {
        let mut pool = world.resource_mut::<BodyPool>();
        stage::teardown_level(&mut shapes, &mut pool);
    });

    println!("Simulation complete!");
}

fn setup_demo_level(world: &mut World) {
    world.resource_scope(|world, mut shapes: Mut<ShapeRegistry>| {
        world.resource_scope(|world, mut rng: Mut<DeterministicRng>| {
            let mut commands = world.commands();

            stage::spawn_player(&mut commands, Vec3::new(4.0, 0.0, 0.0));
            stage::spawn_npc(&mut commands, Vec3::new(-4.0, 0.0, 2.0), 60, 2);
            stage::spawn_spitter(&mut commands, &mut shapes, &SpawnParams::at_grid(0, 0));
            stage::scatter_gems(&mut commands, &mut shapes, &mut rng, 8, 6.0);
        });
    });
    world.flush();
}
