//! VESPER Simulation Core
//!
//! Entity-update и physics-contact ядро экшн-игры:
//! - Clock: монотонное сглаженное время, от него вся игровая каденция
//! - Lifecycle: enabled/disabled/dead state machine всех акторов
//! - Physics boundary: rapier шагает тела, ядро обменивается с ним
//!   трансформами и принимает contact-события
//! - Акторы: spitter (бросает снаряд по каденции), shot (одноразовый
//!   снаряд), gem (collectible с shared collision shape)
//!
//! Однопоточная frame-stepped семантика: один проход систем на тик
//! FixedUpdate, никакая операция не блокирует и не реентерится.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod actors;
pub mod clock;
pub mod lifecycle;
pub mod logger;
pub mod physics;
pub mod stage;

// Re-export базовых типов для удобства
pub use actors::{
    Actor, ActorKind, ElectricShock, Gem, Health, Npc, Player, Shocked, Shot, ShotThrown,
    SpawnParams, Spitter, ThrowCommand,
};
pub use clock::{
    Clock, ClockConfig, ManualTicks, MonotonicTicks, SmoothingWindow, TickSource,
    FPS_REFRESH_INTERVAL,
};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use physics::{
    BodyPool, BodyTransform, ContactDispatch, ContactEvent, CounterpartKind, GemCollected,
    MotionState, PoolExhausted, ShapeRegistry,
};

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Порядок шага:
/// 1. tick_clock — один Clock::update на тик
/// 2. stun recovery / apply — электричество
/// 3. update_spitters — каденция бросков, спавн снарядов
/// 4. update_shots / update_gems — kind-specific поведение
/// 5. push kinematic transforms — logical поза → движок
/// 6. (rapier step)
/// 7. pull dynamic transforms — движок → logical поза снарядов
/// 8. collect + dispatch contacts — типизированные реакции
/// 9. cleanup_actors — уборка выбывших
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz для simulation tick (легче считать интервалы)
        app.insert_resource(Time::<Fixed>::from_hz(60.0));

        // Clock не перетираем: тест/host мог заранее вставить свой
        // (например, на ManualTicks)
        if !app.world().contains_resource::<Clock>() {
            app.insert_resource(Clock::new(ClockConfig {
                smoothing: SmoothingWindow::Wide,
                track_fps: true,
            }));
        }

        app.init_resource::<DeterministicRng>()
            .init_resource::<ShapeRegistry>()
            .init_resource::<BodyPool>();

        app.add_event::<ShotThrown>()
            .add_event::<ElectricShock>()
            .add_event::<ContactEvent>()
            .add_event::<GemCollected>();

        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule());

        app.add_systems(Startup, stage::start_simulation_clock);

        // До physics step
        app.add_systems(
            FixedUpdate,
            (
                stage::tick_clock,
                actors::spitter::recover_from_shock,
                actors::spitter::apply_electric_shocks,
                actors::spitter::update_spitters,
                actors::projectile::update_shots,
                actors::collectible::update_gems,
                physics::bridge::push_spitter_transforms,
                physics::bridge::push_gem_transforms,
            )
                .chain() // Последовательное выполнение
                .before(PhysicsSet::SyncBackend),
        );

        // После physics writeback
        app.add_systems(
            FixedPostUpdate,
            (
                physics::bridge::pull_shot_transforms,
                physics::contacts::collect_contact_events,
                physics::contacts::dispatch_contacts,
                stage::cleanup_actors,
            )
                .chain()
                .after(PhysicsSet::Writeback),
        );
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}
