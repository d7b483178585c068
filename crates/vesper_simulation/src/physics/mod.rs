//! Physics boundary — мост между game-логикой и rigid-body движком
//!
//! Ядро НЕ решает физику: оно отдаёт движку kinematic-трансформы, забирает
//! обратно интегрированные позы dynamic-тел и принимает contact-события.
//! Rapier шагает в своих PhysicsSet, наши sync-системы стоят вокруг шага.

pub mod bridge;
pub mod contacts;
pub mod shapes;

pub use bridge::{BodyTransform, MotionState};
pub use contacts::{ContactDispatch, ContactEvent, CounterpartKind, GemCollected};
pub use shapes::{BodyPool, PoolExhausted, ShapeRegistry};
