mod config;
mod query;
mod simulator;
mod world;

pub use config::PhysicsConfig;
pub use query::{GeometryQuery, ObjectTag, RayHit};
pub use simulator::{PhysicsSimulator, StepReport};
pub use world::{ActorShape, ArenaWorld};
