//! Game simulation modules

pub mod engine;
pub mod exploration;
pub mod outbox;
pub mod physics;
pub mod relic;
pub mod score;
pub mod session;
pub mod snapshot;
pub mod world;

pub use engine::{Game, GameHandle, GameInput, GameSettings};
pub use world::WorldConfig;
