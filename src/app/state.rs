//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{Game, GameHandle, GameSettings, WorldConfig};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub game: GameHandle,
}

impl AppState {
    /// Spawn the game task and wrap its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Self {
        let settings = GameSettings::from(&config);
        let game = Game::new(WorldConfig::default(), settings).spawn();

        Self {
            config: Arc::new(config),
            game,
        }
    }
}
