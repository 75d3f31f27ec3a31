//! Relic state machine
//!
//! The relic is always in exactly one of three phases:
//! - `Idle`: on the ground, anyone in range may grab it
//! - `Held`: carried by one player
//! - `Respawning`: delivered, waiting out its cooldown, cannot be grabbed
//!
//! Only the game task mutates it. Every transition checks its preconditions
//! and leaves the relic untouched on failure.

use uuid::Uuid;

use super::physics::CollisionSystem;
use super::world::GRAB_RANGE;

/// Relic phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelicPhase {
    Idle,
    Held(Uuid),
    Respawning,
}

/// Rejected relic transitions
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RelicError {
    #[error("relic is not idle")]
    NotIdle,

    #[error("player does not hold the relic")]
    NotHolder,

    #[error("relic is {distance:.1} units away")]
    OutOfRange { distance: f64 },

    #[error("relic is not respawning")]
    NotRespawning,
}

/// The single shared objective
#[derive(Debug, Clone, PartialEq)]
pub struct RelicState {
    pub x: f64,
    pub y: f64,
    phase: RelicPhase,
    /// Where the relic returns to after a delivery or reset
    home: (f64, f64),
}

impl RelicState {
    /// Create an idle relic resting at `home`
    pub fn new(home: (f64, f64)) -> Self {
        Self {
            x: home.0,
            y: home.1,
            phase: RelicPhase::Idle,
            home,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> RelicPhase {
        self.phase
    }

    pub fn is_held(&self) -> bool {
        matches!(self.phase, RelicPhase::Held(_))
    }

    pub fn holder_id(&self) -> Option<Uuid> {
        match self.phase {
            RelicPhase::Held(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_respawning(&self) -> bool {
        self.phase == RelicPhase::Respawning
    }

    /// Idle -> Held. The grabber must be within `GRAB_RANGE` of the relic.
    pub fn grab(&mut self, player_id: Uuid, px: f64, py: f64) -> Result<(), RelicError> {
        if self.phase != RelicPhase::Idle {
            return Err(RelicError::NotIdle);
        }

        let distance = CollisionSystem::distance(px, py, self.x, self.y);
        if distance > GRAB_RANGE {
            return Err(RelicError::OutOfRange { distance });
        }

        self.phase = RelicPhase::Held(player_id);
        Ok(())
    }

    /// Held -> Respawning after a delivery. The relic goes back home but
    /// stays locked until `respawn`.
    pub fn deliver(&mut self, player_id: Uuid) -> Result<(), RelicError> {
        if self.holder_id() != Some(player_id) {
            return Err(RelicError::NotHolder);
        }

        self.phase = RelicPhase::Respawning;
        (self.x, self.y) = self.home;
        Ok(())
    }

    /// Held -> Idle at the holder's last position. Only a disconnect
    /// triggers this; the relic is grabbable again immediately.
    pub fn drop_at(&mut self, player_id: Uuid, x: f64, y: f64) -> Result<(), RelicError> {
        if self.holder_id() != Some(player_id) {
            return Err(RelicError::NotHolder);
        }

        self.phase = RelicPhase::Idle;
        self.x = x;
        self.y = y;
        Ok(())
    }

    /// Respawning -> Idle at home
    pub fn respawn(&mut self) -> Result<(), RelicError> {
        if self.phase != RelicPhase::Respawning {
            return Err(RelicError::NotRespawning);
        }

        self.phase = RelicPhase::Idle;
        (self.x, self.y) = self.home;
        Ok(())
    }

    /// Back to a fresh idle relic at home, whatever the current phase
    pub fn reset(&mut self) {
        *self = Self::new(self.home);
    }
}
