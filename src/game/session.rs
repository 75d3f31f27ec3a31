//! Session registry - connection identity to player mapping

use std::collections::BTreeSet;

use uuid::Uuid;

use super::world::{WorldConfig, MAX_PLAYERS};

/// Longest display name kept after sanitizing
pub const MAX_NAME_LENGTH: usize = 16;

/// Authoritative player state
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Base slot, fixed for the lifetime of the connection
    pub slot: u8,
    pub color: &'static str,
    pub has_relic: bool,
    /// Client timestamp of the last accepted move (advisory only)
    pub last_timestamp: Option<f64>,
}

/// Join failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("game is full")]
    GameFull,

    #[error("connection already joined")]
    AlreadyJoined,
}

/// Owns every joined player, in join order
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: Vec<Player>,
    /// Slots handed out this game; a vacated slot stays here until reset
    issued: BTreeSet<u8>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player, spawning them at the center of their base
    pub fn join(
        &mut self,
        world: &WorldConfig,
        id: Uuid,
        requested_name: &str,
    ) -> Result<&Player, JoinError> {
        if self.get(&id).is_some() {
            return Err(JoinError::AlreadyJoined);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(JoinError::GameFull);
        }

        let base = world
            .bases
            .iter()
            .find(|b| !self.issued.contains(&b.slot))
            .ok_or(JoinError::GameFull)?;
        let slot = base.slot;
        self.issued.insert(slot);

        self.players.push(Player {
            id,
            name: sanitize_name(requested_name, slot),
            x: base.rect.x,
            y: base.rect.y,
            slot,
            color: base.color,
            has_relic: false,
            last_timestamp: None,
        });

        Ok(&self.players[self.players.len() - 1])
    }

    /// Remove a player. Slot issuance starts over once nobody is left.
    pub fn leave(&mut self, id: &Uuid) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == *id)?;
        let player = self.players.remove(idx);
        if self.is_empty() {
            self.issued.clear();
        }
        Some(player)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    /// All players in join order
    pub fn all(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Send everyone home without the relic and release vacated slots
    pub fn reset_positions(&mut self, world: &WorldConfig) {
        for player in &mut self.players {
            if let Some(base) = world.base(player.slot) {
                player.x = base.rect.x;
                player.y = base.rect.y;
            }
            player.has_relic = false;
            player.last_timestamp = None;
        }
        self.issued = self.players.iter().map(|p| p.slot).collect();
    }
}

fn sanitize_name(requested: &str, slot: u8) -> String {
    let trimmed: String = requested.trim().chars().take(MAX_NAME_LENGTH).collect();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        format!("Player {}", slot)
    } else {
        trimmed.to_string()
    }
}
