//! Per-player capture counters

use std::collections::BTreeMap;

use uuid::Uuid;

use super::world::WIN_SCORE;

/// Capture counts keyed by player, bounded by `WIN_SCORE`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTable {
    scores: BTreeMap<Uuid, u32>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a player at zero
    pub fn insert(&mut self, id: Uuid) {
        self.scores.insert(id, 0);
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<u32> {
        self.scores.remove(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<u32> {
        self.scores.get(id).copied()
    }

    /// Add one capture; returns the new total, or None for unknown players
    pub fn increment(&mut self, id: &Uuid) -> Option<u32> {
        let score = self.scores.get_mut(id)?;
        *score = (*score + 1).min(WIN_SCORE);
        Some(*score)
    }

    /// True once a score has reached the win threshold
    pub fn is_winning(score: u32) -> bool {
        score >= WIN_SCORE
    }

    /// Zero every live entry
    pub fn reset(&mut self) {
        for score in self.scores.values_mut() {
            *score = 0;
        }
    }

    /// Copy of the table for transmission
    pub fn snapshot(&self) -> BTreeMap<Uuid, u32> {
        self.scores.clone()
    }
}
