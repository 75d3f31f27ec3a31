//! Exploration ledger - union of every tile any client has reported seeing
//!
//! The ledger only grows until a full reset. It is never pushed to connected
//! clients; new joiners receive it in their initial state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Grid coordinate of one exploration tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub x: i32,
    pub y: i32,
}

#[cfg(test)]
impl TileKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Grow-only set of explored tiles
#[derive(Debug, Clone)]
pub struct ExplorationLedger {
    tiles: BTreeSet<TileKey>,
    columns: i32,
    rows: i32,
}

impl ExplorationLedger {
    /// Create an empty ledger for a `columns` x `rows` grid
    pub fn new(columns: i32, rows: i32) -> Self {
        Self {
            tiles: BTreeSet::new(),
            columns,
            rows,
        }
    }

    pub fn in_grid(&self, tile: &TileKey) -> bool {
        (0..self.columns).contains(&tile.x) && (0..self.rows).contains(&tile.y)
    }

    /// Union the reported tiles in. Off-grid keys are skipped.
    /// Returns how many tiles were new.
    pub fn merge<I>(&mut self, tiles: I) -> usize
    where
        I: IntoIterator<Item = TileKey>,
    {
        let mut added = 0;
        for tile in tiles {
            if self.in_grid(&tile) && self.tiles.insert(tile) {
                added += 1;
            }
        }
        added
    }

    #[cfg(test)]
    pub fn contains(&self, tile: &TileKey) -> bool {
        self.tiles.contains(tile)
    }

    /// Every explored tile, in grid order
    pub fn snapshot(&self) -> Vec<TileKey> {
        self.tiles.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_idempotent() {
        let mut ledger = ExplorationLedger::new(20, 20);
        let tiles = [TileKey::new(1, 1), TileKey::new(2, 1), TileKey::new(1, 1)];

        assert_eq!(ledger.merge(tiles), 2);
        assert_eq!(ledger.merge(tiles), 0);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_ledger_only_grows() {
        let mut ledger = ExplorationLedger::new(20, 20);
        let reports = [
            vec![TileKey::new(0, 0), TileKey::new(0, 1)],
            vec![TileKey::new(0, 1), TileKey::new(5, 5)],
            vec![],
            vec![TileKey::new(0, 0)],
        ];

        for report in reports {
            let before: BTreeSet<TileKey> = ledger.snapshot().into_iter().collect();
            ledger.merge(report.clone());
            let after: BTreeSet<TileKey> = ledger.snapshot().into_iter().collect();
            assert!(after.is_superset(&before));
            assert!(report.iter().all(|t| ledger.contains(t)));
        }
    }

    #[test]
    fn test_off_grid_tiles_are_skipped() {
        let mut ledger = ExplorationLedger::new(20, 20);
        let added = ledger.merge([
            TileKey::new(-1, 0),
            TileKey::new(20, 3),
            TileKey::new(3, 20),
            TileKey::new(19, 19),
        ]);
        assert_eq!(added, 1);
        assert!(ledger.contains(&TileKey::new(19, 19)));
    }

    #[test]
    fn test_clear() {
        let mut ledger = ExplorationLedger::new(20, 20);
        ledger.merge([TileKey::new(3, 4)]);
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
