//! Static arena layout and game rule constants

/// Arena width in world units
pub const ARENA_WIDTH: f64 = 1000.0;
/// Arena height in world units
pub const ARENA_HEIGHT: f64 = 1000.0;
/// Hard cap on simultaneously joined players
pub const MAX_PLAYERS: usize = 4;
/// Max distance between a player and the idle relic for a grab
pub const GRAB_RANGE: f64 = 100.0;
/// Max distance between the holder and their own base center for a delivery
pub const SCORE_RANGE: f64 = 100.0;
/// Captures needed to win a game
pub const WIN_SCORE: u32 = 3;
/// Edge length of one exploration tile
pub const TILE_SIZE: f64 = 50.0;
/// Player collision radius used for boundary and obstacle padding
pub const PLAYER_RADIUS: f64 = 15.0;

/// Axis-aligned rectangle described by its center and size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }
}

/// A player's home zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Base {
    /// Slot number, 1..=MAX_PLAYERS
    pub slot: u8,
    pub rect: Rect,
    pub color: &'static str,
}

/// Immutable arena description, built once at startup
#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    pub tile_size: f64,
    pub obstacles: Vec<Rect>,
    pub bases: Vec<Base>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            tile_size: TILE_SIZE,
            obstacles: vec![
                Rect::new(300.0, 250.0, 120.0, 40.0),
                Rect::new(700.0, 250.0, 120.0, 40.0),
                Rect::new(300.0, 750.0, 120.0, 40.0),
                Rect::new(700.0, 750.0, 120.0, 40.0),
                Rect::new(200.0, 500.0, 40.0, 160.0),
                Rect::new(800.0, 500.0, 40.0, 160.0),
            ],
            // One base per corner, slot order is join order
            bases: vec![
                Base { slot: 1, rect: Rect::new(100.0, 100.0, 120.0, 120.0), color: "#e74c3c" },
                Base { slot: 2, rect: Rect::new(900.0, 100.0, 120.0, 120.0), color: "#3498db" },
                Base { slot: 3, rect: Rect::new(100.0, 900.0, 120.0, 120.0), color: "#2ecc71" },
                Base { slot: 4, rect: Rect::new(900.0, 900.0, 120.0, 120.0), color: "#f1c40f" },
            ],
        }
    }
}

impl WorldConfig {
    /// Where the relic spawns and respawns
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn base(&self, slot: u8) -> Option<&Base> {
        self.bases.iter().find(|b| b.slot == slot)
    }

    /// Number of tile columns and rows in the exploration grid
    pub fn tile_grid(&self) -> (i32, i32) {
        (
            (self.width / self.tile_size).ceil() as i32,
            (self.height / self.tile_size).ceil() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::CollisionSystem;

    #[test]
    fn default_layout_has_one_base_per_slot() {
        let world = WorldConfig::default();
        assert_eq!(world.bases.len(), MAX_PLAYERS);
        for slot in 1..=MAX_PLAYERS as u8 {
            assert!(world.base(slot).is_some());
        }
        assert!(world.base(0).is_none());
        assert!(world.base(5).is_none());
    }

    #[test]
    fn spawn_points_are_clear() {
        let world = WorldConfig::default();
        for base in &world.bases {
            assert!(!CollisionSystem::check_collision(&world, base.rect.x, base.rect.y));
        }
        let (cx, cy) = world.center();
        assert!(!CollisionSystem::check_collision(&world, cx, cy));
    }

    #[test]
    fn tile_grid_is_twenty_square() {
        assert_eq!(WorldConfig::default().tile_grid(), (20, 20));
    }
}
