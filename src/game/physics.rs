//! Geometry and movement collision checks

use super::world::{Rect, WorldConfig, PLAYER_RADIUS};

/// Stateless collision helpers used by movement validation
pub struct CollisionSystem;

impl CollisionSystem {
    /// Euclidean distance between two points
    pub fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
        let dx = bx - ax;
        let dy = by - ay;
        (dx * dx + dy * dy).sqrt()
    }

    /// True if a disc of `radius` centered at (x, y) lies fully inside the arena
    pub fn boundary_contains(world: &WorldConfig, x: f64, y: f64, radius: f64) -> bool {
        x - radius >= 0.0
            && x + radius <= world.width
            && y - radius >= 0.0
            && y + radius <= world.height
    }

    /// True if a disc overlaps the rectangle.
    ///
    /// Tested as a point against the rectangle grown by `radius` on every side,
    /// so the rounded corners of the true Minkowski sum count as overlap.
    pub fn rect_overlap(x: f64, y: f64, radius: f64, rect: &Rect) -> bool {
        let half_w = rect.half_width() + radius;
        let half_h = rect.half_height() + radius;
        (x - rect.x).abs() < half_w && (y - rect.y).abs() < half_h
    }

    /// Boundary violation or overlap with any obstacle
    pub fn check_collision(world: &WorldConfig, x: f64, y: f64) -> bool {
        if !Self::boundary_contains(world, x, y, PLAYER_RADIUS) {
            return true;
        }

        world
            .obstacles
            .iter()
            .any(|obstacle| Self::rect_overlap(x, y, PLAYER_RADIUS, obstacle))
    }
}
