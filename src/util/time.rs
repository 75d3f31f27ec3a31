//! Time utilities and game timer constants

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Cooldown between a successful delivery and the relic becoming grabbable again
pub const RELIC_RESPAWN_DELAY: Duration = Duration::from_millis(5_000);

/// Delay between a win and the full game reset
pub const GAME_RESET_DELAY: Duration = Duration::from_millis(10_000);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_delays_are_fixed() {
        assert_eq!(RELIC_RESPAWN_DELAY.as_millis(), 5_000);
        assert_eq!(GAME_RESET_DELAY.as_millis(), 10_000);
    }

    #[test]
    fn uptime_starts_near_zero() {
        init_server_time();
        assert!(uptime_secs() < 5);
        assert!(unix_millis() > 0);
    }
}
