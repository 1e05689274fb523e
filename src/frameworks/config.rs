use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub fn http_port() -> u16 {
    parsed("COMBAT_SERVER_PORT").unwrap_or(3001)
}

pub fn player_tick() -> Duration {
    Duration::from_millis(parsed("PLAYER_TICK_MS").unwrap_or(2500))
}

pub fn follower_tick() -> Duration {
    Duration::from_millis(parsed("FOLLOWER_TICK_MS").unwrap_or(400))
}

/// Fixed seed for the world's random source; entropy when unset.
pub fn rng_seed() -> Option<u64> {
    parsed("COMBAT_RNG_SEED")
}

/// JSON mob table to load instead of the built-in one.
pub fn mob_table_path() -> Option<String> {
    env::var("MOB_TABLE_PATH").ok().filter(|v| !v.trim().is_empty())
}

pub fn view_radius() -> f32 {
    parsed("VIEW_RADIUS").unwrap_or(8000.0)
}

/// Item/mission service base url. Rewards are only logged when unset.
pub fn reward_service_url() -> Option<String> {
    env::var("REWARD_SERVICE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

pub fn reward_timeout() -> Duration {
    Duration::from_millis(parsed("REWARD_TIMEOUT_MS").unwrap_or(1500))
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_BROADCAST_CAPACITY: usize = 256;
pub const REWARD_QUEUE_CAPACITY: usize = 512;
