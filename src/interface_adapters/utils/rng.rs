use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Process-unique id for tagging connections in logs and session ownership.
pub fn rand_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_nanos()));
    counter.fetch_add(1, Ordering::Relaxed)
}

/// The world's only random source. A fixed seed replays a session exactly.
pub fn world_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn ids_never_repeat() {
        let first = rand_id();
        let second = rand_id();
        assert!(second > first);
    }

    #[test]
    fn seeded_rngs_agree() {
        let mut a = world_rng(Some(9));
        let mut b = world_rng(Some(9));
        assert_eq!(a.r#gen::<u64>(), b.r#gen::<u64>());
    }
}
