/// Anti-cheat tuning for attack and movement cadence.
///
/// Fire-rate and movement scores use separate curves on purpose; neither is derived
/// from the other.

#[derive(Debug, Clone, Copy)]
pub struct SuspicionTuning {
    /// Shots closer than `fire_rate * rapid_window` ms apart gain suspicion.
    pub rapid_window: i64,

    /// Shots closer than `fire_rate * decay_window` ms still adjust a positive score.
    pub decay_window: i64,

    /// Expected gap between shots is `fire_rate * expected_gap` ms.
    pub expected_gap: i64,

    /// Score above which outgoing damage is penalised.
    pub penalty_threshold: i32,

    /// Penalty lost per point above the threshold.
    pub penalty_slope: f32,

    /// Score lost per slow shot once above the penalty threshold.
    pub bleed: i32,

    /// Score above which the connection is dropped.
    pub kill_threshold: i32,

    /// Movement messages per player tick before suspicion grows.
    pub movement_burst: u32,

    /// Score gained per movement message over the burst.
    pub movement_gain: i32,

    /// Score lost on a calm tick.
    pub movement_relief: i32,

    /// Movement score above which a victim's defense is reduced.
    pub defense_threshold: i32,
}

impl Default for SuspicionTuning {
    fn default() -> Self {
        Self {
            rapid_window: 80,
            decay_window: 180,
            expected_gap: 100,
            penalty_threshold: 5000,
            penalty_slope: 0.0002,
            bleed: 100,
            kill_threshold: 15_000,
            movement_burst: 12,
            movement_gain: 300,
            movement_relief: 100,
            defense_threshold: 5000,
        }
    }
}
