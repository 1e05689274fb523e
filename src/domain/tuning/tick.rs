/// Gameplay tuning for the periodic player and follower ticks.

#[derive(Debug, Clone, Copy)]
pub struct TickTuning {
    /// Player tick cadence in milliseconds.
    pub player_interval_ms: u64,

    /// Follower tick cadence in milliseconds.
    pub follower_interval_ms: u64,

    /// Minimum gap between heals and between ability drains (ms).
    pub heal_interval_ms: u64,

    /// A heal restores `max_hp / heal_divisor`.
    pub heal_divisor: i32,

    /// Heal cooldown applied when a player leaves combat (ms).
    pub combat_end_heal_cooldown_ms: i64,

    /// Goo damage per tick is `max_hp * goo_numerator / goo_denominator`.
    pub goo_numerator: i32,
    pub goo_denominator: i32,

    /// Stamina an active ability pays when it absorbs goo damage.
    pub goo_shield_stamina_cost: i32,

    /// Idle abilities regain stamina up to this cap.
    pub stamina_cap: i32,

    /// Stamina regained by an idle ability per tick.
    pub stamina_regen: i32,

    /// Players below this height fell out of the world.
    pub fall_floor_z: i32,

    /// Minimum gap between follower attacks (ms).
    pub follower_attack_interval_ms: u64,

    /// Distance a follower keeps from a visible owner.
    pub follower_trail: i32,

    /// Longest step a follower takes per tick.
    pub follower_step: i32,

    /// Speed reported with follower moves.
    pub follower_move_speed: i32,
}

impl Default for TickTuning {
    fn default() -> Self {
        Self {
            player_interval_ms: 2500,
            follower_interval_ms: 400,
            heal_interval_ms: 5000,
            heal_divisor: 5,
            combat_end_heal_cooldown_ms: 5000,
            goo_numerator: 3,
            goo_denominator: 20,
            goo_shield_stamina_cost: 3,
            stamina_cap: 150,
            stamina_regen: 1,
            fall_floor_z: -30_000,
            follower_attack_interval_ms: 1000,
            follower_trail: 200,
            follower_step: 240,
            follower_move_speed: 600,
        }
    }
}
