/// Gameplay tuning for direct (melee/hitscan) attacks.

#[derive(Debug, Clone, Copy)]
pub struct CombatTuning {
    /// Hard cap on simultaneous point-attack targets.
    pub max_point_targets: usize,

    /// Crit chance in percent for weapons without a special rule.
    pub default_crit_rate: i32,

    /// Crit multiplier for ordinary crits.
    pub default_crit_power: i32,

    /// Crit chance in percent for rifles.
    pub rifle_crit_rate: i32,

    /// Swings in a melee combo; the last one always crits.
    pub combo_length: u8,

    /// Crit multiplier of the combo finisher.
    pub combo_crit_power: i32,

    /// Accounts above this level may not use the unrestricted attack.
    pub gm_account_level: i32,

    /// Crit chance in percent for the unrestricted attack.
    pub gm_crit_rate: i32,

    /// Attack power of a follower NPC.
    pub follower_power: i32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            max_point_targets: 3,
            default_crit_rate: 5,
            default_crit_power: 2,
            rifle_crit_rate: 10,
            combo_length: 3,
            combo_crit_power: 3,
            gm_account_level: 30,
            gm_crit_rate: 5,
            follower_power: 500,
        }
    }
}
