/// Gameplay tuning for grenades and rockets.

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Slot ids run from 0 to `max_slots - 1`.
    pub max_slots: u8,

    /// Rocket travel (world units) before the distance bonus starts.
    pub falloff_start: f32,

    /// Travel beyond `falloff_start` that adds one full extra damage share.
    pub falloff_span: f32,

    /// Upper bound on the extra damage share.
    pub falloff_cap: f32,

    /// Rockets report their destination this far above the shooter.
    pub rocket_aim_height: i32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            max_slots: 127,
            falloff_start: 500.0,
            falloff_span: 750.0,
            falloff_cap: 2.0,
            rocket_aim_height: 100,
        }
    }
}
