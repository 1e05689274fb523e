/// Gameplay tuning for sharing kill rewards across a group.

#[derive(Debug, Clone, Copy)]
pub struct RewardTuning {
    /// Members idle for longer than this (ms) before the kill get nothing.
    pub activity_window_ms: u64,

    /// Members farther than this from the kill get nothing.
    pub share_radius: f32,
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            activity_window_ms: 30_000,
            share_radius: 5000.0,
        }
    }
}
