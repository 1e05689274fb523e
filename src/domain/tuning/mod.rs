// Gameplay tuning, kept separate from runtime/server configuration.

pub mod combat;
pub mod projectile;
pub mod reward;
pub mod suspicion;
pub mod tick;

pub use combat::CombatTuning;
pub use projectile::ProjectileTuning;
pub use reward::RewardTuning;
pub use suspicion::SuspicionTuning;
pub use tick::TickTuning;

/// Every tuning table the combat world reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tuning {
    pub combat: CombatTuning,
    pub suspicion: SuspicionTuning,
    pub projectile: ProjectileTuning,
    pub reward: RewardTuning,
    pub tick: TickTuning,
}
