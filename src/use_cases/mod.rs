// Use cases layer: the single-owner combat world and the task that drives it.

pub mod attack;
pub mod fire;
pub mod game;
pub mod kill;
pub mod ticks;
pub mod types;
pub mod validation;
pub mod world;

#[cfg(test)]
pub mod test_support;

pub use game::world_task;
pub use types::{GameEvent, NpcSpawn, NpcSpawnKind, Outbound, PlayerCommand, ServerEvent};
pub use world::{CombatWorld, WorldPorts};
