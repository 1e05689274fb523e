// Domain layer: combat entities, tuning, pure rules and the ports the world talks through.

pub mod errors;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tables;
pub mod tuning;

pub use errors::CombatError;
pub use state::{
    AttackResult, Bullet, BulletKind, CharAttackResult, CharTarget, HitFlag, Loadout, Mob,
    MobState, NanoSlot, Npc, NpcId, NpcKind, Player, PlayerId, Position, Style, TargetKind,
    WeaponKind,
};
pub use tables::{MobTable, MobTemplate};
