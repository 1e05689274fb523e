// Domain-level errors for combat message handling.
//
// Every variant is terminal for the single message that produced it: the message is
// dropped with a warning and no state is touched.

use thiserror::Error;

use super::state::{NpcId, PlayerId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CombatError {
    #[error("player {0} is not in the world")]
    UnknownPlayer(PlayerId),
    #[error("player {0} session was already dropped")]
    SessionClosed(PlayerId),
    #[error("npc {0} not found")]
    UnknownNpc(NpcId),
    #[error("npc {0} is not a mob")]
    NotAMob(NpcId),
    #[error("mob type {0} has no template")]
    UnknownMobType(i32),
    #[error("bullet {bullet_id} not found for player {player_id}")]
    UnknownBullet { player_id: PlayerId, bullet_id: i32 },
    #[error("{count} targets exceeds the limit of {limit}")]
    TooManyTargets { count: usize, limit: usize },
    #[error("claimed {claimed} targets but received {received}")]
    CountMismatch { claimed: usize, received: usize },
    #[error("{count} results do not fit in a response")]
    ResponseOverflow { count: usize },
    #[error("player {0} lacks the privilege for this attack")]
    NotPrivileged(PlayerId),
    #[error("loadout field {field} is out of range")]
    InvalidLoadout { field: &'static str },
}
