// Narrow interfaces to the collaborators that live outside the combat core.

use std::time::{SystemTime, UNIX_EPOCH};

use super::state::{NpcId, PlayerId, Position};
use super::systems::rewards::SharedRoll;

/// Wall-clock milliseconds.
pub trait Clock: Send {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Answers "is `subject` close enough for `observer` to see it".
pub trait Viewability: Send {
    fn is_viewable(&self, observer: &Position, subject: &Position) -> bool;
}

/// Plain radius check on the ground plane.
pub struct ViewRadius {
    pub radius: f32,
}

impl Viewability for ViewRadius {
    fn is_viewable(&self, observer: &Position, subject: &Position) -> bool {
        observer.planar_distance(subject) <= self.radius
    }
}

/// What the item and mission collaborators learn about a dead mob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KilledMob {
    pub npc_id: NpcId,
    pub mob_type: i32,
    pub position: Position,
    pub killed_at: u64,
}

pub trait RewardSink: Send {
    /// Hands out the mob's drop using the group-wide roll.
    fn give_kill_reward(&mut self, player_id: PlayerId, mob: &KilledMob, roll: SharedRoll);

    /// Advances kill-count missions for `mob_type`.
    fn notify_mob_killed(&mut self, player_id: PlayerId, mob_type: i32, qualifying_roll: u32);
}

/// Scripted reaction to a mob of a given type dying.
pub trait KillHook: Send {
    fn on_kill(&mut self, killer: Option<PlayerId>, mob: &KilledMob);
}
