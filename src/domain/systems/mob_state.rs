// Mob combat state machine. Side effects of a transition (broadcasts, rewards, hooks)
// belong to the world; this module only decides what changed.

use std::collections::HashMap;

use crate::domain::state::{Mob, MobState, Npc, NpcId, Player, PlayerId, Position, condition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lethality {
    Survived,
    /// Lethal damage against a mob nobody had aggroed; hp was pinned at 1.
    Clamped,
    /// The mob died. `killer` is whoever held its aggro.
    Killed { killer: PlayerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Wrong state or guarded cast; nothing changed.
    Rejected,
    Applied {
        dealt: i32,
        entered_combat: bool,
        woke_from_mez: bool,
        lethality: Lethality,
    },
}

impl Mob {
    pub fn can_take_damage(&self) -> bool {
        matches!(self.state, MobState::Roaming | MobState::Combat) && !self.casting_guarded
    }

    /// Applies one hit. `attacker` is the player behind it, `None` for NPC sources.
    pub fn apply_hit(&mut self, damage: i32, attacker: Option<PlayerId>, now: u64) -> HitOutcome {
        if !self.can_take_damage() {
            return HitOutcome::Rejected;
        }

        let mut entered_combat = false;
        if self.state == MobState::Roaming {
            if let Some(attacker) = attacker {
                debug_assert!(self.target.is_none(), "roaming mob still has a target");
                self.enter_combat(attacker);
                entered_combat = true;
            }
        }

        self.hp -= damage;

        let woke_from_mez = self.condition & condition::MEZ != 0;
        if woke_from_mez {
            self.condition &= !condition::MEZ;
        }

        let lethality = if self.hp > 0 {
            Lethality::Survived
        } else {
            match self.target {
                None => {
                    self.hp = 1;
                    Lethality::Clamped
                }
                Some(killer) => {
                    self.die(now);
                    Lethality::Killed { killer }
                }
            }
        };

        HitOutcome::Applied {
            dealt: if lethality == Lethality::Clamped { 0 } else { damage },
            entered_combat,
            woke_from_mez,
            lethality,
        }
    }

    pub fn enter_combat(&mut self, target: PlayerId) {
        self.state = MobState::Combat;
        self.target = Some(target);
    }

    /// Drops the target and starts disengaging.
    pub fn retreat(&mut self) {
        self.target = None;
        self.state = MobState::Retreat;
    }

    pub fn clear_debuffs(&mut self) {
        self.condition = 0;
        self.unbuff_times.clear();
    }

    fn die(&mut self, now: u64) {
        self.state = MobState::Dead;
        self.target = None;
        self.casting_guarded = false;
        self.clear_debuffs();
        self.killed_at = Some(now);
        // Despawn waits for the death animation; the NPC collaborator owns that timer.
        self.despawned = false;
    }
}

fn pack_members(npcs: &HashMap<NpcId, Npc>, leader: NpcId) -> Vec<NpcId> {
    let mut members: Vec<NpcId> = npcs
        .values()
        .filter(|npc| {
            npc.id == leader
                || npc
                    .as_mob()
                    .is_some_and(|mob| mob.group_leader == Some(leader))
        })
        .map(|npc| npc.id)
        .collect();
    members.sort_unstable();
    members
}

/// Pulls every idle mob in `leader`'s pack onto `target`. Returns the mobs that joined.
pub fn pull_pack_into_combat(
    npcs: &mut HashMap<NpcId, Npc>,
    leader: NpcId,
    target: PlayerId,
) -> Vec<NpcId> {
    let mut pulled = Vec::new();
    for id in pack_members(npcs, leader) {
        let Some(mob) = npcs.get_mut(&id).and_then(Npc::as_mob_mut) else {
            continue;
        };
        if mob.state == MobState::Roaming && mob.hp > 0 {
            mob.enter_combat(target);
            pulled.push(id);
        }
    }
    pulled
}

/// Sends every live mob in `leader`'s pack into retreat.
pub fn pack_retreat(npcs: &mut HashMap<NpcId, Npc>, leader: NpcId) {
    for id in pack_members(npcs, leader) {
        if let Some(mob) = npcs.get_mut(&id).and_then(Npc::as_mob_mut) {
            if mob.state != MobState::Dead {
                mob.retreat();
            }
        }
    }
}

/// Nearest player a disengaging mob could pick up again, if any is in sight.
pub fn nearest_target(
    players: &HashMap<PlayerId, Player>,
    from: &Position,
    sight_range: i32,
) -> Option<PlayerId> {
    players
        .values()
        .filter(|player| player.hp > 0 && !player.invulnerable && !player.session_killed)
        .map(|player| (player.position.planar_distance(from), player.id))
        .filter(|(distance, _)| *distance <= sight_range as f32)
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}
