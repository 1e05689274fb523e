// The combat world: every player, NPC and bullet, owned by one task.

use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::types::{GameEvent, NpcSpawn, NpcSpawnKind, Outbound, PlayerCommand, ServerEvent};
use crate::domain::ports::{Clock, KillHook, KilledMob, RewardSink, Viewability};
use crate::domain::state::{GroupMembership, condition};
use crate::domain::systems::projectiles::ProjectileRegistry;
use crate::domain::systems::suspicion::relax_after_combat;
use crate::domain::tuning::Tuning;
use crate::domain::{
    CombatError, Loadout, Mob, MobTable, Npc, NpcId, NpcKind, Player, PlayerId, Position,
    WeaponKind,
};

/// Collaborators the world reaches out to.
pub struct WorldPorts {
    pub clock: Box<dyn Clock>,
    pub view: Box<dyn Viewability>,
    pub rewards: Box<dyn RewardSink>,
}

/// On-kill hooks grouped by mob type.
#[derive(Default)]
pub struct KillHooks {
    by_type: HashMap<i32, Vec<Box<dyn KillHook>>>,
}

impl KillHooks {
    pub fn register(&mut self, mob_type: i32, hook: Box<dyn KillHook>) {
        self.by_type.entry(mob_type).or_default().push(hook);
    }

    pub fn fire(&mut self, killer: Option<PlayerId>, mob: &KilledMob) -> usize {
        let Some(hooks) = self.by_type.get_mut(&mob.mob_type) else {
            return 0;
        };
        for hook in hooks.iter_mut() {
            hook.on_kill(killer, mob);
        }
        hooks.len()
    }
}

pub struct CombatWorld {
    pub(crate) players: HashMap<PlayerId, Player>,
    pub(crate) npcs: HashMap<NpcId, Npc>,
    // Pending movement queues pushed by the NPC collaborator.
    pub(crate) paths: HashMap<NpcId, Vec<Position>>,
    pub(crate) projectiles: ProjectileRegistry,
    pub(crate) mob_table: MobTable,
    pub(crate) tuning: Tuning,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) view: Box<dyn Viewability>,
    pub(crate) rewards: Box<dyn RewardSink>,
    pub(crate) hooks: KillHooks,
    pub(crate) last_heal_tick: u64,
    pub(crate) last_follower_attack: u64,
    outbox: Vec<Outbound>,
}

impl CombatWorld {
    pub fn new(mob_table: MobTable, tuning: Tuning, rng: ChaCha8Rng, ports: WorldPorts) -> Self {
        Self {
            players: HashMap::new(),
            npcs: HashMap::new(),
            paths: HashMap::new(),
            projectiles: ProjectileRegistry::new(&tuning.projectile),
            mob_table,
            tuning,
            rng,
            clock: ports.clock,
            view: ports.view,
            rewards: ports.rewards,
            hooks: KillHooks::default(),
            last_heal_tick: 0,
            last_follower_attack: 0,
            outbox: Vec::new(),
        }
    }

    pub fn register_kill_hook(&mut self, mob_type: i32, hook: Box<dyn KillHook>) {
        self.hooks.register(mob_type, hook);
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn npc(&self, npc_id: NpcId) -> Option<&Npc> {
        self.npcs.get(&npc_id)
    }

    pub fn mob(&self, npc_id: NpcId) -> Option<&Mob> {
        self.npcs.get(&npc_id).and_then(Npc::as_mob)
    }

    pub fn has_path(&self, npc_id: NpcId) -> bool {
        self.paths.contains_key(&npc_id)
    }

    pub fn live_bullets(&self, player_id: PlayerId) -> usize {
        self.projectiles.live_count(player_id)
    }

    /// Hands over everything produced since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub fn handle(&mut self, event: GameEvent) -> Result<(), CombatError> {
        match event {
            GameEvent::Join {
                player_id,
                loadout,
                position,
            } => self.join(player_id, &loadout, position),
            GameEvent::Leave { player_id } => {
                self.leave(player_id);
                Ok(())
            }
            GameEvent::Command { player_id, command } => self.command(player_id, command),
            GameEvent::SpawnNpc(spawn) => self.spawn_npc(spawn),
            GameEvent::GroupChanged {
                leader_id,
                member_ids,
            } => {
                self.set_group(leader_id, member_ids);
                Ok(())
            }
            GameEvent::FollowerAssigned {
                player_id,
                npc_id,
                range,
            } => self.assign_follower(player_id, npc_id, range),
            GameEvent::MobStrike { npc_id } => self.mob_strike(npc_id),
        }
    }

    fn command(&mut self, player_id: PlayerId, command: PlayerCommand) -> Result<(), CombatError> {
        self.live_player(player_id)?;
        match command {
            PlayerCommand::Move { position } => {
                self.move_player(player_id, position);
                Ok(())
            }
            PlayerCommand::AttackNpcs { count, npc_ids } => {
                self.attack_npcs(player_id, count, &npc_ids)
            }
            PlayerCommand::AttackChars { count, targets } => {
                self.attack_chars(player_id, count, &targets)
            }
            PlayerCommand::GrenadeFire { to } => self.grenade_fire(player_id, to),
            PlayerCommand::RocketFire { to } => self.rocket_fire(player_id, to),
            PlayerCommand::ProjectileHit {
                bullet_id,
                count,
                npc_ids,
            } => self.projectile_hit(player_id, bullet_id, count, &npc_ids),
            PlayerCommand::CombatBegin => {
                self.combat_begin(player_id);
                Ok(())
            }
            PlayerCommand::CombatEnd => {
                self.combat_end(player_id);
                Ok(())
            }
            PlayerCommand::DotDamageToggle { enabled } => {
                self.toggle_dot_damage(player_id, enabled);
                Ok(())
            }
            PlayerCommand::EquipWeapon { weapon, weapon_id } => {
                self.equip_weapon(player_id, weapon, weapon_id);
                Ok(())
            }
            PlayerCommand::SummonNano { slot } => {
                self.summon_nano(player_id, slot);
                Ok(())
            }
        }
    }

    /// Fails unless the player is present and still has a working session.
    pub(crate) fn live_player(&self, player_id: PlayerId) -> Result<&Player, CombatError> {
        let player = self
            .players
            .get(&player_id)
            .ok_or(CombatError::UnknownPlayer(player_id))?;
        if player.session_killed {
            return Err(CombatError::SessionClosed(player_id));
        }
        Ok(player)
    }

    fn join(
        &mut self,
        player_id: PlayerId,
        loadout: &Loadout,
        position: Position,
    ) -> Result<(), CombatError> {
        loadout.check()?;
        let now = self.clock.now_ms();
        if self.players.contains_key(&player_id) {
            warn!(player_id, "join for a player already in the world; replacing");
            self.projectiles.release_player(player_id);
        }
        self.players
            .insert(player_id, Player::new(player_id, loadout, position, now));
        info!(player_id, "player joined");
        Ok(())
    }

    fn leave(&mut self, player_id: PlayerId) {
        if self.players.remove(&player_id).is_none() {
            debug!(player_id, "leave for unknown player");
            return;
        }
        let dropped = self.projectiles.release_player(player_id);
        // Mobs never keep aggro on a player that is gone.
        for npc in self.npcs.values_mut() {
            if let Some(mob) = npc.as_mob_mut() {
                if mob.target == Some(player_id) {
                    mob.retreat();
                }
            }
        }
        info!(player_id, dropped_bullets = dropped, "player left");
    }

    fn spawn_npc(&mut self, spawn: NpcSpawn) -> Result<(), CombatError> {
        let kind = match spawn.kind {
            NpcSpawnKind::Mob {
                mob_type,
                group_leader,
            } => {
                let template = *self
                    .mob_table
                    .get(mob_type)
                    .ok_or(CombatError::UnknownMobType(mob_type))?;
                let mut mob = Mob::spawn(mob_type, template);
                mob.group_leader = group_leader;
                mob.static_path = spawn.static_path;
                NpcKind::Mob(mob)
            }
            NpcSpawnKind::Follower => NpcKind::Follower,
            NpcSpawnKind::Passive => NpcKind::Passive,
        };

        if spawn.path.is_empty() {
            self.paths.remove(&spawn.npc_id);
        } else {
            self.paths.insert(spawn.npc_id, spawn.path);
        }
        self.npcs.insert(
            spawn.npc_id,
            Npc {
                id: spawn.npc_id,
                npc_type: spawn.npc_type,
                position: spawn.position,
                kind,
            },
        );
        debug!(npc_id = spawn.npc_id, npc_type = spawn.npc_type, "npc spawned");
        Ok(())
    }

    /// Mirrors the grouping collaborator's view onto every listed member.
    fn set_group(&mut self, leader_id: PlayerId, member_ids: Vec<PlayerId>) {
        let membership = GroupMembership {
            leader_id,
            member_ids: member_ids.clone(),
        };
        for member_id in &member_ids {
            if let Some(player) = self.players.get_mut(member_id) {
                player.group = if member_ids.len() <= 1 {
                    GroupMembership::solo(*member_id)
                } else {
                    membership.clone()
                };
            }
        }
        debug!(leader_id, members = member_ids.len(), "group updated");
    }

    fn assign_follower(
        &mut self,
        player_id: PlayerId,
        npc_id: Option<NpcId>,
        range: i32,
    ) -> Result<(), CombatError> {
        if let Some(npc_id) = npc_id {
            if !self.npcs.contains_key(&npc_id) {
                return Err(CombatError::UnknownNpc(npc_id));
            }
        }
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(CombatError::UnknownPlayer(player_id))?;
        player.follower = npc_id;
        player.follower_range = range;
        Ok(())
    }

    fn move_player(&mut self, player_id: PlayerId, position: Position) {
        let now = self.clock.now_ms();
        if let Some(player) = self.players.get_mut(&player_id) {
            player.position = position;
            player.last_activity = now;
            player.movements = player.movements.saturating_add(1);
        }
    }

    fn combat_begin(&mut self, player_id: PlayerId) {
        let Some(player) = self.players.get_mut(&player_id) else {
            return;
        };
        player.in_combat = true;
        let (position, weapon_id) = (player.position, player.weapon_id);
        // Make sure observers see the weapon that is actually out.
        self.emit_to_viewers(
            &position,
            Some(player_id),
            ServerEvent::EquipChange {
                player_id,
                weapon_id,
            },
        );
    }

    fn combat_end(&mut self, player_id: PlayerId) {
        let tick = self.tuning.tick;
        let suspicion = self.tuning.suspicion;
        if let Some(player) = self.players.get_mut(&player_id) {
            player.in_combat = false;
            player.heal_cooldown = tick.combat_end_heal_cooldown_ms;
            player.combos = 0;
            relax_after_combat(&mut player.suspicion, &suspicion);
        }
    }

    fn toggle_dot_damage(&mut self, player_id: PlayerId, enabled: bool) {
        let Some(player) = self.players.get_mut(&player_id) else {
            return;
        };
        if enabled {
            player.condition |= condition::INFECTION;
        } else {
            player.condition &= !condition::INFECTION;
        }
        let condition = player.condition;
        self.emit_to(player_id, ServerEvent::BuffUpdate { condition });
    }

    fn equip_weapon(&mut self, player_id: PlayerId, weapon: WeaponKind, weapon_id: i32) {
        if let Some(player) = self.players.get_mut(&player_id) {
            if player.weapon != weapon {
                player.combos = 0;
            }
            player.weapon = weapon;
            player.weapon_id = weapon_id;
        }
    }

    fn summon_nano(&mut self, player_id: PlayerId, slot: Option<usize>) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.active_nano = slot.filter(|slot| *slot < player.nanos.len());
        }
    }

    /// Players that can see `position`, sorted, minus `exclude`.
    pub(crate) fn viewers_of(&self, position: &Position, exclude: Option<PlayerId>) -> Vec<PlayerId> {
        let mut viewers: Vec<PlayerId> = self
            .players
            .values()
            .filter(|player| Some(player.id) != exclude && !player.session_killed)
            .filter(|player| self.view.is_viewable(&player.position, position))
            .map(|player| player.id)
            .collect();
        viewers.sort_unstable();
        viewers
    }

    pub(crate) fn emit(&mut self, recipients: Vec<PlayerId>, event: ServerEvent) {
        if recipients.is_empty() {
            return;
        }
        self.outbox.push(Outbound { recipients, event });
    }

    pub(crate) fn emit_to(&mut self, player_id: PlayerId, event: ServerEvent) {
        self.emit(vec![player_id], event);
    }

    pub(crate) fn emit_to_viewers(
        &mut self,
        position: &Position,
        exclude: Option<PlayerId>,
        event: ServerEvent,
    ) {
        let viewers = self.viewers_of(position, exclude);
        self.emit(viewers, event);
    }

    /// Sends to `player_id` and to everyone who can see `position`.
    pub(crate) fn emit_to_audience(
        &mut self,
        position: &Position,
        player_id: PlayerId,
        event: ServerEvent,
    ) {
        let mut recipients = self.viewers_of(position, Some(player_id));
        recipients.push(player_id);
        recipients.sort_unstable();
        self.emit(recipients, event);
    }

    /// Marks the session dead and asks the transport to drop it.
    pub(crate) fn kill_session(&mut self, player_id: PlayerId, reason: &'static str) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.session_killed = true;
            warn!(
                player_id,
                fire_rate_suspicion = player.suspicion.fire_rate,
                reason,
                "dropping session"
            );
        }
        self.emit_to(player_id, ServerEvent::Disconnect { reason });
    }
}
