// Everything that happens to a mob once damage lands: aggro, pack pulls, mez wake,
// the kill sequence with rewards and hooks, and mob strikes back at players.

use tracing::{debug, info};

use super::types::ServerEvent;
use super::world::CombatWorld;
use crate::domain::ports::KilledMob;
use crate::domain::systems::damage::{DamageInput, damage};
use crate::domain::systems::mob_state::{
    HitOutcome, Lethality, nearest_target, pack_retreat, pull_pack_into_combat,
};
use crate::domain::systems::rewards::{KillSite, MemberView, SharedRoll, eligible_recipients};
use crate::domain::systems::suspicion::defense_under_suspicion;
use crate::domain::{AttackResult, CombatError, HitFlag, MobState, NpcId, PlayerId};

/// Who landed a hit on a mob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Player(PlayerId),
    /// A player's follower NPC. Never aggroes and never pays out.
    Follower,
}

impl CombatWorld {
    /// Runs one hit through the mob state machine and performs its side effects.
    /// Returns the damage actually dealt.
    pub(crate) fn hit_mob(&mut self, npc_id: NpcId, amount: i32, source: HitSource) -> i32 {
        let now = self.clock.now_ms();
        let attacker = match source {
            HitSource::Player(player_id) => Some(player_id),
            HitSource::Follower => None,
        };
        let Some(npc) = self.npcs.get_mut(&npc_id) else {
            return 0;
        };
        let position = npc.position;
        let Some(mob) = npc.as_mob_mut() else {
            return 0;
        };

        let outcome = mob.apply_hit(amount, attacker, now);
        let HitOutcome::Applied {
            dealt,
            entered_combat,
            woke_from_mez,
            lethality,
        } = outcome
        else {
            return 0;
        };
        let (group_leader, mob_condition) = (mob.group_leader, mob.condition);

        if entered_combat {
            if let (Some(leader), Some(target)) = (group_leader, attacker) {
                let pulled = pull_pack_into_combat(&mut self.npcs, leader, target);
                debug!(npc_id, leader, pulled = pulled.len(), "pack pulled into combat");
            }
        }
        if woke_from_mez {
            self.emit_to_viewers(
                &position,
                None,
                ServerEvent::NpcBuffTimeout {
                    npc_id,
                    condition: mob_condition,
                },
            );
        }
        if let Lethality::Killed { killer } = lethality {
            let paid_killer = match source {
                HitSource::Player(_) => Some(killer),
                HitSource::Follower => None,
            };
            self.finish_kill(npc_id, paid_killer);
        }
        dealt
    }

    /// Post-death bookkeeping. Runs once per death since a dead mob rejects further hits.
    fn finish_kill(&mut self, npc_id: NpcId, killer: Option<PlayerId>) {
        let Some(npc) = self.npcs.get(&npc_id) else {
            return;
        };
        let Some(mob) = npc.as_mob() else {
            return;
        };
        let killed = KilledMob {
            npc_id,
            mob_type: mob.mob_type,
            position: npc.position,
            killed_at: mob.killed_at.unwrap_or_else(|| self.clock.now_ms()),
        };
        let static_path = mob.static_path;

        let mut recipients = Vec::new();
        if let Some(killer_id) = killer {
            if let Some(player) = self.players.get(&killer_id) {
                let site = KillSite {
                    killed_at: killed.killed_at,
                    position: killed.position,
                };
                recipients = eligible_recipients(
                    killer_id,
                    &player.group,
                    |member_id| {
                        self.players
                            .get(&member_id)
                            .filter(|member| !member.session_killed)
                            .map(|member| MemberView {
                                last_activity: member.last_activity,
                                position: member.position,
                            })
                    },
                    &site,
                    &self.tuning.reward,
                );
            }
        }

        if !recipients.is_empty() {
            let roll = SharedRoll::draw(&mut self.rng);
            for recipient in &recipients {
                self.rewards.give_kill_reward(*recipient, &killed, roll);
                self.rewards
                    .notify_mob_killed(*recipient, killed.mob_type, roll.qualifying_item);
            }
        }
        let hooks = self.hooks.fire(killer, &killed);

        if !static_path {
            self.paths.remove(&npc_id);
        }
        info!(
            npc_id,
            mob_type = killed.mob_type,
            killer = ?killer,
            rewarded = recipients.len(),
            hooks,
            "mob killed"
        );
    }

    /// A mob in combat swings at its current target.
    pub(crate) fn mob_strike(&mut self, npc_id: NpcId) -> Result<(), CombatError> {
        let npc = self
            .npcs
            .get(&npc_id)
            .ok_or(CombatError::UnknownNpc(npc_id))?;
        let mob = npc.as_mob().ok_or(CombatError::NotAMob(npc_id))?;
        if mob.state != MobState::Combat {
            debug!(npc_id, state = ?mob.state, "strike from a mob that is not fighting");
            return Ok(());
        }
        let Some(target_id) = mob.target else {
            return Ok(());
        };
        let (template, position) = (mob.template, npc.position);
        let suspicion = self.tuning.suspicion;

        let Some(player) = self.players.get_mut(&target_id) else {
            self.disengage(npc_id);
            return Ok(());
        };
        let (amount, hit_flag) = if player.invulnerable {
            (0, HitFlag::Normal)
        } else {
            let defense =
                defense_under_suspicion(player.defense, player.suspicion.movement, &suspicion);
            // Mob strikes never crit and ignore the style wheel.
            damage(
                &DamageInput {
                    attack: template.power,
                    defense,
                    crit_rate: 0,
                    crit_power: 1,
                    attacker_style: None,
                    defender_style: None,
                },
                &mut self.rng,
            )
        };
        player.hp = (player.hp - amount).max(0);
        let (hp, lethal) = (player.hp, amount > 0 && player.hp == 0);

        let result = AttackResult {
            id: target_id,
            damage: amount,
            hp,
            hit_flag,
        };
        self.emit_to_audience(
            &position,
            target_id,
            ServerEvent::NpcAttackPlayers {
                npc_id,
                results: vec![result],
            },
        );

        if lethal {
            info!(npc_id, player_id = target_id, "player killed by mob");
            self.disengage(npc_id);
        }
        Ok(())
    }

    /// Drops the target, then tries to pick a new one before the pack gives up.
    fn disengage(&mut self, npc_id: NpcId) {
        let Some(npc) = self.npcs.get_mut(&npc_id) else {
            return;
        };
        let position = npc.position;
        let Some(mob) = npc.as_mob_mut() else {
            return;
        };
        mob.retreat();
        let (sight_range, group_leader) = (mob.template.sight_range, mob.group_leader);

        match nearest_target(&self.players, &position, sight_range) {
            Some(next) => {
                if let Some(mob) = self.npcs.get_mut(&npc_id).and_then(|npc| npc.as_mob_mut()) {
                    mob.enter_combat(next);
                }
                debug!(npc_id, target = next, "mob picked a new target");
            }
            None => {
                if let Some(mob) = self.npcs.get_mut(&npc_id).and_then(|npc| npc.as_mob_mut()) {
                    mob.clear_debuffs();
                }
                pack_retreat(&mut self.npcs, group_leader.unwrap_or(npc_id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;
    use crate::domain::state::condition;
    use crate::use_cases::test_support::{RecordingHook, TestWorld, attack_npcs, spawn_mob};

    fn is_mezzed(world: &CombatWorld, npc_id: NpcId) -> bool {
        world
            .mob(npc_id)
            .is_some_and(|mob| mob.condition & condition::MEZ != 0)
    }

    fn make_lethal(world: &mut CombatWorld, npc_id: NpcId) {
        if let Some(mob) = world.npcs.get_mut(&npc_id).and_then(|npc| npc.as_mob_mut()) {
            mob.hp = 1;
        }
    }

    #[test]
    fn only_active_nearby_members_share_a_group_kill() {
        let mut harness = TestWorld::new(21);
        harness.join(1, Position::new(0, 0, 0));
        harness.join(2, Position::new(6000, 0, 0));
        harness.join(3, Position::new(100, 0, 0));
        spawn_mob(&mut harness.world, 100, 1, Position::new(0, 0, 0));
        harness
            .world
            .handle(crate::use_cases::GameEvent::GroupChanged {
                leader_id: 1,
                member_ids: vec![1, 2, 3],
            })
            .expect("group");

        // Member 3 is close but has been idle for 40 seconds.
        harness.clock.advance(40_000);
        if let Some(player) = harness.world.players.get_mut(&2) {
            player.last_activity = harness.clock.now();
        }
        make_lethal(&mut harness.world, 100);
        attack_npcs(&mut harness.world, 1, &[100]).expect("attack");

        assert_eq!(harness.world.mob(100).map(|mob| mob.state), Some(MobState::Dead));
        assert_eq!(harness.rewards.rewarded_players(), vec![1]);
        assert_eq!(harness.rewards.notified_players(), vec![1]);
    }

    #[test]
    fn every_recipient_gets_the_same_roll() {
        let mut harness = TestWorld::new(22);
        harness.join(1, Position::new(0, 0, 0));
        harness.join(2, Position::new(300, 0, 0));
        spawn_mob(&mut harness.world, 100, 1, Position::new(0, 0, 0));
        harness
            .world
            .handle(crate::use_cases::GameEvent::GroupChanged {
                leader_id: 2,
                member_ids: vec![2, 1],
            })
            .expect("group");
        make_lethal(&mut harness.world, 100);

        attack_npcs(&mut harness.world, 1, &[100]).expect("attack");

        let rewards = harness.rewards.rewards();
        assert_eq!(rewards.len(), 2);
        assert_eq!(rewards[0].1.npc_id, 100);
        assert_eq!(rewards[0].2, rewards[1].2);
        let notices = harness.rewards.notices();
        assert_eq!(notices[0].2, rewards[0].2.qualifying_item);
        assert_eq!(notices[1].2, rewards[0].2.qualifying_item);
    }

    #[test]
    fn a_dead_mob_is_rewarded_and_hooked_exactly_once() {
        let mut harness = TestWorld::new(23);
        harness.join(1, Position::default());
        spawn_mob(&mut harness.world, 100, 1, Position::default());
        let hook = RecordingHook::default();
        harness
            .world
            .register_kill_hook(1, Box::new(hook.clone()));
        make_lethal(&mut harness.world, 100);

        attack_npcs(&mut harness.world, 1, &[100]).expect("first attack");
        harness.clock.advance(1_000);
        attack_npcs(&mut harness.world, 1, &[100]).expect("second attack");

        assert_eq!(harness.rewards.rewarded_players(), vec![1]);
        assert_eq!(hook.kills(), vec![(Some(1), 100)]);
        let outbox = harness.world.drain_outbox();
        let damages: Vec<i32> = outbox
            .iter()
            .filter_map(|outbound| match &outbound.event {
                ServerEvent::AttackNpcsSucc { results, .. } => Some(results[0].damage),
                _ => None,
            })
            .collect();
        assert_eq!(damages.len(), 2);
        assert_eq!(damages[1], 0);
    }

    #[test]
    fn kills_drop_the_path_unless_it_is_static() {
        let mut harness = TestWorld::new(24);
        harness.join(1, Position::default());
        harness.spawn_mob_with_path(100, 1, vec![Position::new(10, 0, 0)], false);
        harness.spawn_mob_with_path(101, 1, vec![Position::new(20, 0, 0)], true);
        make_lethal(&mut harness.world, 100);
        make_lethal(&mut harness.world, 101);

        attack_npcs(&mut harness.world, 1, &[100]).expect("attack");
        harness.clock.advance(10_000);
        attack_npcs(&mut harness.world, 1, &[101]).expect("attack");

        assert!(!harness.world.has_path(100));
        assert!(harness.world.has_path(101));
    }

    #[test]
    fn first_hit_pulls_the_whole_pack() {
        let mut harness = TestWorld::new(25);
        harness.join(1, Position::default());
        harness.spawn_pack_member(100, 1, None);
        harness.spawn_pack_member(101, 1, Some(100));
        harness.spawn_pack_member(102, 1, Some(100));

        attack_npcs(&mut harness.world, 1, &[101]).expect("attack");
        for id in [100, 101, 102] {
            let mob = harness.world.mob(id).expect("mob");
            assert_eq!(mob.state, MobState::Combat);
            assert_eq!(mob.target, Some(1));
        }
    }

    #[test]
    fn hitting_a_sleeping_mob_wakes_it_for_everyone() {
        let mut harness = TestWorld::new(26);
        harness.join(1, Position::default());
        spawn_mob(&mut harness.world, 100, 5, Position::default());
        if let Some(mob) = harness.world.npcs.get_mut(&100).and_then(|npc| npc.as_mob_mut()) {
            mob.condition = condition::MEZ;
        }
        assert!(is_mezzed(&harness.world, 100));

        attack_npcs(&mut harness.world, 1, &[100]).expect("attack");
        assert!(!is_mezzed(&harness.world, 100));
        let outbox = harness.world.drain_outbox();
        assert!(outbox.iter().any(|outbound| outbound.event
            == ServerEvent::NpcBuffTimeout {
                npc_id: 100,
                condition: 0
            }
            && outbound.recipients == vec![1]));
    }

    #[test]
    fn follower_kills_fire_hooks_but_pay_nobody() {
        let mut harness = TestWorld::new(27);
        harness.join(1, Position::default());
        spawn_mob(&mut harness.world, 100, 1, Position::default());
        let hook = RecordingHook::default();
        harness
            .world
            .register_kill_hook(1, Box::new(hook.clone()));
        if let Some(mob) = harness.world.npcs.get_mut(&100).and_then(|npc| npc.as_mob_mut()) {
            mob.enter_combat(1);
            mob.hp = 10;
        }

        let dealt = harness.world.hit_mob(100, 50, HitSource::Follower);
        assert_eq!(dealt, 50);
        assert_eq!(harness.world.mob(100).map(|mob| mob.state), Some(MobState::Dead));
        assert!(harness.rewards.rewarded_players().is_empty());
        assert_eq!(hook.kills(), vec![(None, 100)]);
    }

    #[test]
    fn killing_blow_on_a_player_sends_the_pack_home() {
        let mut harness = TestWorld::new(28);
        harness.join(1, Position::default());
        harness.spawn_pack_member(100, 5, None);
        harness.spawn_pack_member(101, 5, Some(100));
        for id in [100, 101] {
            if let Some(mob) = harness.world.npcs.get_mut(&id).and_then(|npc| npc.as_mob_mut()) {
                mob.enter_combat(1);
                mob.condition = condition::MEZ;
            }
        }
        if let Some(player) = harness.world.players.get_mut(&1) {
            player.hp = 1;
        }

        harness
            .world
            .handle(crate::use_cases::GameEvent::MobStrike { npc_id: 100 })
            .expect("strike");

        assert_eq!(harness.world.player(1).map(|player| player.hp), Some(0));
        for id in [100, 101] {
            let mob = harness.world.mob(id).expect("mob");
            assert_eq!(mob.state, MobState::Retreat);
            assert_eq!(mob.target, None);
        }
        assert!(!is_mezzed(&harness.world, 100));
        let outbox = harness.world.drain_outbox();
        assert!(matches!(
            &outbox[0].event,
            ServerEvent::NpcAttackPlayers { npc_id: 100, results } if results[0].hp == 0
        ));
        assert_eq!(outbox[0].recipients, vec![1]);
    }

    #[test]
    fn a_retreating_mob_picks_up_another_player_in_sight() {
        let mut harness = TestWorld::new(29);
        harness.join(1, Position::default());
        harness.join(2, Position::new(500, 0, 0));
        spawn_mob(&mut harness.world, 100, 5, Position::default());
        if let Some(mob) = harness.world.npcs.get_mut(&100).and_then(|npc| npc.as_mob_mut()) {
            mob.enter_combat(1);
        }
        if let Some(player) = harness.world.players.get_mut(&1) {
            player.hp = 1;
        }

        harness
            .world
            .handle(crate::use_cases::GameEvent::MobStrike { npc_id: 100 })
            .expect("strike");
        let mob = harness.world.mob(100).expect("mob");
        assert_eq!(mob.state, MobState::Combat);
        assert_eq!(mob.target, Some(2));
    }

    #[test]
    fn invulnerable_players_shrug_off_strikes() {
        let mut harness = TestWorld::new(30);
        harness.join(1, Position::default());
        spawn_mob(&mut harness.world, 100, 5, Position::default());
        if let Some(mob) = harness.world.npcs.get_mut(&100).and_then(|npc| npc.as_mob_mut()) {
            mob.enter_combat(1);
        }
        if let Some(player) = harness.world.players.get_mut(&1) {
            player.invulnerable = true;
        }
        let hp = harness.world.player(1).map(|player| player.hp);

        harness
            .world
            .handle(crate::use_cases::GameEvent::MobStrike { npc_id: 100 })
            .expect("strike");
        assert_eq!(harness.world.player(1).map(|player| player.hp), hp);
        assert_eq!(harness.world.mob(100).map(|mob| mob.state), Some(MobState::Combat));
    }

    #[test]
    fn mob_strikes_never_crit() {
        let mut harness = TestWorld::new(32);
        harness.join(1, Position::default());
        spawn_mob(&mut harness.world, 100, 5, Position::default());
        if let Some(mob) = harness.world.npcs.get_mut(&100).and_then(|npc| npc.as_mob_mut()) {
            mob.enter_combat(1);
        }

        for _ in 0..400 {
            if let Some(player) = harness.world.players.get_mut(&1) {
                player.hp = 100_000;
            }
            harness
                .world
                .handle(crate::use_cases::GameEvent::MobStrike { npc_id: 100 })
                .expect("strike");
            let outbox = harness.world.drain_outbox();
            let Some(ServerEvent::NpcAttackPlayers { results, .. }) =
                outbox.first().map(|outbound| &outbound.event)
            else {
                panic!("expected a strike report, got {outbox:?}");
            };
            assert_eq!(results[0].hit_flag, HitFlag::Normal);
            assert!(results[0].damage > 0);
        }
    }

    #[test]
    fn strikes_from_idle_mobs_are_ignored() {
        let mut harness = TestWorld::new(31);
        harness.join(1, Position::default());
        spawn_mob(&mut harness.world, 100, 5, Position::default());
        harness
            .world
            .handle(crate::use_cases::GameEvent::MobStrike { npc_id: 100 })
            .expect("strike");
        assert!(harness.world.drain_outbox().is_empty());
        assert_eq!(
            harness
                .world
                .handle(crate::use_cases::GameEvent::MobStrike { npc_id: 999 }),
            Err(CombatError::UnknownNpc(999))
        );
    }
}
