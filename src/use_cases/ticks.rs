// Periodic world work: the slow per-player environment tick and the fast follower tick.

use tracing::{debug, info};

use super::kill::HitSource;
use super::types::ServerEvent;
use super::world::CombatWorld;
use crate::domain::state::condition;
use crate::domain::systems::damage::{DamageInput, damage};
use crate::domain::systems::follower::next_step;
use crate::domain::systems::suspicion::record_movement_tick;
use crate::domain::tuning::{SuspicionTuning, TickTuning};
use crate::domain::{AttackResult, NpcId, Player, PlayerId, Position};

/// Environmental damage taken (or absorbed) during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GooHit {
    pub damage: i32,
    pub protected: bool,
    /// Stamina left on the ability that paid for the protection.
    pub stamina: Option<i32>,
    pub nano_deactivated: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub goo: Option<GooHit>,
    /// Hit points lost by falling out of the world.
    pub fell: Option<i32>,
    /// Hit points, battery or stamina moved.
    pub changed: bool,
}

/// Advances one player by one tick. `heal_due` is set on ticks that open a new heal
/// interval; heals and active-ability drain only happen on those.
pub fn tick_player(
    player: &mut Player,
    tick: &TickTuning,
    suspicion: &SuspicionTuning,
    heal_due: bool,
) -> TickReport {
    let mut report = TickReport::default();
    if player.hp <= 0 {
        return report;
    }
    let before = (player.hp, player.battery, player.stamina_snapshot());

    if player.condition & condition::INFECTION != 0 && !player.invulnerable {
        report.goo = Some(goo_hit(player, tick));
    }

    player.heal_cooldown = (player.heal_cooldown - tick.player_interval_ms as i64).max(0);
    if heal_due
        && !player.in_combat
        && player.hp > 0
        && player.hp < player.max_hp
        && player.heal_cooldown <= 0
    {
        player.hp = (player.hp + player.max_hp / tick.heal_divisor).min(player.max_hp);
    }

    let active = player.active_nano;
    for (slot, nano) in player.nanos.iter_mut().enumerate() {
        if Some(slot) == active {
            if heal_due {
                nano.stamina = (nano.stamina - (nano.drain_rate + 1)).max(0);
            }
        } else if nano.stamina < tick.stamina_cap {
            nano.stamina = (nano.stamina + tick.stamina_regen).min(tick.stamina_cap);
        }
    }
    if active
        .and_then(|slot| player.nanos.get(slot))
        .is_some_and(|nano| nano.stamina <= 0)
    {
        player.deactivate_nano();
    }

    if player.position.z < tick.fall_floor_z && player.hp > 0 {
        report.fell = Some(player.hp);
        player.hp = 0;
    }

    record_movement_tick(&mut player.suspicion, player.movements, suspicion);
    player.movements = 0;

    report.changed = before != (player.hp, player.battery, player.stamina_snapshot());
    report
}

fn goo_hit(player: &mut Player, tick: &TickTuning) -> GooHit {
    if player.condition & condition::PROTECT_INFECTION == 0 {
        let damage = player.max_hp * tick.goo_numerator / tick.goo_denominator;
        player.hp = (player.hp - damage).max(0);
        return GooHit {
            damage,
            protected: false,
            stamina: None,
            nano_deactivated: false,
        };
    }

    let mut hit = GooHit {
        damage: 0,
        protected: true,
        stamina: None,
        nano_deactivated: false,
    };
    // Protection granted by the player's own ability is paid for in stamina.
    if player.self_condition & condition::PROTECT_INFECTION != 0 {
        if let Some(slot) = player.active_nano {
            if let Some(nano) = player.nanos.get_mut(slot) {
                nano.stamina = (nano.stamina - tick.goo_shield_stamina_cost).max(0);
                hit.stamina = Some(nano.stamina);
                if nano.stamina == 0 {
                    player.deactivate_nano();
                    hit.nano_deactivated = true;
                }
            }
        }
    }
    hit
}

impl CombatWorld {
    pub fn player_tick(&mut self) {
        let now = self.clock.now_ms();
        let (tick, suspicion) = (self.tuning.tick, self.tuning.suspicion);
        let heal_due = now.saturating_sub(self.last_heal_tick) >= tick.heal_interval_ms;
        if heal_due {
            self.last_heal_tick = now;
        }

        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        for player_id in ids {
            let Some(player) = self.players.get_mut(&player_id) else {
                continue;
            };
            if player.session_killed {
                continue;
            }
            let report = tick_player(player, &tick, &suspicion, heal_due);
            let (hp, battery, stamina) = (player.hp, player.battery, player.stamina_snapshot());
            let (position, player_condition) = (player.position, player.condition);

            if let Some(goo) = report.goo {
                self.emit_to_audience(
                    &position,
                    player_id,
                    ServerEvent::GooDamage {
                        player_id,
                        damage: goo.damage,
                        hp,
                        protected: goo.protected,
                        stamina: goo.stamina,
                        nano_deactivated: goo.nano_deactivated,
                        condition: player_condition,
                    },
                );
            }
            if let Some(lost) = report.fell {
                info!(player_id, z = position.z, "player fell out of the world");
                self.emit_to_audience(
                    &position,
                    player_id,
                    ServerEvent::SuddenDeath {
                        player_id,
                        damage: lost,
                        hp,
                    },
                );
            }
            if report.changed {
                self.emit_to(
                    player_id,
                    ServerEvent::PlayerTick {
                        hp,
                        battery,
                        stamina,
                    },
                );
            }
        }
    }

    pub fn follower_tick(&mut self) {
        let now = self.clock.now_ms();
        let tick = self.tuning.tick;
        let attack_due =
            now.saturating_sub(self.last_follower_attack) >= tick.follower_attack_interval_ms;
        if attack_due {
            self.last_follower_attack = now;
        }

        let mut owners: Vec<(PlayerId, NpcId, i32, Position, bool)> = self
            .players
            .values()
            .filter(|player| !player.session_killed)
            .filter_map(|player| {
                player.follower.map(|npc_id| {
                    (
                        player.id,
                        npc_id,
                        player.follower_range,
                        player.position,
                        player.vanished,
                    )
                })
            })
            .collect();
        owners.sort_unstable_by_key(|owner| owner.0);

        for (owner_id, npc_id, range, owner_position, vanished) in owners {
            let Some(follower) = self.npcs.get(&npc_id) else {
                debug!(owner_id, npc_id, "follower is gone; unassigning");
                if let Some(owner) = self.players.get_mut(&owner_id) {
                    owner.follower = None;
                }
                continue;
            };
            let from = follower.position;

            // Attacking does not stop the follower from trailing its owner.
            if attack_due {
                if let Some(target) = self.nearest_mob(&from, range) {
                    self.follower_attack(npc_id, &from, target);
                }
            }

            if let Some(to) = next_step(&from, &owner_position, vanished, &tick) {
                if let Some(follower) = self.npcs.get_mut(&npc_id) {
                    follower.position = to;
                }
                self.emit_to_viewers(
                    &to,
                    None,
                    ServerEvent::NpcMove {
                        npc_id,
                        to,
                        speed: tick.follower_move_speed,
                    },
                );
            }
        }
    }

    /// Closest mob that can currently be damaged, within `range` of `from`.
    fn nearest_mob(&self, from: &Position, range: i32) -> Option<NpcId> {
        self.npcs
            .values()
            .filter(|npc| {
                npc.as_mob()
                    .is_some_and(|mob| mob.can_take_damage() && mob.hp > 0)
            })
            .map(|npc| (npc.position.planar_distance(from), npc.id))
            .filter(|(distance, _)| *distance <= range as f32)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    fn follower_attack(&mut self, follower_id: NpcId, from: &Position, target: NpcId) {
        let Some(template) = self.mob(target).map(|mob| mob.template) else {
            return;
        };
        let (amount, hit_flag) = damage(
            &DamageInput {
                attack: self.tuning.combat.follower_power,
                defense: template.protection,
                crit_rate: 0,
                crit_power: 1,
                attacker_style: None,
                defender_style: template.style,
            },
            &mut self.rng,
        );
        let dealt = self.hit_mob(target, amount, HitSource::Follower);
        let result = AttackResult {
            id: target,
            damage: dealt,
            hp: self.mob_hp(target),
            hit_flag,
        };
        self.emit_to_viewers(
            from,
            None,
            ServerEvent::NpcAttackNpc {
                npc_id: follower_id,
                result,
            },
        );
    }
}
