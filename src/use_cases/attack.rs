// Melee and hitscan attacks: point attacks on mobs and the privileged mixed-target variant.

use tracing::debug;

use super::kill::HitSource;
use super::types::ServerEvent;
use super::validation::{
    ATTACK_CHARS_HEADER, ATTACK_NPCS_HEADER, ATTACK_RESULT_SIZE, CHAR_ATTACK_RESULT_SIZE,
    result_capacity, validate_targets,
};
use super::world::CombatWorld;
use crate::domain::systems::damage::{DamageInput, damage};
use crate::domain::systems::suspicion::{self, Verdict};
use crate::domain::tuning::CombatTuning;
use crate::domain::{
    AttackResult, CharAttackResult, CharTarget, CombatError, MobTemplate, NpcId, Player,
    PlayerId, TargetKind, WeaponKind,
};

/// Crit rate (percent) and power for the next swing. Advances the melee combo.
pub fn next_crit_profile(player: &mut Player, tuning: &CombatTuning) -> (i32, i32) {
    match player.weapon {
        WeaponKind::Melee => {
            player.combos += 1;
            if player.combos >= tuning.combo_length {
                player.combos = 0;
                (100, tuning.combo_crit_power)
            } else {
                (0, tuning.default_crit_power)
            }
        }
        WeaponKind::Rifle => {
            player.combos = 0;
            (tuning.rifle_crit_rate, tuning.default_crit_power)
        }
        WeaponKind::Other => {
            player.combos = 0;
            (tuning.default_crit_rate, tuning.default_crit_power)
        }
    }
}

enum CharTargetRef {
    Player(PlayerId),
    Mob(NpcId, MobTemplate),
}

impl CombatWorld {
    /// Looks every id up before anything is touched; one bad id rejects the message.
    pub(crate) fn resolve_mobs(
        &self,
        npc_ids: &[NpcId],
    ) -> Result<Vec<(NpcId, MobTemplate)>, CombatError> {
        npc_ids
            .iter()
            .map(|npc_id| {
                let npc = self
                    .npcs
                    .get(npc_id)
                    .ok_or(CombatError::UnknownNpc(*npc_id))?;
                let mob = npc.as_mob().ok_or(CombatError::NotAMob(*npc_id))?;
                Ok((*npc_id, mob.template))
            })
            .collect()
    }

    pub(crate) fn mob_hp(&self, npc_id: NpcId) -> i32 {
        self.mob(npc_id).map_or(0, |mob| mob.hp)
    }

    pub(crate) fn attack_npcs(
        &mut self,
        player_id: PlayerId,
        count: usize,
        npc_ids: &[NpcId],
    ) -> Result<(), CombatError> {
        validate_targets(
            count,
            npc_ids.len(),
            Some(self.tuning.combat.max_point_targets),
            result_capacity(ATTACK_NPCS_HEADER, ATTACK_RESULT_SIZE),
        )?;
        let targets = self.resolve_mobs(npc_ids)?;

        let now = self.clock.now_ms();
        let combat = self.tuning.combat;
        let suspicion_tuning = self.tuning.suspicion;
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(CombatError::UnknownPlayer(player_id))?;
        let penalty = match suspicion::record_shot(player, &suspicion_tuning, now) {
            Verdict::Allow { penalty } => penalty,
            Verdict::Terminate => {
                self.kill_session(player_id, "attack rate");
                return Ok(());
            }
        };
        let (crit_rate, crit_power) = next_crit_profile(player, &combat);
        let attacker_style = player.active_style();

        let mut results = Vec::with_capacity(targets.len());
        for (npc_id, template) in targets {
            let Some(player) = self.players.get(&player_id) else {
                break;
            };
            let attack = player
                .base_damage(count)
                .saturating_add(player.roll_boost(&mut self.rng));
            let (amount, hit_flag) = damage(
                &DamageInput {
                    attack,
                    defense: template.protection,
                    crit_rate,
                    crit_power,
                    attacker_style,
                    defender_style: template.style,
                },
                &mut self.rng,
            );
            let amount = (amount as f32 * penalty) as i32;
            let dealt = self.hit_mob(npc_id, amount, HitSource::Player(player_id));
            results.push(AttackResult {
                id: npc_id,
                damage: dealt,
                hp: self.mob_hp(npc_id),
                hit_flag,
            });
        }

        let Some(player) = self.players.get_mut(&player_id) else {
            return Ok(());
        };
        player.spend_boost();
        let (battery, position) = (player.battery, player.position);
        debug!(player_id, targets = results.len(), penalty, "attack resolved");

        self.emit_to(
            player_id,
            ServerEvent::AttackNpcsSucc {
                battery,
                results: results.clone(),
            },
        );
        self.emit_to_viewers(
            &position,
            Some(player_id),
            ServerEvent::AttackNpcs { player_id, results },
        );
        Ok(())
    }

    /// Unrestricted attack on any mix of players and mobs, for privileged accounts.
    pub(crate) fn attack_chars(
        &mut self,
        player_id: PlayerId,
        count: usize,
        targets: &[CharTarget],
    ) -> Result<(), CombatError> {
        let combat = self.tuning.combat;
        let player = self.live_player(player_id)?;
        if player.account_level > combat.gm_account_level {
            return Err(CombatError::NotPrivileged(player_id));
        }
        let attacker_style = player.active_style();

        validate_targets(
            count,
            targets.len(),
            None,
            result_capacity(ATTACK_CHARS_HEADER, CHAR_ATTACK_RESULT_SIZE),
        )?;

        let resolved = targets
            .iter()
            .map(|target| match target.kind {
                TargetKind::Player if self.players.contains_key(&target.id) => {
                    Ok(CharTargetRef::Player(target.id))
                }
                TargetKind::Player => Err(CombatError::UnknownPlayer(target.id)),
                TargetKind::Npc => self
                    .resolve_mobs(&[target.id])
                    .map(|mut found| found.remove(0))
                    .map(|(npc_id, template)| CharTargetRef::Mob(npc_id, template)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut results = Vec::with_capacity(resolved.len());
        for target in resolved {
            let Some(player) = self.players.get(&player_id) else {
                break;
            };
            let attack = player
                .base_damage(count)
                .saturating_add(player.roll_boost(&mut self.rng));

            let result = match target {
                CharTargetRef::Player(target_id) => {
                    let Some(victim) = self.players.get_mut(&target_id) else {
                        continue;
                    };
                    let (amount, hit_flag) = damage(
                        &DamageInput {
                            attack,
                            defense: victim.defense,
                            crit_rate: combat.gm_crit_rate,
                            crit_power: 1,
                            attacker_style: None,
                            defender_style: None,
                        },
                        &mut self.rng,
                    );
                    victim.hp -= amount;
                    CharAttackResult {
                        kind: TargetKind::Player,
                        result: AttackResult {
                            id: target_id,
                            damage: amount,
                            hp: victim.hp,
                            hit_flag,
                        },
                    }
                }
                CharTargetRef::Mob(npc_id, template) => {
                    let (amount, hit_flag) = damage(
                        &DamageInput {
                            attack,
                            defense: template.protection,
                            crit_rate: combat.gm_crit_rate,
                            crit_power: combat.default_crit_power,
                            attacker_style,
                            defender_style: template.style,
                        },
                        &mut self.rng,
                    );
                    let dealt = self.hit_mob(npc_id, amount, HitSource::Player(player_id));
                    CharAttackResult {
                        kind: TargetKind::Npc,
                        result: AttackResult {
                            id: npc_id,
                            damage: dealt,
                            hp: self.mob_hp(npc_id),
                            hit_flag,
                        },
                    }
                }
            };
            results.push(result);
        }

        let Some(player) = self.players.get_mut(&player_id) else {
            return Ok(());
        };
        player.spend_boost();
        let (battery, position) = (player.battery, player.position);

        self.emit_to(
            player_id,
            ServerEvent::AttackCharsSucc {
                battery,
                results: results.clone(),
            },
        );
        self.emit_to_viewers(
            &position,
            Some(player_id),
            ServerEvent::AttackChars { player_id, results },
        );
        Ok(())
    }
}
