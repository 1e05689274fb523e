// Grenades and rockets: firing allocates a bullet slot, the later hit report spends it.

use tracing::debug;

use super::kill::HitSource;
use super::types::ServerEvent;
use super::validation::{
    ATTACK_RESULT_SIZE, GRENADE_HIT_HEADER, result_capacity, validate_targets,
};
use super::world::CombatWorld;
use crate::domain::systems::damage::{DamageInput, damage};
use crate::domain::systems::projectiles::rocket_falloff;
use crate::domain::systems::suspicion::{self, Verdict};
use crate::domain::{AttackResult, BulletKind, CombatError, NpcId, PlayerId, Position};

impl CombatWorld {
    pub(crate) fn grenade_fire(&mut self, player_id: PlayerId, to: Position) -> Result<(), CombatError> {
        self.launch(player_id, to, |_| BulletKind::Grenade)
    }

    /// Rockets fly toward a point just above the shooter's height, whatever the client sent.
    pub(crate) fn rocket_fire(&mut self, player_id: PlayerId, to: Position) -> Result<(), CombatError> {
        let aim_height = self.tuning.projectile.rocket_aim_height;
        let shooter_z = self.live_player(player_id)?.position.z;
        let to = Position {
            z: shooter_z + aim_height,
            ..to
        };
        self.launch(player_id, to, |weapon_id| BulletKind::Rocket { weapon_id })
    }

    fn launch(
        &mut self,
        player_id: PlayerId,
        to: Position,
        kind: impl FnOnce(i32) -> BulletKind,
    ) -> Result<(), CombatError> {
        let now = self.clock.now_ms();
        let suspicion_tuning = self.tuning.suspicion;
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(CombatError::UnknownPlayer(player_id))?;
        if suspicion::record_shot(player, &suspicion_tuning, now) == Verdict::Terminate {
            self.kill_session(player_id, "fire rate");
            return Ok(());
        }

        let kind = kind(player.weapon_id);
        let bullet_id = self.projectiles.allocate(player, kind, &mut self.rng);
        let (battery, position) = (player.battery, player.position);
        let bullet_kind = kind.wire_id();
        debug!(player_id, bullet_id, bullet_kind, "projectile launched");

        self.emit_to(
            player_id,
            ServerEvent::GrenadeFireSucc {
                to,
                bullet_id,
                bullet_kind,
                battery,
            },
        );
        self.emit_to_viewers(
            &position,
            Some(player_id),
            ServerEvent::GrenadeFire {
                player_id,
                to,
                bullet_id,
                bullet_kind,
            },
        );
        Ok(())
    }

    /// Resolves a bullet against the mobs it reportedly hit. An empty report is a miss
    /// and only frees the slot.
    pub(crate) fn projectile_hit(
        &mut self,
        player_id: PlayerId,
        bullet_id: i32,
        count: usize,
        npc_ids: &[NpcId],
    ) -> Result<(), CombatError> {
        validate_targets(
            count,
            npc_ids.len(),
            None,
            result_capacity(GRENADE_HIT_HEADER, ATTACK_RESULT_SIZE),
        )?;
        let slot = self
            .projectiles
            .slot_from_wire(bullet_id)
            .filter(|slot| self.projectiles.get(player_id, *slot).is_some())
            .ok_or(CombatError::UnknownBullet {
                player_id,
                bullet_id,
            })?;

        if npc_ids.is_empty() {
            self.projectiles.take(player_id, slot);
            debug!(player_id, bullet_id, "projectile missed");
            return Ok(());
        }
        let targets = self.resolve_mobs(npc_ids)?;
        let player = self.live_player(player_id)?;
        let penalty = suspicion::penalty(player.suspicion.fire_rate, &self.tuning.suspicion);
        let (attacker_style, position) = (player.active_style(), player.position);
        let falloff = self.tuning.projectile;

        let Some(bullet) = self.projectiles.take(player_id, slot) else {
            return Ok(());
        };

        let mut results = Vec::with_capacity(targets.len());
        for (npc_id, template) in targets {
            let (amount, hit_flag) = damage(
                &DamageInput {
                    attack: bullet.base_damage(count),
                    defense: template.protection,
                    crit_rate: 0,
                    crit_power: 1,
                    attacker_style,
                    defender_style: template.style,
                },
                &mut self.rng,
            );
            let mut amount = amount;
            if let BulletKind::Rocket { .. } = bullet.kind {
                if let Some(npc) = self.npcs.get(&npc_id) {
                    let travelled = bullet.origin.planar_distance(&npc.position);
                    amount = rocket_falloff(amount, travelled, &falloff);
                }
            }
            // The suspicion penalty scales the finished figure, distance bonus included.
            let amount = (amount as f32 * penalty) as i32;

            let dealt = self.hit_mob(npc_id, amount, HitSource::Player(player_id));
            results.push(AttackResult {
                id: npc_id,
                damage: dealt,
                hp: self.mob_hp(npc_id),
                hit_flag,
            });
        }

        self.emit_to_audience(
            &position,
            player_id,
            ServerEvent::GrenadeHit {
                player_id,
                bullet_id: slot,
                bullet_kind: bullet.kind.wire_id(),
                results,
            },
        );
        Ok(())
    }
}
