use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::domain::state::{Bullet, BulletKind, Player, PlayerId};
use crate::domain::tuning::ProjectileTuning;

/// In-flight grenades and rockets, keyed by owner and a small reusable slot id.
#[derive(Debug, Default)]
pub struct ProjectileRegistry {
    bullets: HashMap<PlayerId, BTreeMap<u8, Bullet>>,
    max_slots: u8,
}

impl ProjectileRegistry {
    pub fn new(tuning: &ProjectileTuning) -> Self {
        Self {
            bullets: HashMap::new(),
            max_slots: tuning.max_slots.max(1),
        }
    }

    /// Registers a new bullet for `player` and returns its slot.
    ///
    /// Damage figures and the launch position are captured now, including one boost roll
    /// paid for out of the player's battery.
    pub fn allocate<R: Rng + ?Sized>(
        &mut self,
        player: &mut Player,
        kind: BulletKind,
        rng: &mut R,
    ) -> u8 {
        let slots = self.bullets.entry(player.id).or_default();

        // Lowest id not held by a live bullet.
        let free = (0..self.max_slots).find(|slot| !slots.contains_key(slot));
        let slot = match free {
            Some(slot) => slot,
            None => {
                warn!(
                    player_id = player.id,
                    live = slots.len(),
                    "projectile slots exhausted; reusing slot 0"
                );
                0
            }
        };

        let mut bullet = Bullet {
            owner: player.id,
            slot,
            origin: player.position,
            point_damage: player.point_damage,
            group_damage: player.group_damage,
            kind,
        };

        if player.battery > 0 && player.boost_cost > 0 {
            let boost = player.roll_boost(rng);
            bullet.point_damage = bullet.point_damage.saturating_add(boost);
            bullet.group_damage = bullet.group_damage.saturating_add(boost);
            player.spend_boost();
        }

        slots.insert(slot, bullet);
        slot
    }

    pub fn get(&self, player_id: PlayerId, slot: u8) -> Option<&Bullet> {
        self.bullets.get(&player_id)?.get(&slot)
    }

    /// Frees the slot, handing back whatever bullet occupied it.
    pub fn take(&mut self, player_id: PlayerId, slot: u8) -> Option<Bullet> {
        let slots = self.bullets.get_mut(&player_id)?;
        let bullet = slots.remove(&slot);
        if slots.is_empty() {
            self.bullets.remove(&player_id);
        }
        bullet
    }

    /// Drops every bullet a departing player still had in flight.
    pub fn release_player(&mut self, player_id: PlayerId) -> usize {
        self.bullets
            .remove(&player_id)
            .map(|slots| slots.len())
            .unwrap_or(0)
    }

    pub fn live_count(&self, player_id: PlayerId) -> usize {
        self.bullets.get(&player_id).map_or(0, BTreeMap::len)
    }

    /// Converts a client-supplied bullet id into a slot, if it could name one.
    pub fn slot_from_wire(&self, bullet_id: i32) -> Option<u8> {
        u8::try_from(bullet_id)
            .ok()
            .filter(|slot| *slot < self.max_slots)
    }
}

/// Rockets hit harder the farther they travelled before impact.
pub fn rocket_falloff(damage: i32, distance: f32, tuning: &ProjectileTuning) -> i32 {
    if distance <= tuning.falloff_start {
        return damage;
    }
    let share = ((distance - tuning.falloff_start) / tuning.falloff_span).min(tuning.falloff_cap);
    (damage as f32 * (1.0 + share)) as i32
}
