// Domain-level combat entities: the player slice, NPCs and mobs, bullets and attack results.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::errors::CombatError;
use super::tables::MobTemplate;

pub type PlayerId = i32;
pub type NpcId = i32;

/// Condition bits shared by players and mobs.
pub mod condition {
    /// Crowd-control sleep; cleared by any damaging hit.
    pub const MEZ: u32 = 1 << 3;
    /// Shields the holder from goo/infection damage.
    pub const PROTECT_INFECTION: u32 = 1 << 5;
    /// Standing in goo; deals periodic environmental damage.
    pub const INFECTION: u32 = 1 << 18;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Distance on the ground plane; height is ignored.
    pub fn planar_distance(&self, other: &Position) -> f32 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy) as f32
    }
}

/// The three-way type-advantage wheel. Each style beats exactly one other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    Adaptium,
    Blastons,
    Cosmix,
}

impl Style {
    pub fn index(self) -> i32 {
        match self {
            Style::Adaptium => 0,
            Style::Blastons => 1,
            Style::Cosmix => 2,
        }
    }

    pub fn from_index(index: i32) -> Option<Style> {
        match index {
            0 => Some(Style::Adaptium),
            1 => Some(Style::Blastons),
            2 => Some(Style::Cosmix),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeaponKind {
    Melee,
    Rifle,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitFlag {
    Normal,
    Critical,
}

impl HitFlag {
    /// Wire code carried in attack results.
    pub fn code(self) -> i32 {
        match self {
            HitFlag::Normal => 1,
            HitFlag::Critical => 2,
        }
    }
}

/// Full stamina of an ability slot.
pub const NANO_STAMINA_CAP: i32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NanoSlot {
    pub stamina: i32,
    pub drain_rate: i32,
    pub style: Option<Style>,
}

impl Default for NanoSlot {
    fn default() -> Self {
        Self {
            stamina: NANO_STAMINA_CAP,
            drain_rate: 0,
            style: None,
        }
    }
}

/// Two independent cadence heuristics: movement spam and rapid fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Suspicion {
    pub movement: i32,
    pub fire_rate: i32,
}

/// Group view owned by the grouping collaborator; combat only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub leader_id: PlayerId,
    pub member_ids: Vec<PlayerId>,
}

impl GroupMembership {
    pub fn solo(player_id: PlayerId) -> Self {
        Self {
            leader_id: player_id,
            member_ids: vec![player_id],
        }
    }
}

/// Combat stats a session brings with it at login.
#[derive(Debug, Clone)]
pub struct Loadout {
    pub level: i32,
    pub max_hp: i32,
    pub account_level: i32,
    pub defense: i32,
    pub point_damage: i32,
    pub group_damage: i32,
    pub boost_damage: i32,
    pub boost_cost: i32,
    pub battery: i32,
    pub fire_rate: i32,
    pub weapon: WeaponKind,
    pub weapon_id: i32,
    pub nanos: [NanoSlot; 3],
    pub active_nano: Option<usize>,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            level: 1,
            max_hp: 1000,
            account_level: 99,
            defense: 50,
            point_damage: 120,
            group_damage: 80,
            boost_damage: 40,
            boost_cost: 10,
            battery: 100,
            fire_rate: 5,
            weapon: WeaponKind::Other,
            weapon_id: 0,
            nanos: [NanoSlot::default(); 3],
            active_nano: None,
        }
    }
}

impl Loadout {
    /// Rejects stats no real character can carry. The damage path relies on these
    /// bounds to keep its sums far from `i32` overflow.
    pub fn check(&self) -> Result<(), CombatError> {
        let bounds: [(&'static str, i32, RangeInclusive<i32>); 10] = [
            ("level", self.level, 1..=1_000),
            ("max_hp", self.max_hp, 1..=1_000_000),
            ("account_level", self.account_level, 0..=1_000),
            ("defense", self.defense, 0..=100_000),
            ("point_damage", self.point_damage, 0..=100_000),
            ("group_damage", self.group_damage, 0..=100_000),
            ("boost_damage", self.boost_damage, 0..=100_000),
            ("boost_cost", self.boost_cost, 1..=100_000),
            ("battery", self.battery, 0..=1_000_000),
            ("fire_rate", self.fire_rate, 1..=10_000),
        ];
        for (field, value, range) in bounds {
            if !range.contains(&value) {
                return Err(CombatError::InvalidLoadout { field });
            }
        }

        for nano in &self.nanos {
            if !(0..=NANO_STAMINA_CAP).contains(&nano.stamina) {
                return Err(CombatError::InvalidLoadout { field: "nano.stamina" });
            }
            if !(0..=NANO_STAMINA_CAP).contains(&nano.drain_rate) {
                return Err(CombatError::InvalidLoadout {
                    field: "nano.drain_rate",
                });
            }
        }
        if self.active_nano.is_some_and(|slot| slot >= self.nanos.len()) {
            return Err(CombatError::InvalidLoadout {
                field: "active_nano",
            });
        }
        Ok(())
    }
}

pub struct Player {
    pub id: PlayerId,
    pub level: i32,
    pub account_level: i32,

    pub hp: i32,
    pub max_hp: i32,
    pub defense: i32,

    // Offense.
    pub point_damage: i32,
    pub group_damage: i32,
    pub boost_damage: i32,
    pub boost_cost: i32,
    pub battery: i32,
    pub fire_rate: i32,
    pub weapon: WeaponKind,
    pub weapon_id: i32,
    pub combos: u8,

    // Anti-cheat bookkeeping (millisecond timestamps).
    pub suspicion: Suspicion,
    pub movements: u32,
    pub last_shot: u64,
    pub last_activity: u64,

    pub in_combat: bool,
    pub heal_cooldown: i64,
    pub condition: u32,
    pub self_condition: u32,
    pub invulnerable: bool,
    pub vanished: bool,

    pub active_nano: Option<usize>,
    pub nanos: [NanoSlot; 3],

    pub group: GroupMembership,
    pub follower: Option<NpcId>,
    pub follower_range: i32,

    pub position: Position,
    // Set when anti-cheat dropped the connection; further input is ignored.
    pub session_killed: bool,
}

impl Player {
    pub fn new(id: PlayerId, loadout: &Loadout, position: Position, now: u64) -> Self {
        Self {
            id,
            level: loadout.level,
            account_level: loadout.account_level,
            hp: loadout.max_hp,
            max_hp: loadout.max_hp,
            defense: loadout.defense,
            point_damage: loadout.point_damage,
            group_damage: loadout.group_damage,
            boost_damage: loadout.boost_damage,
            boost_cost: loadout.boost_cost,
            battery: loadout.battery,
            fire_rate: loadout.fire_rate,
            weapon: loadout.weapon,
            weapon_id: loadout.weapon_id,
            combos: 0,
            suspicion: Suspicion::default(),
            movements: 0,
            last_shot: 0,
            last_activity: now,
            in_combat: false,
            heal_cooldown: 0,
            condition: 0,
            self_condition: 0,
            invulnerable: false,
            vanished: false,
            active_nano: loadout.active_nano.filter(|slot| *slot < loadout.nanos.len()),
            nanos: loadout.nanos,
            group: GroupMembership::solo(id),
            follower: None,
            follower_range: 0,
            position,
            session_killed: false,
        }
    }

    /// Style of the active ability, if any.
    pub fn active_style(&self) -> Option<Style> {
        self.active_nano
            .and_then(|slot| self.nanos.get(slot))
            .and_then(|nano| nano.style)
    }

    pub fn deactivate_nano(&mut self) {
        self.active_nano = None;
    }

    pub fn is_solo(&self) -> bool {
        self.group.member_ids.len() <= 1 && self.group.leader_id == self.id
    }

    /// Base damage figure for a hit against `target_count` simultaneous targets.
    pub fn base_damage(&self, target_count: usize) -> i32 {
        if target_count > 1 {
            self.group_damage
        } else {
            self.point_damage
        }
    }

    /// Random bonus scaled by how much of one boost the battery can still pay for.
    pub fn roll_boost<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.battery <= 0 || self.boost_cost <= 0 {
            return 0;
        }
        let ratio = (self.battery as f32 / self.boost_cost as f32).min(1.0);
        let ceiling = (self.boost_damage as f32 * ratio) as i32;
        if ceiling <= 0 {
            return 0;
        }
        rng.gen_range(0..ceiling)
    }

    pub fn spend_boost(&mut self) {
        self.battery = self.battery.saturating_sub(self.boost_cost).max(0);
    }

    pub fn stamina_snapshot(&self) -> [i32; 3] {
        [
            self.nanos[0].stamina,
            self.nanos[1].stamina,
            self.nanos[2].stamina,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobState {
    Roaming,
    Combat,
    Retreat,
    Dead,
}

#[derive(Debug, Clone)]
pub struct Mob {
    pub mob_type: i32,
    pub template: MobTemplate,
    pub hp: i32,
    pub state: MobState,
    pub target: Option<PlayerId>,
    pub group_leader: Option<NpcId>,
    // Casting a guarded ability makes the mob untouchable.
    pub casting_guarded: bool,
    pub condition: u32,
    // (condition bit, expiry ms) pairs awaiting removal.
    pub unbuff_times: Vec<(u32, u64)>,
    pub killed_at: Option<u64>,
    pub despawned: bool,
    pub static_path: bool,
}

impl Mob {
    pub fn spawn(mob_type: i32, template: MobTemplate) -> Self {
        Self {
            mob_type,
            hp: template.max_hp,
            template,
            state: MobState::Roaming,
            target: None,
            group_leader: None,
            casting_guarded: false,
            condition: 0,
            unbuff_times: Vec::new(),
            killed_at: None,
            despawned: false,
            static_path: false,
        }
    }
}

/// Closed set of NPC kinds the combat core dispatches on.
#[derive(Debug, Clone)]
pub enum NpcKind {
    Mob(Mob),
    Follower,
    Passive,
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub id: NpcId,
    pub npc_type: i32,
    pub position: Position,
    pub kind: NpcKind,
}

impl Npc {
    pub fn as_mob(&self) -> Option<&Mob> {
        match &self.kind {
            NpcKind::Mob(mob) => Some(mob),
            NpcKind::Follower | NpcKind::Passive => None,
        }
    }

    pub fn as_mob_mut(&mut self) -> Option<&mut Mob> {
        match &mut self.kind {
            NpcKind::Mob(mob) => Some(mob),
            NpcKind::Follower | NpcKind::Passive => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletKind {
    Grenade,
    Rocket { weapon_id: i32 },
}

impl BulletKind {
    /// Grenades are tagged 1 on the wire, rockets carry the launching weapon id.
    pub fn wire_id(self) -> i32 {
        match self {
            BulletKind::Grenade => 1,
            BulletKind::Rocket { weapon_id } => weapon_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub owner: PlayerId,
    pub slot: u8,
    pub origin: Position,
    // Snapshotted at fire time, boost roll included.
    pub point_damage: i32,
    pub group_damage: i32,
    pub kind: BulletKind,
}

impl Bullet {
    pub fn base_damage(&self, target_count: usize) -> i32 {
        if target_count > 1 {
            self.group_damage
        } else {
            self.point_damage
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Player,
    Npc,
}

impl TargetKind {
    pub fn code(self) -> i32 {
        match self {
            TargetKind::Player => 1,
            TargetKind::Npc => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<TargetKind> {
        match code {
            1 => Some(TargetKind::Player),
            4 => Some(TargetKind::Npc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharTarget {
    pub id: i32,
    pub kind: TargetKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackResult {
    pub id: i32,
    pub damage: i32,
    pub hp: i32,
    pub hit_flag: HitFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharAttackResult {
    pub kind: TargetKind,
    pub result: AttackResult,
}
