// Use-case level inputs and outputs of the combat world.

use crate::domain::{
    AttackResult, CharAttackResult, CharTarget, Loadout, NpcId, PlayerId, Position, WeaponKind,
};

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join {
        player_id: PlayerId,
        loadout: Loadout,
        position: Position,
    },
    Leave {
        player_id: PlayerId,
    },
    Command {
        player_id: PlayerId,
        command: PlayerCommand,
    },
    SpawnNpc(NpcSpawn),
    GroupChanged {
        leader_id: PlayerId,
        member_ids: Vec<PlayerId>,
    },
    FollowerAssigned {
        player_id: PlayerId,
        npc_id: Option<NpcId>,
        range: i32,
    },
    MobStrike {
        npc_id: NpcId,
    },
}

/// Requests a connected player can make.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    Move {
        position: Position,
    },
    AttackNpcs {
        count: usize,
        npc_ids: Vec<NpcId>,
    },
    AttackChars {
        count: usize,
        targets: Vec<CharTarget>,
    },
    GrenadeFire {
        to: Position,
    },
    RocketFire {
        to: Position,
    },
    /// A `count` of zero reports a miss and only frees the slot.
    ProjectileHit {
        bullet_id: i32,
        count: usize,
        npc_ids: Vec<NpcId>,
    },
    CombatBegin,
    CombatEnd,
    DotDamageToggle {
        enabled: bool,
    },
    EquipWeapon {
        weapon: WeaponKind,
        weapon_id: i32,
    },
    SummonNano {
        slot: Option<usize>,
    },
}

#[derive(Debug, Clone)]
pub enum NpcSpawnKind {
    Mob {
        mob_type: i32,
        group_leader: Option<NpcId>,
    },
    Follower,
    Passive,
}

#[derive(Debug, Clone)]
pub struct NpcSpawn {
    pub npc_id: NpcId,
    pub npc_type: i32,
    pub position: Position,
    pub kind: NpcSpawnKind,
    pub path: Vec<Position>,
    pub static_path: bool,
}

/// Everything the world can tell players about.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    AttackNpcsSucc {
        battery: i32,
        results: Vec<AttackResult>,
    },
    AttackNpcs {
        player_id: PlayerId,
        results: Vec<AttackResult>,
    },
    AttackCharsSucc {
        battery: i32,
        results: Vec<CharAttackResult>,
    },
    AttackChars {
        player_id: PlayerId,
        results: Vec<CharAttackResult>,
    },
    /// Acknowledges both grenades and rockets.
    GrenadeFireSucc {
        to: Position,
        bullet_id: u8,
        bullet_kind: i32,
        battery: i32,
    },
    GrenadeFire {
        player_id: PlayerId,
        to: Position,
        bullet_id: u8,
        bullet_kind: i32,
    },
    GrenadeHit {
        player_id: PlayerId,
        bullet_id: u8,
        bullet_kind: i32,
        results: Vec<AttackResult>,
    },
    NpcBuffTimeout {
        npc_id: NpcId,
        condition: u32,
    },
    NpcAttackPlayers {
        npc_id: NpcId,
        results: Vec<AttackResult>,
    },
    NpcAttackNpc {
        npc_id: NpcId,
        result: AttackResult,
    },
    NpcMove {
        npc_id: NpcId,
        to: Position,
        speed: i32,
    },
    GooDamage {
        player_id: PlayerId,
        damage: i32,
        hp: i32,
        protected: bool,
        stamina: Option<i32>,
        nano_deactivated: bool,
        condition: u32,
    },
    PlayerTick {
        hp: i32,
        battery: i32,
        stamina: [i32; 3],
    },
    SuddenDeath {
        player_id: PlayerId,
        damage: i32,
        hp: i32,
    },
    BuffUpdate {
        condition: u32,
    },
    EquipChange {
        player_id: PlayerId,
        weapon_id: i32,
    },
    /// The session is being dropped; nothing else will be sent to it.
    Disconnect {
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipients: Vec<PlayerId>,
    pub event: ServerEvent,
}
