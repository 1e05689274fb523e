// Wire protocol DTOs and conversions for the public combat socket.
// Internal service-to-service payloads live next to their routes in `net::internal`.

use crate::domain::{AttackResult, CharAttackResult, CharTarget, Position, TargetKind, WeaponKind};
use crate::use_cases::{PlayerCommand, ServerEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake; nothing else is accepted until it arrives.
    Join(JoinPayload),
    Move {
        position: PositionDto,
    },
    AttackNpcs {
        count: usize,
        npc_ids: Vec<i32>,
    },
    AttackChars {
        count: usize,
        targets: Vec<CharTargetDto>,
    },
    GrenadeFire {
        to: PositionDto,
    },
    RocketFire {
        to: PositionDto,
    },
    ProjectileHit {
        bullet_id: i32,
        count: usize,
        #[serde(default)]
        npc_ids: Vec<i32>,
    },
    CombatBegin,
    CombatEnd,
    DotDamageToggle {
        enabled: bool,
    },
    EquipWeapon {
        weapon: WeaponKindDto,
        weapon_id: i32,
    },
    SummonNano {
        slot: Option<usize>,
    },
}

/// Payload for the Join handshake. The token was issued by the login service; the
/// player id and stats it stands for never come from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    pub session_token: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDto {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl From<PositionDto> for Position {
    fn from(dto: PositionDto) -> Self {
        Position::new(dto.x, dto.y, dto.z)
    }
}

impl From<Position> for PositionDto {
    fn from(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum WeaponKindDto {
    Melee,
    Rifle,
    Other,
}

impl From<WeaponKindDto> for WeaponKind {
    fn from(dto: WeaponKindDto) -> Self {
        match dto {
            WeaponKindDto::Melee => WeaponKind::Melee,
            WeaponKindDto::Rifle => WeaponKind::Rifle,
            WeaponKindDto::Other => WeaponKind::Other,
        }
    }
}

/// Target of the mixed attack; `kind` is 1 for players and 4 for NPCs.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CharTargetDto {
    pub id: i32,
    pub kind: i32,
}

impl TryFrom<CharTargetDto> for CharTarget {
    type Error = ProtocolError;

    fn try_from(dto: CharTargetDto) -> Result<Self, Self::Error> {
        let kind = TargetKind::from_code(dto.kind).ok_or(ProtocolError::TargetKind(dto.kind))?;
        Ok(CharTarget { id: dto.id, kind })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("join is only valid as the first message")]
    UnexpectedJoin,
    #[error("unknown target kind {0}")]
    TargetKind(i32),
}

impl TryFrom<ClientMessage> for PlayerCommand {
    type Error = ProtocolError;

    fn try_from(msg: ClientMessage) -> Result<Self, Self::Error> {
        Ok(match msg {
            ClientMessage::Join(_) => return Err(ProtocolError::UnexpectedJoin),
            ClientMessage::Move { position } => PlayerCommand::Move {
                position: position.into(),
            },
            ClientMessage::AttackNpcs { count, npc_ids } => {
                PlayerCommand::AttackNpcs { count, npc_ids }
            }
            ClientMessage::AttackChars { count, targets } => PlayerCommand::AttackChars {
                count,
                targets: targets
                    .into_iter()
                    .map(CharTarget::try_from)
                    .collect::<Result<_, _>>()?,
            },
            ClientMessage::GrenadeFire { to } => PlayerCommand::GrenadeFire { to: to.into() },
            ClientMessage::RocketFire { to } => PlayerCommand::RocketFire { to: to.into() },
            ClientMessage::ProjectileHit {
                bullet_id,
                count,
                npc_ids,
            } => PlayerCommand::ProjectileHit {
                bullet_id,
                count,
                npc_ids,
            },
            ClientMessage::CombatBegin => PlayerCommand::CombatBegin,
            ClientMessage::CombatEnd => PlayerCommand::CombatEnd,
            ClientMessage::DotDamageToggle { enabled } => {
                PlayerCommand::DotDamageToggle { enabled }
            }
            ClientMessage::EquipWeapon { weapon, weapon_id } => PlayerCommand::EquipWeapon {
                weapon: weapon.into(),
                weapon_id,
            },
            ClientMessage::SummonNano { slot } => PlayerCommand::SummonNano { slot },
        })
    }
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Confirms the Join and the identity the session is bound to.
    Identity {
        player_id: i32,
    },
    AttackNpcsSucc {
        battery: i32,
        results: Vec<AttackResultDto>,
    },
    AttackNpcs {
        player_id: i32,
        results: Vec<AttackResultDto>,
    },
    AttackCharsSucc {
        battery: i32,
        results: Vec<CharAttackResultDto>,
    },
    AttackChars {
        player_id: i32,
        results: Vec<CharAttackResultDto>,
    },
    GrenadeFireSucc {
        to: PositionDto,
        bullet_id: u8,
        bullet_kind: i32,
        battery: i32,
    },
    GrenadeFire {
        player_id: i32,
        to: PositionDto,
        bullet_id: u8,
        bullet_kind: i32,
    },
    GrenadeHit {
        player_id: i32,
        bullet_id: u8,
        bullet_kind: i32,
        results: Vec<AttackResultDto>,
    },
    NpcBuffTimeout {
        npc_id: i32,
        condition: u32,
    },
    NpcAttackPlayers {
        npc_id: i32,
        results: Vec<AttackResultDto>,
    },
    NpcAttackNpc {
        npc_id: i32,
        result: AttackResultDto,
    },
    NpcMove {
        npc_id: i32,
        to: PositionDto,
        speed: i32,
    },
    GooDamage {
        player_id: i32,
        damage: i32,
        hp: i32,
        protected: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
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
        player_id: i32,
        damage: i32,
        hp: i32,
    },
    BuffUpdate {
        condition: u32,
    },
    EquipChange {
        player_id: i32,
        weapon_id: i32,
    },
    Disconnect {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackResultDto {
    pub id: i32,
    pub damage: i32,
    pub hp: i32,
    // 1 for a normal hit, 2 for a critical.
    pub hit_flag: i32,
}

impl From<AttackResult> for AttackResultDto {
    fn from(result: AttackResult) -> Self {
        Self {
            id: result.id,
            damage: result.damage,
            hp: result.hp,
            hit_flag: result.hit_flag.code(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharAttackResultDto {
    pub kind: i32,
    #[serde(flatten)]
    pub result: AttackResultDto,
}

impl From<CharAttackResult> for CharAttackResultDto {
    fn from(result: CharAttackResult) -> Self {
        Self {
            kind: result.kind.code(),
            result: result.result.into(),
        }
    }
}

fn dtos<T, D: From<T>>(items: Vec<T>) -> Vec<D> {
    items.into_iter().map(D::from).collect()
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::AttackNpcsSucc { battery, results } => ServerMessage::AttackNpcsSucc {
                battery,
                results: dtos(results),
            },
            ServerEvent::AttackNpcs { player_id, results } => ServerMessage::AttackNpcs {
                player_id,
                results: dtos(results),
            },
            ServerEvent::AttackCharsSucc { battery, results } => ServerMessage::AttackCharsSucc {
                battery,
                results: dtos(results),
            },
            ServerEvent::AttackChars { player_id, results } => ServerMessage::AttackChars {
                player_id,
                results: dtos(results),
            },
            ServerEvent::GrenadeFireSucc {
                to,
                bullet_id,
                bullet_kind,
                battery,
            } => ServerMessage::GrenadeFireSucc {
                to: to.into(),
                bullet_id,
                bullet_kind,
                battery,
            },
            ServerEvent::GrenadeFire {
                player_id,
                to,
                bullet_id,
                bullet_kind,
            } => ServerMessage::GrenadeFire {
                player_id,
                to: to.into(),
                bullet_id,
                bullet_kind,
            },
            ServerEvent::GrenadeHit {
                player_id,
                bullet_id,
                bullet_kind,
                results,
            } => ServerMessage::GrenadeHit {
                player_id,
                bullet_id,
                bullet_kind,
                results: dtos(results),
            },
            ServerEvent::NpcBuffTimeout { npc_id, condition } => {
                ServerMessage::NpcBuffTimeout { npc_id, condition }
            }
            ServerEvent::NpcAttackPlayers { npc_id, results } => ServerMessage::NpcAttackPlayers {
                npc_id,
                results: dtos(results),
            },
            ServerEvent::NpcAttackNpc { npc_id, result } => ServerMessage::NpcAttackNpc {
                npc_id,
                result: result.into(),
            },
            ServerEvent::NpcMove { npc_id, to, speed } => ServerMessage::NpcMove {
                npc_id,
                to: to.into(),
                speed,
            },
            ServerEvent::GooDamage {
                player_id,
                damage,
                hp,
                protected,
                stamina,
                nano_deactivated,
                condition,
            } => ServerMessage::GooDamage {
                player_id,
                damage,
                hp,
                protected,
                stamina,
                nano_deactivated,
                condition,
            },
            ServerEvent::PlayerTick {
                hp,
                battery,
                stamina,
            } => ServerMessage::PlayerTick {
                hp,
                battery,
                stamina,
            },
            ServerEvent::SuddenDeath {
                player_id,
                damage,
                hp,
            } => ServerMessage::SuddenDeath {
                player_id,
                damage,
                hp,
            },
            ServerEvent::BuffUpdate { condition } => ServerMessage::BuffUpdate { condition },
            ServerEvent::EquipChange {
                player_id,
                weapon_id,
            } => ServerMessage::EquipChange {
                player_id,
                weapon_id,
            },
            ServerEvent::Disconnect { reason } => ServerMessage::Disconnect {
                reason: reason.to_string(),
            },
        }
    }
}
