// Routes for the services that feed the combat world: session grants from the login
// service, NPC spawning, grouping and the mob AI. World-bound requests are queued for
// the world task and answered with 202.

use crate::domain::{Loadout, NanoSlot, NpcId, PlayerId, Style, WeaponKind};
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{PositionDto, WeaponKindDto};
use crate::interface_adapters::sessions::SessionGrant;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GameEvent, NpcSpawn, NpcSpawnKind};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NanoDto {
    pub stamina: i32,
    #[serde(default)]
    pub drain_rate: i32,
    #[serde(default)]
    pub style: Option<i32>,
}

/// Combat stats the login service vouches for. Anything omitted keeps the stock value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadoutDto {
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
    pub weapon: Option<WeaponKindDto>,
    pub weapon_id: i32,
    pub nanos: Vec<NanoDto>,
    pub active_nano: Option<usize>,
}

impl Default for LoadoutDto {
    fn default() -> Self {
        let stock = Loadout::default();
        Self {
            level: stock.level,
            max_hp: stock.max_hp,
            account_level: stock.account_level,
            defense: stock.defense,
            point_damage: stock.point_damage,
            group_damage: stock.group_damage,
            boost_damage: stock.boost_damage,
            boost_cost: stock.boost_cost,
            battery: stock.battery,
            fire_rate: stock.fire_rate,
            weapon: None,
            weapon_id: stock.weapon_id,
            nanos: Vec::new(),
            active_nano: stock.active_nano,
        }
    }
}

impl From<LoadoutDto> for Loadout {
    fn from(dto: LoadoutDto) -> Self {
        let mut nanos = [NanoSlot::default(); 3];
        // Extra slots beyond the fixed three are ignored.
        for (slot, nano) in nanos.iter_mut().zip(dto.nanos) {
            *slot = NanoSlot {
                stamina: nano.stamina,
                drain_rate: nano.drain_rate,
                style: nano.style.and_then(Style::from_index),
            };
        }
        Self {
            level: dto.level,
            max_hp: dto.max_hp,
            account_level: dto.account_level,
            defense: dto.defense,
            point_damage: dto.point_damage,
            group_damage: dto.group_damage,
            boost_damage: dto.boost_damage,
            boost_cost: dto.boost_cost,
            battery: dto.battery,
            fire_rate: dto.fire_rate,
            weapon: dto.weapon.map(WeaponKind::from).unwrap_or_default(),
            weapon_id: dto.weapon_id,
            nanos,
            active_nano: dto.active_nano,
        }
    }
}

/// Longest session token the login service may issue.
pub const MAX_SESSION_TOKEN_LEN: usize = 256;

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    session_token: String,
    player_id: PlayerId,
    #[serde(default)]
    position: PositionDto,
    #[serde(default)]
    loadout: LoadoutDto,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NpcKindRequest {
    Mob {
        mob_type: i32,
        #[serde(default)]
        group_leader: Option<NpcId>,
    },
    Follower,
    Passive,
}

#[derive(Debug, Deserialize)]
pub struct SpawnNpcRequest {
    npc_id: NpcId,
    npc_type: i32,
    #[serde(default)]
    position: PositionDto,
    #[serde(flatten)]
    kind: NpcKindRequest,
    // Waypoints the NPC collaborator has queued for it.
    #[serde(default)]
    path: Vec<PositionDto>,
    // Static paths survive the mob's death.
    #[serde(default)]
    static_path: bool,
}

#[derive(Debug, Deserialize)]
pub struct GroupRequest {
    leader_id: PlayerId,
    member_ids: Vec<PlayerId>,
}

#[derive(Debug, Deserialize)]
pub struct FollowerRequest {
    player_id: PlayerId,
    // `None` unassigns the current follower.
    #[serde(default)]
    npc_id: Option<NpcId>,
    #[serde(default)]
    range: i32,
}

#[derive(Debug, Deserialize)]
pub struct MobAttackRequest {
    npc_id: NpcId,
}

fn bad_request(error: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error))).into_response()
}

async fn enqueue(state: &AppState, event: GameEvent) -> Response {
    match state.input_tx.send(event).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(_) => {
            warn!("world task is gone; internal request dropped");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("combat world unavailable")),
            )
                .into_response()
        }
    }
}

pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SessionRequest>,
) -> Response {
    let token = payload.session_token.trim();
    if token.is_empty() || token.len() > MAX_SESSION_TOKEN_LEN {
        return bad_request(format!(
            "session_token must be 1 to {MAX_SESSION_TOKEN_LEN} bytes"
        ));
    }
    if payload.player_id <= 0 {
        return bad_request("player_id must be positive");
    }
    let loadout = Loadout::from(payload.loadout);
    if let Err(e) = loadout.check() {
        return bad_request(e.to_string());
    }

    state
        .directory
        .grant(
            token.to_owned(),
            SessionGrant {
                player_id: payload.player_id,
                loadout,
                position: payload.position.into(),
            },
        )
        .await;
    debug!(player_id = payload.player_id, "session granted");
    StatusCode::CREATED.into_response()
}

pub async fn spawn_npc_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SpawnNpcRequest>,
) -> Response {
    let kind = match payload.kind {
        NpcKindRequest::Mob {
            mob_type,
            group_leader,
        } => {
            if state.mob_table.get(mob_type).is_none() {
                return bad_request(format!("unknown mob type {mob_type}"));
            }
            NpcSpawnKind::Mob {
                mob_type,
                group_leader,
            }
        }
        NpcKindRequest::Follower => NpcSpawnKind::Follower,
        NpcKindRequest::Passive => NpcSpawnKind::Passive,
    };
    debug!(npc_id = payload.npc_id, ?kind, "spawn requested");

    enqueue(
        &state,
        GameEvent::SpawnNpc(NpcSpawn {
            npc_id: payload.npc_id,
            npc_type: payload.npc_type,
            position: payload.position.into(),
            kind,
            path: payload.path.into_iter().map(Into::into).collect(),
            static_path: payload.static_path,
        }),
    )
    .await
}

pub async fn group_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GroupRequest>,
) -> Response {
    if payload.member_ids.is_empty() {
        return bad_request("member_ids must not be empty");
    }
    if !payload.member_ids.contains(&payload.leader_id) {
        return bad_request("leader_id must be one of member_ids");
    }
    enqueue(
        &state,
        GameEvent::GroupChanged {
            leader_id: payload.leader_id,
            member_ids: payload.member_ids,
        },
    )
    .await
}

pub async fn follower_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FollowerRequest>,
) -> Response {
    if payload.range < 0 {
        return bad_request("range must not be negative");
    }
    enqueue(
        &state,
        GameEvent::FollowerAssigned {
            player_id: payload.player_id,
            npc_id: payload.npc_id,
            range: payload.range,
        },
    )
    .await
}

pub async fn mob_attack_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MobAttackRequest>,
) -> Response {
    enqueue(
        &state,
        GameEvent::MobStrike {
            npc_id: payload.npc_id,
        },
    )
    .await
}
