use crate::domain::PlayerId;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::sessions::{PlayerDirectory, SessionGrant, SessionRegistry};
use crate::interface_adapters::state::{AppState, Frame};
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{GameEvent, Outbound, PlayerCommand, ServerEvent};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Notify, broadcast, mpsc};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    FramesClosed,
    JoinRequired,
    InvalidSession,
    JoinTimeout,
    ClosedBeforeJoin,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

/// Serializes each outbound message once and fans the bytes out to every connection.
pub async fn outbound_serializer(
    mut outbound_rx: broadcast::Receiver<Outbound>,
    frames_tx: broadcast::Sender<Frame>,
) {
    loop {
        match outbound_rx.recv().await {
            Ok(outbound) => {
                let close_reason = match outbound.event {
                    ServerEvent::Disconnect { reason } => Some(reason),
                    _ => None,
                };
                let msg = ServerMessage::from(outbound.event);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize outbound message");
                        continue;
                    }
                };

                let _ = frames_tx.send(Frame {
                    recipients: outbound.recipients.into(),
                    bytes: Utf8Bytes::from(txt),
                    close_reason,
                });
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "outbound serializer lagged; messages lost");
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("outbound channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        // Separate connection id for correlating logs before/after a player_id exists.
        let conn_id = rand_id();
        let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
        handle_socket(socket, state).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(NetError::InvalidSession) => {
            warn!("join refused: unknown session token");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "bootstrap failed".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    Span::current().record("player_id", ctx.player_id);
    info!(player_id = ctx.player_id, "client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx, &state.sessions).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    rejected: u32,
    frames_lagged: u64,
}

struct ConnCtx {
    player_id: PlayerId,
    // Proves ownership of the player's session slot at cleanup.
    token: u64,
    // Fires when a newer connection takes over this player id.
    replaced: Arc<Notify>,
    input_tx: mpsc::Sender<GameEvent>,
    frames_rx: broadcast::Receiver<Frame>,
    stats: ConnStats,

    last_input_full_log: Instant,
    last_frames_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    grant: SessionGrant,
    bytes_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so nothing addressed to this player is missed.
    let frames_rx = state.frames_tx.subscribe();

    let join = match timeout(
        JOIN_HANDSHAKE_TIMEOUT,
        read_join_handshake(socket, &state.directory),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };
    let player_id = join.grant.player_id;

    let token = rand_id();
    let replaced = state.sessions.register_or_replace(player_id, token).await;

    if let Err(err) = send_message(socket, &ServerMessage::Identity { player_id }).await {
        state.sessions.unregister_if_owner(player_id, token).await;
        return Err(err);
    }

    // A Join for an id already in the world replaces that player's state.
    if let Err(err) = state
        .input_tx
        .send(GameEvent::Join {
            player_id,
            loadout: join.grant.loadout,
            position: join.grant.position,
        })
        .await
        .map_err(|_| NetError::InputClosed)
    {
        state.sessions.unregister_if_owner(player_id, token).await;
        return Err(err);
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        token,
        replaced,
        input_tx: state.input_tx.clone(),
        frames_rx,
        stats: ConnStats {
            msgs_in: 1,
            bytes_in: join.bytes_in,
            ..ConnStats::default()
        },

        last_input_full_log: now,
        last_frames_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(
    socket: &mut WebSocket,
    directory: &PlayerDirectory,
) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => payload,
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                let session_token = payload.session_token.trim();
                let grant = if session_token.is_empty() {
                    None
                } else {
                    directory.redeem(session_token).await
                };
                let Some(grant) = grant else {
                    let _ =
                        send_close_with_reason(socket, close_code::POLICY, "invalid session token")
                            .await;
                    return Err(NetError::InvalidSession);
                };

                return Ok(JoinHandshake { grant, bytes_in });
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn forward_command(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    command: PlayerCommand,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(GameEvent::Command { player_id, command }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_input_full_log) {
                warn!(player_id, "input channel full; dropping command");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
    sessions: &SessionRegistry,
) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        token,
        replaced,
        input_tx,
        frames_rx,
        stats,
        last_input_full_log,
        last_frames_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    input_tx,
                    stats,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            frame = frames_rx.recv() => {
                match frame {
                    Ok(frame) if frame.is_for(player_id) => {
                        let outcome = forward_frame(frame.bytes, socket, stats).await;
                        if let Some(reason) = frame.close_reason {
                            // The world dropped this session; the message above was its last.
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: reason.into(),
                            });
                            info!(player_id, reason, "session dropped by server");
                            true
                        } else {
                            matches!(outcome, LoopControl::Disconnect)
                        }
                    }
                    Ok(_) => false,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        stats.frames_lagged += n;
                        if should_log(last_frames_lag_log) {
                            warn!(player_id, missed = n, "outbound frames lagged; messages lost");
                        }
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::FramesClosed);
                        true
                    }
                }
            }

            _ = replaced.notified() => {
                *close_frame = Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "connection replaced".into(),
                });
                info!(player_id, "connection replaced by newer session");
                true
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(player_id, *token, sessions, input_tx, stats).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    stats: &mut ConnStats,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                stats.msgs_in += 1;
                stats.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(_)) => {
                        if should_log(last_invalid_input_log) {
                            warn!(player_id, "duplicate join ignored");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Ok(msg) => match PlayerCommand::try_from(msg) {
                        Ok(command) => {
                            forward_command(player_id, input_tx, command, last_input_full_log)
                        }
                        Err(e) => {
                            stats.rejected += 1;
                            if should_log(last_invalid_input_log) {
                                warn!(player_id, error = %e, "rejected client message");
                            }
                            Ok(LoopControl::Continue)
                        }
                    },
                    Err(parse_err) => {
                        stats.invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if stats.invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_frame(bytes: Utf8Bytes, socket: &mut WebSocket, stats: &mut ConnStats) -> LoopControl {
    let len = bytes.len();
    match socket.send(Message::Text(bytes)).await.map_err(NetError::Ws) {
        Ok(()) => {
            stats.msgs_out += 1;
            stats.bytes_out += len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send frame");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(
    player_id: PlayerId,
    token: u64,
    sessions: &SessionRegistry,
    input_tx: &mpsc::Sender<GameEvent>,
    stats: &ConnStats,
) -> Result<(), NetError> {
    // A replaced connection must not remove the player its successor now drives.
    if sessions.unregister_if_owner(player_id, token).await {
        input_tx
            .send(GameEvent::Leave { player_id })
            .await
            .map_err(|_| NetError::InputClosed)?;
    }

    debug!(
        player_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        rejected = stats.rejected,
        frames_lagged = stats.frames_lagged,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}
