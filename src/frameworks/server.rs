// Framework bootstrap for the combat server runtime.

use crate::domain::MobTable;
use crate::domain::ports::{RewardSink, SystemClock, ViewRadius};
use crate::domain::tuning::Tuning;
use crate::frameworks::config;
use crate::interface_adapters::clients::rewards::{
    LoggedRewards, QueuedRewards, RewardClient, forward_rewards,
};
use crate::interface_adapters::net::{
    follower_handler, group_handler, mob_attack_handler, outbound_serializer, session_handler,
    spawn_npc_handler, ws_handler,
};
use crate::interface_adapters::sessions::{PlayerDirectory, SessionRegistry};
use crate::interface_adapters::state::{AppState, Frame};
use crate::interface_adapters::utils::rng::world_rng;
use crate::use_cases::{CombatWorld, GameEvent, Outbound, WorldPorts, world_task};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{Notify, broadcast, mpsc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let (state, world_shutdown) = build_state().await?;
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/npcs", post(spawn_npc_handler))
        .route("/npcs/attack", post(mob_attack_handler))
        .route("/groups", post(group_handler))
        .route("/followers", post(follower_handler))
        .route("/sessions", post(session_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    let served = axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    });
    world_shutdown.notify_one();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn load_mob_table() -> Result<MobTable> {
    let Some(path) = config::mob_table_path() else {
        return Ok(MobTable::builtin());
    };
    let json = tokio::fs::read_to_string(&path).await.inspect_err(|e| {
        tracing::error!(%path, error = %e, "failed to read mob table");
    })?;
    let table = MobTable::from_json(&json)
        .map_err(|e| std::io::Error::other(format!("invalid mob table {path}: {e}")))?;
    tracing::info!(%path, mob_types = table.len(), "mob table loaded");
    Ok(table)
}

fn reward_sink() -> Result<Box<dyn RewardSink>> {
    let Some(base_url) = config::reward_service_url() else {
        tracing::warn!("REWARD_SERVICE_URL not set; kill rewards will only be logged");
        return Ok(Box::new(LoggedRewards));
    };
    let client = RewardClient::new(base_url.clone(), config::reward_timeout())
        .map_err(|e| std::io::Error::other(format!("failed to initialize reward client: {e}")))?;
    tracing::debug!(reward_base_url = %base_url, "reward client configured");

    let (tx, rx) = mpsc::channel(config::REWARD_QUEUE_CAPACITY);
    tokio::spawn(forward_rewards(client, rx));
    Ok(Box::new(QueuedRewards::new(tx)))
}

async fn build_state() -> Result<(Arc<AppState>, Arc<Notify>)> {
    let mob_table = load_mob_table().await?;
    let seed = config::rng_seed();
    if let Some(seed) = seed {
        tracing::info!(seed, "world rng seeded");
    }

    let world = CombatWorld::new(
        mob_table.clone(),
        Tuning::default(),
        world_rng(seed),
        WorldPorts {
            clock: Box::new(SystemClock),
            view: Box::new(ViewRadius {
                radius: config::view_radius(),
            }),
            rewards: reward_sink()?,
        },
    );

    // input_tx/rx: client commands and collaborator pushes go to the single world task.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);
    // outbound_tx: addressed world output, serialized once by the adapter layer.
    let (outbound_tx, _outbound_rx) =
        broadcast::channel::<Outbound>(config::OUTBOUND_BROADCAST_CAPACITY);
    let (frames_tx, _frames_rx) = broadcast::channel::<Frame>(config::OUTBOUND_BROADCAST_CAPACITY);

    tokio::spawn(outbound_serializer(
        outbound_tx.subscribe(),
        frames_tx.clone(),
    ));

    let shutdown = Arc::new(Notify::new());
    tokio::spawn(world_task(
        world,
        input_rx,
        outbound_tx,
        config::player_tick(),
        config::follower_tick(),
        shutdown.clone(),
    ));

    Ok((
        Arc::new(AppState {
            input_tx,
            frames_tx,
            sessions: Arc::new(SessionRegistry::default()),
            directory: Arc::new(PlayerDirectory::default()),
            mob_table: Arc::new(mob_table),
        }),
        shutdown,
    ))
}
