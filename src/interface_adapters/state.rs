use crate::domain::{MobTable, PlayerId};
use crate::interface_adapters::sessions::{PlayerDirectory, SessionRegistry};
use crate::use_cases::GameEvent;
use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// One serialized server message and the players it is addressed to.
#[derive(Debug, Clone)]
pub struct Frame {
    pub recipients: Arc<[PlayerId]>,
    pub bytes: Utf8Bytes,
    // Set when the message ends the recipients' sessions.
    pub close_reason: Option<&'static str>,
}

impl Frame {
    pub fn is_for(&self, player_id: PlayerId) -> bool {
        self.recipients.contains(&player_id)
    }
}

#[derive(Clone)]
pub struct AppState {
    // Client commands and collaborator pushes flowing into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    // Serialized outbound messages, shared across all connections.
    pub frames_tx: broadcast::Sender<Frame>,
    // Which connection currently owns each player id.
    pub sessions: Arc<SessionRegistry>,
    // Identities vouched for by the login service, keyed by session token.
    pub directory: Arc<PlayerDirectory>,
    // Read-only copy used to reject bad spawns before they reach the world.
    pub mob_table: Arc<MobTable>,
}
