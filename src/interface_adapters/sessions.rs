// Session bookkeeping for the public socket.
//
// `PlayerDirectory` holds the identities the login service has vouched for; a client
// only ever presents an opaque token. `SessionRegistry` tracks the one live socket per
// player id. A newer connection for the same id replaces the older one, which is told
// to close.

use crate::domain::{Loadout, PlayerId, Position};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// What a redeemed token binds the connection to.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub player_id: PlayerId,
    pub loadout: Loadout,
    pub position: Position,
}

#[derive(Default)]
struct Grants {
    by_token: HashMap<String, SessionGrant>,
    token_of: HashMap<PlayerId, String>,
}

/// Tokens issued by the login service, each good for one Join.
#[derive(Default)]
pub struct PlayerDirectory {
    grants: Mutex<Grants>,
}

impl PlayerDirectory {
    /// Stores a grant under `token`. An older unredeemed token for the same player
    /// stops working.
    pub async fn grant(&self, token: String, grant: SessionGrant) {
        let mut grants = self.grants.lock().await;
        if let Some(stale) = grants.token_of.insert(grant.player_id, token.clone()) {
            grants.by_token.remove(&stale);
        }
        if let Some(replaced) = grants.by_token.insert(token, grant) {
            grants.token_of.remove(&replaced.player_id);
        }
    }

    /// Consumes `token`, returning the grant it was issued for.
    pub async fn redeem(&self, token: &str) -> Option<SessionGrant> {
        let mut grants = self.grants.lock().await;
        let grant = grants.by_token.remove(token)?;
        grants.token_of.remove(&grant.player_id);
        Some(grant)
    }
}

struct SessionSlot {
    token: u64,
    shutdown: Arc<Notify>,
}

#[derive(Default)]
pub struct SessionRegistry {
    slots: Mutex<HashMap<PlayerId, SessionSlot>>,
}

impl SessionRegistry {
    /// Claims `player_id` for the connection holding `token` and returns the signal
    /// that fires if a later connection takes the id over.
    pub async fn register_or_replace(&self, player_id: PlayerId, token: u64) -> Arc<Notify> {
        let shutdown = Arc::new(Notify::new());
        let previous = self.slots.lock().await.insert(
            player_id,
            SessionSlot {
                token,
                shutdown: shutdown.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.shutdown.notify_one();
        }
        shutdown
    }

    /// Releases the slot only if `token` still owns it. Returns whether it did.
    pub async fn unregister_if_owner(&self, player_id: PlayerId, token: u64) -> bool {
        let mut slots = self.slots.lock().await;
        match slots.get(&player_id) {
            Some(slot) if slot.token == token => {
                slots.remove(&player_id);
                true
            }
            _ => false,
        }
    }

    pub async fn is_owner(&self, player_id: PlayerId, token: u64) -> bool {
        self.slots
            .lock()
            .await
            .get(&player_id)
            .is_some_and(|slot| slot.token == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn grant_for(player_id: PlayerId) -> SessionGrant {
        SessionGrant {
            player_id,
            loadout: Loadout::default(),
            position: Position::default(),
        }
    }

    #[tokio::test]
    async fn tokens_redeem_once() {
        let directory = PlayerDirectory::default();
        directory.grant("abc".into(), grant_for(5)).await;

        let grant = directory.redeem("abc").await.expect("first redeem");
        assert_eq!(grant.player_id, 5);
        assert!(directory.redeem("abc").await.is_none());
        assert!(directory.redeem("never-issued").await.is_none());
    }

    #[tokio::test]
    async fn a_fresh_grant_revokes_the_players_older_token() {
        let directory = PlayerDirectory::default();
        directory.grant("old".into(), grant_for(5)).await;
        directory.grant("new".into(), grant_for(5)).await;

        assert!(directory.redeem("old").await.is_none());
        assert_eq!(
            directory.redeem("new").await.map(|grant| grant.player_id),
            Some(5)
        );
    }

    #[tokio::test]
    async fn a_reissued_token_moves_to_the_new_player() {
        let directory = PlayerDirectory::default();
        directory.grant("shared".into(), grant_for(5)).await;
        directory.grant("shared".into(), grant_for(6)).await;
        directory.grant("other".into(), grant_for(5)).await;

        assert_eq!(
            directory.redeem("shared").await.map(|grant| grant.player_id),
            Some(6)
        );
        assert_eq!(
            directory.redeem("other").await.map(|grant| grant.player_id),
            Some(5)
        );
    }

    #[tokio::test]
    async fn a_newer_connection_replaces_the_older_one() {
        let registry = SessionRegistry::default();
        let first = registry.register_or_replace(5, 1).await;
        let _second = registry.register_or_replace(5, 2).await;

        timeout(Duration::from_secs(1), first.notified())
            .await
            .expect("old connection should be told to close");
        assert!(!registry.unregister_if_owner(5, 1).await);
        assert!(registry.is_owner(5, 2).await);
        assert!(registry.unregister_if_owner(5, 2).await);
        assert!(!registry.is_owner(5, 2).await);
    }
}
