// Forwards kill rewards and mission notices to the item service.
//
// The world calls the sink synchronously from its own task, so the sink only queues
// a notice; a background task does the HTTP work.

use crate::domain::PlayerId;
use crate::domain::ports::{KilledMob, RewardSink};
use crate::domain::systems::rewards::SharedRoll;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum RewardNotice {
    KillReward {
        player_id: PlayerId,
        npc_id: i32,
        mob_type: i32,
        x: i32,
        y: i32,
        z: i32,
        killed_at: u64,
        loot_roll: u32,
        event_loot_roll: u32,
        qualifying_roll: u32,
    },
    MobKilled {
        player_id: PlayerId,
        mob_type: i32,
        qualifying_roll: u32,
    },
}

impl RewardNotice {
    fn path(&self) -> &'static str {
        match self {
            RewardNotice::KillReward { .. } => "/rewards/kill",
            RewardNotice::MobKilled { .. } => "/missions/mob-killed",
        }
    }
}

/// Queues notices for `forward_rewards`. Drops (and logs) when the queue is full.
pub struct QueuedRewards {
    tx: mpsc::Sender<RewardNotice>,
}

impl QueuedRewards {
    pub fn new(tx: mpsc::Sender<RewardNotice>) -> Self {
        Self { tx }
    }

    fn queue(&self, notice: RewardNotice) {
        if let Err(e) = self.tx.try_send(notice) {
            warn!(error = %e, "reward queue rejected notice");
        }
    }
}

impl RewardSink for QueuedRewards {
    fn give_kill_reward(&mut self, player_id: PlayerId, mob: &KilledMob, roll: SharedRoll) {
        self.queue(RewardNotice::KillReward {
            player_id,
            npc_id: mob.npc_id,
            mob_type: mob.mob_type,
            x: mob.position.x,
            y: mob.position.y,
            z: mob.position.z,
            killed_at: mob.killed_at,
            loot_roll: roll.loot,
            event_loot_roll: roll.event_loot,
            qualifying_roll: roll.qualifying_item,
        });
    }

    fn notify_mob_killed(&mut self, player_id: PlayerId, mob_type: i32, qualifying_roll: u32) {
        self.queue(RewardNotice::MobKilled {
            player_id,
            mob_type,
            qualifying_roll,
        });
    }
}

/// Used when no item service is configured: rewards are only logged.
pub struct LoggedRewards;

impl RewardSink for LoggedRewards {
    fn give_kill_reward(&mut self, player_id: PlayerId, mob: &KilledMob, roll: SharedRoll) {
        info!(
            player_id,
            npc_id = mob.npc_id,
            mob_type = mob.mob_type,
            loot_roll = roll.loot,
            "kill reward"
        );
    }

    fn notify_mob_killed(&mut self, player_id: PlayerId, mob_type: i32, qualifying_roll: u32) {
        debug!(player_id, mob_type, qualifying_roll, "mob killed notice");
    }
}

// Thin reqwest client for the item/mission service.
#[derive(Clone)]
pub struct RewardClient {
    http: reqwest::Client,
    base_url: String,
}

impl RewardClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn post(&self, notice: &RewardNotice) -> Result<(), reqwest::Error> {
        let url = format!("{}{}", self.base_url, notice.path());
        self.http
            .post(url)
            .json(notice)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Drains queued notices into the item service until every sender is gone.
pub async fn forward_rewards(client: RewardClient, mut rx: mpsc::Receiver<RewardNotice>) {
    while let Some(notice) = rx.recv().await {
        // Delivery is best effort; the kill itself is already final.
        if let Err(e) = client.post(&notice).await {
            warn!(error = %e, ?notice, "failed to deliver reward notice");
        }
    }
    debug!("reward queue closed; forwarder exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;

    #[test]
    fn notices_are_queued_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = QueuedRewards::new(tx);
        let mob = KilledMob {
            npc_id: 40,
            mob_type: 3,
            position: Position::new(1, 2, 3),
            killed_at: 99,
        };
        let roll = SharedRoll {
            loot: 7,
            event_loot: 8,
            qualifying_item: 9,
        };

        sink.give_kill_reward(12, &mob, roll);
        sink.notify_mob_killed(12, 3, 9);

        let reward = rx.try_recv().expect("reward queued");
        assert_eq!(reward.path(), "/rewards/kill");
        assert!(matches!(
            reward,
            RewardNotice::KillReward {
                player_id: 12,
                npc_id: 40,
                loot_roll: 7,
                ..
            }
        ));
        assert_eq!(
            rx.try_recv().expect("notice queued"),
            RewardNotice::MobKilled {
                player_id: 12,
                mob_type: 3,
                qualifying_roll: 9,
            }
        );
    }

    #[test]
    fn a_full_queue_drops_instead_of_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut sink = QueuedRewards::new(tx);
        sink.notify_mob_killed(1, 2, 3);
        sink.notify_mob_killed(1, 2, 4);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn notices_serialize_with_a_type_tag() {
        let json = serde_json::to_value(RewardNotice::MobKilled {
            player_id: 1,
            mob_type: 2,
            qualifying_roll: 3,
        })
        .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "MobKilled", "player_id": 1, "mob_type": 2, "qualifying_roll": 3})
        );
    }
}
