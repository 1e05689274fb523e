use super::types::{GameEvent, Outbound};
use super::world::CombatWorld;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Owns the combat world for the life of the server. Every input and tick runs to
/// completion before the next one starts, so handlers never see a half-applied change.
pub async fn world_task(
    mut world: CombatWorld,
    mut input_rx: mpsc::Receiver<GameEvent>,
    outbound_tx: broadcast::Sender<Outbound>,
    player_tick: Duration,
    follower_tick: Duration,
    shutdown: Arc<Notify>,
) {
    let mut player_interval = tokio::time::interval(player_tick);
    let mut follower_interval = tokio::time::interval(follower_tick);
    // A stalled loop should not replay a burst of heals or follower swings.
    player_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    follower_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("world task shutting down");
                break;
            }
            event = input_rx.recv() => {
                let Some(event) = event else {
                    info!("input channel closed; world task exiting");
                    break;
                };
                if let Err(e) = world.handle(event) {
                    warn!(error = %e, "dropping message");
                }
            }
            _ = player_interval.tick() => world.player_tick(),
            _ = follower_interval.tick() => world.follower_tick(),
        }

        for outbound in world.drain_outbox() {
            // No subscribers just means nobody is connected.
            let _ = outbound_tx.send(outbound);
        }
    }
}
