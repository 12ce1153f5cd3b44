use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::messages::PresenceMessage;
use super::registry::{ConnectionHandle, ConnectionRegistry};

/// Configuration for the presence broadcaster
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// How often viewer counts are pushed
    pub interval: Duration,
    /// Upper bound on handing one message to one connection
    pub send_timeout: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3 * 60), // 3 minutes
            send_timeout: Duration::from_secs(2),
        }
    }
}

/// Outcome of one broadcast tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub rooms: usize,
    pub delivered: usize,
    pub evicted: usize,
}

/// Pushes per-room viewer counts to every connection in the room
pub struct PresenceBroadcaster {
    registry: Arc<dyn ConnectionRegistry>,
    config: BroadcastConfig,
}

impl PresenceBroadcaster {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, config: BroadcastConfig) -> Self {
        Self { registry, config }
    }

    /// Runs one broadcast over every room that currently has viewers
    ///
    /// Rooms are independent and fan out concurrently; the tick returns only after every
    /// delivery has finished or timed out, so two ticks never overlap.
    #[instrument(skip(self))]
    pub async fn tick(&self, tick: u64) -> TickReport {
        let rooms = self.registry.active_rooms();
        if rooms.is_empty() {
            debug!("No connected rooms, skipping broadcast");
            return TickReport::default();
        }

        let reports = join_all(
            rooms
                .iter()
                .map(|room_id| self.broadcast_room(room_id, tick)),
        )
        .await;

        reports
            .into_iter()
            .fold(TickReport::default(), |total, report| TickReport {
                rooms: total.rooms + report.rooms,
                delivered: total.delivered + report.delivered,
                evicted: total.evicted + report.evicted,
            })
    }

    async fn broadcast_room(&self, room_id: &str, tick: u64) -> TickReport {
        let snapshot = self.registry.snapshot(room_id);
        if snapshot.count == 0 {
            return TickReport::default();
        }

        // One message per room per tick: every recipient sees the same count
        let message = match PresenceMessage::presence_count(room_id, snapshot.count, tick)
            .and_then(|message| message.to_json())
        {
            Ok(json) => json,
            Err(e) => {
                error!(room_id = %room_id, error = %e, "Failed to serialize presence message");
                return TickReport::default();
            }
        };

        let timeout = self.config.send_timeout;
        let results = join_all(snapshot.connections.iter().map(|connection| {
            let message = message.clone();
            async move { (connection.id, connection.deliver(message, timeout).await) }
        }))
        .await;

        let mut report = TickReport {
            rooms: 1,
            ..TickReport::default()
        };
        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        room_id = %room_id,
                        connection_id = %id,
                        error = %e,
                        "Presence delivery failed, evicting connection"
                    );
                    self.registry.unregister(&ConnectionHandle {
                        room_id: room_id.to_string(),
                        id,
                    });
                    report.evicted += 1;
                }
            }
        }

        debug!(
            room_id = %room_id,
            count = snapshot.count,
            delivered = report.delivered,
            evicted = report.evicted,
            "Room presence broadcast"
        );

        report
    }

    /// Ticks on the configured interval until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            send_timeout_ms = self.config.send_timeout.as_millis() as u64,
            "Starting presence broadcaster"
        );

        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Presence broadcaster stopped");
                    return;
                }
                _ = ticker.tick() => {
                    tick += 1;
                    let report = self.tick(tick).await;
                    debug!(
                        tick = tick,
                        rooms = report.rooms,
                        delivered = report.delivered,
                        evicted = report.evicted,
                        "Presence tick completed"
                    );
                }
            }
        }
    }
}

/// Starts the background broadcaster; it stops when `cancel` is triggered
pub fn start_presence_broadcaster(
    registry: Arc<dyn ConnectionRegistry>,
    config: BroadcastConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let broadcaster = PresenceBroadcaster::new(registry, config);
    tokio::spawn(broadcaster.run(cancel))
}
