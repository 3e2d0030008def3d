//! Real-time presence broadcasting.
//!
//! Session state changes publish presence events on a channel abstraction.
//! Publishing is fire-and-forget: a broadcaster failure is logged and never
//! mistaken for a failure of the session operation that triggered it.

use crate::types::PresenceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// One presence update for a player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub player_id: String,
    pub status: PresenceStatus,
    pub context: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Outbound presence sink. Implementations must not block or fail the
/// caller.
pub trait StatusBroadcaster: Send + Sync {
    fn publish(&self, player_id: &str, status: PresenceStatus, context: serde_json::Value);
}

/// Broadcaster fanning events out over a `tokio::sync::broadcast` channel.
/// Subscribers that lag are allowed to drop events.
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<PresenceEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

impl StatusBroadcaster for ChannelBroadcaster {
    fn publish(&self, player_id: &str, status: PresenceStatus, context: serde_json::Value) {
        let event = PresenceEvent {
            player_id: player_id.to_string(),
            status,
            context,
            timestamp: Utc::now(),
        };
        // send errors only mean there are no subscribers right now.
        if self.tx.send(event).is_err() {
            debug!(player_id, ?status, "presence event dropped, no subscribers");
        }
    }
}
