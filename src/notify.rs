//! Real-time notification hub.
//!
//! Keeps a broadcast channel per user; the API layer exposes the receiving
//! side as an SSE stream. Publishing is best-effort: if nobody is listening
//! the event is dropped, and delivery carries no guarantee.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::RwLock;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 64;

/// Events pushed to a user's channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    NewTask { task_id: Uuid, title: String },
}

/// Per-user pub/sub fan-out.
pub struct NotificationHub {
    channels: RwLock<HashMap<Uuid, broadcast::Sender<TaskEvent>>>,
}

/// Shared hub wrapped in Arc for concurrent access.
pub type SharedNotificationHub = Arc<NotificationHub>;

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to a user's channel, creating it on first use.
    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<TaskEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event to one user. Dropped silently when the user has no
    /// open subscription; a channel whose last subscriber disconnected is
    /// evicted so the map does not grow with every user id ever seen.
    pub async fn publish(&self, user_id: Uuid, event: TaskEvent) {
        let mut channels = self.channels.write().await;
        if let Some(sender) = channels.get(&user_id) {
            if sender.receiver_count() == 0 {
                channels.remove(&user_id);
            } else {
                // send only errors when there are no receivers; best-effort.
                let _ = sender.send(event);
            }
        }
    }

    /// Publish an event to every listed user.
    pub async fn publish_all(&self, user_ids: &[Uuid], event: &TaskEvent) {
        for user_id in user_ids {
            self.publish(*user_id, event.clone()).await;
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
