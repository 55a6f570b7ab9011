use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::broadcast::{BroadcastMessage, NewBroadcast};
use crate::domain::notification::UserNotification;

/// Durable storage for direct notifications, broadcast messages and the
/// per-user broadcast read markers.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Most recent notifications owned by `user_id`, newest first.
    async fn list_recent(&self, user_id: Uuid, limit: i64) -> Result<Vec<UserNotification>>;

    async fn count_unread(&self, user_id: Uuid) -> Result<i64>;

    /// Marks one notification read if `user_id` owns it. Returns whether a row matched.
    async fn mark_read(&self, user_id: Uuid, notification_id: i64) -> Result<bool>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;

    async fn delete_all(&self, user_id: Uuid) -> Result<u64>;

    /// Most recent broadcast messages, newest first.
    async fn list_recent_broadcasts(&self, limit: i64) -> Result<Vec<BroadcastMessage>>;

    /// Subset of `message_ids` that `user_id` holds a read marker for.
    async fn read_marker_ids(&self, user_id: Uuid, message_ids: &[i64]) -> Result<Vec<i64>>;

    /// Inserts a marker for `message_id` if the message exists and no marker is present.
    async fn mark_broadcast_read(&self, user_id: Uuid, message_id: i64) -> Result<bool>;

    /// Inserts a marker for every broadcast message the user has not seen yet.
    async fn mark_all_broadcasts_read(&self, user_id: Uuid) -> Result<u64>;

    async fn publish_broadcast(&self, broadcast: NewBroadcast) -> Result<BroadcastMessage>;

    async fn ping(&self) -> Result<()>;
}

pub type DynNotificationStore = Arc<dyn NotificationStore>;
