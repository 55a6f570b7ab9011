use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::broadcast::{BroadcastMessage, BroadcastReadMarker, NewBroadcast};
use crate::domain::notification::{NewNotification, UserNotification};
use crate::infra::store::NotificationStore;

#[derive(Default)]
struct Tables {
    last_notification_id: i64,
    last_broadcast_id: i64,
    notifications: Vec<UserNotification>,
    broadcasts: Vec<BroadcastMessage>,
    reads: BTreeMap<(i64, Uuid), BroadcastReadMarker>,
}

impl Tables {
    fn insert_marker(&mut self, message_id: i64, user_id: Uuid, now: OffsetDateTime) -> bool {
        if self.reads.contains_key(&(message_id, user_id)) {
            return false;
        }
        self.reads.insert(
            (message_id, user_id),
            BroadcastReadMarker {
                message_id,
                user_id,
                created_at: now,
            },
        );
        true
    }
}

/// Process-local store with the same semantics as the Postgres tables.
/// Notification and broadcast ids come from independent sequences.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_notification(&self, notification: NewNotification) -> UserNotification {
        let mut tables = self.tables.lock().await;
        tables.last_notification_id += 1;
        let row = UserNotification {
            id: tables.last_notification_id,
            user_id: notification.user_id,
            notification_type: notification.notification_type,
            title_key: notification.title_key,
            content_key: notification.content_key,
            data: notification.data,
            is_read: false,
            created_at: notification.created_at,
        };
        tables.notifications.push(row.clone());
        row
    }

    /// Publishes a broadcast with an explicit (possibly missing) timestamp.
    pub async fn insert_broadcast_at(
        &self,
        broadcast: NewBroadcast,
        created_at: Option<OffsetDateTime>,
    ) -> BroadcastMessage {
        let mut tables = self.tables.lock().await;
        tables.last_broadcast_id += 1;
        let row = BroadcastMessage {
            id: tables.last_broadcast_id,
            title: broadcast.title,
            body: broadcast.body,
            sender: broadcast.sender,
            created_at,
        };
        tables.broadcasts.push(row.clone());
        row
    }

    pub async fn notifications_for(&self, user_id: Uuid) -> Vec<UserNotification> {
        let tables = self.tables.lock().await;
        tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn markers_for(&self, user_id: Uuid) -> Vec<BroadcastReadMarker> {
        let tables = self.tables.lock().await;
        tables
            .reads
            .values()
            .filter(|marker| marker.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn list_recent(&self, user_id: Uuid, limit: i64) -> Result<Vec<UserNotification>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<UserNotification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|n| Reverse((n.created_at, n.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().await;
        let count = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(count as i64)
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: i64) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let row = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id);
        match row {
            Some(row) => {
                row.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for row in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            row.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.notifications.len();
        tables.notifications.retain(|n| n.user_id != user_id);
        Ok((before - tables.notifications.len()) as u64)
    }

    async fn list_recent_broadcasts(&self, limit: i64) -> Result<Vec<BroadcastMessage>> {
        let tables = self.tables.lock().await;
        let mut rows = tables.broadcasts.clone();
        rows.sort_by_key(|b| Reverse((b.created_at, b.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn read_marker_ids(&self, user_id: Uuid, message_ids: &[i64]) -> Result<Vec<i64>> {
        let tables = self.tables.lock().await;
        let ids = message_ids
            .iter()
            .copied()
            .filter(|id| tables.reads.contains_key(&(*id, user_id)))
            .collect();
        Ok(ids)
    }

    async fn mark_broadcast_read(&self, user_id: Uuid, message_id: i64) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.broadcasts.iter().any(|b| b.id == message_id) {
            return Ok(false);
        }
        Ok(tables.insert_marker(message_id, user_id, OffsetDateTime::now_utc()))
    }

    async fn mark_all_broadcasts_read(&self, user_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let now = OffsetDateTime::now_utc();
        let ids: Vec<i64> = tables.broadcasts.iter().map(|b| b.id).collect();
        let mut inserted = 0;
        for id in ids {
            if tables.insert_marker(id, user_id, now) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn publish_broadcast(&self, broadcast: NewBroadcast) -> Result<BroadcastMessage> {
        Ok(self
            .insert_broadcast_at(broadcast, Some(OffsetDateTime::now_utc()))
            .await)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
