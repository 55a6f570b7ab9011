use anyhow::Result;
use std::collections::HashSet;
use uuid::Uuid;

use crate::app::best_effort::best_effort;
use crate::domain::notification::{merge_feed, unread_broadcasts, NotificationItem};
use crate::infra::store::DynNotificationStore;

/// How many of the newest broadcast messages take part in a user's feed.
pub const BROADCAST_WINDOW: i64 = 10;
/// How many direct notifications a feed request returns.
pub const DIRECT_PAGE_SIZE: i64 = 20;

/// Outcome of an operation once the caller's identity has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<T> {
    Granted(T),
    Unauthorized,
}

#[derive(Clone)]
pub struct NotificationReadService {
    store: DynNotificationStore,
}

impl NotificationReadService {
    pub fn new(store: DynNotificationStore) -> Self {
        Self { store }
    }

    pub async fn mark_all_read(&self, caller: Option<Uuid>) -> Result<Access<()>> {
        let Some(user_id) = caller else {
            return Ok(Access::Unauthorized);
        };

        let updated = self.store.mark_all_read(user_id).await?;
        tracing::debug!(user_id = %user_id, updated, "marked notifications read");

        best_effort(
            "mark all broadcasts read",
            self.store.mark_all_broadcasts_read(user_id),
        )
        .await;

        Ok(Access::Granted(()))
    }

    pub async fn list_my_notifications(
        &self,
        caller: Option<Uuid>,
    ) -> Result<Access<Vec<NotificationItem>>> {
        let Some(user_id) = caller else {
            return Ok(Access::Unauthorized);
        };

        let direct: Vec<NotificationItem> = self
            .store
            .list_recent(user_id, DIRECT_PAGE_SIZE)
            .await?
            .into_iter()
            .map(NotificationItem::from)
            .collect();

        let broadcasts = best_effort("list broadcasts", self.broadcast_items(user_id))
            .await
            .unwrap_or_default();

        Ok(Access::Granted(merge_feed(broadcasts, direct)))
    }

    pub async fn unread_count(&self, caller: Option<Uuid>) -> Result<Access<i64>> {
        let Some(user_id) = caller else {
            return Ok(Access::Unauthorized);
        };

        let direct = self.store.count_unread(user_id).await?;
        let broadcasts = best_effort("count unread broadcasts", self.broadcast_unread(user_id))
            .await
            .unwrap_or(0);

        Ok(Access::Granted(direct + broadcasts))
    }

    /// Marks `id` read as a direct notification of the caller and, when a
    /// broadcast carries the same id, records a read marker for it too.
    pub async fn mark_one_read(&self, caller: Option<Uuid>, id: i64) -> Result<Access<()>> {
        let Some(user_id) = caller else {
            return Ok(Access::Unauthorized);
        };

        let updated = self.store.mark_read(user_id, id).await?;
        tracing::debug!(
            user_id = %user_id,
            notification_id = id,
            updated,
            "marked notification read"
        );

        best_effort(
            "mark broadcast read",
            self.store.mark_broadcast_read(user_id, id),
        )
        .await;

        Ok(Access::Granted(()))
    }

    pub async fn clear_my_notifications(&self, caller: Option<Uuid>) -> Result<Access<()>> {
        let Some(user_id) = caller else {
            return Ok(Access::Unauthorized);
        };

        let deleted = self.store.delete_all(user_id).await?;
        tracing::debug!(user_id = %user_id, deleted, "cleared notifications");

        // Cleared users should not see old broadcasts resurface as new.
        best_effort(
            "mark all broadcasts read",
            self.store.mark_all_broadcasts_read(user_id),
        )
        .await;

        Ok(Access::Granted(()))
    }

    async fn broadcast_items(&self, user_id: Uuid) -> Result<Vec<NotificationItem>> {
        let messages = self.store.list_recent_broadcasts(BROADCAST_WINDOW).await?;
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        let read: HashSet<i64> = self
            .store
            .read_marker_ids(user_id, &ids)
            .await?
            .into_iter()
            .collect();

        let mut items = Vec::with_capacity(messages.len());
        for message in &messages {
            items.push(NotificationItem::from_broadcast(
                message,
                read.contains(&message.id),
            )?);
        }
        Ok(items)
    }

    async fn broadcast_unread(&self, user_id: Uuid) -> Result<i64> {
        let messages = self.store.list_recent_broadcasts(BROADCAST_WINDOW).await?;
        if messages.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        let read: HashSet<i64> = self
            .store
            .read_marker_ids(user_id, &ids)
            .await?
            .into_iter()
            .collect();

        Ok(unread_broadcasts(ids.len(), read.len()))
    }
}
