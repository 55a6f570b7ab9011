use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::broadcast::{BroadcastMessage, NewBroadcast};
use crate::domain::notification::UserNotification;
use crate::infra::db::Db;
use crate::infra::store::NotificationStore;

#[derive(Clone)]
pub struct PgNotificationStore {
    db: Db,
}

impl PgNotificationStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn notification_from_row(row: PgRow) -> UserNotification {
    UserNotification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        notification_type: row.get("notification_type"),
        title_key: row.get("title_key"),
        content_key: row.get("content_key"),
        data: row.get("data"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}

fn broadcast_from_row(row: PgRow) -> BroadcastMessage {
    BroadcastMessage {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        sender: row.get("sender"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn list_recent(&self, user_id: Uuid, limit: i64) -> Result<Vec<UserNotification>> {
        let rows = sqlx::query(
            "SELECT id, user_id, notification_type, title_key, content_key, data, is_read, \
                    created_at \
             FROM user_notifications \
             WHERE user_id = $1 \
             ORDER BY created_at DESC NULLS LAST, id DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(notification_from_row).collect())
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_notifications \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE user_notifications \
             SET is_read = true \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE user_notifications \
             SET is_read = true \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_recent_broadcasts(&self, limit: i64) -> Result<Vec<BroadcastMessage>> {
        let rows = sqlx::query(
            "SELECT id, title, body, sender, created_at \
             FROM broadcast_messages \
             ORDER BY created_at DESC NULLS LAST, id DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(broadcast_from_row).collect())
    }

    async fn read_marker_ids(&self, user_id: Uuid, message_ids: &[i64]) -> Result<Vec<i64>> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT message_id FROM broadcast_reads \
             WHERE user_id = $1 AND message_id = ANY($2)",
        )
        .bind(user_id)
        .bind(message_ids)
        .fetch_all(self.db.pool())
        .await?;

        Ok(ids)
    }

    async fn mark_broadcast_read(&self, user_id: Uuid, message_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO broadcast_reads (message_id, user_id, created_at) \
             SELECT m.id, $2, now() \
             FROM broadcast_messages m \
             WHERE m.id = $1 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM broadcast_reads r \
                   WHERE r.message_id = m.id AND r.user_id = $2 \
               ) \
             ON CONFLICT (message_id, user_id) DO NOTHING",
        )
        .bind(message_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_broadcasts_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "INSERT INTO broadcast_reads (message_id, user_id, created_at) \
             SELECT m.id, $1, now() \
             FROM broadcast_messages m \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM broadcast_reads r \
                 WHERE r.message_id = m.id AND r.user_id = $1 \
             ) \
             ON CONFLICT (message_id, user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn publish_broadcast(&self, broadcast: NewBroadcast) -> Result<BroadcastMessage> {
        let row = sqlx::query(
            "INSERT INTO broadcast_messages (title, body, sender) \
             VALUES ($1, $2, $3) \
             RETURNING id, title, body, sender, created_at",
        )
        .bind(broadcast.title)
        .bind(broadcast.body)
        .bind(broadcast.sender)
        .fetch_one(self.db.pool())
        .await?;

        Ok(broadcast_from_row(row))
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}
