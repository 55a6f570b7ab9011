use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::broadcast::BroadcastMessage;

/// Type tag carried by feed items synthesized from broadcast messages.
pub const BROADCAST_TYPE: &str = "broadcast";
pub const BROADCAST_TITLE_KEY: &str = "profile.notifications.adminMessageTitle";
pub const BROADCAST_CONTENT_KEY: &str = "profile.notifications.adminMessageBody";

/// A notification row owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNotification {
    pub id: i64,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title_key: String,
    pub content_key: String,
    pub data: Option<String>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// A direct notification as handed over by a producer.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title_key: String,
    pub content_key: String,
    pub data: Option<String>,
    pub created_at: Option<OffsetDateTime>,
}

/// Uniform shape returned by the feed for both direct and broadcast entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title_key: String,
    pub content_key: String,
    pub data: Option<String>,
    pub is_read: bool,
    /// Milliseconds since the unix epoch.
    pub created_at: Option<i64>,
}

#[derive(Serialize)]
struct BroadcastPayload<'a> {
    title: &'a str,
    body: &'a str,
}

impl From<UserNotification> for NotificationItem {
    fn from(notification: UserNotification) -> Self {
        Self {
            id: notification.id,
            notification_type: notification.notification_type,
            title_key: notification.title_key,
            content_key: notification.content_key,
            data: notification.data,
            is_read: notification.is_read,
            created_at: notification.created_at.map(epoch_millis),
        }
    }
}

impl NotificationItem {
    pub fn from_broadcast(message: &BroadcastMessage, is_read: bool) -> serde_json::Result<Self> {
        let data = serde_json::to_string(&BroadcastPayload {
            title: &message.title,
            body: &message.body,
        })?;

        Ok(Self {
            id: message.id,
            notification_type: BROADCAST_TYPE.to_string(),
            title_key: BROADCAST_TITLE_KEY.to_string(),
            content_key: BROADCAST_CONTENT_KEY.to_string(),
            data: Some(data),
            is_read,
            created_at: message.created_at.map(epoch_millis),
        })
    }
}

pub fn epoch_millis(timestamp: OffsetDateTime) -> i64 {
    (timestamp.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Concatenates broadcast and direct items and orders them newest first.
///
/// Items without a timestamp sort as if created at the epoch. The sort is
/// stable, so equal timestamps keep broadcasts ahead of direct items.
pub fn merge_feed(
    broadcasts: Vec<NotificationItem>,
    direct: Vec<NotificationItem>,
) -> Vec<NotificationItem> {
    let mut items = broadcasts;
    items.extend(direct);
    items.sort_by_key(|item| std::cmp::Reverse(item.created_at.unwrap_or(0)));
    items
}

/// Unread broadcasts inside the recent window, never negative.
pub fn unread_broadcasts(window: usize, read: usize) -> i64 {
    window.saturating_sub(read) as i64
}
