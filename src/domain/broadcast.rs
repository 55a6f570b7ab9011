use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A global admin message shown to every user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub sender: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewBroadcast {
    pub title: String,
    pub body: String,
    pub sender: Option<String>,
}

/// Records that `user_id` has seen `message_id`. Absence means unread.
#[derive(Debug, Clone)]
pub struct BroadcastReadMarker {
    pub message_id: i64,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}
