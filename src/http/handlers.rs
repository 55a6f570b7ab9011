use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::notifications::{Access, NotificationReadService};
use crate::domain::broadcast::{BroadcastMessage, NewBroadcast};
use crate::domain::notification::NotificationItem;
use crate::http::{AdminToken, AppError, Caller};
use crate::AppState;

const UNAUTHORIZED: &str = "Unauthorized";
const MAX_BROADCAST_TITLE_LEN: usize = 200;
const MAX_BROADCAST_BODY_LEN: usize = 5000;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct FailureResponse {
    success: bool,
    error: &'static str,
}

#[derive(Serialize)]
pub struct Acknowledged {}

#[derive(Serialize)]
pub struct NotificationFeed {
    pub items: Vec<NotificationItem>,
}

#[derive(Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

fn respond<T: Serialize>(access: Access<T>) -> Response {
    match access {
        Access::Granted(body) => Json(SuccessResponse {
            success: true,
            body,
        })
        .into_response(),
        Access::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(FailureResponse {
                success: false,
                error: UNAUTHORIZED,
            }),
        )
            .into_response(),
    }
}

fn acknowledged(access: Access<()>) -> Response {
    match access {
        Access::Granted(()) => respond(Access::Granted(Acknowledged {})),
        Access::Unauthorized => respond(Access::<Acknowledged>::Unauthorized),
    }
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.store.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

pub async fn list_notifications(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let service = NotificationReadService::new(state.store.clone());
    let access = service.list_my_notifications(caller).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = ?caller, "failed to list notifications");
        AppError::internal("failed to list notifications")
    })?;

    Ok(respond(match access {
        Access::Granted(items) => Access::Granted(NotificationFeed { items }),
        Access::Unauthorized => Access::Unauthorized,
    }))
}

pub async fn unread_count(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let service = NotificationReadService::new(state.store.clone());
    let access = service.unread_count(caller).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = ?caller, "failed to count unread notifications");
        AppError::internal("failed to count unread notifications")
    })?;

    Ok(respond(match access {
        Access::Granted(count) => Access::Granted(UnreadCount { count }),
        Access::Unauthorized => Access::Unauthorized,
    }))
}

pub async fn mark_all_read(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let service = NotificationReadService::new(state.store.clone());
    let access = service.mark_all_read(caller).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = ?caller, "failed to mark notifications read");
        AppError::internal("failed to mark notifications read")
    })?;

    Ok(acknowledged(access))
}

/// The path is parsed only after the caller is known, so anonymous requests
/// get the uniform unauthorized body whatever the id looks like.
pub async fn mark_notification_read(
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    if caller.is_none() {
        return Ok(acknowledged(Access::Unauthorized));
    }
    let Path(id) = path.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected notification id");
        AppError::bad_request("invalid notification id")
    })?;

    let service = NotificationReadService::new(state.store.clone());
    let access = service.mark_one_read(caller, id).await.map_err(|err| {
        tracing::error!(
            error = ?err,
            notification_id = id,
            user_id = ?caller,
            "failed to mark notification read"
        );
        AppError::internal("failed to mark notification read")
    })?;

    Ok(acknowledged(access))
}

pub async fn clear_notifications(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let service = NotificationReadService::new(state.store.clone());
    let access = service.clear_my_notifications(caller).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = ?caller, "failed to clear notifications");
        AppError::internal("failed to clear notifications")
    })?;

    Ok(acknowledged(access))
}

#[derive(Deserialize)]
pub struct PublishBroadcastRequest {
    pub title: String,
    pub body: String,
    pub sender: Option<String>,
}

pub async fn publish_broadcast(
    _admin: AdminToken,
    State(state): State<AppState>,
    Json(payload): Json<PublishBroadcastRequest>,
) -> Result<Json<BroadcastMessage>, AppError> {
    let title = payload.title.trim().to_string();
    let body = payload.body.trim().to_string();
    if title.is_empty() || body.is_empty() {
        return Err(AppError::bad_request("title and body are required"));
    }
    if title.chars().count() > MAX_BROADCAST_TITLE_LEN {
        return Err(AppError::bad_request("title must be at most 200 characters"));
    }
    if body.chars().count() > MAX_BROADCAST_BODY_LEN {
        return Err(AppError::bad_request("body must be at most 5000 characters"));
    }
    let sender = payload
        .sender
        .map(|sender| sender.trim().to_string())
        .filter(|sender| !sender.is_empty());

    let message = state
        .store
        .publish_broadcast(NewBroadcast {
            title,
            body,
            sender,
        })
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to publish broadcast");
            AppError::internal("failed to publish broadcast")
        })?;

    tracing::info!(broadcast_id = message.id, "published broadcast");
    Ok(Json(message))
}
