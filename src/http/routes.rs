use axum::{routing::delete, routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn notifications() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications", delete(handlers::clear_notifications))
        .route(
            "/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route("/notifications/read-all", post(handlers::mark_all_read))
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
}

pub fn admin() -> Router<AppState> {
    Router::new().route("/admin/broadcasts", post(handlers::publish_broadcast))
}
