#![allow(dead_code)]


use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Once};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

use beacon::app::auth::AuthService;
use beacon::config::{AppConfig, StoreBackend};
use beacon::domain::broadcast::{BroadcastMessage, NewBroadcast};
use beacon::domain::notification::{NewNotification, UserNotification};
use beacon::infra::memory::MemoryStore;
use beacon::infra::store::NotificationStore;
use beacon::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// "0123456789abcdef0123456789abcdef" (32 bytes), test-only
const TEST_PASETO_ACCESS_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
const TEST_ADMIN_TOKEN: &str = "test-admin-token-12345";

static ENV: Once = Once::new();

// ---------------------------------------------------------------------------
// TestApp: one per test, broadcasts are global so state is never shared
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: MemoryStore,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }

    pub fn items(&self) -> Vec<Value> {
        self.json()["items"].as_array().cloned().unwrap_or_default()
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub access_token: String,
}

pub fn app() -> TestApp {
    TestApp::setup(Faults::default())
}

/// Like `app()`, but the router's store fails the selected tables.
pub fn app_with_faults(faults: Faults) -> TestApp {
    TestApp::setup(faults)
}

// ---------------------------------------------------------------------------
// FaultyStore: memory store that errors on demand
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Default)]
pub struct Faults {
    pub direct: bool,
    pub broadcasts: bool,
}

struct FaultyStore {
    inner: MemoryStore,
    faults: Faults,
}

impl FaultyStore {
    fn direct(&self) -> Result<()> {
        if self.faults.direct {
            return Err(anyhow!("user_notifications unavailable"));
        }
        Ok(())
    }

    fn broadcasts(&self) -> Result<()> {
        if self.faults.broadcasts {
            return Err(anyhow!("broadcast tables unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for FaultyStore {
    async fn list_recent(&self, user_id: Uuid, limit: i64) -> Result<Vec<UserNotification>> {
        self.direct()?;
        self.inner.list_recent(user_id, limit).await
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<i64> {
        self.direct()?;
        self.inner.count_unread(user_id).await
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: i64) -> Result<bool> {
        self.direct()?;
        self.inner.mark_read(user_id, notification_id).await
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        self.direct()?;
        self.inner.mark_all_read(user_id).await
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64> {
        self.direct()?;
        self.inner.delete_all(user_id).await
    }

    async fn list_recent_broadcasts(&self, limit: i64) -> Result<Vec<BroadcastMessage>> {
        self.broadcasts()?;
        self.inner.list_recent_broadcasts(limit).await
    }

    async fn read_marker_ids(&self, user_id: Uuid, message_ids: &[i64]) -> Result<Vec<i64>> {
        self.broadcasts()?;
        self.inner.read_marker_ids(user_id, message_ids).await
    }

    async fn mark_broadcast_read(&self, user_id: Uuid, message_id: i64) -> Result<bool> {
        self.broadcasts()?;
        self.inner.mark_broadcast_read(user_id, message_id).await
    }

    async fn mark_all_broadcasts_read(&self, user_id: Uuid) -> Result<u64> {
        self.broadcasts()?;
        self.inner.mark_all_broadcasts_read(user_id).await
    }

    async fn publish_broadcast(&self, broadcast: NewBroadcast) -> Result<BroadcastMessage> {
        self.broadcasts()?;
        self.inner.publish_broadcast(broadcast).await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

impl TestApp {
    fn setup(faults: Faults) -> Self {
        ENV.call_once(|| {
            std::env::set_var("STORE_BACKEND", "memory");
            std::env::set_var("PASETO_ACCESS_KEY", TEST_PASETO_ACCESS_KEY);
            std::env::set_var("ADMIN_TOKEN", TEST_ADMIN_TOKEN);
            std::env::set_var("APP_MODE", "api");
        });

        // Same code path as production, minus the store connection.
        let config = AppConfig::from_env().expect("failed to build AppConfig");
        assert_eq!(config.store_backend, StoreBackend::Memory);

        // Seeding helpers write straight to `store`, bypassing the faults.
        let store = MemoryStore::new();
        let state = AppState {
            store: Arc::new(FaultyStore {
                inner: store.clone(),
                faults,
            }),
            admin_token: config.admin_token.clone(),
            paseto_access_key: config.paseto_access_key,
            access_ttl_minutes: config.access_ttl_minutes,
        };

        let router = beacon::http::router(state.clone());

        TestApp {
            router,
            state,
            store,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, None, &headers).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::DELETE, path, None, &headers).await
    }

    /// POST with an admin token in the x-admin-token header.
    pub async fn post_admin(
        &self,
        path: &str,
        body: Value,
        admin_token: Option<&str>,
    ) -> TestResponse {
        let mut headers = vec![];
        if let Some(t) = admin_token {
            headers.push(("x-admin-token", t));
        }
        self.request(Method::POST, path, Some(body), &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Mint an access token for a fresh user id.
    pub fn create_user(&self) -> TestUser {
        let id = Uuid::new_v4();
        let auth_service =
            AuthService::new(self.state.paseto_access_key, self.state.access_ttl_minutes);
        let token = auth_service
            .issue_access_token(id)
            .expect("issue_access_token failed");

        TestUser {
            id,
            access_token: token.token,
        }
    }

    /// Insert a direct notification created `minutes_ago` minutes in the past.
    pub async fn notify(&self, user_id: Uuid, minutes_ago: i64) -> UserNotification {
        self.store
            .insert_notification(NewNotification {
                user_id,
                notification_type: "comment".to_string(),
                title_key: "profile.notifications.commentTitle".to_string(),
                content_key: "profile.notifications.commentBody".to_string(),
                data: Some(r#"{"postId":"p1"}"#.to_string()),
                created_at: Some(OffsetDateTime::now_utc() - Duration::minutes(minutes_ago)),
            })
            .await
    }

    /// Insert a direct notification without a creation timestamp.
    pub async fn notify_undated(&self, user_id: Uuid) -> UserNotification {
        self.store
            .insert_notification(NewNotification {
                user_id,
                notification_type: "system".to_string(),
                title_key: "profile.notifications.systemTitle".to_string(),
                content_key: "profile.notifications.systemBody".to_string(),
                data: None,
                created_at: None,
            })
            .await
    }

    /// Insert a broadcast message created `minutes_ago` minutes in the past.
    pub async fn broadcast(&self, title: &str, minutes_ago: i64) -> BroadcastMessage {
        self.store
            .insert_broadcast_at(
                NewBroadcast {
                    title: title.to_string(),
                    body: format!("{} body", title),
                    sender: Some("admin".to_string()),
                },
                Some(OffsetDateTime::now_utc() - Duration::minutes(minutes_ago)),
            )
            .await
    }

    /// Return the admin token used by the test infrastructure.
    pub fn admin_token(&self) -> &str {
        TEST_ADMIN_TOKEN
    }
}
