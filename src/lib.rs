pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use crate::infra::store::DynNotificationStore;

#[derive(Clone)]
pub struct AppState {
    pub store: DynNotificationStore,
    pub admin_token: Option<String>,
    pub paseto_access_key: [u8; 32],
    pub access_ttl_minutes: u64,
}
