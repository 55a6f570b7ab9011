pub mod db;
pub mod memory;
pub mod postgres;
pub mod store;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::infra::db::Db;
use crate::infra::memory::MemoryStore;
use crate::infra::postgres::PgNotificationStore;
use crate::infra::store::DynNotificationStore;

pub async fn connect_store(config: &AppConfig) -> Result<DynNotificationStore> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let db = Db::connect(config).await?;
            Ok(Arc::new(PgNotificationStore::new(db)))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory notification store, data is not persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
