use crate::config::{Config, StoreBackend};
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgDocumentStore;
use crate::database::SharedStore;
use crate::error::{Error, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(50)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn create_store(config: &Config) -> Result<SharedStore> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| Error::Config("DATABASE_URL is not set".to_string()))?;
            let pool = create_pool(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Ok(Arc::new(PgDocumentStore::new(
                pool,
                Duration::from_millis(config.subscription_poll_ms),
            )))
        }
    }
}
