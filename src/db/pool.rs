use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::store::DocumentStore;

pub const MEMORY_URL: &str = "memory://";

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to create database pool")
}

/// Builds the store for `database_url` and verifies it is reachable.
/// Any failure here is fatal for startup.
pub async fn connect(database_url: &str) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = if database_url == MEMORY_URL {
        tracing::warn!("Using in-memory document store; data is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(database_url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
        Arc::new(PgStore::new(pool))
    };

    store.ping().await.context("Document store is unreachable")?;
    tracing::info!("Document store connection verified");
    Ok(store)
}
