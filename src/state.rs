use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::AppConfig;
use crate::store::{InventoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to postgres")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("migrations applied");

        Ok(Self::from_parts(Arc::new(PgStore::new(db)), config))
    }

    pub fn from_parts(store: Arc<dyn InventoryStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::store::memory::MemoryStore;

        Self::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(AppConfig::for_tests()),
        )
    }
}
