/// Application context and wiring
use crate::config::WardenConfig;
use crate::db;
use crate::error::WardenResult;
use crate::flood::FloodTracker;
use crate::gateway::ChatGateway;
use crate::pipeline::ModerationPipeline;
use crate::store::{SanctionStore, SettingsStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

/// Shared services built from configuration
///
/// The chat transport is external; callers build a pipeline by handing
/// their gateway implementation to [`AppContext::pipeline`].
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<WardenConfig>,
    pub db: SqlitePool,
    pub settings: SettingsStore,
    pub sanctions: SanctionStore,
    pub flood: Arc<FloodTracker>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: WardenConfig) -> WardenResult<Self> {
        config.validate()?;

        let db = db::create_pool(
            &config.storage.database,
            db::DatabaseOptions {
                max_connections: config.storage.max_connections,
                enable_wal: true,
            },
        )
        .await?;
        db::init_schema(&db).await?;
        db::test_connection(&db).await?;

        Ok(Self {
            config: Arc::new(config),
            settings: SettingsStore::new(db.clone()),
            sanctions: SanctionStore::new(db.clone()),
            flood: Arc::new(FloodTracker::new()),
            db,
        })
    }

    /// Build the moderation pipeline over this context's stores
    pub fn pipeline(&self, gateway: Arc<dyn ChatGateway>) -> ModerationPipeline {
        ModerationPipeline::new(
            self.settings.clone(),
            self.sanctions.clone(),
            Arc::clone(&self.flood),
            gateway,
            Duration::from_secs(self.config.flood.window_secs),
        )
    }
}
