use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use agrilink_advisor::{GroqClient, PriceIntelligence};
use agrilink_core::config::{AppConfig, ConfigError, LoadOptions};
use agrilink_core::SystemClock;
use agrilink_db::repositories::SqlTrendRepository;
use agrilink_db::{connect, migrations, DbPool, SqlCatalog};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: SqlCatalog,
    pub engine: Arc<PriceIntelligence>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client initialization failed: {0}")]
    Llm(#[source] anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let trends = SqlTrendRepository::new(db_pool.clone());
    let mut engine =
        PriceIntelligence::new(Arc::new(trends), Arc::new(SystemClock));

    match GroqClient::from_config(&config.llm).map_err(BootstrapError::Llm)? {
        Some(client) => {
            info!(
                event_name = "system.bootstrap.llm_enabled",
                model = %config.llm.model,
                "llm pricing enabled"
            );
            engine = engine.with_llm(Arc::new(client));
        }
        None => {
            info!(
                event_name = "system.bootstrap.llm_disabled",
                "no llm api key configured, heuristic pricing only"
            );
        }
    }

    Ok(Application {
        catalog: SqlCatalog::new(db_pool.clone()),
        engine: Arc::new(engine),
        config,
        db_pool,
    })
}

#[cfg(test)]
mod tests {
    use agrilink_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn in_memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_applies_the_marketplace_schema() {
        let app = bootstrap(in_memory_options()).await.expect("bootstrap succeeds");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('category', 'product', 'market_trend', 'price_suggestion')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query succeeds");
        assert_eq!(table_count, 4, "bootstrap should expose the baseline marketplace tables");

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_succeeds_without_an_llm_key() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                llm_api_key: Some(String::new()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap succeeds with a blank key");

        assert!(!app.config.llm_enabled());
        app.db_pool.close().await;
    }
}
