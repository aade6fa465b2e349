use crate::commands::CommandResult;
use agrilink_core::config::{AppConfig, LoadOptions};
use agrilink_core::trends::TrendSummariser;
use agrilink_db::repositories::SqlTrendRepository;
use agrilink_db::{connect, migrations, SqlCatalog};

/// Rebuilds the per-category trend snapshots from the current listings. Safe
/// to run repeatedly; each run appends a fresh snapshot per stocked category.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "trends",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "trends",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let summariser =
            TrendSummariser::new(SqlCatalog::new(pool.clone()), SqlTrendRepository::new(pool.clone()));
        let written = summariser
            .recompute_trends()
            .await
            .map_err(|error| ("trend_recompute", error.to_string(), 5u8))?;

        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(written)
    });

    match result {
        Ok(written) => CommandResult::success(
            "trends",
            format!("recomputed market trends for {written} categories"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("trends", error_class, message, exit_code)
        }
    }
}
