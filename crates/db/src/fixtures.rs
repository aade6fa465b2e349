use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_CATEGORY_IDS: &[&str] = &["cat-vegetables", "cat-fruits", "cat-grains"];

const SEED_PRODUCT_IDS: &[&str] = &[
    "prod-sukuma-001",
    "prod-tomato-001",
    "prod-cabbage-001",
    "prod-spinach-001",
    "prod-mango-001",
    "prod-banana-001",
    "prod-maize-001",
    "prod-beans-001",
];

const SEED_TREND_IDS: &[&str] = &["trend-veg-001", "trend-fruit-001", "trend-grain-001"];

const DEMO_BUYER_ID: &str = "buyer-demo";

/// Demo marketplace dataset: categories, listings, one trend snapshot per
/// category, and enough buyer activity to exercise every recommendation
/// phase.
pub struct DemoSeedDataset;

pub struct SeedResult {
    pub categories: usize,
    pub products: usize,
    pub trends: usize,
}

pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl DemoSeedDataset {
    /// SQL fixture content for the demo dataset.
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            categories: SEED_CATEGORY_IDS.len(),
            products: SEED_PRODUCT_IDS.len(),
            trends: SEED_TREND_IDS.len(),
        })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let category_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM category WHERE id IN {}",
            sql_array(SEED_CATEGORY_IDS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("categories", category_count == SEED_CATEGORY_IDS.len() as i64));

        let product_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM product WHERE id IN {}",
            sql_array(SEED_PRODUCT_IDS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("products", product_count == SEED_PRODUCT_IDS.len() as i64));

        let trend_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM market_trend WHERE id IN {}",
            sql_array(SEED_TREND_IDS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("trends", trend_count == SEED_TREND_IDS.len() as i64));

        // Every category must carry a trend snapshot so pricing never has to
        // synthesize context for seeded listings.
        let uncovered: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM category c
             WHERE NOT EXISTS (SELECT 1 FROM market_trend t WHERE t.category_id = c.id)",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("trend-coverage", uncovered == 0));

        let wishlist_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM wishlist WHERE user_id = ?1")
                .bind(DEMO_BUYER_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("demo-buyer-wishlist", wishlist_count >= 1));

        let search_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM search_history WHERE user_id = ?1")
                .bind(DEMO_BUYER_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("demo-buyer-searches", search_count >= 1));

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }
}

fn sql_array(ids: &[&str]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("'{id}'")).collect();
    format!("({})", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::DemoSeedDataset;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seed_loads_and_verifies_against_its_contract() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        let seeded = DemoSeedDataset::load(&pool).await.expect("load seed");
        assert_eq!(seeded.categories, 3);
        assert_eq!(seeded.products, 8);
        assert_eq!(seeded.trends, 3);

        let verified = DemoSeedDataset::verify(&pool).await.expect("verify seed");
        assert!(
            verified.all_present,
            "missing seed checks: {:?}",
            verified
                .checks
                .iter()
                .filter(|(_, present)| !present)
                .map(|(name, _)| name)
                .collect::<Vec<_>>()
        );

        pool.close().await;
    }

    #[tokio::test]
    async fn verify_reports_missing_data_on_an_empty_database() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        let verified = DemoSeedDataset::verify(&pool).await.expect("verify empty");
        assert!(!verified.all_present);

        pool.close().await;
    }
}
