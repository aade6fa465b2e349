use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use agrilink_core::domain::product::CategoryId;
use agrilink_core::domain::trend::{DemandLevel, MarketTrend, NewMarketTrend, PriceTrend};
use agrilink_core::trends::TrendStore;
use agrilink_core::{ApplicationError, TrendProvider};

use super::product::{parse_decimal, parse_timestamp};
use super::RepositoryError;
use crate::DbPool;

pub struct SqlTrendRepository {
    pool: DbPool,
}

impl SqlTrendRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Latest snapshot for every category that has one, alphabetised by
    /// category name. Backs the market insights feed.
    pub async fn latest_per_category(&self) -> Result<Vec<MarketTrend>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.category_id, t.average_price, t.price_trend,
                   t.demand_level, t.recommendation, t.created_at
            FROM market_trend t
            JOIN category c ON c.id = t.category_id
            WHERE t.created_at = (
                SELECT MAX(created_at) FROM market_trend WHERE category_id = t.category_id
            )
            GROUP BY t.category_id
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(trend_from_row).collect()
    }

    async fn latest(&self, category: &CategoryId) -> Result<Option<MarketTrend>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, average_price, price_trend,
                   demand_level, recommendation, created_at
            FROM market_trend
            WHERE category_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(&category.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(trend_from_row).transpose()
    }

    async fn insert(&self, trend: NewMarketTrend) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO market_trend (
                id, category_id, average_price, price_trend, demand_level,
                recommendation, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(format!("MT-{}", Uuid::new_v4()))
        .bind(&trend.category_id.0)
        .bind(trend.average_price.to_string())
        .bind(trend.price_trend.as_str())
        .bind(trend.demand_level.as_str())
        .bind(&trend.recommendation)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TrendProvider for SqlTrendRepository {
    async fn latest_for_category(
        &self,
        category: &CategoryId,
    ) -> Result<Option<MarketTrend>, ApplicationError> {
        Ok(self.latest(category).await?)
    }
}

#[async_trait]
impl TrendStore for SqlTrendRepository {
    async fn append(&self, trend: NewMarketTrend) -> Result<(), ApplicationError> {
        Ok(self.insert(trend).await?)
    }
}

fn trend_from_row(row: &SqliteRow) -> Result<MarketTrend, RepositoryError> {
    let price_trend: String = row.try_get("price_trend")?;
    let price_trend = PriceTrend::parse(&price_trend)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown price trend `{price_trend}`")))?;
    let demand_level: String = row.try_get("demand_level")?;
    let demand_level = DemandLevel::parse(&demand_level)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown demand level `{demand_level}`")))?;

    Ok(MarketTrend {
        id: row.try_get("id")?,
        category_id: CategoryId(row.try_get("category_id")?),
        average_price: parse_decimal("average_price", &row.try_get::<String, _>("average_price")?)?,
        price_trend,
        demand_level,
        recommendation: row.try_get("recommendation")?,
        created_at: parse_timestamp("created_at", &row.try_get::<String, _>("created_at")?)?,
    })
}
