use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use agrilink_core::domain::product::ProductId;
use agrilink_core::domain::suggestion::{FactorMap, PriceLabel, PriceSuggestion};

use super::product::{parse_decimal, parse_timestamp};
use super::RepositoryError;
use crate::DbPool;

/// History of engine outputs, one row per pricing call.
pub struct SqlSuggestionRepository {
    pool: DbPool,
}

impl SqlSuggestionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, suggestion: &PriceSuggestion) -> Result<(), RepositoryError> {
        let factors_json = serde_json::to_string(&suggestion.factors_considered)
            .map_err(|error| RepositoryError::Decode(format!("factor encode failed: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO price_suggestion (
                id, product_id, suggested_price, confidence_score, price_label,
                factors_json, explanation, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(format!("PS-{}", Uuid::new_v4()))
        .bind(&suggestion.product_id.0)
        .bind(suggestion.suggested_price.to_string())
        .bind(suggestion.confidence_score)
        .bind(suggestion.price_label.as_str())
        .bind(factors_json)
        .bind(suggestion.explanation.as_deref())
        .bind(suggestion.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn latest_for_product(
        &self,
        product: &ProductId,
    ) -> Result<Option<PriceSuggestion>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT product_id, suggested_price, confidence_score, price_label,
                   factors_json, explanation, created_at
            FROM price_suggestion
            WHERE product_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(&product.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(suggestion_from_row).transpose()
    }
}

fn suggestion_from_row(row: &SqliteRow) -> Result<PriceSuggestion, RepositoryError> {
    let price_label: String = row.try_get("price_label")?;
    let price_label = PriceLabel::parse(&price_label)
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

    let factors_json: String = row.try_get("factors_json")?;
    let factors_considered: FactorMap = serde_json::from_str(&factors_json)
        .map_err(|error| RepositoryError::Decode(format!("factor decode failed: {error}")))?;

    Ok(PriceSuggestion {
        product_id: ProductId(row.try_get("product_id")?),
        suggested_price: parse_decimal(
            "suggested_price",
            &row.try_get::<String, _>("suggested_price")?,
        )?,
        confidence_score: row.try_get("confidence_score")?,
        price_label,
        factors_considered,
        explanation: row.try_get("explanation")?,
        created_at: parse_timestamp("created_at", &row.try_get::<String, _>("created_at")?)?,
    })
}
