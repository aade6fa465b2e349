use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use agrilink_core::domain::product::{Category, CategoryId, Product, ProductId, QualityGrade};

use super::RepositoryError;
use crate::DbPool;

const PRODUCT_COLUMNS: &str = r#"
    p.id,
    p.farmer_id,
    p.category_id,
    c.name AS category_name,
    p.name,
    p.description,
    p.base_price,
    p.quantity,
    p.unit,
    p.quality_grade,
    p.location,
    p.harvest_date,
    p.is_available,
    p.created_at,
    p.updated_at
"#;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM product p JOIN category c ON c.id = p.category_id
             WHERE p.id = ?1"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| product_from_row(&row)).transpose()
    }

    pub async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO product (
                id, farmer_id, category_id, name, description, base_price, quantity,
                unit, quality_grade, location, harvest_date, is_available,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&product.id.0)
        .bind(&product.farmer_id)
        .bind(&product.category_id.0)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.base_price.to_string())
        .bind(product.quantity.to_string())
        .bind(&product.unit)
        .bind(product.quality_grade.map(|grade| grade.as_str()))
        .bind(product.location.as_deref())
        .bind(product.harvest_date.format("%Y-%m-%d").to_string())
        .bind(product.is_available)
        .bind(product.created_at.to_rfc3339())
        .bind(product.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, icon FROM category ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Category {
                    id: CategoryId(row.try_get("id")?),
                    name: row.try_get("name")?,
                    icon: row.try_get("icon")?,
                })
            })
            .collect()
    }
}

pub(crate) fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let quality_grade: Option<String> = row.try_get("quality_grade")?;
    let quality_grade = quality_grade
        .map(|grade| QualityGrade::parse(&grade).map_err(|err| RepositoryError::Decode(err.to_string())))
        .transpose()?;

    Ok(Product {
        id: ProductId(row.try_get("id")?),
        farmer_id: row.try_get("farmer_id")?,
        category_id: CategoryId(row.try_get("category_id")?),
        category_name: row.try_get("category_name")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        base_price: parse_decimal("base_price", &row.try_get::<String, _>("base_price")?)?,
        quantity: parse_decimal("quantity", &row.try_get::<String, _>("quantity")?)?,
        unit: row.try_get("unit")?,
        quality_grade,
        location: row.try_get("location")?,
        harvest_date: parse_date("harvest_date", &row.try_get::<String, _>("harvest_date")?)?,
        is_available: row.try_get("is_available")?,
        created_at: parse_timestamp("created_at", &row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp("updated_at", &row.try_get::<String, _>("updated_at")?)?,
    })
}

pub(crate) fn product_columns() -> &'static str {
    PRODUCT_COLUMNS
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|error| RepositoryError::Decode(format!("invalid decimal for {field}: {error}")))
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|error| RepositoryError::Decode(format!("invalid date for {field}: {error}")))
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp for {field}: {error}")))
}
