use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;

use agrilink_core::domain::product::{Category, CategoryId, Product, ProductId};
use agrilink_core::domain::user::UserId;
use agrilink_core::trends::InventoryProvider;
use agrilink_core::{ApplicationError, CatalogProvider};

use crate::repositories::product::{parse_decimal, product_columns, product_from_row};
use crate::repositories::RepositoryError;
use crate::DbPool;

/// Catalog reads behind the recommender and the trend summariser. Pseudo-random
/// ordering comes from SQLite's RANDOM() so repeated calls rotate the
/// selection.
#[derive(Clone)]
pub struct SqlCatalog {
    pool: DbPool,
}

impl SqlCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn placeholders(count: usize, offset: usize) -> String {
        (0..count).map(|index| format!("?{}", offset + index + 1)).collect::<Vec<_>>().join(", ")
    }
}

#[async_trait]
impl CatalogProvider for SqlCatalog {
    async fn wishlist_products(&self, user: &UserId) -> Result<Vec<Product>, ApplicationError> {
        let rows = sqlx::query(&format!(
            "SELECT {}
             FROM wishlist w
             JOIN product p ON p.id = w.product_id
             JOIN category c ON c.id = p.category_id
             WHERE w.user_id = ?1
             ORDER BY w.created_at DESC",
            product_columns()
        ))
        .bind(&user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, RepositoryError>>()?)
    }

    async fn available_in_categories(
        &self,
        categories: &[CategoryId],
        exclude: &[ProductId],
        limit: usize,
    ) -> Result<Vec<Product>, ApplicationError> {
        if categories.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let category_slots = Self::placeholders(categories.len(), 0);
        let exclude_clause = if exclude.is_empty() {
            String::new()
        } else {
            format!("AND p.id NOT IN ({})", Self::placeholders(exclude.len(), categories.len()))
        };
        let limit_slot = categories.len() + exclude.len() + 1;

        let sql = format!(
            "SELECT {}
             FROM product p JOIN category c ON c.id = p.category_id
             WHERE p.is_available = 1
               AND p.category_id IN ({category_slots})
               {exclude_clause}
             ORDER BY RANDOM()
             LIMIT ?{limit_slot}",
            product_columns()
        );

        let mut query = sqlx::query(&sql);
        for category in categories {
            query = query.bind(&category.0);
        }
        for product in exclude {
            query = query.bind(&product.0);
        }
        query = query.bind(limit as i64);

        let rows = query.fetch_all(&self.pool).await.map_err(RepositoryError::from)?;
        Ok(rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, RepositoryError>>()?)
    }

    async fn recent_searches(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<String>, ApplicationError> {
        let rows = sqlx::query(
            "SELECT query FROM search_history
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )
        .bind(&user.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_get::<String, _>("query").map_err(RepositoryError::from))
            .collect::<Result<Vec<_>, RepositoryError>>()?)
    }

    async fn search_available(
        &self,
        query: &str,
        exclude: &[ProductId],
        limit: usize,
    ) -> Result<Vec<Product>, ApplicationError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let exclude_clause = if exclude.is_empty() {
            String::new()
        } else {
            format!("AND p.id NOT IN ({})", Self::placeholders(exclude.len(), 1))
        };
        let limit_slot = exclude.len() + 2;

        let sql = format!(
            "SELECT {}
             FROM product p JOIN category c ON c.id = p.category_id
             WHERE p.is_available = 1
               AND p.name LIKE ?1 ESCAPE '\\'
               {exclude_clause}
             ORDER BY p.created_at DESC, p.id ASC
             LIMIT ?{limit_slot}",
            product_columns()
        );

        let pattern =
            format!("%{}%", query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"));

        let mut statement = sqlx::query(&sql).bind(pattern);
        for product in exclude {
            statement = statement.bind(&product.0);
        }
        statement = statement.bind(limit as i64);

        let rows = statement.fetch_all(&self.pool).await.map_err(RepositoryError::from)?;
        Ok(rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, RepositoryError>>()?)
    }

    async fn popular_available(
        &self,
        exclude: &[ProductId],
        limit: usize,
    ) -> Result<Vec<Product>, ApplicationError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let exclude_clause = if exclude.is_empty() {
            String::new()
        } else {
            format!("AND p.id NOT IN ({})", Self::placeholders(exclude.len(), 0))
        };
        let limit_slot = exclude.len() + 1;

        let sql = format!(
            "SELECT {}
             FROM product p
             JOIN category c ON c.id = p.category_id
             LEFT JOIN product_review r ON r.product_id = p.id
             WHERE p.is_available = 1
               {exclude_clause}
             GROUP BY p.id
             ORDER BY COUNT(r.id) DESC, p.created_at DESC
             LIMIT ?{limit_slot}",
            product_columns()
        );

        let mut statement = sqlx::query(&sql);
        for product in exclude {
            statement = statement.bind(&product.0);
        }
        statement = statement.bind(limit as i64);

        let rows = statement.fetch_all(&self.pool).await.map_err(RepositoryError::from)?;
        Ok(rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, RepositoryError>>()?)
    }
}

#[async_trait]
impl InventoryProvider for SqlCatalog {
    async fn categories(&self) -> Result<Vec<Category>, ApplicationError> {
        let rows = sqlx::query("SELECT id, name, icon FROM category ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                Ok::<_, RepositoryError>(Category {
                    id: CategoryId(row.try_get("id")?),
                    name: row.try_get("name")?,
                    icon: row.try_get("icon")?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?)
    }

    async fn available_prices(
        &self,
        category: &CategoryId,
    ) -> Result<Vec<Decimal>, ApplicationError> {
        let rows = sqlx::query(
            "SELECT base_price FROM product WHERE category_id = ?1 AND is_available = 1",
        )
        .bind(&category.0)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let text: String = row.try_get("base_price").map_err(RepositoryError::from)?;
                parse_decimal("base_price", &text)
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use agrilink_core::domain::product::{CategoryId, ProductId};
    use agrilink_core::domain::user::UserId;
    use agrilink_core::trends::InventoryProvider;
    use agrilink_core::CatalogProvider;

    use super::SqlCatalog;
    use crate::repositories::product::tests::{insert_category, sample_product, setup_pool};
    use crate::repositories::{SqlActivityRepository, SqlProductRepository};
    use crate::DbPool;

    async fn seed_products(pool: &DbPool) {
        insert_category(pool, "cat-veg", "Vegetables").await;
        insert_category(pool, "cat-fruit", "Fruits").await;

        let repo = SqlProductRepository::new(pool.clone());
        for (id, category, name, available) in [
            ("P-1", "cat-veg", "Sukuma Wiki", true),
            ("P-2", "cat-veg", "Tomatoes", true),
            ("P-3", "cat-veg", "Cabbage", false),
            ("P-4", "cat-fruit", "Mangoes", true),
        ] {
            let mut product = sample_product(id, category);
            product.name = name.to_owned();
            product.is_available = available;
            repo.insert(&product).await.expect("insert product");
        }
    }

    #[tokio::test]
    async fn category_scan_skips_unavailable_and_excluded_products() {
        let pool = setup_pool().await;
        seed_products(&pool).await;

        let catalog = SqlCatalog::new(pool.clone());
        let products = catalog
            .available_in_categories(
                &[CategoryId("cat-veg".to_owned())],
                &[ProductId("P-1".to_owned())],
                10,
            )
            .await
            .expect("category scan");

        let ids: Vec<&str> = products.iter().map(|product| product.id.0.as_str()).collect();
        assert_eq!(ids, vec!["P-2"]);

        pool.close().await;
    }

    #[tokio::test]
    async fn name_search_is_case_insensitive_and_available_only() {
        let pool = setup_pool().await;
        seed_products(&pool).await;

        let catalog = SqlCatalog::new(pool.clone());
        let products = catalog.search_available("toma", &[], 10).await.expect("search");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Tomatoes");

        let hidden = catalog.search_available("cabbage", &[], 10).await.expect("search");
        assert!(hidden.is_empty(), "unavailable products should not match");

        pool.close().await;
    }

    #[tokio::test]
    async fn popularity_orders_by_review_count() {
        let pool = setup_pool().await;
        seed_products(&pool).await;

        let activity = SqlActivityRepository::new(pool.clone());
        let reviewer = UserId("U-1".to_owned());
        for _ in 0..3 {
            activity
                .add_review(&ProductId("P-4".to_owned()), &reviewer, 5, "great mangoes")
                .await
                .expect("review");
        }
        activity
            .add_review(&ProductId("P-2".to_owned()), &reviewer, 4, "good tomatoes")
            .await
            .expect("review");

        let catalog = SqlCatalog::new(pool.clone());
        let popular = catalog.popular_available(&[], 2).await.expect("popular");
        assert_eq!(popular[0].id, ProductId("P-4".to_owned()));
        assert_eq!(popular[1].id, ProductId("P-2".to_owned()));

        pool.close().await;
    }

    #[tokio::test]
    async fn wishlist_and_searches_feed_back_per_user() {
        let pool = setup_pool().await;
        seed_products(&pool).await;

        let activity = SqlActivityRepository::new(pool.clone());
        let user = UserId("U-9".to_owned());
        activity.add_wishlist_item(&user, &ProductId("P-4".to_owned())).await.expect("wishlist");
        activity.add_wishlist_item(&user, &ProductId("P-3".to_owned())).await.expect("wishlist");
        activity.record_search(&user, "sukuma").await.expect("search");

        let catalog = SqlCatalog::new(pool.clone());
        let wishlist = catalog.wishlist_products(&user).await.expect("wishlist products");
        let mut ids: Vec<&str> = wishlist.iter().map(|product| product.id.0.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["P-3", "P-4"], "wishlist reads keep unavailable products");

        let searches = catalog.recent_searches(&user, 5).await.expect("recent searches");
        assert_eq!(searches, vec!["sukuma".to_owned()]);

        pool.close().await;
    }

    #[tokio::test]
    async fn inventory_prices_cover_only_available_products() {
        let pool = setup_pool().await;
        seed_products(&pool).await;

        let catalog = SqlCatalog::new(pool.clone());
        let categories = catalog.categories().await.expect("categories");
        assert_eq!(categories.len(), 2);

        let prices = catalog
            .available_prices(&CategoryId("cat-veg".to_owned()))
            .await
            .expect("prices");
        assert_eq!(prices.len(), 2);
        assert!(prices.iter().all(|price| *price == Decimal::new(8000, 2)));

        pool.close().await;
    }
}
