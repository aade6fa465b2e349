use chrono::Utc;
use uuid::Uuid;

use agrilink_core::domain::product::ProductId;
use agrilink_core::domain::user::UserId;

use super::RepositoryError;
use crate::DbPool;

/// Buyer activity writes: searches, wishlists and reviews. These feed the
/// recommender's affinity and popularity phases.
pub struct SqlActivityRepository {
    pool: DbPool,
}

impl SqlActivityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn record_search(&self, user: &UserId, query: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO search_history (id, user_id, query, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(format!("SH-{}", Uuid::new_v4()))
        .bind(&user.0)
        .bind(query)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Idempotent: wishlisting the same product twice keeps a single row.
    pub async fn add_wishlist_item(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO wishlist (id, user_id, product_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id, product_id) DO NOTHING
            "#,
        )
        .bind(format!("WL-{}", Uuid::new_v4()))
        .bind(&user.0)
        .bind(&product.0)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn add_review(
        &self,
        product: &ProductId,
        reviewer: &UserId,
        rating: u8,
        comment: &str,
    ) -> Result<(), RepositoryError> {
        if !(1..=5).contains(&rating) {
            return Err(RepositoryError::Decode(format!(
                "rating must be in range 1..=5, got {rating}"
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO product_review (id, product_id, reviewer_id, rating, comment, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(format!("PR-{}", Uuid::new_v4()))
        .bind(&product.0)
        .bind(&reviewer.0)
        .bind(i64::from(rating))
        .bind(comment)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use agrilink_core::domain::product::ProductId;
    use agrilink_core::domain::user::UserId;

    use super::SqlActivityRepository;
    use crate::repositories::product::tests::{insert_category, sample_product, setup_pool};
    use crate::repositories::SqlProductRepository;

    #[tokio::test]
    async fn wishlist_insert_is_idempotent_per_user_and_product() {
        let pool = setup_pool().await;
        insert_category(&pool, "cat-veg", "Vegetables").await;
        SqlProductRepository::new(pool.clone())
            .insert(&sample_product("P-1", "cat-veg"))
            .await
            .expect("insert product");

        let repo = SqlActivityRepository::new(pool.clone());
        let user = UserId("U-1".to_owned());
        let product = ProductId("P-1".to_owned());
        repo.add_wishlist_item(&user, &product).await.expect("first add");
        repo.add_wishlist_item(&user, &product).await.expect("second add");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wishlist WHERE user_id = 'U-1'")
            .fetch_one(&pool)
            .await
            .expect("count wishlist");
        assert_eq!(count, 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn out_of_range_review_ratings_are_rejected() {
        let pool = setup_pool().await;
        insert_category(&pool, "cat-veg", "Vegetables").await;
        SqlProductRepository::new(pool.clone())
            .insert(&sample_product("P-1", "cat-veg"))
            .await
            .expect("insert product");

        let repo = SqlActivityRepository::new(pool.clone());
        let result = repo
            .add_review(&ProductId("P-1".to_owned()), &UserId("U-1".to_owned()), 6, "too good")
            .await;
        assert!(result.is_err());

        pool.close().await;
    }

    #[tokio::test]
    async fn searches_are_recorded_per_user() {
        let pool = setup_pool().await;
        let repo = SqlActivityRepository::new(pool.clone());
        let user = UserId("U-2".to_owned());

        repo.record_search(&user, "tomatoes").await.expect("first search");
        repo.record_search(&user, "kale").await.expect("second search");

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM search_history WHERE user_id = 'U-2'")
                .fetch_one(&pool)
                .await
                .expect("count searches");
        assert_eq!(count, 2);

        pool.close().await;
    }
}
