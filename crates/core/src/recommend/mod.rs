//! Personalised product recommendations. Purely local: wishlist affinity,
//! then search affinity, then popularity fill, deduplicated and bounded.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::product::{CategoryId, Product, ProductId};
use crate::domain::user::UserId;
use crate::errors::ApplicationError;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 6;

/// How many recent search queries feed the search-affinity phase.
const RECENT_SEARCH_WINDOW: usize = 5;
/// How many products each search query may contribute.
const PRODUCTS_PER_SEARCH: usize = 2;

/// Catalog reads the recommender needs. The `*_available` methods must
/// return only available products and honour the exclusion lists;
/// `wishlist_products` returns whatever the user has saved, available or
/// not, so wishlisted items can be excluded from the results.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Products currently on the user's wishlist.
    async fn wishlist_products(&self, user: &UserId) -> Result<Vec<Product>, ApplicationError>;

    /// Available products in any of the given categories, excluding the given
    /// ids, in a pseudo-random order.
    async fn available_in_categories(
        &self,
        categories: &[CategoryId],
        exclude: &[ProductId],
        limit: usize,
    ) -> Result<Vec<Product>, ApplicationError>;

    /// The user's most recent search queries, newest first.
    async fn recent_searches(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<String>, ApplicationError>;

    /// Available products whose name contains the query, case-insensitively.
    async fn search_available(
        &self,
        query: &str,
        exclude: &[ProductId],
        limit: usize,
    ) -> Result<Vec<Product>, ApplicationError>;

    /// Available products ordered by descending review count.
    async fn popular_available(
        &self,
        exclude: &[ProductId],
        limit: usize,
    ) -> Result<Vec<Product>, ApplicationError>;
}

pub struct Recommender<C> {
    catalog: C,
}

impl<C: CatalogProvider> Recommender<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Builds a bounded, de-duplicated selection. Earlier phases keep their
    /// entries when later phases would duplicate them; the final result is a
    /// set-ish selection with no ordering guarantee.
    pub async fn recommend(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Product>, ApplicationError> {
        let mut selected: Vec<Product> = Vec::new();
        let mut seen: HashSet<ProductId> = HashSet::new();

        // Phase 1: categories the user has wishlisted, minus the wishlist
        // itself.
        let wishlist = self.catalog.wishlist_products(user).await?;
        if !wishlist.is_empty() {
            let categories: Vec<CategoryId> = wishlist
                .iter()
                .map(|product| product.category_id.clone())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            let wishlisted_ids: Vec<ProductId> =
                wishlist.iter().map(|product| product.id.clone()).collect();
            // Owned items never come back as recommendations, not even via
            // the popularity fill.
            seen.extend(wishlisted_ids.iter().cloned());

            let similar = self
                .catalog
                .available_in_categories(&categories, &wishlisted_ids, limit)
                .await?;
            for product in similar {
                if seen.insert(product.id.clone()) {
                    selected.push(product);
                }
            }
        }

        // Phase 2: name matches for the last few searches, two per query.
        let searches = self.catalog.recent_searches(user, RECENT_SEARCH_WINDOW).await?;
        for query in searches {
            let exclude: Vec<ProductId> = seen.iter().cloned().collect();
            let matches =
                self.catalog.search_available(&query, &exclude, PRODUCTS_PER_SEARCH).await?;
            for product in matches {
                if seen.insert(product.id.clone()) {
                    selected.push(product);
                }
            }
        }

        // Phase 3: top up with the most reviewed products.
        if selected.len() < limit {
            let exclude: Vec<ProductId> = seen.iter().cloned().collect();
            let popular =
                self.catalog.popular_available(&exclude, limit - selected.len()).await?;
            for product in popular {
                if seen.insert(product.id.clone()) {
                    selected.push(product);
                }
            }
        }

        selected.truncate(limit);
        Ok(selected)
    }
}
