//! Market-trend summarisation. Operator-triggered: scans available inventory
//! per category, classifies direction against the previous snapshot, and
//! appends a new trend record. One category failing never stops the rest.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::product::{Category, CategoryId};
use crate::domain::trend::{DemandLevel, NewMarketTrend, PriceTrend};
use crate::errors::ApplicationError;
use crate::pricing::context::TrendProvider;

/// Inventory reads the summariser needs.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>, ApplicationError>;

    /// Base prices of all available products in the category.
    async fn available_prices(
        &self,
        category: &CategoryId,
    ) -> Result<Vec<Decimal>, ApplicationError>;
}

/// Write side of the trend table. Append-only: prior snapshots are never
/// mutated.
#[async_trait]
pub trait TrendStore: TrendProvider {
    async fn append(&self, trend: NewMarketTrend) -> Result<(), ApplicationError>;
}

/// Direction of the new average against the prior snapshot, with a ±5% dead
/// band. No prior snapshot reads as stable.
pub fn classify_price_trend(average: Decimal, prior_average: Option<Decimal>) -> PriceTrend {
    let Some(prior) = prior_average else { return PriceTrend::Stable };
    if average > prior * Decimal::new(105, 2) {
        PriceTrend::Increasing
    } else if average < prior * Decimal::new(95, 2) {
        PriceTrend::Decreasing
    } else {
        PriceTrend::Stable
    }
}

/// Demand classification by active listing count.
pub fn classify_demand(active_products: usize) -> DemandLevel {
    if active_products > 20 {
        DemandLevel::High
    } else if active_products > 10 {
        DemandLevel::Medium
    } else {
        DemandLevel::Low
    }
}

/// Advisory string for a category. The rising/high and falling/low wordings
/// are displayed verbatim in the marketplace UI.
pub fn build_recommendation(
    category_name: &str,
    trend: PriceTrend,
    demand: DemandLevel,
) -> String {
    match (trend, demand) {
        (PriceTrend::Increasing, DemandLevel::High) => {
            format!("High demand for {category_name}. Prices rising. Good time to sell.")
        }
        (PriceTrend::Decreasing, DemandLevel::Low) => {
            format!("Low demand for {category_name}. Prices falling. Good time to buy.")
        }
        _ => format!("Market for {category_name} is stable. Good time for trading."),
    }
}

pub struct TrendSummariser<I, S> {
    inventory: I,
    store: S,
}

impl<I: InventoryProvider, S: TrendStore> TrendSummariser<I, S> {
    pub fn new(inventory: I, store: S) -> Self {
        Self { inventory, store }
    }

    /// Appends one trend record per non-empty category and returns how many
    /// were written. Per-category failures are logged and skipped.
    pub async fn recompute_trends(&self) -> Result<usize, ApplicationError> {
        let categories = self.inventory.categories().await?;
        let mut written = 0usize;

        for category in categories {
            match self.recompute_category(&category).await {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(error) => {
                    warn!(
                        event_name = "engine.trends.category_failed",
                        category = %category.name,
                        error = %error,
                        "trend recompute skipped a category"
                    );
                }
            }
        }

        info!(
            event_name = "engine.trends.recomputed",
            categories_written = written,
            "market trend recompute finished"
        );
        Ok(written)
    }

    async fn recompute_category(&self, category: &Category) -> Result<bool, ApplicationError> {
        let prices = self.inventory.available_prices(&category.id).await?;
        if prices.is_empty() {
            return Ok(false);
        }

        let count = prices.len();
        let total: Decimal = prices.into_iter().sum();
        let average = (total / Decimal::from(count as u64)).round_dp(2);

        let prior = self.store.latest_for_category(&category.id).await?;
        let price_trend = classify_price_trend(average, prior.map(|trend| trend.average_price));
        let demand_level = classify_demand(count);
        let recommendation = build_recommendation(&category.name, price_trend, demand_level);

        self.store
            .append(NewMarketTrend {
                category_id: category.id.clone(),
                average_price: average,
                price_trend,
                demand_level,
                recommendation,
            })
            .await?;
        Ok(true)
    }
}
