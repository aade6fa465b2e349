use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::CategoryId;
use crate::domain::trend::{DemandLevel, MarketTrend, PriceTrend};
use crate::errors::ApplicationError;

/// Read side of the market trend table. Only the latest record per category
/// is ever consulted.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    async fn latest_for_category(
        &self,
        category: &CategoryId,
    ) -> Result<Option<MarketTrend>, ApplicationError>;
}

/// Market conditions fed to the pricers. When no trend record exists the
/// context is synthesized with random defaults; the confidence score already
/// reflects that uncertainty, so callers must not rely on a defaulted
/// context being stable between calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub average_price: Decimal,
    pub price_trend: PriceTrend,
    pub demand_level: DemandLevel,
    pub recommendation: String,
    pub synthesized: bool,
}

impl MarketContext {
    pub fn from_trend(trend: &MarketTrend) -> Self {
        Self {
            average_price: trend.average_price,
            price_trend: trend.price_trend,
            demand_level: trend.demand_level,
            recommendation: trend.recommendation.clone(),
            synthesized: false,
        }
    }

    pub fn synthesized<R: Rng>(rng: &mut R) -> Self {
        let average = rng.gen_range(50.0..=500.0_f64);
        let price_trend = match rng.gen_range(0..3) {
            0 => PriceTrend::Increasing,
            1 => PriceTrend::Decreasing,
            _ => PriceTrend::Stable,
        };
        let demand_level = match rng.gen_range(0..3) {
            0 => DemandLevel::High,
            1 => DemandLevel::Medium,
            _ => DemandLevel::Low,
        };

        Self {
            average_price: Decimal::from_f64_retain(average)
                .unwrap_or_else(|| Decimal::from(150))
                .round_dp(2),
            price_trend,
            demand_level,
            recommendation: "Monitor market trends for optimal pricing".to_owned(),
            synthesized: true,
        }
    }
}
