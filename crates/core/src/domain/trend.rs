use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::CategoryId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl PriceTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "increasing" => Some(Self::Increasing),
            "decreasing" => Some(Self::Decreasing),
            "stable" => Some(Self::Stable),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    High,
    Medium,
    Low,
}

impl DemandLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Per-category market snapshot. Written only by the trend summariser and
/// never mutated afterwards; pricing consults the latest record only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketTrend {
    pub id: String,
    pub category_id: CategoryId,
    pub average_price: Decimal,
    pub price_trend: PriceTrend,
    pub demand_level: DemandLevel,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

/// A snapshot about to be appended by the summariser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewMarketTrend {
    pub category_id: CategoryId,
    pub average_price: Decimal,
    pub price_trend: PriceTrend,
    pub demand_level: DemandLevel,
    pub recommendation: String,
}
