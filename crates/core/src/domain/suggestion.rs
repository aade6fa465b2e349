use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::ProductId;
use crate::errors::DomainError;

/// Categorical summary of how a suggested price compares to the base price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLabel {
    BestPrice,
    GoodPrice,
    FairPrice,
    HighPrice,
}

impl PriceLabel {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim() {
            "best_price" => Ok(Self::BestPrice),
            "good_price" => Ok(Self::GoodPrice),
            "fair_price" => Ok(Self::FairPrice),
            "high_price" => Ok(Self::HighPrice),
            other => Err(DomainError::UnknownPriceLabel(other.to_owned())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BestPrice => "best_price",
            Self::GoodPrice => "good_price",
            Self::FairPrice => "fair_price",
            Self::HighPrice => "high_price",
        }
    }
}

/// Opaque factor keys mapped to scalar or string values. Kept ordered so
/// serialized suggestions are stable.
pub type FactorMap = BTreeMap<String, serde_json::Value>;

/// Engine output for one pricing call. Both the LLM path and the heuristic
/// path produce this exact shape; callers cannot tell them apart by schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    pub product_id: ProductId,
    pub suggested_price: Decimal,
    pub confidence_score: f64,
    pub price_label: PriceLabel,
    pub factors_considered: FactorMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::PriceLabel;

    #[test]
    fn labels_round_trip_through_their_wire_names() {
        for label in
            [PriceLabel::BestPrice, PriceLabel::GoodPrice, PriceLabel::FairPrice, PriceLabel::HighPrice]
        {
            assert_eq!(PriceLabel::parse(label.as_str()).unwrap(), label);
        }
    }

    #[test]
    fn label_ordering_runs_from_best_to_high() {
        assert!(PriceLabel::BestPrice < PriceLabel::GoodPrice);
        assert!(PriceLabel::GoodPrice < PriceLabel::FairPrice);
        assert!(PriceLabel::FairPrice < PriceLabel::HighPrice);
    }

    #[test]
    fn out_of_range_label_is_rejected() {
        assert!(PriceLabel::parse("premium_price").is_err());
    }
}
