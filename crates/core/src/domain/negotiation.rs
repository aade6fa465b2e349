use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::Product;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerProfile {
    pub buyer_type: String,
    pub location: Option<String>,
}

/// Counter-offer plus talking points for the farmer. The fallback variant is
/// fully deterministic; the LLM variant carries whatever the model returned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationPlan {
    pub counter_offer: Decimal,
    pub strategy_points: Vec<String>,
    pub value_propositions: Vec<String>,
    pub compromise_points: Vec<String>,
}

impl NegotiationPlan {
    /// Deterministic counter-offer strategy used whenever the LLM is
    /// unavailable or returns something unusable. A near-asking offer gets a
    /// small concession; anything lower gets a firm anchor. The counter never
    /// exceeds the base price.
    pub fn fallback(product: &Product, buyer_offer: Decimal) -> Self {
        let base = product.base_price;
        let close_threshold = base * Decimal::new(90, 2);
        let counter_offer = if buyer_offer >= close_threshold {
            (base * Decimal::new(95, 2)).round_dp(2)
        } else {
            (base * Decimal::new(85, 2)).round_dp(2)
        };

        Self {
            counter_offer,
            strategy_points: vec![
                "Emphasize product quality and freshness".to_owned(),
                "Highlight direct farmer-to-buyer advantage".to_owned(),
                "Consider bulk purchase discounts".to_owned(),
            ],
            value_propositions: vec![
                format!("Fresh {} quality {}", product.grade_label(), product.name),
                format!("Harvested on {}", product.harvest_date),
                "Direct from farm pricing".to_owned(),
            ],
            compromise_points: vec![
                "Flexible on delivery timing".to_owned(),
                "Bulk order discounts available".to_owned(),
                "Repeat customer benefits".to_owned(),
            ],
        }
    }
}
