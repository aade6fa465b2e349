//! Deterministic-plus-jittered pricing formula. This pricer never fails and
//! is the terminal fallback for every other pricer.

use std::sync::Arc;

use chrono::Datelike;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;

use super::context::MarketContext;
use super::season::season_of;
use crate::clock::Clock;
use crate::domain::product::{Product, QualityGrade};
use crate::domain::suggestion::{FactorMap, PriceLabel, PriceSuggestion};
use crate::domain::trend::PriceTrend;

/// Ordered substring table for location adjustment. The first matching
/// substring wins, so the declared order is load-bearing.
const LOCATION_MULTIPLIERS: &[(&str, f64)] = &[
    ("nairobi", 1.10),
    ("mombasa", 1.05),
    ("nakuru", 0.95),
    ("eldoret", 0.90),
    ("kisumu", 0.95),
];

pub fn quality_multiplier(grade: Option<QualityGrade>) -> f64 {
    match grade {
        Some(QualityGrade::Premium) => 1.4,
        Some(QualityGrade::Grade1) => 1.2,
        Some(QualityGrade::Grade2) => 1.0,
        Some(QualityGrade::Standard) => 0.8,
        None => 1.0,
    }
}

pub fn location_multiplier(location: Option<&str>) -> f64 {
    let Some(location) = location else { return 1.0 };
    let normalized = location.to_lowercase();
    LOCATION_MULTIPLIERS
        .iter()
        .find(|(town, _)| normalized.contains(town))
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

pub fn trend_multiplier(trend: PriceTrend) -> f64 {
    match trend {
        PriceTrend::Increasing => 1.05,
        PriceTrend::Decreasing => 0.95,
        PriceTrend::Stable => 1.0,
    }
}

/// The formula before jitter: base × quality × location × season × trend.
pub fn deterministic_price(
    base_price: f64,
    grade: Option<QualityGrade>,
    location: Option<&str>,
    month: u32,
    trend: PriceTrend,
) -> f64 {
    base_price
        * quality_multiplier(grade)
        * location_multiplier(location)
        * season_of(month).multiplier
        * trend_multiplier(trend)
}

/// Rounds to the nearest 10 KES, half away from zero.
pub fn round_to_nearest_ten(value: f64) -> Decimal {
    Decimal::from(((value / 10.0).round() as i64) * 10)
}

/// Percentage difference of the suggestion against the base price. A zero
/// base price reads as no difference so classification cannot divide by zero.
pub fn price_difference_percent(suggested: Decimal, base_price: Decimal) -> f64 {
    if base_price <= Decimal::ZERO {
        return 0.0;
    }
    let suggested = suggested.to_f64().unwrap_or(0.0);
    let base = base_price.to_f64().unwrap_or(0.0);
    ((suggested - base) / base) * 100.0
}

pub fn classify_label(diff_pct: f64) -> PriceLabel {
    if diff_pct <= -10.0 {
        PriceLabel::BestPrice
    } else if diff_pct <= -5.0 {
        PriceLabel::GoodPrice
    } else if diff_pct <= 5.0 {
        PriceLabel::FairPrice
    } else {
        PriceLabel::HighPrice
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct HeuristicPricer {
    clock: Arc<dyn Clock>,
}

impl HeuristicPricer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Produces a suggestion from the multiplier formula plus a jitter drawn
    /// from U[0.95, 1.05] and a confidence from U[0.70, 0.95]. Degenerate
    /// inputs (zero base price, missing location, unknown grade) take neutral
    /// values instead of failing.
    pub fn suggest<R: Rng>(
        &self,
        product: &Product,
        context: &MarketContext,
        rng: &mut R,
    ) -> PriceSuggestion {
        let now = self.clock.now();
        let month = now.month();
        let base = product.base_price.to_f64().unwrap_or(0.0).max(0.0);

        let raw = deterministic_price(
            base,
            product.quality_grade,
            product.location.as_deref(),
            month,
            context.price_trend,
        );
        let jittered = raw * rng.gen_range(0.95..=1.05);
        let suggested_price = round_to_nearest_ten(jittered);

        let diff_pct = price_difference_percent(suggested_price, product.base_price);
        let confidence_score = round2(rng.gen_range(0.70..=0.95));

        let mut factors = FactorMap::new();
        factors.insert("quality_grade".to_owned(), json!(product.grade_label()));
        factors.insert(
            "location".to_owned(),
            product.location.as_deref().map(|value| json!(value)).unwrap_or(json!(null)),
        );
        factors.insert("seasonality".to_owned(), json!(month));
        factors.insert("market_trend".to_owned(), json!(context.price_trend.as_str()));
        factors.insert("original_price".to_owned(), json!(base));
        factors.insert("price_difference_percent".to_owned(), json!(round2(diff_pct)));

        PriceSuggestion {
            product_id: product.id.clone(),
            suggested_price,
            confidence_score,
            price_label: classify_label(diff_pct),
            factors_considered: factors,
            explanation: Some("Heuristic price calculation applied".to_owned()),
            created_at: now,
        }
    }
}
