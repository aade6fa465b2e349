//! Lenient decoding of model output. Models wrap JSON in markdown fences and
//! return numbers as strings often enough that strict deserialization would
//! throw away usable answers; anything beyond these coercions is an error and
//! routes to the fallback.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use serde_json::Value;

use agrilink_core::domain::negotiation::NegotiationPlan;
use agrilink_core::domain::suggestion::{FactorMap, PriceLabel};

/// Fields recovered from a pricing completion, already coerced and defaulted.
#[derive(Clone, Debug)]
pub struct ParsedPriceResponse {
    pub suggested_price: Decimal,
    pub confidence_score: f64,
    pub price_label: PriceLabel,
    pub factors: FactorMap,
    pub explanation: String,
}

pub fn strip_code_fences(content: &str) -> &str {
    content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

pub fn parse_price_response(content: &str, base_price: Decimal) -> Result<ParsedPriceResponse> {
    let value: Value = serde_json::from_str(strip_code_fences(content))
        .map_err(|error| anyhow!("pricing response was not json: {error}"))?;
    let object = value.as_object().ok_or_else(|| anyhow!("pricing response was not an object"))?;

    let suggested_price =
        object.get("suggested_price").and_then(value_to_decimal).unwrap_or(base_price);
    let confidence_score = object.get("confidence_score").and_then(value_to_f64).unwrap_or(0.7);
    let price_label = object
        .get("price_label")
        .and_then(Value::as_str)
        .and_then(|label| PriceLabel::parse(label).ok())
        .unwrap_or(PriceLabel::FairPrice);

    let factors = match object.get("factors") {
        Some(Value::Object(map)) => map.iter().map(|(key, value)| (key.clone(), value.clone())).collect(),
        _ => FactorMap::new(),
    };

    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or("AI price recommendation")
        .to_owned();

    Ok(ParsedPriceResponse { suggested_price, confidence_score, price_label, factors, explanation })
}

pub fn parse_negotiation_response(content: &str) -> Result<NegotiationPlan> {
    let value: Value = serde_json::from_str(strip_code_fences(content))
        .map_err(|error| anyhow!("negotiation response was not json: {error}"))?;
    let object =
        value.as_object().ok_or_else(|| anyhow!("negotiation response was not an object"))?;

    let counter_offer = object
        .get("counter_offer")
        .and_then(value_to_decimal)
        .ok_or_else(|| anyhow!("negotiation response carried no usable counter_offer"))?;

    Ok(NegotiationPlan {
        counter_offer: counter_offer.round_dp(2),
        strategy_points: string_list(object.get("strategy_points")),
        value_propositions: string_list(object.get("value_propositions")),
        compromise_points: string_list(object.get("compromise_points")),
    })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items.iter().filter_map(Value::as_str).map(str::to_owned).collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => {
            number.as_f64().and_then(Decimal::from_f64_retain).map(|price| price.round_dp(2))
        }
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
