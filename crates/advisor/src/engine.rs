//! The price intelligence engine. Every operation either succeeds through the
//! model or degrades to a deterministic answer; none of them return an error
//! for an LLM failure.

use std::sync::{Arc, Mutex};

use chrono::Datelike;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, warn};

use agrilink_core::domain::negotiation::{BuyerProfile, NegotiationPlan};
use agrilink_core::domain::product::{CategoryId, Product};
use agrilink_core::domain::suggestion::PriceSuggestion;
use agrilink_core::pricing::context::{MarketContext, TrendProvider};
use agrilink_core::pricing::heuristic::HeuristicPricer;
use agrilink_core::pricing::season::season_of;
use agrilink_core::Clock;

use crate::llm::{ChatRequest, LlmClient};
use crate::parse::{parse_negotiation_response, parse_price_response};
use crate::prompts;

pub const INSIGHTS_UNAVAILABLE: &str =
    "Market insights currently unavailable. Please check back later.";
pub const RECOMMENDATIONS_UNAVAILABLE: &str =
    "Personalized recommendations currently unavailable.";

pub struct PriceIntelligence {
    llm: Option<Arc<dyn LlmClient>>,
    trends: Arc<dyn TrendProvider>,
    heuristic: HeuristicPricer,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl PriceIntelligence {
    pub fn new(trends: Arc<dyn TrendProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            llm: None,
            trends,
            heuristic: HeuristicPricer::new(clock.clone()),
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Seeds the jitter and default-context draws; tests use this to make the
    /// heuristic path deterministic.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Latest trend for the category, or a synthesized context when none
    /// exists. A persistence failure also synthesizes: pricing must not fail
    /// because the trend table is unreachable.
    pub async fn market_context(&self, category: &CategoryId) -> MarketContext {
        match self.trends.latest_for_category(category).await {
            Ok(Some(trend)) => MarketContext::from_trend(&trend),
            Ok(None) => self.synthesize_context(),
            Err(error) => {
                warn!(
                    event_name = "engine.context.trend_read_failed",
                    category = %category.0,
                    error = %error,
                    "falling back to synthesized market context"
                );
                self.synthesize_context()
            }
        }
    }

    fn synthesize_context(&self) -> MarketContext {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        MarketContext::synthesized(&mut *rng)
    }

    /// Primary pricing entry. Tries the model, falls back to the heuristic on
    /// any error, and never returns one itself.
    pub async fn suggest_price(&self, product: &Product) -> PriceSuggestion {
        let context = self.market_context(&product.category_id).await;

        if let Some(llm) = &self.llm {
            match self.suggest_with_llm(llm.as_ref(), product, &context).await {
                Ok(suggestion) => return suggestion,
                Err(error) => {
                    warn!(
                        event_name = "engine.pricing.llm_fallback",
                        product_id = %product.id.0,
                        error = %error,
                        "llm pricing failed, using heuristic"
                    );
                }
            }
        }

        self.heuristic_fallback(product, &context)
    }

    async fn suggest_with_llm(
        &self,
        llm: &dyn LlmClient,
        product: &Product,
        context: &MarketContext,
    ) -> anyhow::Result<PriceSuggestion> {
        let now = self.clock.now();
        let season = season_of(now.month());
        let request = ChatRequest {
            system: prompts::PRICING_SYSTEM.to_owned(),
            user: prompts::pricing_user(product, context, season),
            temperature: 0.3,
            max_tokens: 500,
        };

        let content = llm.complete(&request).await?;
        let parsed = parse_price_response(&content, product.base_price)?;

        debug!(
            event_name = "engine.pricing.llm_ok",
            product_id = %product.id.0,
            label = parsed.price_label.as_str(),
            "llm pricing succeeded"
        );

        Ok(PriceSuggestion {
            product_id: product.id.clone(),
            suggested_price: parsed.suggested_price,
            confidence_score: parsed.confidence_score,
            price_label: parsed.price_label,
            factors_considered: parsed.factors,
            explanation: Some(parsed.explanation),
            created_at: now,
        })
    }

    fn heuristic_fallback(&self, product: &Product, context: &MarketContext) -> PriceSuggestion {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut suggestion = self.heuristic.suggest(product, context, &mut *rng);
        suggestion.factors_considered.insert("fallback_calculation".to_owned(), json!(true));
        suggestion
    }

    /// Counter-offer plan for a buyer offer, LLM-first with the deterministic
    /// fallback of `NegotiationPlan::fallback`.
    pub async fn negotiate(
        &self,
        product: &Product,
        buyer_offer: Decimal,
        buyer: &BuyerProfile,
    ) -> NegotiationPlan {
        if let Some(llm) = &self.llm {
            let request = ChatRequest {
                system: prompts::NEGOTIATION_SYSTEM.to_owned(),
                user: prompts::negotiation_user(product, buyer, buyer_offer),
                temperature: 0.4,
                max_tokens: 500,
            };

            match llm.complete(&request).await.and_then(|content| {
                parse_negotiation_response(&content)
            }) {
                Ok(plan) => return plan,
                Err(error) => {
                    warn!(
                        event_name = "engine.negotiation.llm_fallback",
                        product_id = %product.id.0,
                        error = %error,
                        "llm negotiation failed, using fixed strategy"
                    );
                }
            }
        }

        NegotiationPlan::fallback(product, buyer_offer)
    }

    /// Free-text market advisory. Untrusted display content; on any failure
    /// the fixed unavailable string is returned instead.
    pub async fn market_insights(&self, category: Option<&CategoryId>) -> String {
        let Some(llm) = &self.llm else { return INSIGHTS_UNAVAILABLE.to_owned() };

        let context = match category {
            Some(category) => self.market_context(category).await,
            None => self.synthesize_context(),
        };
        let market_data = serde_json::to_string_pretty(&context)
            .unwrap_or_else(|_| "{}".to_owned());

        let request = ChatRequest {
            system: prompts::INSIGHTS_SYSTEM.to_owned(),
            user: prompts::insights_user(&market_data),
            temperature: 0.3,
            max_tokens: 800,
        };

        match llm.complete(&request).await {
            Ok(content) => content,
            Err(error) => {
                warn!(
                    event_name = "engine.insights.llm_fallback",
                    error = %error,
                    "llm market insights failed"
                );
                INSIGHTS_UNAVAILABLE.to_owned()
            }
        }
    }

    /// Free-text shopping advice from the user's activity. Same contract as
    /// `market_insights`.
    pub async fn personalized_recommendations(
        &self,
        buyer: &BuyerProfile,
        recent_searches: &[String],
        wishlist_items: &[String],
    ) -> String {
        let Some(llm) = &self.llm else { return RECOMMENDATIONS_UNAVAILABLE.to_owned() };

        let request = ChatRequest {
            system: prompts::RECOMMENDATIONS_SYSTEM.to_owned(),
            user: prompts::recommendations_user(buyer, recent_searches, wishlist_items),
            temperature: 0.4,
            max_tokens: 600,
        };

        match llm.complete(&request).await {
            Ok(content) => content,
            Err(error) => {
                warn!(
                    event_name = "engine.recommendations.llm_fallback",
                    error = %error,
                    "llm personalized recommendations failed"
                );
                RECOMMENDATIONS_UNAVAILABLE.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use agrilink_core::domain::negotiation::BuyerProfile;
    use agrilink_core::domain::product::{CategoryId, Product, ProductId, QualityGrade};
    use agrilink_core::domain::suggestion::PriceLabel;
    use agrilink_core::domain::trend::{DemandLevel, MarketTrend, PriceTrend};
    use agrilink_core::pricing::context::TrendProvider;
    use agrilink_core::{ApplicationError, FixedClock};

    use super::{PriceIntelligence, INSIGHTS_UNAVAILABLE};
    use crate::llm::{ChatRequest, LlmClient};

    struct CannedLlm {
        response: Result<String, String>,
    }

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _request: &ChatRequest) -> Result<String> {
            match &self.response {
                Ok(content) => Ok(content.clone()),
                Err(reason) => Err(anyhow!("{reason}")),
            }
        }
    }

    struct StableTrends;

    #[async_trait]
    impl TrendProvider for StableTrends {
        async fn latest_for_category(
            &self,
            category: &CategoryId,
        ) -> Result<Option<MarketTrend>, ApplicationError> {
            Ok(Some(MarketTrend {
                id: "T-1".to_owned(),
                category_id: category.clone(),
                average_price: Decimal::from(100),
                price_trend: PriceTrend::Stable,
                demand_level: DemandLevel::Medium,
                recommendation: "steady".to_owned(),
                created_at: Utc.with_ymd_and_hms(2026, 1, 1, 6, 0, 0).unwrap(),
            }))
        }
    }

    fn product() -> Product {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        Product {
            id: ProductId("P-1".to_owned()),
            farmer_id: "F-1".to_owned(),
            category_id: CategoryId("cat-veg".to_owned()),
            category_name: "Vegetables".to_owned(),
            name: "Tomatoes".to_owned(),
            description: String::new(),
            base_price: Decimal::from(100),
            quantity: Decimal::from(50),
            unit: "kg".to_owned(),
            quality_grade: Some(QualityGrade::Grade1),
            location: Some("Nairobi farm".to_owned()),
            harvest_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn engine() -> PriceIntelligence {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap());
        PriceIntelligence::new(Arc::new(StableTrends), Arc::new(clock)).with_rng_seed(7)
    }

    #[tokio::test]
    async fn llm_path_parses_a_fenced_json_response() {
        let llm = CannedLlm {
            response: Ok("```json\n{\"suggested_price\": 130, \"confidence_score\": 0.88, \
                          \"price_label\": \"good_price\", \"factors\": {\"demand\": \"high\"}, \
                          \"explanation\": \"seasonal demand\"}\n```"
                .to_owned()),
        };
        let engine = engine().with_llm(Arc::new(llm));

        let suggestion = engine.suggest_price(&product()).await;
        assert_eq!(suggestion.suggested_price, Decimal::from(130));
        assert_eq!(suggestion.price_label, PriceLabel::GoodPrice);
        assert_eq!(suggestion.explanation.as_deref(), Some("seasonal demand"));
        assert!(!suggestion.factors_considered.contains_key("fallback_calculation"));
    }

    #[tokio::test]
    async fn llm_failure_falls_back_and_stamps_the_factor_map() {
        let llm = CannedLlm { response: Err("connection refused".to_owned()) };
        let engine = engine().with_llm(Arc::new(llm));

        let suggestion = engine.suggest_price(&product()).await;
        assert_eq!(suggestion.factors_considered["fallback_calculation"], serde_json::json!(true));
        assert!((0.70..=0.95).contains(&suggestion.confidence_score));
    }

    #[tokio::test]
    async fn unparseable_llm_output_falls_back_the_same_way() {
        let llm = CannedLlm { response: Ok("I think 130 KES is fair.".to_owned()) };
        let engine = engine().with_llm(Arc::new(llm));

        let suggestion = engine.suggest_price(&product()).await;
        assert_eq!(suggestion.factors_considered["fallback_calculation"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn both_paths_serialize_to_the_same_key_set() {
        let llm_ok = CannedLlm {
            response: Ok(r#"{"suggested_price": 130, "confidence_score": 0.88,
                "price_label": "good_price", "factors": {}, "explanation": "ok"}"#
                .to_owned()),
        };
        let llm_err = CannedLlm { response: Err("boom".to_owned()) };

        let from_llm = engine().with_llm(Arc::new(llm_ok)).suggest_price(&product()).await;
        let from_fallback = engine().with_llm(Arc::new(llm_err)).suggest_price(&product()).await;

        let keys = |suggestion: &agrilink_core::PriceSuggestion| -> BTreeSet<String> {
            serde_json::to_value(suggestion)
                .unwrap()
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect()
        };
        assert_eq!(keys(&from_llm), keys(&from_fallback));
    }

    #[tokio::test]
    async fn engine_without_an_llm_still_prices() {
        let suggestion = engine().suggest_price(&product()).await;
        assert!(suggestion.suggested_price > Decimal::ZERO);
        assert_eq!(suggestion.factors_considered["fallback_calculation"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn negotiation_falls_back_to_the_deterministic_plan() {
        let llm = CannedLlm { response: Err("timeout".to_owned()) };
        let engine = engine().with_llm(Arc::new(llm));
        let buyer = BuyerProfile { buyer_type: "retailer".to_owned(), location: None };

        let near = engine.negotiate(&product(), Decimal::from(95), &buyer).await;
        assert_eq!(near.counter_offer, Decimal::new(9500, 2));

        let lowball = engine.negotiate(&product(), Decimal::from(50), &buyer).await;
        assert_eq!(lowball.counter_offer, Decimal::new(8500, 2));
    }

    #[tokio::test]
    async fn negotiation_uses_the_llm_plan_when_parseable() {
        let llm = CannedLlm {
            response: Ok(r#"{"counter_offer": 92, "strategy_points": ["hold firm"],
                "value_propositions": ["fresh"], "compromise_points": ["delivery"]}"#
                .to_owned()),
        };
        let engine = engine().with_llm(Arc::new(llm));
        let buyer = BuyerProfile::default();

        let plan = engine.negotiate(&product(), Decimal::from(80), &buyer).await;
        assert_eq!(plan.counter_offer, Decimal::from(92));
        assert_eq!(plan.strategy_points, vec!["hold firm".to_owned()]);
    }

    #[tokio::test]
    async fn insights_return_the_fixed_string_without_an_llm_or_on_error() {
        let category = CategoryId("cat-veg".to_owned());
        assert_eq!(engine().market_insights(Some(&category)).await, INSIGHTS_UNAVAILABLE);

        let llm = CannedLlm { response: Err("401 unauthorized".to_owned()) };
        let failing = engine().with_llm(Arc::new(llm));
        assert_eq!(failing.market_insights(Some(&category)).await, INSIGHTS_UNAVAILABLE);
    }

    #[tokio::test]
    async fn insights_pass_model_text_through_untouched() {
        let llm = CannedLlm { response: Ok("Prices firming across Nairobi markets.".to_owned()) };
        let engine = engine().with_llm(Arc::new(llm));
        let text = engine.market_insights(None).await;
        assert_eq!(text, "Prices firming across Nairobi markets.");
    }

    #[tokio::test]
    async fn personalized_advice_has_the_same_fallback_contract() {
        let buyer = BuyerProfile { buyer_type: "buyer".to_owned(), location: None };
        let text = engine()
            .personalized_recommendations(&buyer, &["sukuma".to_owned()], &[])
            .await;
        assert_eq!(text, super::RECOMMENDATIONS_UNAVAILABLE);
    }
}
