//! JSON API for the price intelligence engine.
//!
//! Endpoints:
//! - `POST /api/products/{id}/suggestion`    — price a listing and persist the result
//! - `POST /api/negotiations`                — counter-offer plan for a buyer offer
//! - `GET  /api/insights`                    — market advisory plus latest trend snapshots
//! - `GET  /api/users/{id}/recommendations`  — catalog products picked for the user
//! - `GET  /api/users/{id}/advice`           — free-text shopping advice
//! - `POST /admin/trends/recompute`          — rebuild per-category trend snapshots

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use agrilink_advisor::PriceIntelligence;
use agrilink_core::domain::negotiation::{BuyerProfile, NegotiationPlan};
use agrilink_core::domain::product::{CategoryId, Product, ProductId};
use agrilink_core::domain::suggestion::PriceSuggestion;
use agrilink_core::domain::trend::MarketTrend;
use agrilink_core::domain::user::UserId;
use agrilink_core::recommend::{CatalogProvider, Recommender, DEFAULT_RECOMMENDATION_LIMIT};
use agrilink_core::trends::TrendSummariser;
use agrilink_core::ApplicationError;
use agrilink_db::repositories::{
    RepositoryError, SqlProductRepository, SqlSuggestionRepository, SqlTrendRepository,
};
use agrilink_db::{DbPool, SqlCatalog};

#[derive(Clone)]
pub struct ApiState {
    pub db_pool: DbPool,
    pub catalog: SqlCatalog,
    pub engine: Arc<PriceIntelligence>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/products/{id}/suggestion", post(suggest_price))
        .route("/api/negotiations", post(negotiate))
        .route("/api/insights", get(market_insights))
        .route("/api/users/{id}/recommendations", get(recommendations))
        .route("/api/users/{id}/advice", get(personalized_advice))
        .route("/admin/trends/recompute", post(recompute_trends))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        Self::Application(error.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Application(error) => {
                error!(event_name = "api.request.failed", error = %error, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

pub async fn suggest_price(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<PriceSuggestion>, ApiError> {
    let product = load_product(&state.db_pool, &id).await?;
    let suggestion = state.engine.suggest_price(&product).await;

    // Pricing never fails; a persistence error downgrades to a warning so the
    // caller still gets the suggestion.
    let history = SqlSuggestionRepository::new(state.db_pool.clone());
    if let Err(persist_error) = history.record(&suggestion).await {
        warn!(
            event_name = "api.suggestion.persist_failed",
            product_id = %product.id.0,
            error = %persist_error,
            "suggestion returned but not recorded"
        );
    }

    Ok(Json(suggestion))
}

// ---------------------------------------------------------------------------
// Negotiation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NegotiationRequest {
    pub product_id: String,
    pub buyer_offer: Decimal,
    #[serde(default)]
    pub buyer_type: Option<String>,
    #[serde(default)]
    pub buyer_location: Option<String>,
}

pub async fn negotiate(
    State(state): State<ApiState>,
    Json(request): Json<NegotiationRequest>,
) -> Result<Json<NegotiationPlan>, ApiError> {
    let product = load_product(&state.db_pool, &request.product_id).await?;
    let buyer = BuyerProfile {
        buyer_type: request.buyer_type.unwrap_or_else(|| "buyer".to_owned()),
        location: request.buyer_location,
    };

    let plan = state.engine.negotiate(&product, request.buyer_offer, &buyer).await;
    Ok(Json(plan))
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct InsightsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: String,
    pub trends: Vec<MarketTrend>,
}

pub async fn market_insights(
    State(state): State<ApiState>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<InsightsResponse>, ApiError> {
    let category = query.category.map(CategoryId);
    let insights = state.engine.market_insights(category.as_ref()).await;
    let trends = SqlTrendRepository::new(state.db_pool.clone()).latest_per_category().await?;

    Ok(Json(InsightsResponse { insights, trends }))
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub products: Vec<Product>,
}

pub async fn recommendations(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    let recommender = Recommender::new(state.catalog.clone());
    let products = recommender.recommend(&UserId(id), limit).await?;

    Ok(Json(RecommendationResponse { products }))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdviceQuery {
    pub buyer_type: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub advice: String,
}

pub async fn personalized_advice(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<AdviceQuery>,
) -> Result<Json<AdviceResponse>, ApiError> {
    let user = UserId(id);
    let searches = state.catalog.recent_searches(&user, 5).await?;
    let wishlist: Vec<String> = state
        .catalog
        .wishlist_products(&user)
        .await?
        .into_iter()
        .map(|product| product.name)
        .collect();

    let buyer = BuyerProfile {
        buyer_type: query.buyer_type.unwrap_or_else(|| "buyer".to_owned()),
        location: query.location,
    };

    let advice = state.engine.personalized_recommendations(&buyer, &searches, &wishlist).await;
    Ok(Json(AdviceResponse { advice }))
}

// ---------------------------------------------------------------------------
// Trend recompute
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub categories_written: usize,
}

pub async fn recompute_trends(
    State(state): State<ApiState>,
) -> Result<Json<RecomputeResponse>, ApiError> {
    let summariser = TrendSummariser::new(
        state.catalog.clone(),
        SqlTrendRepository::new(state.db_pool.clone()),
    );
    let categories_written = summariser.recompute_trends().await?;

    info!(
        event_name = "api.trends.recomputed",
        categories_written, "trend recompute requested over the api"
    );
    Ok(Json(RecomputeResponse { categories_written }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_product(pool: &DbPool, id: &str) -> Result<Product, ApiError> {
    let repo = SqlProductRepository::new(pool.clone());
    repo.find_by_id(&ProductId(id.to_owned()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))
}
