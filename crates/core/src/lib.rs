pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod recommend;
pub mod trends;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::negotiation::{BuyerProfile, NegotiationPlan};
pub use domain::product::{Category, CategoryId, Product, ProductId, QualityGrade};
pub use domain::suggestion::{FactorMap, PriceLabel, PriceSuggestion};
pub use domain::trend::{DemandLevel, MarketTrend, NewMarketTrend, PriceTrend};
pub use domain::user::UserId;
pub use errors::{ApplicationError, DomainError};
pub use pricing::context::{MarketContext, TrendProvider};
pub use pricing::heuristic::HeuristicPricer;
pub use pricing::season::{season_of, Season};
pub use recommend::{CatalogProvider, Recommender};
pub use trends::{InventoryProvider, TrendStore, TrendSummariser};
