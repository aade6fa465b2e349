pub mod catalog;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use catalog::SqlCatalog;
pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{DemoSeedDataset, SeedResult, VerificationResult};
