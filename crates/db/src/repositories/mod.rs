use thiserror::Error;

use agrilink_core::ApplicationError;

pub mod activity;
pub mod product;
pub mod suggestion;
pub mod trend;

pub use activity::SqlActivityRepository;
pub use product::SqlProductRepository;
pub use suggestion::SqlSuggestionRepository;
pub use trend::SqlTrendRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}
