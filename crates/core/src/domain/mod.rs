pub mod negotiation;
pub mod product;
pub mod suggestion;
pub mod trend;
pub mod user;
