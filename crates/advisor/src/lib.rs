//! LLM-backed pricing and negotiation advice with a deterministic fallback.
//!
//! The model is advisory only: every operation has a heuristic or fixed-text
//! fallback, and no external failure ever reaches a caller. The engine in
//! `engine` owns that contract; `llm` holds the Groq client, `parse` the
//! lenient response decoding, and `prompts` the prompt text.

pub mod engine;
pub mod llm;
pub mod parse;
pub mod prompts;

pub use engine::{PriceIntelligence, INSIGHTS_UNAVAILABLE, RECOMMENDATIONS_UNAVAILABLE};
pub use llm::{ChatRequest, GroqClient, LlmClient};
