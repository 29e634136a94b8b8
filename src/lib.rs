//! Retrieval-Augmented Generation over a small fixed corpus, served as a
//! single-page web form backed by the Mistral API.

pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;

pub use crate::core::errors::ApiError;
pub use crate::rag::{Answer, QueryOrchestrator, INVALID_QUERY_MESSAGE};
pub use crate::state::AppState;
