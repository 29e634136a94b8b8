//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `DocumentStore`: the passage collection answers are grounded in
//! - `VectorIndex`: exact cosine top-k search over passage embeddings
//! - `prompt::assemble`: the answer-only-from-context prompt template
//! - `QueryOrchestrator`: the validate → retrieve → generate pipeline

pub mod index;
pub mod orchestrator;
pub mod prompt;
pub mod store;

pub use index::{ScoredPassage, VectorIndex};
pub use orchestrator::{Answer, OrchestratorConfig, QueryOrchestrator, INVALID_QUERY_MESSAGE};
pub use store::{DocumentStore, Passage};
