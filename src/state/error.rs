use thiserror::Error;

use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ApiError),

    #[error("Failed to load document corpus: {0}")]
    Corpus(#[source] ApiError),

    #[error("Failed to initialize LLM clients: {0}")]
    Llm(#[source] ApiError),
}
