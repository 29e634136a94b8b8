use serde_json::{json, Value};

pub const DEFAULT_MISTRAL_BASE_URL: &str = "https://api.mistral.ai";
pub const DEFAULT_EMBEDDING_MODEL: &str = "mistral-embed";
pub const DEFAULT_CHAT_MODEL: &str = "mistral-large-latest";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7860;

/// Baseline configuration tree; files and environment are merged over it.
pub fn default_config() -> Value {
    json!({
        "server": {
            "host": DEFAULT_HOST,
            "port": DEFAULT_PORT,
            "cors_allowed_origins": []
        },
        "mistral": {
            "base_url": DEFAULT_MISTRAL_BASE_URL,
            "embedding_model": DEFAULT_EMBEDDING_MODEL,
            "chat_model": DEFAULT_CHAT_MODEL,
            "temperature": DEFAULT_TEMPERATURE
        },
        "llm": {
            "provider": "mistral"
        },
        "retrieval": {
            "top_k": DEFAULT_TOP_K,
            "reuse_index": false
        },
        "corpus": {}
    })
}
