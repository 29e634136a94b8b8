//! The fixed passage collection the pipeline retrieves from.
//!
//! The built-in corpus is three short literary and community passages. Any
//! other collection can be injected with [`DocumentStore::new`] or loaded
//! from a YAML list with [`DocumentStore::from_yaml_file`].

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// One unit of retrievable text with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// The text that is embedded and placed into the prompt.
    pub text: String,
    /// Human-readable title.
    pub title: String,
    /// Where the text comes from.
    pub source_url: String,
}

impl Passage {
    pub fn new(
        text: impl Into<String>,
        title: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            title: title.into(),
            source_url: source_url.into(),
        }
    }
}

/// Immutable, cheaply clonable passage collection.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    passages: Arc<[Passage]>,
}

impl DocumentStore {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            passages: passages.into(),
        }
    }

    /// The corpus shipped with the service.
    pub fn builtin() -> Self {
        Self::new(vec![
            Passage::new(
                "It is a truth universally acknowledged, that a single man in possession \
                 of a good fortune, must be in want of a wife...",
                "Pride and Prejudice",
                "https://www.gutenberg.org/ebooks/1342",
            ),
            Passage::new(
                "You will rejoice to hear that no disaster has accompanied the commencement \
                 of an enterprise, which you have regarded with such evil forebodings...",
                "Frankenstein",
                "https://www.gutenberg.org/ebooks/84",
            ),
            Passage::new(
                "This is Maiva community located in northern Mozambique. The community is \
                 known for its rich culture and traditions...\
                 There is a famous family called the Muhimuas, the leader was a young Paulino...",
                "Maiva Community",
                "https://www.maivacommunity.com/",
            ),
        ])
    }

    /// Loads a YAML sequence of `{ text, title, source_url }` entries.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ApiError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            ApiError::Configuration(format!("Failed to read corpus {}: {}", path.display(), err))
        })?;
        let passages: Vec<Passage> = serde_yaml::from_str(&contents).map_err(|err| {
            ApiError::Configuration(format!("Failed to parse corpus {}: {}", path.display(), err))
        })?;

        if passages.is_empty() {
            return Err(ApiError::Configuration(format!(
                "Corpus {} contains no passages",
                path.display()
            )));
        }
        if let Some(blank) = passages.iter().position(|p| p.text.trim().is_empty()) {
            return Err(ApiError::Configuration(format!(
                "Corpus {} entry {} has empty text",
                path.display(),
                blank
            )));
        }

        Ok(Self::new(passages))
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn texts(&self) -> Vec<String> {
        self.passages.iter().map(|p| p.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn contains(&self, passage: &Passage) -> bool {
        self.passages.iter().any(|p| p == passage)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::builtin()
    }
}
