use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::llm::{build_language_model, EmbeddingProvider, LanguageModel, MistralClient};
use crate::rag::{DocumentStore, OrchestratorConfig, QueryOrchestrator};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Everything here is immutable after startup; the orchestrator holds its
/// own clients and (optionally) a once-built passage index.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub orchestrator: QueryOrchestrator,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Loads configuration and wires the pipeline.
    ///
    /// A missing credential aborts here, before any listener is bound.
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        tracing::info!(
            config = %config.config_path().display(),
            data_dir = %paths.user_data_dir.display(),
            "Loading configuration"
        );
        let settings = config.load_settings().map_err(InitializationError::Config)?;
        Self::from_settings(paths, settings)
    }

    pub fn from_settings(
        paths: Arc<AppPaths>,
        settings: Settings,
    ) -> Result<Arc<Self>, InitializationError> {
        let store = load_store(&paths, &settings).map_err(InitializationError::Corpus)?;

        let mistral = MistralClient::new(&settings.mistral).map_err(InitializationError::Llm)?;
        let model =
            build_language_model(&settings, &mistral).map_err(InitializationError::Llm)?;
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(mistral);

        tracing::info!(
            passages = store.len(),
            generator = model.name(),
            top_k = settings.retrieval.top_k,
            "Pipeline ready"
        );

        Ok(Self::with_components(settings, store, embedder, model))
    }

    /// Assembles state around caller-provided components.
    pub fn with_components(
        settings: Settings,
        store: DocumentStore,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Arc<Self> {
        let orchestrator = QueryOrchestrator::new(
            store,
            embedder,
            model,
            OrchestratorConfig {
                top_k: settings.retrieval.top_k,
                reuse_index: settings.retrieval.reuse_index,
            },
        );

        Arc::new(AppState {
            settings: Arc::new(settings),
            orchestrator,
            started_at: Utc::now(),
        })
    }
}

fn load_store(
    paths: &AppPaths,
    settings: &Settings,
) -> Result<DocumentStore, crate::core::errors::ApiError> {
    let Some(raw) = settings.corpus.path.as_deref() else {
        return Ok(DocumentStore::builtin());
    };

    let candidate = PathBuf::from(raw);
    let path = if candidate.is_absolute() {
        candidate
    } else {
        paths.project_root.join(candidate)
    };
    tracing::info!("Loading corpus from {}", path.display());
    DocumentStore::from_yaml_file(&path)
}
