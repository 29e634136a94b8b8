use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{form, health, query};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// - `GET /` and `POST /` serve the question form
/// - `POST /api/query` answers JSON requests
/// - `GET /health` reports liveness
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/", get(form::index).post(form::submit))
        .route("/health", get(health::health))
        .route("/api/query", post(query::query))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let configured = &state.settings.server.cors_allowed_origins;
    let origins = if configured.is_empty() {
        default_local_origins(state.settings.server.port)
    } else {
        configured.clone()
    };

    let allow_origin = AllowOrigin::list(
        origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect::<Vec<_>>(),
    );

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn default_local_origins(port: u16) -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        format!("http://localhost:{}", port),
        "http://127.0.0.1".to_string(),
        format!("http://127.0.0.1:{}", port),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    use crate::core::config::Settings;
    use crate::core::errors::ApiError;
    use crate::llm::{EmbeddingProvider, LanguageModel};
    use crate::rag::DocumentStore;

    /// Scores passages by how many of a few marker words they share with the text.
    struct KeywordEmbedder {
        calls: Arc<AtomicUsize>,
    }

    const MARKERS: [&str; 4] = ["fortune", "enterprise", "mozambique", "pride"];

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    let mut v: Vec<f32> = MARKERS
                        .iter()
                        .map(|m| if lower.contains(m) { 1.0 } else { 0.0 })
                        .collect();
                    v.push(0.1);
                    v
                })
                .collect())
        }
    }

    struct FirstLineModel;

    #[async_trait]
    impl LanguageModel for FirstLineModel {
        fn name(&self) -> &str {
            "first-line"
        }

        async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
            let first = prompt
                .split("<context>\n")
                .nth(1)
                .and_then(|rest| rest.lines().next())
                .unwrap_or_default();
            Ok(format!(" {} ", first))
        }
    }

    struct RejectingModel;

    #[async_trait]
    impl LanguageModel for RejectingModel {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ApiError> {
            Err(ApiError::Authentication("bad key".to_string()))
        }
    }

    fn app_with(model: Arc<dyn LanguageModel>, calls: Arc<AtomicUsize>) -> Router {
        let mut settings = Settings::default();
        settings.mistral.api_key = "unused".to_string();
        let state = AppState::with_components(
            settings,
            DocumentStore::builtin(),
            Arc::new(KeywordEmbedder { calls }),
            model,
        );
        router(state)
    }

    fn app() -> (Router, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (app_with(Arc::new(FirstLineModel), calls.clone()), calls)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn form_page_renders() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("<form method=\"post\""));
    }

    #[tokio::test]
    async fn form_submission_shows_answer() {
        let (app, _) = app();
        let request = Request::post("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("query=What+is+Pride+and+Prejudice+about%3F"))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains("a single man in possession"));
        assert!(html.contains("What is Pride and Prejudice about?"));
    }

    #[tokio::test]
    async fn blank_form_submission_shows_fixed_message_without_calls() {
        let (app, calls) = app();
        let request = Request::post("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("query=+++"))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        let html = body_string(response).await;

        assert!(html.contains("Please enter a valid query."));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn json_query_returns_answer_and_context() {
        let (app, _) = app();
        let request = Request::post("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "query": "Tell me about Mozambique" }).to_string(),
            ))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let payload: Value = serde_json::from_str(&body_string(response).await).expect("json");
        assert!(payload["answer"]
            .as_str()
            .expect("answer")
            .contains("Maiva community"));
        assert_eq!(payload["context"][0]["title"], "Maiva Community");
        assert_eq!(payload["context"].as_array().expect("context").len(), 3);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (app, _) = app();
        let request = Request::post("/api/query")
            .header("content-type", "application/json")
            .body(Body::from("{\"question\": 1}"))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_authentication_failure_propagates() {
        let app = app_with(Arc::new(RejectingModel), Arc::new(AtomicUsize::new(0)));
        let request = Request::post("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "query": "anything" }).to_string()))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_reports_corpus_size() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        let payload: Value = serde_json::from_str(&body_string(response).await).expect("json");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["corpus_size"], 3);
    }
}
