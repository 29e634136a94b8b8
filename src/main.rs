use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use gutenberg_rag::core::config::AppPaths;
use gutenberg_rag::core::logging;
use gutenberg_rag::server;
use gutenberg_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let state = AppState::initialize(paths).context("Startup aborted")?;

    let bind_addr = state.settings.server.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on http://{}", addr);

    let app: Router = server::router::router(state.clone());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
