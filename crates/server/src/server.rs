//! Server initialization and routing
//!
//! Startup order:
//! 1. JSON logging
//! 2. PDF text for the QA context (per-file failures are logged, not fatal)
//! 3. Chat worker with both models loaded (failure is fatal)
//! 4. Router, bind, serve until Ctrl+C or SIGTERM

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{health, index_page, not_found, sessions};
use crate::state::ServerState;
use crate::worker::ChatWorker;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use extract::{load_raw_text, PdfPageSource};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health::health_check))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/{session_id}", get(sessions::get_session))
        .route(
            "/api/sessions/{session_id}/messages",
            post(sessions::post_message).delete(sessions::clear_messages),
        )
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Concatenated text of `documents`. Unreadable files are logged and skipped.
pub fn load_context(documents: &[PathBuf]) -> String {
    let raw = load_raw_text(documents, &PdfPageSource);
    for failure in &raw.failures {
        tracing::error!(
            path = %failure.path.display(),
            error = %failure.error,
            "pdf_load_failure"
        );
    }
    tracing::info!(
        documents = documents.len(),
        failed = raw.failures.len(),
        context_chars = raw.text.len(),
        "qa_context_loaded"
    );
    raw.text
}

/// Start the pdfchat HTTP server
///
/// Blocks until the server is shut down via SIGTERM or Ctrl+C.
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    config.validate()?;
    let addr: SocketAddr = config.socket_addr()?;
    health::mark_started();

    let documents = config.documents.clone();
    let chat_cfg = config.chat.clone();
    let worker = tokio::task::spawn_blocking(move || {
        ChatWorker::spawn(move || chat::onnx_router(load_context(&documents), chat_cfg))
    })
    .await??;

    let state = Arc::new(ServerState::new(config.clone(), worker));
    let _sweeper = state.spawn_session_sweeper();
    let app = build_router(state);

    tracing::info!(
        addr = %addr,
        timeout_secs = config.timeout_secs,
        cors = config.enable_cors,
        "server_starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server_shutdown_complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received_ctrl_c"),
        _ = terminate => tracing::info!("received_sigterm"),
    }
}
