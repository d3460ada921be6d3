//! pdfchat server - web chat over PDF documents
//!
//! Serves a single-page chat UI plus the JSON API it talks to. Each browser
//! tab opens its own session; the assistant replies through the chat router
//! (health tip, extractive QA over the PDF text, or GPT-2 generation).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - chat page
//! - `GET /health` - liveness
//! - `POST /api/sessions` - open a session (returns id + greeting)
//! - `GET /api/sessions/{id}` - message log
//! - `POST /api/sessions/{id}/messages` - send `{"content": "..."}`, get the reply
//! - `DELETE /api/sessions/{id}/messages` - clear chat history
//!
//! # Concurrency
//!
//! Models live on one worker thread ([`ChatWorker`]) and answer one message at
//! a time across all sessions. Sessions themselves are plain values in
//! [`ServerState`].

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod worker;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, load_context, start_server};
pub use state::ServerState;
pub use worker::{ChatWorker, Turn};
