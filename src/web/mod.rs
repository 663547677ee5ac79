//! Browser front end: a single server-rendered page plus form endpoints.
//!
//! ## Routes
//!
//! | Method | Path           | Action                                  |
//! |--------|----------------|-----------------------------------------|
//! | GET    | `/`            | render transcript, selector and forms   |
//! | POST   | `/message`     | summarize pasted text                   |
//! | POST   | `/upload`      | summarize an uploaded PDF (multipart)   |
//! | POST   | `/model`       | change the selected model               |
//! | POST   | `/reset`       | clear the transcript ("New chat")       |
//! | POST   | `/session/end` | destroy the session                     |
//!
//! Every POST answers with `303 See Other` back to `/`, so a browser refresh
//! never resubmits an action. The session id travels in the
//! [`SESSION_COOKIE`] cookie.

mod handlers;
pub mod page;

use crate::config::SummarizerConfig;
use crate::error::SummarizerError;
use crate::pipeline::registry::ModelRegistry;
use crate::session::SessionStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "summarizer_session";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub sessions: SessionStore,
    pub config: Arc<SummarizerConfig>,
}

impl AppState {
    pub fn new(registry: Arc<ModelRegistry>, config: SummarizerConfig) -> Self {
        Self {
            registry,
            sessions: SessionStore::new(config.session_idle_timeout()),
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    // Multipart framing adds a little on top of the file itself.
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/", get(handlers::index))
        .route("/message", post(handlers::message))
        .route("/upload", post(handlers::upload))
        .route("/model", post(handlers::select_model))
        .route("/reset", post(handlers::reset))
        .route("/session/end", post(handlers::end_session))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), SummarizerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| SummarizerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(SummarizerError::Serve)
}
