//! Axum HTTP front end for the chat pipeline.
//!
//! ## URL layout
//!
//! ```text
//! POST /chat    — {"question", "patientId"?} → {"answer", "data"}
//! GET  /health  — liveness plus registered API names
//! ```
//!
//! [`serve`] is shared with the `mock-backend` binary: bind, run until the
//! [`CancellationToken`] fires, then drain in-flight requests.

mod api;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;
use crate::orchestrator::Orchestrator;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone — the orchestrator is reference-counted.
#[derive(Clone)]
pub(crate) struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/chat", post(api::chat))
        .route("/health", get(api::health))
        .with_state(AppState { orchestrator })
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `bind_addr` and serve `router` until `shutdown` is cancelled.
pub async fn serve(
    name: &str,
    router: Router,
    bind_addr: &str,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("{name} bind failed on {bind_addr}: {e}")))?;

    info!(%name, %bind_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("{name} server error: {e}")))?;

    info!(%name, "shut down");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C.
pub fn spawn_ctrl_c(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — shutting down");
        }
        shutdown.cancel();
    });
}
