//! HTTP surface of the explorer's request history.
//!
//! `GET /history` lists stored exchanges newest first; `POST /history`
//! appends one. Storage is an `explorer_core::MemoryHistory` shared by every
//! handler, so ordering, bounding and validation live in one place.

pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use explorer_core::{AppendAck, HistoryBackend, HistoryDraft, HistoryEntry, MemoryHistory};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::ServerConfig;
pub use error::{ApiError, ConfigError, ServerError};

pub type Store = Arc<MemoryHistory>;

const SAVED_MESSAGE: &str = "Request saved to history";

/// Router over a fresh store with the default cap.
pub fn app() -> Router {
    app_with(Arc::new(MemoryHistory::new()))
}

pub fn app_with(store: Store) -> Router {
    Router::new()
        .route("/history", get(list_history).post(append_history))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

pub async fn run(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(store)).await
}

async fn list_history(State(store): State<Store>) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let entries = store.list().await.map_err(ApiError::listing)?;
    Ok(Json(entries))
}

async fn append_history(
    State(store): State<Store>,
    Json(draft): Json<HistoryDraft>,
) -> Result<(StatusCode, Json<AppendAck>), ApiError> {
    let item = store.append(draft).await.map_err(|err| {
        warn!(error = %err, "history append rejected");
        ApiError::saving(err)
    })?;
    Ok((
        StatusCode::CREATED,
        Json(AppendAck {
            message: SAVED_MESSAGE.to_string(),
            item,
        }),
    ))
}
