//! `GET /data/{mode}`: directory tables for the operator form.
//!
//! YSF is answered from the in-memory reflector snapshot. Every other mode
//! serves the JSON file configured under `tables`, parsed so malformed
//! files surface as an error instead of being relayed verbatim. A mode with
//! no table, an unreadable file and invalid JSON all answer 500.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::link::Mode;
use crate::server::AppState;

pub async fn data_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_mode): Path<String>,
) -> Response {
    let Ok(mode) = raw_mode.parse::<Mode>() else {
        return (StatusCode::BAD_REQUEST, "Invalid mode.").into_response();
    };

    if mode == Mode::Ysf {
        return match state.directory.snapshot() {
            Some(snapshot) => Json(snapshot.records()).into_response(),
            None => {
                tracing::warn!("YSF data requested before the directory was loaded");
                (StatusCode::SERVICE_UNAVAILABLE, "Failed to load data.").into_response()
            }
        };
    }

    let path = {
        let loaded = state.config.read().await;
        loaded.config.tables.get(&mode).cloned()
    };
    let Some(path) = path else {
        tracing::error!(mode = %mode, "no data table configured");
        return load_failure();
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(mode = %mode, path = %path.display(), error = %e, "failed to read data table");
            return load_failure();
        }
    };

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(value) => Json(value).into_response(),
        Err(e) => {
            tracing::error!(mode = %mode, path = %path.display(), error = %e, "data table is not valid JSON");
            load_failure()
        }
    }
}

fn load_failure() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load data.").into_response()
}
