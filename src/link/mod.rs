//! Link switching: request validation, planning and step execution.
//!
//! [`connect_handler`] is the `POST /connect` endpoint. It validates the
//! form ([`request`]), then hands the request to the single-flight
//! [`Orchestrator`](orchestrator::Orchestrator), which plans the mode's
//! step sequence ([`plan`]) and runs it through a
//! [`CommandExecutor`](executor::CommandExecutor). The switch runs on a
//! spawned task, so it finishes and is counted even if the caller hangs up.

pub mod executor;
pub mod mode;
pub mod orchestrator;
pub mod plan;
pub mod request;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use http::HeaderName;

pub use mode::Mode;

use crate::config::model::Config;
use crate::server::AppState;
use orchestrator::SwitchError;
use request::{SwitchRequest, ValidatedRequest};

/// Echoed back on every `/connect` response; generated when absent.
pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

pub async fn connect_handler(
    State(state): State<Arc<AppState>>,
    req_headers: HeaderMap,
    Form(form): Form<SwitchRequest>,
) -> Response {
    let correlation_id = req_headers
        .get(&CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let validated = match request::validate(&form) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                error = %e,
                "switch request rejected"
            );
            state.stats.invalid.fetch_add(1, Ordering::Relaxed);
            return with_correlation(&correlation_id, StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    tracing::info!(
        correlation_id = %correlation_id,
        mode = %validated.mode(),
        target = validated.target_id(),
        "switch requested"
    );

    // Clone the Arc<Config> (cheap refcount bump) to release the RwLock before running steps
    let config = {
        let loaded = state.config.read().await;
        Arc::clone(&loaded.config)
    };

    // The switch runs on its own task: a client that disconnects drops only
    // this handler future, never a half-finished step sequence.
    let task = tokio::spawn(run_switch(
        Arc::clone(&state),
        config,
        validated,
        correlation_id.clone(),
    ));

    let (status, body) = match task.await {
        Ok(reply) => reply,
        Err(e) => {
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                correlation_id = %correlation_id,
                error = %e,
                "switch task aborted"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "link switch aborted unexpectedly".to_string(),
            )
        }
    };
    with_correlation(&correlation_id, status, body)
}

/// Run one switch to completion, record its outcome, and render the reply.
async fn run_switch(
    state: Arc<AppState>,
    config: Arc<Config>,
    validated: ValidatedRequest,
    correlation_id: String,
) -> (StatusCode, String) {
    match state
        .orchestrator
        .switch_link(&config.controller, &validated)
        .await
    {
        Ok(connected) => {
            state.stats.switched.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                correlation_id = %correlation_id,
                steps = connected.completed.len(),
                "{}",
                connected.message
            );
            (StatusCode::OK, connected.message)
        }
        Err(e) => {
            match e {
                SwitchError::Busy => state.stats.busy.fetch_add(1, Ordering::Relaxed),
                _ => state.stats.failed.fetch_add(1, Ordering::Relaxed),
            };
            if e.left_partial_state() {
                tracing::error!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "switch failed after changing controller state"
                );
            } else {
                tracing::warn!(correlation_id = %correlation_id, error = %e, "switch failed");
            }
            (e.status(), e.to_string())
        }
    }
}

fn with_correlation(correlation_id: &str, status: StatusCode, body: String) -> Response {
    (
        status,
        [(CORRELATION_HEADER, correlation_id.to_string())],
        body,
    )
        .into_response()
}
