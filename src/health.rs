//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload containing the server
//! version, uptime, config source metadata, the state of the reflector
//! directory, and cumulative switch counters.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub config: ConfigHealth,
    pub directory: DirectoryHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct ConfigHealth {
    pub source: String,
    pub version: String,
    pub loaded_ago_seconds: u64,
    pub modes: usize,
    pub steps: usize,
}

#[derive(Serialize, Deserialize)]
pub struct DirectoryHealth {
    pub loaded: bool,
    pub records: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_ago_seconds: Option<u64>,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub switches_succeeded: u64,
    pub switches_failed: u64,
    pub switches_rejected_busy: u64,
    pub requests_invalid: u64,
    pub directory_refreshes: u64,
    pub directory_failures: u64,
    pub config_reloads: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    // Clone Arc<Config> (cheap refcount bump) to release the lock quickly
    let (config, source_name, version_str, loaded_ago) = {
        let loaded = state.config.read().await;
        (
            Arc::clone(&loaded.config),
            loaded.source_name.clone(),
            loaded.version.short().to_string(),
            loaded.loaded_at.elapsed().as_secs(),
        )
    };

    // A missing directory degrades YSF only; the service still reports healthy.
    let directory = state.directory.snapshot().map_or(
        DirectoryHealth {
            loaded: false,
            records: 0,
            origin: None,
            installed_ago_seconds: None,
        },
        |snapshot| DirectoryHealth {
            loaded: true,
            records: snapshot.len(),
            origin: Some(snapshot.origin().to_string()),
            installed_ago_seconds: Some(snapshot.installed_at().elapsed().as_secs()),
        },
    );

    let stats = &state.stats;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        config: ConfigHealth {
            source: source_name,
            version: version_str,
            loaded_ago_seconds: loaded_ago,
            modes: config.controller.modes.len(),
            steps: config.total_steps(),
        },
        directory,
        stats: StatsResponse {
            switches_succeeded: stats.switched.load(Ordering::Relaxed),
            switches_failed: stats.failed.load(Ordering::Relaxed),
            switches_rejected_busy: stats.busy.load(Ordering::Relaxed),
            requests_invalid: stats.invalid.load(Ordering::Relaxed),
            directory_refreshes: stats.directory_refreshes.load(Ordering::Relaxed),
            directory_failures: stats.directory_failures.load(Ordering::Relaxed),
            config_reloads: stats.config_reloads.load(Ordering::Relaxed),
        },
    })
}
