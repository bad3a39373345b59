//! `linkswitch run`: start the link switching server.
//!
//! Loads the config file, restores the last directory snapshot from disk,
//! starts the Axum server with graceful shutdown, and spawns two background
//! loops: one re-downloading the reflector directory, one hot-reloading the
//! config file when its content hash changes.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::cli::RunArgs;
use crate::config::model::DirectoryConfig;
use crate::config::sources::create_file_source;
use crate::config::ConfigSource;
use crate::directory::{refresh_directory, DirectoryStore};
use crate::error::LinkSwitchError;
use crate::link::executor::ProcessExecutor;
use crate::link::orchestrator::Orchestrator;
use crate::logging;
use crate::server::{self, AppState, LoadedConfig, Stats};

pub async fn execute(args: RunArgs) -> Result<(), LinkSwitchError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let source = resolve_config_source(args.config.as_deref()).await?;
    let (config, version) = source.load().await?;

    let mode_count = config.controller.modes.len();
    let step_count = config.total_steps();
    tracing::info!(
        source = source.name(),
        version = version.short(),
        modes = mode_count,
        steps = step_count,
        "config loaded"
    );

    let directory = Arc::new(DirectoryStore::open(config.directory.snapshot_path.clone()).await);
    let orchestrator = Orchestrator::new(Arc::new(ProcessExecutor), Arc::clone(&directory));

    let state = Arc::new(AppState {
        config: tokio::sync::RwLock::new(LoadedConfig {
            config: Arc::new(config),
            version,
            source_name: source.name().to_string(),
            loaded_at: Instant::now(),
        }),
        directory,
        orchestrator,
        http_client: server::build_http_client(),
        start_time: Instant::now(),
        stats: Stats::new(),
    });

    // Dropping shutdown_tx closes the channel and stops both loops
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let config_handle = tokio::spawn(config_refresh_loop(
        Arc::clone(&state),
        source,
        args.poll_interval,
        shutdown_rx.clone(),
    ));
    let directory_handle = tokio::spawn(directory_refresh_loop(Arc::clone(&state), shutdown_rx));

    let router = server::build_router(state, args.max_body, &args.static_dir);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        static_dir = %args.static_dir.display(),
        "linkswitch started"
    );

    let graceful_shutdown = async move {
        server::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    };

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown)
    .await?;

    for (name, handle) in [("config", config_handle), ("directory", directory_handle)] {
        if let Err(e) = handle.await {
            tracing::error!(task = name, error = %e, "background task failed");
        }
    }

    tracing::info!("linkswitch stopped");
    Ok(())
}

/// Use the explicit path if given, otherwise the first `linkswitch.*` file
/// found in the working directory.
pub async fn resolve_config_source(
    explicit: Option<&Path>,
) -> Result<Box<dyn ConfigSource>, LinkSwitchError> {
    if let Some(path) = explicit {
        return create_file_source(path);
    }

    let candidates = [
        "linkswitch.yaml",
        "linkswitch.yml",
        "linkswitch.json",
        "linkswitch.toml",
    ];

    for name in &candidates {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return create_file_source(&path);
        }
    }

    Err(LinkSwitchError::NoConfigSource {
        hint: "Provide --config <file> or place linkswitch.yaml in the working directory.\n  \
               Run 'linkswitch init' to create one."
            .into(),
    })
}

async fn refresh_once(state: &AppState, directory: &DirectoryConfig) {
    let result = refresh_directory(
        &state.http_client,
        &directory.source_url,
        Duration::from_millis(directory.timeout),
        &state.directory,
    )
    .await;

    match result {
        Ok(_) => {
            state.stats.directory_refreshes.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            state.stats.directory_failures.fetch_add(1, Ordering::Relaxed);
            let serving = state.directory.snapshot().map_or(0, |s| s.len());
            tracing::error!(
                error = %e,
                serving_records = serving,
                "directory refresh failed, keeping current snapshot"
            );
        }
    }
}

/// Refresh the directory once at startup, then every `refresh_interval`
/// seconds. The interval and source are re-read from the live config on
/// each pass, so a reload takes effect at the next refresh.
async fn directory_refresh_loop(state: Arc<AppState>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let directory = state.config.read().await.config.directory.clone();

        tokio::select! {
            () = refresh_once(&state, &directory) => {}
            _ = shutdown.changed() => {
                tracing::debug!("directory refresh loop shutting down");
                return;
            }
        }

        if directory.refresh_interval == 0 {
            tracing::debug!("periodic directory refresh disabled");
            return;
        }

        tokio::select! {
            () = tokio::time::sleep(Duration::from_secs(directory.refresh_interval)) => {}
            _ = shutdown.changed() => {
                tracing::debug!("directory refresh loop shutting down");
                return;
            }
        }
    }
}

async fn config_refresh_loop(
    state: Arc<AppState>,
    source: Box<dyn ConfigSource>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.tick().await; // first tick is immediate

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                tracing::debug!("config refresh loop shutting down");
                return;
            }
        }

        let current_version = state.config.read().await.version.clone();

        match source.has_changed(&current_version).await {
            Ok(true) => {
                tracing::info!("config change detected, reloading");
                match source.load().await {
                    Ok((config, version)) => {
                        let steps = config.total_steps();
                        if config.directory.snapshot_path != *state.directory.path() {
                            tracing::warn!(
                                path = %config.directory.snapshot_path.display(),
                                "directory.snapshot_path changes take effect on restart"
                            );
                        }
                        let mut loaded = state.config.write().await;
                        loaded.config = Arc::new(config);
                        loaded.version = version;
                        loaded.loaded_at = Instant::now();
                        let short = loaded.version.short().to_string();
                        drop(loaded);
                        state.stats.config_reloads.fetch_add(1, Ordering::Relaxed);
                        tracing::info!(version = %short, steps, "config reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "config reload failed, keeping current config");
                    }
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "config change check failed");
            }
        }
    }
}
