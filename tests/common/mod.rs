//! Shared fixtures for the integration tests: a recording command
//! executor, a scratch directory store and an in-process server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use linkswitch::config::model::Config;
use linkswitch::config::starter::starter_config;
use linkswitch::config::ConfigVersion;
use linkswitch::directory::{parse_line, DirectoryStore, SnapshotOrigin};
use linkswitch::link::executor::{CommandExecutor, CommandLine, ExecError};
use linkswitch::link::orchestrator::Orchestrator;
use linkswitch::server::{self, AppState, LoadedConfig, Stats};

pub const NODE: u32 = 57686;

/// Records every command it is asked to run. Fails any command whose
/// arguments contain `fail_on`, and sleeps `delay` before answering.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<CommandLine>>,
    fail_on: Option<String>,
    delay: Duration,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    /// The last argument of each recorded command, which is where the
    /// starter config puts the interesting part.
    pub fn last_args(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.args.last().cloned().unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(
        &self,
        command: &CommandLine,
        _timeout: Duration,
    ) -> Result<String, ExecError> {
        self.calls.lock().unwrap().push(command.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.fail_on {
            Some(marker) if command.args.iter().any(|a| a.contains(marker.as_str())) => {
                Err(ExecError::Failed {
                    status: Some(1),
                    diagnostic: format!("refused {marker}"),
                })
            }
            _ => Ok(String::new()),
        }
    }
}

pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("linkswitch-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub const REFLECTOR_LINES: [&str; 3] = [
    "12345;Alpha;Alpha reflector;ysf.example.org;42000;ALPHA;http://alpha.example.org;0",
    "23456;Bravo;Bravo reflector;10.0.0.2;42001;BRAVO;http://bravo.example.org;0",
    "34567;Charlie;Charlie reflector;2001:db8::7;42002;CHARLIE;;0",
];

/// A store under a fresh scratch directory, optionally preloaded with
/// [`REFLECTOR_LINES`].
pub async fn directory_store(populated: bool) -> Arc<DirectoryStore> {
    let store = DirectoryStore::empty(scratch_dir().join("ysf.json"));
    if populated {
        let records = REFLECTOR_LINES
            .iter()
            .map(|l| parse_line(l).unwrap())
            .collect();
        store.install(records, SnapshotOrigin::Network).await.unwrap();
    }
    Arc::new(store)
}

pub fn test_config() -> Config {
    starter_config(NODE)
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn start_server(
    config: Config,
    executor: Arc<dyn CommandExecutor>,
    directory: Arc<DirectoryStore>,
) -> TestServer {
    let static_dir = scratch_dir();
    std::fs::write(static_dir.join("index.html"), "<h1>linkswitch</h1>").unwrap();

    let state = Arc::new(AppState {
        config: tokio::sync::RwLock::new(LoadedConfig {
            config: Arc::new(config),
            version: ConfigVersion::Hash("0123456789abcdef".into()),
            source_name: "test".into(),
            loaded_at: Instant::now(),
        }),
        orchestrator: Orchestrator::new(executor, Arc::clone(&directory)),
        directory,
        http_client: server::build_http_client(),
        start_time: Instant::now(),
        stats: Stats::new(),
    });

    let router = server::build_router(Arc::clone(&state), 16_384, &static_dir);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    TestServer {
        addr,
        state,
        shutdown: Some(shutdown_tx),
    }
}
