//! In-memory directory snapshot with atomic replacement and JSON persistence.
//!
//! Readers call [`DirectoryStore::snapshot`] and get an `Arc` to whatever
//! snapshot was current at that instant; a concurrent [`install`] never
//! tears it. Installing writes a uniquely named `<path>.<uuid>.tmp` and
//! renames it over the snapshot file before swapping the pointer, so a failed
//! write leaves both the file and the in-memory snapshot as they were, and a
//! `linkswitch refresh` racing the server never shares a temp file with it.
//!
//! [`install`]: DirectoryStore::install

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;

use super::{DirectoryRecord, IngestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// Fetched from the register during this process lifetime.
    Network,
    /// Reloaded from the snapshot file written by an earlier run.
    Disk,
}

impl fmt::Display for SnapshotOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("network"),
            Self::Disk => f.write_str("disk"),
        }
    }
}

#[derive(Debug)]
pub struct DirectorySnapshot {
    records: Vec<DirectoryRecord>,
    index: HashMap<u32, usize>,
    origin: SnapshotOrigin,
    installed_at: Instant,
}

impl DirectorySnapshot {
    /// Build a snapshot, keeping the first record for any repeated id.
    #[must_use]
    pub fn new(records: Vec<DirectoryRecord>, origin: SnapshotOrigin) -> Self {
        let mut unique = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            if index.contains_key(&record.id) {
                continue;
            }
            index.insert(record.id, unique.len());
            unique.push(record);
        }
        Self {
            records: unique,
            index,
            origin,
            installed_at: Instant::now(),
        }
    }

    /// Look a reflector up by id.
    #[must_use]
    pub fn resolve(&self, id: u32) -> Option<&DirectoryRecord> {
        self.index.get(&id).map(|&i| &self.records[i])
    }

    #[must_use]
    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    #[must_use]
    pub const fn installed_at(&self) -> Instant {
        self.installed_at
    }
}

pub struct DirectoryStore {
    path: PathBuf,
    current: ArcSwapOption<DirectorySnapshot>,
}

impl DirectoryStore {
    /// A store with no snapshot yet.
    #[must_use]
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            current: ArcSwapOption::empty(),
        }
    }

    /// Open the store, reloading the snapshot file if a previous run left one.
    /// An unreadable or corrupt file is logged and treated as absent.
    pub async fn open(path: PathBuf) -> Self {
        let store = Self::empty(path);
        match tokio::fs::read(&store.path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<DirectoryRecord>>(&bytes) {
                Ok(records) if !records.is_empty() => {
                    let snapshot = DirectorySnapshot::new(records, SnapshotOrigin::Disk);
                    tracing::info!(
                        path = %store.path.display(),
                        records = snapshot.len(),
                        "loaded directory snapshot from disk"
                    );
                    store.current.store(Some(Arc::new(snapshot)));
                }
                Ok(_) => {
                    tracing::warn!(path = %store.path.display(), "directory snapshot on disk is empty");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %store.path.display(),
                        error = %e,
                        "directory snapshot on disk is corrupt, ignoring"
                    );
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %store.path.display(), "no directory snapshot on disk");
            }
            Err(e) => {
                tracing::warn!(
                    path = %store.path.display(),
                    error = %e,
                    "failed to read directory snapshot"
                );
            }
        }
        store
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current snapshot, if any. Wait-free.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<DirectorySnapshot>> {
        self.current.load_full()
    }

    /// Persist `records` and make them the current snapshot.
    pub async fn install(
        &self,
        records: Vec<DirectoryRecord>,
        origin: SnapshotOrigin,
    ) -> Result<Arc<DirectorySnapshot>, IngestError> {
        let snapshot = Arc::new(DirectorySnapshot::new(records, origin));
        self.persist(snapshot.records()).await?;
        self.current.store(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    async fn persist(&self, records: &[DirectoryRecord]) -> Result<(), IngestError> {
        let persist_err = |source| IngestError::Persist {
            path: self.path.clone(),
            source,
        };

        let body = serde_json::to_vec_pretty(records)
            .map_err(|e| persist_err(std::io::Error::other(e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(persist_err)?;
        }

        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, &body).await.map_err(persist_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(persist_err(e));
        }
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("snapshot"), OsString::from);
    name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    path.with_file_name(name)
}
