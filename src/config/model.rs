//! Serde data structures for the linkswitch configuration file.
//!
//! Contains [`Config`] (the root), [`DirectoryConfig`] for reflector
//! directory ingestion, [`ControllerConfig`] holding the declarative
//! per-mode step table, and the [`CommandSpec`] / [`StepSpec`] command
//! templates. All types derive `Serialize` and `Deserialize` with
//! `deny_unknown_fields` for strict parsing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::link::Mode;

pub const DEFAULT_SOURCE_URL: &str = "https://register.ysfreflector.de/export_csv.php";

const fn default_step_timeout() -> u64 {
    5000
}

const fn default_fetch_timeout() -> u64 {
    10_000
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("ysf.json")
}

fn is_default_step_timeout(v: &u64) -> bool {
    *v == default_step_timeout()
}

fn is_default_fetch_timeout(v: &u64) -> bool {
    *v == default_fetch_timeout()
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,

    pub controller: ControllerConfig,

    /// Read-only JSON tables served by `GET /data/{mode}`. YSF is served
    /// from the ingested directory and needs no entry here.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<Mode, PathBuf>,
}

impl Config {
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.controller
            .modes
            .values()
            .map(|p| p.steps.len() + 1)
            .sum()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    #[serde(default = "default_source_url")]
    pub source_url: String,

    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Seconds between background refreshes. Zero refreshes at startup only.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub refresh_interval: u64,

    /// Fetch timeout in milliseconds.
    #[serde(
        default = "default_fetch_timeout",
        skip_serializing_if = "is_default_fetch_timeout"
    )]
    pub timeout: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            snapshot_path: default_snapshot_path(),
            refresh_interval: 0,
            timeout: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Default per-step timeout in milliseconds.
    #[serde(
        default = "default_step_timeout",
        skip_serializing_if = "is_default_step_timeout"
    )]
    pub timeout: u64,

    /// Drops whatever is currently linked. Always runs first.
    pub teardown: CommandSpec,

    pub modes: BTreeMap<Mode, ModeProfile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModeProfile {
    /// Token substituted for `:bridge_mode`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_mode: Option<String>,

    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub program: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    pub stage: String,

    pub program: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}
