//! linkswitch switches a repeater node's active link between networks.
//!
//! An operator submits a mode and target through a small web form; the
//! service tears down the current link and runs the configured controller
//! commands for the new mode, one request at a time. YSF talkgroups are
//! resolved through a reflector directory that is downloaded, validated,
//! persisted to disk and swapped in atomically.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch (run, init, validate, health, refresh).
//! - [`config`] -- Config file model, validation and hot-reloading via the
//!   [`ConfigSource`](config::ConfigSource) trait.
//! - [`data`] -- `GET /data/{mode}` lookup tables for the operator form.
//! - [`directory`] -- YSF reflector register parsing, ingestion and the
//!   [`DirectoryStore`](directory::DirectoryStore) snapshot.
//! - [`error`] -- Crate-level error types using `thiserror`.
//! - [`health`] -- `GET /health` runtime diagnostics.
//! - [`link`] -- Request validation, switch planning, command execution and
//!   the serialized [`Orchestrator`](link::orchestrator::Orchestrator).
//! - [`logging`] -- Structured tracing setup with JSON and pretty output.
//! - [`server`] -- Axum router, shared state, HTTP client and shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All config file formats |
//! | `full` | All features |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod data;
pub mod directory;
pub mod error;
pub mod health;
pub mod link;
pub mod logging;
pub mod server;
