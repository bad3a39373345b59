//! Structured logging setup using the `tracing` ecosystem.
//!
//! JSON output for service managers and log shippers, pretty output for a
//! terminal. The format is auto-detected from stdout but can be forced via
//! `--json` or `--pretty`. Connection-level chatter from hyper and rustls
//! is held at `warn` unless the operator asks for `trace`.

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

const NOISY_TARGETS: [&str; 3] = ["hyper", "hyper_util", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

fn filter_for(level: Level) -> Targets {
    let quiet = if level == Level::TRACE {
        level
    } else {
        level.min(Level::WARN)
    };
    NOISY_TARGETS
        .iter()
        .fold(Targets::new().with_default(level), |targets, name| {
            targets.with_target(*name, quiet)
        })
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = filter_for(level.to_tracing_level());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}
