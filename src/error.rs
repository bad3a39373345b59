//! Crate-level error types for linkswitch.
//!
//! Defines [`LinkSwitchError`] (the error returned by subcommands and
//! startup paths) and [`ConfigIssue`] for config validation failures.
//! Domain errors live next to the code that raises them:
//! [`IngestError`](crate::directory::IngestError),
//! [`ValidationError`](crate::link::request::ValidationError),
//! [`SwitchError`](crate::link::orchestrator::SwitchError) and
//! [`ExecError`](crate::link::executor::ExecError).

use std::path::PathBuf;

use crate::directory::IngestError;

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub section: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}: {}", self.section, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigIssue {}

fn format_issues(issues: &[ConfigIssue]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in issues.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LinkSwitchError {
    #[error("No config source found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_issues(.issues))]
    ConfigValidation { issues: Vec<ConfigIssue> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),

    #[error("Directory refresh failed: {0}")]
    Ingest(#[from] IngestError),
}
