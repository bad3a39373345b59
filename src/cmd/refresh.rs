//! `linkswitch refresh`: download the reflector directory once.
//!
//! Useful from cron or before the first `run` on a host without a
//! snapshot. The previous snapshot file is left untouched on failure.

use std::time::Duration;

use crate::cli::RefreshArgs;
use crate::config::sources::parse_config_str;
use crate::config::validation::validate_source_url;
use crate::directory::{refresh_directory, DirectoryStore};
use crate::error::{ConfigIssue, LinkSwitchError};
use crate::logging::{self, LogFormat};
use crate::server::build_http_client;

pub async fn execute(args: RefreshArgs) -> Result<(), LinkSwitchError> {
    logging::init(&args.log_level, LogFormat::Pretty);

    let path = &args.config;
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LinkSwitchError::ConfigFileNotFound { path: path.clone() });
        }
        Err(e) => return Err(e.into()),
    };
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let directory = parse_config_str(ext, &content, &path.display().to_string())?.directory;

    // Only the directory section matters here; a half-written controller
    // table must not block fetching the register.
    if let Err(message) = validate_source_url(&directory.source_url) {
        return Err(LinkSwitchError::ConfigValidation {
            issues: vec![ConfigIssue {
                section: "directory".into(),
                field: "source_url".into(),
                message,
                suggestion: None,
            }],
        });
    }

    let store = DirectoryStore::open(directory.snapshot_path.clone()).await;
    let previous = store.snapshot().map_or(0, |s| s.len());

    let snapshot = refresh_directory(
        &build_http_client(),
        &directory.source_url,
        Duration::from_millis(directory.timeout),
        &store,
    )
    .await?;

    println!(
        "\u{2713} {} reflectors written to {} (previously {previous})",
        snapshot.len(),
        store.path().display()
    );
    Ok(())
}
