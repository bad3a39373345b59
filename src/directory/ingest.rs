//! Fetch the reflector register and install it as the current snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use super::{parse_document, DirectorySnapshot, DirectoryStore, IngestError, SnapshotOrigin};
use crate::server::HttpClient;

/// Download the register over HTTP(S). Any non-2xx status, connection
/// error or timeout is a [`IngestError::TransportFailure`].
pub async fn fetch_document(
    client: &HttpClient,
    source_url: &str,
    timeout: Duration,
) -> Result<String, IngestError> {
    let transport = |reason: String| IngestError::TransportFailure {
        url: source_url.to_string(),
        reason,
    };

    let uri: hyper::Uri = source_url
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| transport(e.to_string()))?;

    let req = hyper::Request::builder()
        .uri(uri)
        .header(
            hyper::header::USER_AGENT,
            concat!("linkswitch/", env!("CARGO_PKG_VERSION")),
        )
        .body(Full::new(Bytes::new()))
        .map_err(|e| transport(e.to_string()))?;

    let response = tokio::time::timeout(timeout, client.request(req))
        .await
        .map_err(|_| transport(format!("timed out after {}ms", timeout.as_millis())))?
        .map_err(|e| transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(transport(format!("unexpected status {status}")));
    }

    let body = tokio::time::timeout(timeout, response.into_body().collect())
        .await
        .map_err(|_| transport("timed out reading body".into()))?
        .map_err(|e| transport(format!("body read error: {e}")))?
        .to_bytes();

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Fetch, parse, persist and swap in a fresh directory snapshot.
///
/// On any error the store keeps whatever snapshot it already had.
pub async fn refresh_directory(
    client: &HttpClient,
    source_url: &str,
    timeout: Duration,
    store: &DirectoryStore,
) -> Result<Arc<DirectorySnapshot>, IngestError> {
    let start = Instant::now();
    let document = fetch_document(client, source_url, timeout).await?;

    let parsed = parse_document(&document);
    for rejected in &parsed.rejected {
        tracing::warn!(
            line = rejected.line,
            reason = %rejected.reason,
            "skipping malformed directory record"
        );
    }

    if parsed.records.is_empty() {
        return Err(IngestError::ParseFailure {
            reason: format!(
                "no valid records ({} lines rejected)",
                parsed.rejected.len()
            ),
        });
    }

    let snapshot = store
        .install(parsed.records, SnapshotOrigin::Network)
        .await?;

    #[allow(clippy::cast_possible_truncation)]
    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        source = %source_url,
        records = snapshot.len(),
        rejected = parsed.rejected.len(),
        path = %store.path().display(),
        elapsed_ms,
        "directory refreshed"
    );
    Ok(snapshot)
}
