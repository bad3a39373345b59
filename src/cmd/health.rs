//! `linkswitch health`: query a running instance.
//!
//! Sends `GET /health` and prints the config, directory and switch
//! counters, or the raw JSON with `--json`.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use crate::cli::HealthArgs;
use crate::error::LinkSwitchError;
use crate::health::HealthResponse;
use crate::server::build_http_client;

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

fn request_err(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> LinkSwitchError {
    LinkSwitchError::HttpRequest { source: e.into() }
}

pub async fn execute(args: HealthArgs) -> Result<(), LinkSwitchError> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let uri: hyper::Uri = url
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| LinkSwitchError::UriParse {
            source: Box::new(e),
        })?;

    // Same rustls client the server uses, so https:// instances work too.
    let client = build_http_client();
    let req = hyper::Request::builder()
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .map_err(request_err)?;

    let response = tokio::time::timeout(CHECK_TIMEOUT, client.request(req))
        .await
        .map_err(|_| request_err("health check timed out after 10s"))?
        .map_err(request_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(LinkSwitchError::HealthCheckFailed(status));
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(request_err)?
        .to_bytes();

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    match serde_json::from_slice::<HealthResponse>(&body) {
        Ok(health) => print_report(&args.url, &health),
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }
    Ok(())
}

fn print_report(url: &str, health: &HealthResponse) {
    println!("\u{2713} linkswitch is healthy ({url})");
    println!("  version:        {}", health.version);
    println!("  uptime:         {}", format_uptime(health.uptime_seconds));
    println!(
        "  config:         {} {} (loaded {}s ago)",
        health.config.source, health.config.version, health.config.loaded_ago_seconds
    );
    println!(
        "  controller:     {} modes, {} steps",
        health.config.modes, health.config.steps
    );

    let dir = &health.directory;
    if dir.loaded {
        let origin = dir.origin.as_deref().unwrap_or("unknown");
        let age = dir
            .installed_ago_seconds
            .map_or_else(String::new, |s| format!(", {} ago", format_uptime(s)));
        println!("  directory:      {} reflectors (from {origin}{age})", dir.records);
    } else {
        println!("  directory:      not loaded, YSF switching unavailable");
    }

    let stats = &health.stats;
    println!(
        "  switches:       {} succeeded, {} failed, {} rejected busy",
        stats.switches_succeeded, stats.switches_failed, stats.switches_rejected_busy
    );
    println!("  invalid:        {} requests", stats.requests_invalid);
    println!(
        "  refreshes:      {} ok, {} failed",
        stats.directory_refreshes, stats.directory_failures
    );
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
