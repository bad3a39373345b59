//! YSF reflector directory: records, parsing, storage and ingestion.
//!
//! The register publishes one reflector per line as eight `;`-separated
//! fields. [`parse_document`] turns that text into [`DirectoryRecord`]s,
//! skipping (and reporting) malformed lines rather than failing the batch.
//! [`store::DirectoryStore`] holds the current snapshot behind an atomic
//! pointer and persists it as JSON; [`ingest`] fetches, parses and installs
//! a fresh snapshot.

pub mod ingest;
pub mod store;

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use ingest::refresh_directory;
pub use store::{DirectorySnapshot, DirectoryStore, SnapshotOrigin};

const FIELD_COUNT: usize = 8;

/// One reflector. Serialized with the field names the web form expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    #[serde(rename = "number")]
    pub id: u32,
    pub name: String,
    pub description: String,
    #[serde(rename = "ipHostname")]
    pub host: String,
    pub port: u16,
    pub extension: String,
    #[serde(rename = "urlDashboard")]
    pub dashboard_url: String,
    #[serde(rename = "key")]
    pub access_key: u64,
}

impl DirectoryRecord {
    /// `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Render the record in register line format (no trailing newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{};{};{};{};{};{};{};{}",
            self.id,
            self.name,
            self.description,
            self.host,
            self.port,
            self.extension,
            self.dashboard_url,
            self.access_key
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("expected {FIELD_COUNT} fields, found {0}")]
    FieldCount(usize),

    #[error("{field} '{value}' is not a base-10 integer in range")]
    InvalidInteger { field: &'static str, value: String },

    #[error("port must be between 1 and 65535")]
    PortOutOfRange,

    #[error("duplicate id {0}")]
    DuplicateId(u32),
}

/// Parse one non-blank register line.
pub fn parse_line(line: &str) -> Result<DirectoryRecord, RecordError> {
    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    let [id, name, description, host, port, extension, dashboard_url, access_key] =
        fields.as_slice()
    else {
        return Err(RecordError::FieldCount(fields.len()));
    };

    let port: u16 = parse_int("port", port)?;
    if port == 0 {
        return Err(RecordError::PortOutOfRange);
    }

    Ok(DirectoryRecord {
        id: parse_int("id", id)?,
        name: (*name).to_string(),
        description: (*description).to_string(),
        host: (*host).to_string(),
        port,
        extension: (*extension).to_string(),
        dashboard_url: (*dashboard_url).to_string(),
        access_key: parse_int("accessKey", access_key)?,
    })
}

fn parse_int<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, RecordError> {
    // FromStr for integers accepts a leading '+'; the register never emits one.
    if value.starts_with('+') {
        return Err(RecordError::InvalidInteger {
            field,
            value: value.to_string(),
        });
    }
    value.parse().map_err(|_| RecordError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number in the source document.
    pub line: usize,
    pub reason: RecordError,
}

#[derive(Debug, Default)]
pub struct ParsedDirectory {
    pub records: Vec<DirectoryRecord>,
    pub rejected: Vec<RejectedLine>,
}

/// Parse a whole register document. Blank lines are skipped; malformed
/// lines and repeated ids land in `rejected` and parsing continues.
#[must_use]
pub fn parse_document(text: &str) -> ParsedDirectory {
    let mut parsed = ParsedDirectory::default();
    let mut seen = HashSet::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let result = parse_line(line).and_then(|record| {
            if seen.insert(record.id) {
                Ok(record)
            } else {
                Err(RecordError::DuplicateId(record.id))
            }
        });
        match result {
            Ok(record) => parsed.records.push(record),
            Err(reason) => parsed.rejected.push(RejectedLine {
                line: idx + 1,
                reason,
            }),
        }
    }

    parsed
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("fetching {url} failed: {reason}")]
    TransportFailure { url: String, reason: String },

    #[error("directory document unusable: {reason}")]
    ParseFailure { reason: String },

    #[error("writing snapshot {} failed: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
