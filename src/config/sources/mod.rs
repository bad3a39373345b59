//! Config file formats and the file-backed [`ConfigSource`](super::ConfigSource).
//!
//! [`Format`] maps file extensions to a serde deserializer (YAML, JSON and
//! TOML, each gated by its feature flag). [`parse_config_str`] is the
//! format-dispatching parser shared by `validate`, `init` round-trips and
//! the tests; [`file_source::FileSource`] adds async reads, validation and
//! SHA-256 versioning on top.

pub mod file_source;

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::config::model::Config;
use crate::config::ConfigSource;
use crate::error::LinkSwitchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    #[cfg(feature = "yaml")]
    Yaml,
    Json,
    #[cfg(feature = "toml")]
    Toml,
}

impl Format {
    /// Resolve a format from a file extension, honouring enabled features.
    pub fn from_extension(ext: &str) -> Result<Self, LinkSwitchError> {
        match ext {
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Ok(Self::Yaml),

            #[cfg(feature = "json")]
            "json" => Ok(Self::Json),

            #[cfg(feature = "toml")]
            "toml" => Ok(Self::Toml),

            other => Err(LinkSwitchError::UnsupportedFormat(other.to_string())),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "yaml")]
            Self::Yaml => "yaml",
            Self::Json => "json",
            #[cfg(feature = "toml")]
            Self::Toml => "toml",
        }
    }

    pub fn deserialize(
        self,
        content: &str,
    ) -> Result<Config, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            #[cfg(feature = "yaml")]
            Self::Yaml => Ok(serde_yml::from_str(content)?),
            Self::Json => Ok(serde_json::from_str(content)?),
            #[cfg(feature = "toml")]
            Self::Toml => Ok(toml::from_str(content)?),
        }
    }
}

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, LinkSwitchError> {
    Format::from_extension(ext)?
        .deserialize(content)
        .map_err(|source| LinkSwitchError::ConfigParse {
            path: path_display.to_string(),
            source,
        })
}

/// Build a file-backed source, picking the format from the extension.
pub fn create_file_source(path: &Path) -> Result<Box<dyn ConfigSource>, LinkSwitchError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let format = Format::from_extension(ext)?;
    Ok(Box::new(file_source::FileSource::new(
        path.to_path_buf(),
        format,
    )))
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
