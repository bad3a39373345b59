//! Async file-backed config source with SHA-256 change detection.
//!
//! [`FileSource`] reads the config file through Tokio, parses it with the
//! [`Format`] chosen at construction, validates it, and versions it by the
//! digest of the raw bytes so the refresh loop can skip unchanged files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{sha256_hex, Format};
use crate::config::model::Config;
use crate::config::validation::validate;
use crate::config::{ConfigSource, ConfigVersion};
use crate::error::LinkSwitchError;

pub struct FileSource {
    path: PathBuf,
    format: Format,
}

impl FileSource {
    #[must_use]
    pub const fn new(path: PathBuf, format: Format) -> Self {
        Self { path, format }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_content(&self) -> Result<String, LinkSwitchError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => LinkSwitchError::ConfigFileNotFound {
                    path: self.path.clone(),
                },
                _ => LinkSwitchError::Io(e),
            })
    }

    fn version_of(content: &str) -> ConfigVersion {
        ConfigVersion::Hash(sha256_hex(content.as_bytes()))
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn name(&self) -> &'static str {
        self.format.name()
    }

    async fn load(&self) -> Result<(Config, ConfigVersion), LinkSwitchError> {
        let content = self.read_content().await?;

        let config =
            self.format
                .deserialize(&content)
                .map_err(|source| LinkSwitchError::ConfigParse {
                    path: self.path.display().to_string(),
                    source,
                })?;

        validate(&config).map_err(|issues| LinkSwitchError::ConfigValidation { issues })?;

        Ok((config, Self::version_of(&content)))
    }

    async fn has_changed(&self, current: &ConfigVersion) -> Result<bool, LinkSwitchError> {
        let content = self.read_content().await?;
        Ok(*current != Self::version_of(&content))
    }
}
