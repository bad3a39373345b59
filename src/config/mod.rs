//! Configuration loading, validation, and hot-reloading.
//!
//! Defines the [`ConfigSource`] trait for pluggable config files and the
//! [`ConfigVersion`] enum used for change detection. Submodules provide
//! the data model, validation logic, and concrete file sources.

pub mod model;
pub mod sources;
pub mod starter;
pub mod validation;

use async_trait::async_trait;

use crate::error::LinkSwitchError;
use model::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
}

impl ConfigVersion {
    /// Short form for logs and `/health`.
    #[must_use]
    pub fn short(&self) -> &str {
        match self {
            Self::Hash(h) => h.get(..8).unwrap_or(h),
        }
    }
}

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits (Rust 1.75+) does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self) -> Result<(Config, ConfigVersion), LinkSwitchError>;
    async fn has_changed(&self, current: &ConfigVersion) -> Result<bool, LinkSwitchError>;
}
