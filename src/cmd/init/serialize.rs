//! Render a [`Config`] in the chosen output format.

use crate::cli::ConfigFormat;
use crate::config::model::Config;
use crate::error::LinkSwitchError;

fn render_err(format: &str, e: impl std::fmt::Display) -> LinkSwitchError {
    LinkSwitchError::Io(std::io::Error::other(format!(
        "failed to render {format} config: {e}"
    )))
}

pub fn serialize_config(config: &Config, format: &ConfigFormat) -> Result<String, LinkSwitchError> {
    match format {
        #[cfg(feature = "yaml")]
        ConfigFormat::Yaml => serde_yml::to_string(config).map_err(|e| render_err("yaml", e)),

        #[cfg(not(feature = "yaml"))]
        ConfigFormat::Yaml => Err(LinkSwitchError::UnsupportedFormat("yaml".into())),

        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| render_err("json", e)),

        #[cfg(feature = "toml")]
        ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| render_err("toml", e)),

        #[cfg(not(feature = "toml"))]
        ConfigFormat::Toml => Err(LinkSwitchError::UnsupportedFormat("toml".into())),
    }
}
