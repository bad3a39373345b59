//! The closed set of linking modes an operator can select.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "ALLSTAR")]
    Allstar,
    #[serde(rename = "ECHOLINK")]
    Echolink,
    #[serde(rename = "YSF")]
    Ysf,
    #[serde(rename = "BRANDMEISTER")]
    Brandmeister,
    #[serde(rename = "DMR")]
    Dmr,
    #[serde(rename = "NXDN")]
    Nxdn,
    #[serde(rename = "P25")]
    P25,
}

/// How a mode addresses its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Analog node number (`nodeNumber` form field).
    Node,
    /// Digital-voice talkgroup or reflector id (`talkgroup` form field).
    Talkgroup,
}

impl Mode {
    pub const ALL: [Self; 7] = [
        Self::Allstar,
        Self::Echolink,
        Self::Ysf,
        Self::Brandmeister,
        Self::Dmr,
        Self::Nxdn,
        Self::P25,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allstar => "ALLSTAR",
            Self::Echolink => "ECHOLINK",
            Self::Ysf => "YSF",
            Self::Brandmeister => "BRANDMEISTER",
            Self::Dmr => "DMR",
            Self::Nxdn => "NXDN",
            Self::P25 => "P25",
        }
    }

    #[must_use]
    pub const fn addressing(self) -> Addressing {
        match self {
            Self::Allstar | Self::Echolink => Addressing::Node,
            Self::Ysf | Self::Brandmeister | Self::Dmr | Self::Nxdn | Self::P25 => {
                Addressing::Talkgroup
            }
        }
    }

    /// Whether the talkgroup must be resolved through the reflector directory.
    #[must_use]
    pub const fn resolves_through_directory(self) -> bool {
        matches!(self, Self::Ysf)
    }

    /// Placeholders a step template for this mode may reference.
    #[must_use]
    pub const fn placeholders(self) -> &'static [&'static str] {
        match self {
            Self::Allstar | Self::Echolink => &["node"],
            Self::Ysf => &["talkgroup", "bridge_mode", "endpoint", "host", "port"],
            Self::Brandmeister | Self::Dmr | Self::Nxdn | Self::P25 => {
                &["talkgroup", "bridge_mode"]
            }
        }
    }

    /// Name used in operator-facing confirmation messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Allstar => "Allstar",
            Self::Echolink => "Echolink",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}
