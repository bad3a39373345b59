//! Validation of inbound switch requests.
//!
//! [`validate`] turns raw form input into a [`ValidatedRequest`] or a
//! [`ValidationError`]. It is pure: nothing is executed or looked up.

use serde::Deserialize;

use super::mode::{Addressing, Mode};

/// Raw `POST /connect` form body. Browsers send empty strings for inputs the
/// operator left blank, so every field is optional text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchRequest {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, rename = "nodeNumber")]
    pub node_number: Option<String>,
    #[serde(default)]
    pub talkgroup: Option<String>,
}

/// What the request points at, typed by the mode's addressing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node(u32),
    Talkgroup(u32),
}

/// A request that passed [`validate`]. Only constructible through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRequest {
    mode: Mode,
    target: Target,
}

impl ValidatedRequest {
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn target(&self) -> Target {
        self.target
    }

    /// The numeric target, whichever kind it is.
    #[must_use]
    pub const fn target_id(&self) -> u32 {
        match self.target {
            Target::Node(n) | Target::Talkgroup(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("unknown mode '{0}'")]
    UnknownMode(String),

    #[error("{field} must be a positive integer, got '{value}'")]
    InvalidField { field: &'static str, value: String },
}

pub fn validate(request: &SwitchRequest) -> Result<ValidatedRequest, ValidationError> {
    let raw_mode = present(request.mode.as_deref()).ok_or(ValidationError::MissingField("mode"))?;
    let mode: Mode = raw_mode
        .parse()
        .map_err(|_| ValidationError::UnknownMode(raw_mode.to_string()))?;

    let target = match mode.addressing() {
        Addressing::Node => Target::Node(positive("nodeNumber", request.node_number.as_deref())?),
        Addressing::Talkgroup => {
            Target::Talkgroup(positive("talkgroup", request.talkgroup.as_deref())?)
        }
    };

    Ok(ValidatedRequest { mode, target })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn positive(field: &'static str, value: Option<&str>) -> Result<u32, ValidationError> {
    let raw = present(value).ok_or(ValidationError::MissingField(field))?;
    let invalid = || ValidationError::InvalidField {
        field,
        value: raw.to_string(),
    };
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(n) => Ok(n),
    }
}
