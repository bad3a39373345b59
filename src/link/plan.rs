//! Turns the declarative step table into a concrete, ordered command plan.
//!
//! Planning has no side effects: the directory lookup for YSF happens here,
//! so an unknown reflector is reported before anything runs.

use std::collections::HashMap;
use std::time::Duration;

use super::executor::CommandLine;
use super::orchestrator::SwitchError;
use super::request::{Target, ValidatedRequest};
use super::Mode;
use crate::config::model::{ControllerConfig, ModeProfile};
use crate::directory::DirectoryStore;

pub const TEARDOWN_STAGE: &str = "teardown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub stage: String,
    pub command: CommandLine,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SwitchPlan {
    pub steps: Vec<PlannedStep>,
    /// Returned to the operator once every step succeeded.
    pub confirmation: String,
}

/// Build the plan for `request`: teardown first, then the mode's steps.
pub fn build(
    controller: &ControllerConfig,
    request: &ValidatedRequest,
    directory: &DirectoryStore,
) -> Result<SwitchPlan, SwitchError> {
    let mode = request.mode();
    let profile = controller
        .modes
        .get(&mode)
        .ok_or(SwitchError::NotConfigured(mode))?;

    let (params, confirmation) = bind(mode, profile, request, directory)?;
    let default_timeout = controller.timeout;

    let teardown = &controller.teardown;
    let mut steps = Vec::with_capacity(profile.steps.len() + 1);
    steps.push(PlannedStep {
        stage: TEARDOWN_STAGE.to_string(),
        command: CommandLine {
            program: teardown.program.clone(),
            args: teardown.args.clone(),
        },
        timeout: Duration::from_millis(teardown.timeout.unwrap_or(default_timeout)),
    });

    for step in &profile.steps {
        steps.push(PlannedStep {
            stage: step.stage.clone(),
            command: CommandLine {
                program: substitute_params(&step.program, &params),
                args: step
                    .args
                    .iter()
                    .map(|a| substitute_params(a, &params))
                    .collect(),
            },
            timeout: Duration::from_millis(step.timeout.unwrap_or(default_timeout)),
        });
    }

    Ok(SwitchPlan {
        steps,
        confirmation,
    })
}

/// Gather placeholder values and the confirmation text for this request.
fn bind(
    mode: Mode,
    profile: &ModeProfile,
    request: &ValidatedRequest,
    directory: &DirectoryStore,
) -> Result<(HashMap<String, String>, String), SwitchError> {
    let mut params = HashMap::new();

    if let Some(ref token) = profile.bridge_mode {
        params.insert("bridge_mode".to_string(), token.clone());
    }

    let confirmation = match request.target() {
        Target::Node(node) => {
            params.insert("node".into(), node.to_string());
            format!("Connected to {} node {node}", mode.display_name())
        }
        Target::Talkgroup(talkgroup) if mode.resolves_through_directory() => {
            let snapshot = directory
                .snapshot()
                .ok_or(SwitchError::DirectoryUnavailable)?;
            let record = snapshot
                .resolve(talkgroup)
                .ok_or(SwitchError::NotFound { mode, talkgroup })?;
            let endpoint = record.endpoint();
            params.insert("talkgroup".into(), talkgroup.to_string());
            params.insert("host".into(), record.host.clone());
            params.insert("port".into(), record.port.to_string());
            params.insert("endpoint".into(), endpoint.clone());
            format!("Connected to {mode} talkgroup {talkgroup} ({endpoint})")
        }
        Target::Talkgroup(talkgroup) => {
            params.insert("talkgroup".into(), talkgroup.to_string());
            format!("Connected to {mode} talkgroup {talkgroup}")
        }
    };

    Ok((params, confirmation))
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Substitute `:param` placeholders in a command template.
///
/// One left-to-right pass over the template: a placeholder is the whole
/// `[A-Za-z_][A-Za-z0-9_]*` run after a `:`, the same rule config
/// validation applies. Substituted values are never rescanned, so a
/// register host that happens to contain `:port` is passed through as-is.
/// Unknown names are left in place.
fn substitute_params(template: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = if after.starts_with(is_name_start) {
            after.find(|c: char| !is_name_char(c)).unwrap_or(after.len())
        } else {
            0
        };
        let name = &after[..len];

        match params.get(name) {
            Some(value) if !name.is_empty() => out.push_str(value),
            _ => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}
