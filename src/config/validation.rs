//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors: an unusable directory source URL, missing or empty step tables,
//! empty programs, duplicate stage names, zero timeouts, and command
//! templates that reference placeholders the mode cannot supply. Returns a
//! list of [`ConfigIssue`] values with per-field suggestions.

use std::collections::HashSet;

use url::Url;

use super::model::{CommandSpec, Config, ModeProfile};
use crate::error::ConfigIssue;
use crate::link::plan::TEARDOWN_STAGE;
use crate::link::Mode;

/// Validate the directory source URL. Returns `Ok(())` or a human-readable error.
pub fn validate_source_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

/// Collect `:name` placeholders from a command template argument.
///
/// A placeholder is a `:` followed by a letter or underscore, then any run
/// of alphanumerics and underscores. `host:42000` and `http://` are not
/// placeholders.
#[must_use]
pub fn placeholder_names(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':'
            && bytes
                .get(i + 1)
                .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'_')
        {
            let start = i + 1;
            let mut end = start;
            while bytes
                .get(end)
                .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_')
            {
                end += 1;
            }
            names.push(&template[start..end]);
            i = end;
        } else {
            i += 1;
        }
    }
    names
}

pub fn validate(config: &Config) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if let Err(msg) = validate_source_url(&config.directory.source_url) {
        issues.push(issue("directory", "source_url", msg, None));
    }
    if config.directory.snapshot_path.as_os_str().is_empty() {
        issues.push(issue(
            "directory",
            "snapshot_path",
            "snapshot path cannot be empty".into(),
            Some("e.g. 'ysf.json'".into()),
        ));
    }
    if config.directory.timeout == 0 {
        issues.push(issue(
            "directory",
            "timeout",
            "must be greater than zero".into(),
            None,
        ));
    }

    let controller = &config.controller;
    if controller.timeout == 0 {
        issues.push(issue(
            "controller",
            "timeout",
            "must be greater than zero".into(),
            None,
        ));
    }
    validate_teardown(&controller.teardown, &mut issues);

    for mode in Mode::ALL {
        let section = format!("modes.{mode}");
        match controller.modes.get(&mode) {
            Some(profile) => validate_profile(mode, profile, &section, &mut issues),
            None => issues.push(issue(
                &section,
                "steps",
                format!("no step table configured for {mode}"),
                Some("run 'linkswitch init' to see the default table".into()),
            )),
        }
    }

    for (mode, path) in &config.tables {
        if *mode == Mode::Ysf {
            issues.push(issue(
                "tables",
                mode.as_str(),
                "YSF data is served from the ingested directory".into(),
                Some("remove this entry".into()),
            ));
        } else if path.as_os_str().is_empty() {
            issues.push(issue(
                "tables",
                mode.as_str(),
                "table path cannot be empty".into(),
                None,
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn validate_teardown(teardown: &CommandSpec, issues: &mut Vec<ConfigIssue>) {
    if teardown.program.trim().is_empty() {
        issues.push(issue(
            "controller.teardown",
            "program",
            "program cannot be empty".into(),
            None,
        ));
    }
    if teardown.timeout == Some(0) {
        issues.push(issue(
            "controller.teardown",
            "timeout",
            "must be greater than zero".into(),
            None,
        ));
    }
    let fields = std::iter::once(("program", teardown.program.as_str()))
        .chain(teardown.args.iter().map(|a| ("args", a.as_str())));
    for (field, text) in fields {
        if let Some(name) = placeholder_names(text).first() {
            issues.push(issue(
                "controller.teardown",
                field,
                format!("teardown cannot reference ':{name}'"),
                Some("teardown runs before the target is known".into()),
            ));
        }
    }
}

fn validate_profile(
    mode: Mode,
    profile: &ModeProfile,
    section: &str,
    issues: &mut Vec<ConfigIssue>,
) {
    if profile.steps.is_empty() {
        issues.push(issue(
            section,
            "steps",
            "at least one step must follow teardown".into(),
            None,
        ));
    }

    let allowed = mode.placeholders();
    let mut seen_stages = HashSet::new();

    for (i, step) in profile.steps.iter().enumerate() {
        let field = format!("steps[{i}]");

        if step.stage.trim().is_empty() {
            issues.push(issue(
                section,
                &field,
                "stage name cannot be empty".into(),
                None,
            ));
        } else if step.stage == TEARDOWN_STAGE {
            issues.push(issue(
                section,
                &field,
                format!("stage name '{TEARDOWN_STAGE}' is reserved"),
                Some("teardown is configured under controller.teardown".into()),
            ));
        } else if !seen_stages.insert(step.stage.as_str()) {
            issues.push(issue(
                section,
                &field,
                format!("duplicate stage '{}'", step.stage),
                None,
            ));
        }

        if step.program.trim().is_empty() {
            issues.push(issue(
                section,
                &format!("{field}.program"),
                "program cannot be empty".into(),
                None,
            ));
        }

        if step.timeout == Some(0) {
            issues.push(issue(
                section,
                &format!("{field}.timeout"),
                "must be greater than zero".into(),
                None,
            ));
        }

        // The program path is substituted like the args, so it is checked too.
        let templates = std::iter::once(("program", step.program.as_str()))
            .chain(step.args.iter().map(|a| ("args", a.as_str())));
        for (part, name) in
            templates.flat_map(|(part, t)| placeholder_names(t).into_iter().map(move |n| (part, n)))
        {
            if !allowed.contains(&name) {
                let available = allowed
                    .iter()
                    .map(|a| format!(":{a}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                issues.push(issue(
                    section,
                    &format!("{field}.{part}"),
                    format!("unknown placeholder ':{name}' for {mode}"),
                    Some(format!("available: {available}")),
                ));
            } else if name == "bridge_mode" && profile.bridge_mode.is_none() {
                issues.push(issue(
                    section,
                    "bridge_mode",
                    "':bridge_mode' is referenced but no bridge_mode is set".into(),
                    Some(format!("e.g. bridge_mode: {mode}")),
                ));
            }
        }
    }
}

fn issue(section: &str, field: &str, message: String, suggestion: Option<String>) -> ConfigIssue {
    ConfigIssue {
        section: section.to_string(),
        field: field.to_string(),
        message,
        suggestion,
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let controller = &config.controller;
    let mut lines = vec![format!(
        "  {} modes, {} steps, directory from {}\n",
        controller.modes.len(),
        config.total_steps(),
        config.directory.source_url
    )];

    for (mode, profile) in &controller.modes {
        let stages: Vec<&str> = std::iter::once(TEARDOWN_STAGE)
            .chain(profile.steps.iter().map(|s| s.stage.as_str()))
            .collect();
        lines.push(format!("  {mode}  -> {}", stages.join(" -> ")));
        if let Some(ref token) = profile.bridge_mode {
            lines.push(format!("    bridge mode: {token}"));
        }
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}
