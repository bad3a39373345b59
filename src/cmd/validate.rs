//! `linkswitch validate`: check a configuration file for errors.
//!
//! Parses and validates the config file, reporting results as text
//! (with the per-mode step sequence) or as JSON.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::LinkSwitchError;

pub fn execute(args: &ValidateArgs) -> Result<(), LinkSwitchError> {
    let path = &args.config;

    if !path.exists() {
        return Err(LinkSwitchError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(issues) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} problems\n", path.display(), issues.len());
                for issue in &issues {
                    eprintln!("{issue}");
                }
            }
            ValidateFormat::Json => {
                let json_issues: Vec<serde_json::Value> = issues
                    .iter()
                    .map(|i| {
                        serde_json::json!({
                            "section": i.section,
                            "field": i.field,
                            "message": i.message,
                            "suggestion": i.suggestion,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({ "valid": false, "issues": json_issues })
                );
            }
        }
        return Err(LinkSwitchError::ConfigValidation { issues });
    }

    match args.format {
        ValidateFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &config)
            );
        }
        ValidateFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "modes": config.controller.modes.len(),
                    "steps": config.total_steps(),
                    "tables": config.tables.len(),
                })
            );
        }
    }

    Ok(())
}
