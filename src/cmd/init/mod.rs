//! `linkswitch init`: generate a starter configuration file.
//!
//! The starter config is built in code for the given `--node` and then
//! serialized to the requested format, so every generated file passes
//! `linkswitch validate` unchanged. `--full` prefixes YAML output with a
//! commented guide to the step table.

mod serialize;

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::config::starter::starter_config;
use crate::error::LinkSwitchError;

const YAML_GUIDE: &str = "\
# linkswitch configuration
#
# directory:   where the YSF reflector register comes from and where the
#              last good snapshot is kept (refresh_interval 0 = startup only)
# controller:  teardown runs before every switch, then the steps of the
#              requested mode run in order; the first failure stops the run
#
# Placeholders usable in step args:
#   :node         ALLSTAR / ECHOLINK target node number
#   :talkgroup    talkgroup number (digital modes)
#   :bridge_mode  the mode's bridge_mode token
#   :endpoint     YSF reflector as host:port (also :host and :port)
#
# tables:      JSON files served by GET /data/{mode} for the operator form
";

pub fn execute(args: &InitArgs) -> Result<(), LinkSwitchError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("linkswitch.{}", args.format.extension())));

    if output.exists() {
        return Err(LinkSwitchError::FileExists { path: output });
    }

    let content = render(args.node, &args.format, args.full)?;
    std::fs::write(&output, content)?;

    println!("\u{2713} Created {} (node {})", output.display(), args.node);
    println!("\n  Next steps:");
    println!("    linkswitch validate {}", output.display());
    println!("    linkswitch refresh -c {}", output.display());
    println!("    linkswitch run -c {}", output.display());
    Ok(())
}

fn render(node: u32, format: &ConfigFormat, full: bool) -> Result<String, LinkSwitchError> {
    let body = serialize::serialize_config(&starter_config(node), format)?;
    if full && matches!(format, ConfigFormat::Yaml) {
        Ok(format!("{YAML_GUIDE}\n{body}"))
    } else {
        Ok(body)
    }
}
