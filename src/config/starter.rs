//! Starter configuration for a DVSwitch-style AllStar node.
//!
//! Teardown drops every link on the local node (`ilink 6`). Analog modes
//! dial the target through the node's function codes; digital modes first
//! connect the local bridge node, then select the bridge mode and tune.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::model::{CommandSpec, Config, ControllerConfig, DirectoryConfig, ModeProfile, StepSpec};
use crate::link::Mode;

const ASTERISK: &str = "/usr/sbin/asterisk";
const DVSWITCH: &str = "/opt/MMDVM_Bridge/dvswitch.sh";

/// Private AllStar node that carries audio into MMDVM_Bridge.
pub const BRIDGE_NODE: u32 = 1999;

fn asterisk(stage: &str, command: String) -> StepSpec {
    StepSpec {
        stage: stage.to_string(),
        program: ASTERISK.to_string(),
        args: vec!["-rx".to_string(), command],
        timeout: None,
    }
}

fn dvswitch(stage: &str, args: &[&str]) -> StepSpec {
    StepSpec {
        stage: stage.to_string(),
        program: DVSWITCH.to_string(),
        args: args.iter().map(|a| (*a).to_string()).collect(),
        timeout: None,
    }
}

fn digital(node: u32, bridge_mode: &str, tune_to: &str) -> ModeProfile {
    ModeProfile {
        bridge_mode: Some(bridge_mode.to_string()),
        steps: vec![
            asterisk("bridge-link", format!("rpt fun {node} *3{BRIDGE_NODE}")),
            dvswitch("mode-select", &["mode", ":bridge_mode"]),
            dvswitch("tune", &["tune", tune_to]),
        ],
    }
}

/// Build the starter config for local node `node`.
#[must_use]
pub fn starter_config(node: u32) -> Config {
    let mut modes = BTreeMap::new();
    modes.insert(
        Mode::Allstar,
        ModeProfile {
            bridge_mode: None,
            steps: vec![asterisk("establish", format!("rpt fun {node} *3:node"))],
        },
    );
    modes.insert(
        Mode::Echolink,
        ModeProfile {
            bridge_mode: None,
            steps: vec![asterisk("establish", format!("rpt fun {node} *33:node"))],
        },
    );
    modes.insert(Mode::Ysf, digital(node, "YSF", ":endpoint"));
    // BrandMeister DMR runs through the bridge's STFU mode.
    modes.insert(Mode::Brandmeister, digital(node, "STFU", ":talkgroup"));
    modes.insert(Mode::Dmr, digital(node, "DMR", ":talkgroup"));
    modes.insert(Mode::Nxdn, digital(node, "NXDN", ":talkgroup"));
    modes.insert(Mode::P25, digital(node, "P25", ":talkgroup"));

    let tables = [
        (Mode::Allstar, "/switchapp/allstar_json/allstardata.json"),
        (Mode::Echolink, "/switchapp/echolink_json/echolinkdata.json"),
        (Mode::Brandmeister, "/switchapp/digitalmodes/dmr_bm_talkgroups.json"),
        (Mode::Dmr, "/switchapp/digitalmodes/dmr_tgif_talkgroups.json"),
        (Mode::Nxdn, "/switchapp/digitalmodes/nxdn.json"),
        (Mode::P25, "/switchapp/digitalmodes/p25.json"),
    ]
    .into_iter()
    .map(|(mode, path)| (mode, PathBuf::from(path)))
    .collect();

    Config {
        directory: DirectoryConfig::default(),
        controller: ControllerConfig {
            timeout: 5000,
            teardown: CommandSpec {
                program: ASTERISK.to_string(),
                args: vec!["-rx".to_string(), format!("rpt cmd {node} ilink 6 0")],
                timeout: None,
            },
            modes,
        },
        tables,
    }
}
