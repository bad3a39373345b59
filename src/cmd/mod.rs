//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the matching
//! handler: [`run`], [`init`], [`validate`], [`health`] or [`refresh`].

pub mod health;
pub mod init;
pub mod refresh;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::LinkSwitchError;

pub async fn dispatch(cli: Cli) -> Result<(), LinkSwitchError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        Some(Commands::Refresh(args)) => refresh::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  linkswitch v{version}: repeater link switching service\n\n  \
         No command provided. To get started:\n\n    \
         linkswitch init --node 57686      Generate a starter config\n    \
         linkswitch refresh                Download the YSF reflector directory\n    \
         linkswitch run                    Start the server (auto-detects ./linkswitch.yaml)\n    \
         linkswitch --help                 See all commands and options\n"
    );
}
