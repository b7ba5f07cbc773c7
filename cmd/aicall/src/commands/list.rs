//! Supported host commands.

use aicall_bridge::COMMAND_NAMES;
use clap::Args;

use super::output;
use crate::Cli;

/// List the command names the bridge understands.
#[derive(Args)]
pub struct CommandsCommand {}

impl CommandsCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        if cli.json || cli.output.is_some() {
            return output(cli).write(&COMMAND_NAMES);
        }
        for name in COMMAND_NAMES {
            println!("{}", name);
        }
        Ok(())
    }
}
