//! Scripted session runner.

use aicall_bridge::logger::default_logger;
use aicall_cli::script::{load_script, run_script};
use clap::Args;

use super::{get_context, output, print_verbose, require_input_file};
use crate::Cli;

/// Run a script of commands and simulated engine callbacks.
///
/// Prints a transcript of command results, errors and emitted events.
#[derive(Args)]
pub struct RunCommand {
    /// Exit with an error if any command in the script failed
    #[arg(long)]
    strict: bool,
}

impl RunCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let path = require_input_file(cli)?;
        let script = load_script(path)?;
        let ctx = get_context(cli)?;

        print_verbose(cli, &format!("Script: {} ({} steps)", path, script.steps.len()));
        if !ctx.name.is_empty() {
            print_verbose(cli, &format!("Context: {}", ctx.name));
        }

        let transcript = run_script(&script, &ctx, default_logger()).await;
        output(cli).write(&transcript)?;

        let errors = transcript.error_codes();
        if self.strict && !errors.is_empty() {
            anyhow::bail!("{} command(s) failed: {}", errors.len(), errors.join(", "));
        }
        Ok(())
    }
}
