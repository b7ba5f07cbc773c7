//! Utility functions for CLI commands.

use aicall_cli::config::{load_config, Config, Context};
use aicall_cli::Output;

use crate::Cli;

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(cli.config.as_deref())
}

/// Gets the context to use: `-c`, else the current context, else defaults.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    get_config(cli)?.resolve_context(cli.context.as_deref())
}

/// Requires input file to be provided.
pub fn require_input_file(cli: &Cli) -> anyhow::Result<&str> {
    cli.input
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("input file is required, use -f flag"))
}

/// Returns the output selected by the global flags.
pub fn output(cli: &Cli) -> Output {
    Output::from_flags(cli.json, cli.output.as_deref())
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}
