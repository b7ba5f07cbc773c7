//! aicall CLI - drive the call session bridge from the command line.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CommandsCommand, ConfigCommand, RunCommand};

/// aicall CLI - drive the call session bridge from the command line.
///
/// Scripts run against a simulated engine, so command handling, state
/// transitions and event normalization can be exercised without a device.
///
/// Configuration is stored in ~/.aicall/config.yaml and supports multiple
/// contexts, similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "aicall")]
#[command(about = "Call session bridge CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.aicall/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input script file (YAML or JSON)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Run a scripted session against the simulated engine
    Run(RunCommand),
    /// List supported host commands
    Commands(CommandsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_target(false)
            .init();
    }

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Run(cmd) => cmd.run(&cli).await,
        Commands::Commands(cmd) => cmd.run(&cli).await,
    }
}
