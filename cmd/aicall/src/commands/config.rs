//! Configuration management commands.

use aicall_bridge::AgentType;
use clap::{Args, Subcommand};

use super::{get_config, output, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts hold the bridge configuration used by `aicall run`,
/// similar to kubectl's context management.
///
/// Configuration is stored in ~/.aicall/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add or update a context
    #[command(name = "set-context")]
    SetContext {
        /// Context name
        name: String,
        /// Agent type: VoiceAgent, AvatarAgent or VisionAgent
        #[arg(long)]
        agent_type: Option<String>,
        /// Lowest engine error code that ends the call
        #[arg(long, conflicts_with = "no_fatal_errors")]
        fatal_error_floor: Option<i32>,
        /// Never end the call on engine errors
        #[arg(long)]
        no_fatal_errors: bool,
        /// Agent voice applied before each join
        #[arg(long)]
        voice_id: Option<String>,
        /// Event channel capacity
        #[arg(long)]
        event_buffer: Option<usize>,
        /// Milliseconds to wait for events after each script step
        #[arg(long)]
        settle_ms: Option<u64>,
    },
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// Display the current context
    #[command(name = "get-context")]
    GetContext,
    /// List all contexts
    #[command(name = "list", alias = "list-contexts")]
    List,
    /// View the current configuration
    View,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::SetContext {
                name,
                agent_type,
                fatal_error_floor,
                no_fatal_errors,
                voice_id,
                event_buffer,
                settle_ms,
            } => {
                let mut cfg = get_config(cli)?;
                let mut ctx = cfg.get_context(name).cloned().unwrap_or_default();

                if let Some(agent_type) = agent_type {
                    ctx.bridge.agent_type = AgentType::parse(agent_type)
                        .ok_or_else(|| anyhow::anyhow!("unknown agent type '{}'", agent_type))?;
                }
                if *no_fatal_errors {
                    ctx.bridge.fatal_error_floor = None;
                } else if let Some(floor) = fatal_error_floor {
                    ctx.bridge.fatal_error_floor = Some(*floor);
                }
                if let Some(voice_id) = voice_id {
                    ctx.bridge.call.agent_voice_id = Some(voice_id.clone());
                }
                if let Some(buffer) = event_buffer {
                    ctx.event_buffer = *buffer;
                }
                if let Some(ms) = settle_ms {
                    ctx.settle_ms = *ms;
                }

                cfg.set_context(name, ctx)?;
                print_success(&format!("Context \"{}\" saved", name));
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetContext => {
                let cfg = get_config(cli)?;
                if cfg.current_context.is_empty() {
                    println!("No current context set");
                } else {
                    println!("{}", cfg.current_context);
                }
                Ok(())
            }

            ConfigSubcommand::List => {
                let cfg = get_config(cli)?;
                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<12} {}", "CURRENT", "NAME", "AGENT_TYPE", "FATAL_FLOOR");
                for (name, ctx) in &cfg.contexts {
                    let current = if *name == cfg.current_context { "*" } else { "" };
                    let floor = ctx
                        .bridge
                        .fatal_error_floor
                        .map(|f| f.to_string())
                        .unwrap_or_else(|| "(none)".to_string());
                    println!(
                        "{:<8} {:<20} {:<12} {}",
                        current,
                        name,
                        ctx.bridge.agent_type.as_str(),
                        floor
                    );
                }
                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;
                eprintln!("Config file: {}", cfg.path().display());
                output(cli).write(&cfg)
            }
        }
    }
}
