//! CLI commands module.

mod config;
mod list;
mod run;
mod util;

pub use config::ConfigCommand;
pub use list::CommandsCommand;
pub use run::RunCommand;

pub(crate) use util::*;
