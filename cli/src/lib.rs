//! CLI utilities for aicall.
//!
//! This crate provides configuration contexts, output formatting and the
//! scripted session runner used by the `aicall` binary.

pub mod config;
pub mod output;
pub mod script;

pub use config::{Config, Context};
pub use output::{Output, OutputFormat};
pub use script::{run_script, Script, Step, Transcript, TranscriptEntry};
