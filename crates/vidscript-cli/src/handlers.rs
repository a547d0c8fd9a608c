//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod generate;
mod pipeline;
mod providers;
mod resolve;
mod transcribe;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use generate::handle_generate;
pub use pipeline::handle_pipeline;
pub use providers::handle_providers;
pub use resolve::handle_resolve;
pub use transcribe::handle_transcribe;
pub use utils::{build_manager, print_report};
