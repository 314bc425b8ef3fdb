//! SimpleChat CLI library
//!
//! Argument parsing, configuration loading and the two role entry points
//! (`server` and `client`) used by the `simplechat` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use config::AppConfig;
pub use error::{CliError, Result};
