//! Command line, configuration file and subcommands.
//!
//! This crate provides the `roomcal` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{CliError, CliResult};
