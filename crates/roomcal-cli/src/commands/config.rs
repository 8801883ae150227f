//! Configuration commands.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &AppConfig, path: Option<&Path>) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    let source = path.map_or_else(AppConfig::default_path, Path::to_path_buf);
    println!("# config.toml ({})", source.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &AppConfig) -> CliResult<()> {
    config.validate()?;
    match config.source.file {
        Some(ref file) => println!("Schedule file: {}", file.display()),
        None => println!("Schedule URL: {}", config.source.url),
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: Option<&Path>) -> CliResult<()> {
    let config_path = path.map_or_else(AppConfig::default_path, Path::to_path_buf);
    let state = if config_path.exists() { "" } else { " (not found, using defaults)" };
    println!("config: {}{}", config_path.display(), state);
    Ok(())
}
