//! Subcommand implementations.

pub mod config;
pub mod render;
pub mod rooms;
pub mod serve;

use std::sync::Arc;

use roomcal_providers::{FileScheduleProvider, HttpScheduleProvider, ScheduleProvider};
use tracing::info;

use crate::config::AppConfig;
use crate::error::CliResult;

/// Builds the schedule provider described by `[source]`.
///
/// A configured file wins over the URL.
pub fn build_provider(config: &AppConfig) -> CliResult<Arc<dyn ScheduleProvider>> {
    let provider: Arc<dyn ScheduleProvider> = match config.source.file {
        Some(ref path) => Arc::new(FileScheduleProvider::new(path)),
        None => Arc::new(HttpScheduleProvider::new(config.http_source()?)?),
    };
    info!(provider = provider.name(), source = %provider.source(), "Schedule provider ready");
    Ok(provider)
}
