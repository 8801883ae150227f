//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use roomcal_core::{TracingConfig, TracingOutputFormat};

use crate::config::AppConfig;

/// roomcal - conference schedules as per-room iCalendar feeds
#[derive(Debug, Parser)]
#[command(name = "roomcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ROOMCAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<TracingOutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Builds the tracing configuration for the selected command.
    ///
    /// `serve` logs at info with timestamps; one-shot commands only warn.
    /// `--debug` wins over the config file, which wins over the defaults.
    pub fn tracing_config(&self, config: &AppConfig) -> TracingConfig {
        let mut tracing = if self.debug {
            TracingConfig::cli_debug()
        } else if matches!(self.command, Command::Serve(_)) {
            TracingConfig::server()
        } else {
            TracingConfig::default()
        };

        if !self.debug
            && let Ok(Some(level)) = config.level()
        {
            tracing = tracing.with_level(level);
        }

        if let Some(format) = self.log_format.or(config.logging.format) {
            tracing = tracing.with_format(format);
        }
        tracing
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve per-room calendars over HTTP, refreshing periodically
    Serve(ServeArgs),

    /// Render one calendar and exit
    Render(RenderArgs),

    /// List room keys with event counts
    Rooms(SourceArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Where to read the schedule from, overriding `[source]`.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Read the schedule from a local JSON file
    #[arg(long, conflicts_with = "source_url")]
    pub file: Option<PathBuf>,

    /// Fetch the schedule from this URL
    #[arg(long)]
    pub source_url: Option<String>,
}

impl SourceArgs {
    /// Applies the flags on top of the file configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(ref file) = self.file {
            config.source.file = Some(file.clone());
        }
        if let Some(ref url) = self.source_url {
            config.source.url = url.clone();
            config.source.file = None;
        }
    }
}

/// Arguments of `roomcal serve`.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Seconds between refreshes
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Exit with an error when a refresh fails instead of serving old data
    #[arg(long)]
    pub abort_on_fetch_error: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl ServeArgs {
    /// Applies the flags on top of the file configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        self.source.apply(config);
        if let Some(bind) = self.bind {
            config.server.bind = bind.to_string();
        }
        if let Some(interval) = self.interval {
            config.server.refresh_interval_secs = interval;
        }
        if self.abort_on_fetch_error {
            config.server.on_fetch_error = roomcal_server::FetchFailurePolicy::Abort;
        }
    }
}

/// Arguments of `roomcal render`.
#[derive(Debug, Clone, Default, Args)]
pub struct RenderArgs {
    /// Room to render; defaults to the all-events calendar
    #[arg(long)]
    pub room: Option<String>,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
