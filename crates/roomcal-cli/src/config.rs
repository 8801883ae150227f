//! Application configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/roomcal/config.toml` by default. Every section and key is
//! optional; command-line flags override file values.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use roomcal_core::{
    ConferenceClock, DEFAULT_LINE_WIDTH, DEFAULT_PRODUCT_ID, DescriptionPolicy, EndFallback,
    RendererOptions, TracingOutputFormat,
};
use roomcal_providers::{DEFAULT_SCHEDULE_URL, HttpSourceConfig};
use roomcal_server::{
    DEFAULT_ALL_EVENTS_KEY, DEFAULT_BIND, FetchFailurePolicy, ServerConfig, UnknownRoomPolicy,
};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::{CliError, CliResult};

/// Format of the conference bounds in `[calendar]`.
pub const LOCAL_INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M";

// ---------------------------------------------------------------------------
// AppConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for roomcal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the schedule comes from.
    pub source: SourceSettings,

    /// HTTP server and refresh settings.
    pub server: ServerSettings,

    /// Rendering settings.
    pub calendar: CalendarSettings,

    /// Log settings.
    pub logging: LoggingSettings,
}

/// Schedule source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Upstream schedule URL.
    pub url: String,

    /// Fetch timeout in seconds.
    pub timeout_secs: u64,

    /// Local schedule file; takes precedence over `url`.
    pub file: Option<PathBuf>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SCHEDULE_URL.to_string(),
            timeout_secs: HttpSourceConfig::DEFAULT_TIMEOUT_SECS,
            file: None,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address.
    pub bind: String,

    /// Seconds between refresh cycles.
    pub refresh_interval_secs: u64,

    /// `retain` keeps serving old documents, `abort` stops the server.
    pub on_fetch_error: FetchFailurePolicy,

    /// `not-found` (404) or `empty` (200 with empty body).
    pub unknown_room: UnknownRoomPolicy,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            refresh_interval_secs: 300,
            on_fetch_error: FetchFailurePolicy::default(),
            unknown_room: UnknownRoomPolicy::default(),
        }
    }
}

/// Calendar rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// IANA timezone the schedule's times are written in.
    pub timezone: String,

    /// Fallback start, `YYYY-MM-DDTHH:MM` local time.
    pub conference_start: String,

    /// Conference end, `YYYY-MM-DDTHH:MM` local time.
    pub conference_end: String,

    /// What an unusable `End` resolves to.
    pub end_fallback: EndFallback,

    /// Calendar `PRODID`.
    pub product_id: String,

    /// Fold width in octets.
    pub line_width: usize,

    /// Key of the document holding every event.
    pub all_events_key: String,

    /// How links shape descriptions.
    pub description: DescriptionPolicy,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            timezone: roomcal_core::DEFAULT_TIMEZONE.name().to_string(),
            conference_start: "2013-05-30T17:23".to_string(),
            conference_end: "2013-06-02T15:30".to_string(),
            end_fallback: EndFallback::default(),
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            line_width: DEFAULT_LINE_WIDTH,
            all_events_key: DEFAULT_ALL_EVENTS_KEY.to_string(),
            description: DescriptionPolicy::default(),
        }
    }
}

/// Log settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level (`error`..`trace`); `RUST_LOG` still wins.
    pub level: Option<String>,

    /// `pretty`, `compact` or `json`.
    pub format: Option<TracingOutputFormat>,
}

impl AppConfig {
    /// Loads configuration from the default path, or defaults if absent.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Loads `path` if given, the default file otherwise.
    pub fn resolve(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roomcal")
    }

    /// Checks every setting, reporting the first problem found.
    pub fn validate(&self) -> CliResult<()> {
        if self.source.file.is_none() {
            self.http_source()?;
        }
        if self.source.timeout_secs == 0 {
            return Err(CliError::Config("source.timeout_secs must be positive".into()));
        }
        if self.calendar.line_width == 0 {
            return Err(CliError::Config("calendar.line_width must be positive".into()));
        }
        if self.calendar.product_id.is_empty() {
            return Err(CliError::Config("calendar.product_id must not be empty".into()));
        }
        self.clock()?;
        self.level()?;
        self.server_config()?.validate()?;
        Ok(())
    }

    /// Returns the conference clock described by `[calendar]`.
    pub fn clock(&self) -> CliResult<ConferenceClock> {
        let calendar = &self.calendar;
        let tz = Tz::from_str(&calendar.timezone).map_err(|e| {
            CliError::Config(format!("unknown timezone '{}': {}", calendar.timezone, e))
        })?;
        let start = parse_local_instant("calendar.conference_start", &calendar.conference_start)?;
        let end = parse_local_instant("calendar.conference_end", &calendar.conference_end)?;

        let clock = ConferenceClock::from_local(tz, start, end).ok_or_else(|| {
            CliError::Config(format!(
                "conference bounds do not exist in {} (daylight saving gap)",
                calendar.timezone
            ))
        })?;
        Ok(clock.with_end_fallback(calendar.end_fallback))
    }

    /// Returns renderer settings.
    pub fn renderer_options(&self) -> CliResult<RendererOptions> {
        Ok(RendererOptions::default()
            .with_clock(self.clock()?)
            .with_product_id(&self.calendar.product_id)
            .with_line_width(self.calendar.line_width)
            .with_description(self.calendar.description))
    }

    /// Returns the HTTP source settings.
    pub fn http_source(&self) -> CliResult<HttpSourceConfig> {
        let config = HttpSourceConfig::new(&self.source.url)
            .map_err(|e| CliError::Config(format!("source.url: {}", e.message())))?;
        Ok(config.with_timeout(Duration::from_secs(self.source.timeout_secs)))
    }

    /// Returns the server settings.
    pub fn server_config(&self) -> CliResult<ServerConfig> {
        let bind = SocketAddr::from_str(&self.server.bind).map_err(|e| {
            CliError::Config(format!("invalid bind address '{}': {}", self.server.bind, e))
        })?;
        Ok(ServerConfig::new(bind)
            .with_refresh_interval(Duration::from_secs(self.server.refresh_interval_secs))
            .with_fetch_failure_policy(self.server.on_fetch_error)
            .with_unknown_room(self.server.unknown_room)
            .with_all_events_key(&self.calendar.all_events_key))
    }

    /// Returns the configured default log level, if any.
    pub fn level(&self) -> CliResult<Option<Level>> {
        self.logging
            .level
            .as_deref()
            .map(|level| {
                Level::from_str(level)
                    .map_err(|_| CliError::Config(format!("unknown log level '{}'", level)))
            })
            .transpose()
    }
}

fn parse_local_instant(key: &str, value: &str) -> CliResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_INSTANT_FORMAT).map_err(|e| {
        CliError::Config(format!(
            "{} '{}' is not YYYY-MM-DDTHH:MM: {}",
            key, value, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.server.refresh_interval_secs, 300);
        assert_eq!(config.calendar.all_events_key, "Alle");
        assert_eq!(config.calendar.timezone, "Europe/Berlin");
        assert_eq!(config.clock().unwrap(), ConferenceClock::default());
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn parses_full_file() {
        let config = AppConfig::parse(
            r#"
[source]
url = "https://example.org/schedule.json"
timeout_secs = 10

[server]
bind = "127.0.0.1:9000"
refresh_interval_secs = 60
on_fetch_error = "abort"
unknown_room = "empty"

[calendar]
timezone = "Europe/Vienna"
conference_start = "2024-05-30T10:00"
conference_end = "2024-06-02T18:00"
end_fallback = "conference-end"
product_id = "-//example//gpn//EN"
line_width = 60
all_events_key = "All"
description = "append-link"

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.on_fetch_error, FetchFailurePolicy::Abort);
        assert_eq!(config.server.unknown_room, UnknownRoomPolicy::EmptyDocument);
        assert_eq!(config.calendar.end_fallback, EndFallback::ConferenceEnd);
        assert_eq!(config.calendar.description, DescriptionPolicy::AppendLink);
        assert_eq!(config.logging.format, Some(TracingOutputFormat::Json));
        assert_eq!(config.level().unwrap(), Some(Level::DEBUG));

        let server = config.server_config().unwrap();
        assert_eq!(server.bind.port(), 9000);
        assert_eq!(server.all_events_key, "All");
        assert!(server.scheduler().halt_on_failure);

        let http = config.http_source().unwrap();
        assert_eq!(http.timeout, Duration::from_secs(10));

        let options = config.renderer_options().unwrap();
        assert_eq!(options.line_width, 60);
        assert_eq!(options.clock.timezone(), chrono_tz::Europe::Vienna);
    }

    #[test]
    fn validation_reports_bad_values() {
        let cases = [
            ("[calendar]\ntimezone = \"Mars/Olympus\"", "unknown timezone"),
            ("[calendar]\nconference_start = \"30.05.2013\"", "conference_start"),
            ("[calendar]\nline_width = 0", "line_width"),
            ("[server]\nrefresh_interval_secs = 0", "refresh interval"),
            ("[server]\nbind = \"localhost\"", "bind address"),
            ("[source]\nurl = \"not a url\"", "source.url"),
            ("[logging]\nlevel = \"loud\"", "log level"),
        ];
        for (toml, expected) in cases {
            let err = AppConfig::parse(toml).unwrap().validate().unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{toml:?}: {err} does not mention {expected}"
            );
        }
    }

    #[test]
    fn file_source_skips_url_validation() {
        let config = AppConfig::parse(
            "[source]\nurl = \"not a url\"\nfile = \"/srv/fahrplan.json\"",
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_policy_value_is_rejected() {
        assert!(AppConfig::parse("[server]\non_fetch_error = \"panic\"").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"127.0.0.1:8080\"").unwrap();

        let config = AppConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn dump_round_trips() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(AppConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn default_path_ends_with_roomcal() {
        let path = AppConfig::default_path();
        assert!(path.ends_with("roomcal/config.toml"));
    }
}
