//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{ServerError, ServerResult};
use crate::http::UnknownRoomPolicy;
use crate::refresh::{DEFAULT_ALL_EVENTS_KEY, FetchFailurePolicy, RefreshConfig};
use crate::scheduler::SchedulerConfig;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,

    /// Interval between refresh cycles.
    pub refresh_interval: Duration,

    /// What a failed fetch does.
    pub on_fetch_error: FetchFailurePolicy,

    /// Response for rooms without a document.
    pub unknown_room: UnknownRoomPolicy,

    /// Key of the all-events document.
    pub all_events_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            refresh_interval: Duration::from_secs(300),
            on_fetch_error: FetchFailurePolicy::default(),
            unknown_room: UnknownRoomPolicy::default(),
            all_events_key: DEFAULT_ALL_EVENTS_KEY.to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration listening on `bind`.
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            ..Default::default()
        }
    }

    /// Builder: set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Builder: set the fetch failure policy.
    pub fn with_fetch_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.on_fetch_error = policy;
        self
    }

    /// Builder: set the unknown room policy.
    pub fn with_unknown_room(mut self, policy: UnknownRoomPolicy) -> Self {
        self.unknown_room = policy;
        self
    }

    /// Builder: set the all-events key.
    pub fn with_all_events_key(mut self, key: impl Into<String>) -> Self {
        self.all_events_key = key.into();
        self
    }

    /// Checks values the types cannot rule out.
    pub fn validate(&self) -> ServerResult<()> {
        if self.refresh_interval.is_zero() {
            return Err(ServerError::config("refresh interval must be positive"));
        }
        if self.all_events_key.is_empty() {
            return Err(ServerError::config("all-events key must not be empty"));
        }
        if self.all_events_key.starts_with('_') {
            return Err(ServerError::config(format!(
                "all-events key '{}' collides with reserved paths",
                self.all_events_key
            )));
        }
        Ok(())
    }

    /// Returns the refresh cycle settings.
    pub fn refresh(&self) -> RefreshConfig {
        RefreshConfig::default()
            .with_all_events_key(&self.all_events_key)
            .with_fetch_failure_policy(self.on_fetch_error)
    }

    /// Returns the scheduler settings.
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::new(self.refresh_interval)
            .with_halt_on_failure(self.on_fetch_error.halts())
    }
}
