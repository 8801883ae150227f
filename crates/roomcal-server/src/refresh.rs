//! The refresh cycle: fetch, group by room, render, publish.
//!
//! A cycle runs through [`RefreshPhase`]s in order. Everything expensive
//! happens before the cache lock is taken; publishing is a single swap. A
//! failed fetch ends the cycle early and leaves the published snapshot as it
//! was.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use roomcal_core::{CalendarRenderer, EventRecord};
use roomcal_providers::ScheduleProvider;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{RenderedDocument, SharedCache, Snapshot};
use crate::error::ServerResult;
use crate::http::STATUS_KEY;

/// Key of the document holding every event, placed or not.
pub const DEFAULT_ALL_EVENTS_KEY: &str = "Alle";

/// Where a refresh cycle currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
    Grouping,
    Rendering,
    Publishing,
}

/// What a failed fetch does to the refresh loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchFailurePolicy {
    /// Log, record the error and keep serving the previous snapshot.
    #[default]
    Retain,
    /// Stop refreshing; the process exits with a failure.
    Abort,
}

impl FetchFailurePolicy {
    /// Returns true if the scheduler should stop after a failed cycle.
    pub fn halts(&self) -> bool {
        matches!(self, Self::Abort)
    }
}

/// Refresh health, served by the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshHealth {
    /// Current phase.
    pub phase: RefreshPhase,
    /// Completed cycles, successful or not.
    pub cycles: u64,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Last successful publish.
    pub last_success: Option<DateTime<Utc>>,
    /// Last cycle start.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Error of the last failed cycle, cleared on success.
    pub last_error: Option<String>,
}

impl RefreshHealth {
    /// Records a cycle that published a snapshot.
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.cycles += 1;
        self.consecutive_failures = 0;
        self.last_success = Some(at);
        self.last_error = None;
        self.phase = RefreshPhase::Idle;
    }

    /// Records a cycle that ended without publishing.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.cycles += 1;
        self.consecutive_failures += 1;
        self.last_error = Some(error.into());
        self.phase = RefreshPhase::Idle;
    }
}

/// Shared refresh health.
pub type SharedHealth = Arc<RwLock<RefreshHealth>>;

/// Creates a new shared health record.
pub fn new_health() -> SharedHealth {
    Arc::new(RwLock::new(RefreshHealth::default()))
}

/// Groups placed events by room, keeping upstream order within each room.
pub fn group_by_room(events: &[EventRecord]) -> BTreeMap<&str, Vec<&EventRecord>> {
    let mut rooms: BTreeMap<&str, Vec<&EventRecord>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.is_placed()) {
        rooms.entry(event.place.as_str()).or_default().push(event);
    }
    rooms
}

/// Renders the all-events document and one document per room.
///
/// A room named like `all_events_key` is skipped; the all-events document
/// keeps the key. A room named like the status endpoint is skipped too.
pub fn render_snapshot(
    renderer: &CalendarRenderer,
    events: &[EventRecord],
    all_events_key: &str,
    stamp: DateTime<Utc>,
) -> ServerResult<Snapshot> {
    let rooms = group_by_room(events);
    let mut snapshot = Snapshot::new(stamp, events.len());

    snapshot.insert(
        all_events_key,
        RenderedDocument::new(renderer.render(events, stamp)?),
    );

    for (room, room_events) in rooms {
        if room == all_events_key {
            warn!(
                room,
                events = room_events.len(),
                "Room name collides with the all-events key, skipping room document"
            );
            continue;
        }
        if room == STATUS_KEY {
            warn!(
                room,
                events = room_events.len(),
                "Room name collides with the status endpoint, skipping room document"
            );
            continue;
        }
        let document = renderer.render(room_events, stamp)?;
        snapshot.insert(room, RenderedDocument::new(document));
    }

    Ok(snapshot)
}

/// Refresh cycle settings.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Key of the all-events document.
    pub all_events_key: String,
    /// What a failed fetch does.
    pub on_fetch_error: FetchFailurePolicy,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            all_events_key: DEFAULT_ALL_EVENTS_KEY.to_string(),
            on_fetch_error: FetchFailurePolicy::default(),
        }
    }
}

impl RefreshConfig {
    /// Builder: set the all-events key.
    pub fn with_all_events_key(mut self, key: impl Into<String>) -> Self {
        self.all_events_key = key.into();
        self
    }

    /// Builder: set the fetch failure policy.
    pub fn with_fetch_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.on_fetch_error = policy;
        self
    }
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub generation: u64,
    pub events: usize,
    pub documents: usize,
}

/// Runs refresh cycles against one provider and one cache.
#[derive(Clone)]
pub struct Refresher {
    provider: Arc<dyn ScheduleProvider>,
    renderer: CalendarRenderer,
    cache: SharedCache,
    health: SharedHealth,
    config: RefreshConfig,
}

impl Refresher {
    pub fn new(
        provider: Arc<dyn ScheduleProvider>,
        renderer: CalendarRenderer,
        cache: SharedCache,
        config: RefreshConfig,
    ) -> Self {
        Self {
            provider,
            renderer,
            cache,
            health: new_health(),
            config,
        }
    }

    /// Returns the shared health record.
    pub fn health(&self) -> SharedHealth {
        self.health.clone()
    }

    /// Returns the cache this refresher publishes into.
    pub fn cache(&self) -> SharedCache {
        self.cache.clone()
    }

    /// Returns the refresh settings.
    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    async fn enter(&self, phase: RefreshPhase) {
        self.health.write().await.phase = phase;
        debug!(?phase, "Refresh phase");
    }

    /// Runs one cycle.
    ///
    /// On error the cache is untouched and the failure is recorded in the
    /// health record.
    pub async fn run_cycle(&self) -> ServerResult<CycleReport> {
        let started = Instant::now();
        let stamp = Utc::now();
        self.health.write().await.last_attempt = Some(stamp);

        match self.cycle(stamp).await {
            Ok(report) => {
                self.health.write().await.record_success(stamp);
                info!(
                    generation = report.generation,
                    events = report.events,
                    documents = report.documents,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Refresh completed"
                );
                Ok(report)
            }
            Err(e) => {
                self.health.write().await.record_failure(e.to_string());
                warn!(
                    error = %e,
                    source = %self.provider.source(),
                    "Refresh failed, keeping previous documents"
                );
                Err(e)
            }
        }
    }

    async fn cycle(&self, stamp: DateTime<Utc>) -> ServerResult<CycleReport> {
        self.enter(RefreshPhase::Fetching).await;
        let events = self.provider.fetch_schedule().await?;
        debug!(events = events.len(), provider = self.provider.name(), "Fetched schedule");

        self.enter(RefreshPhase::Grouping).await;
        let rooms = group_by_room(&events).len();
        debug!(rooms, "Grouped events by room");

        self.enter(RefreshPhase::Rendering).await;
        let snapshot =
            render_snapshot(&self.renderer, &events, &self.config.all_events_key, stamp)?;
        let documents = snapshot.len();

        self.enter(RefreshPhase::Publishing).await;
        let generation = self.cache.publish(snapshot).await;

        Ok(CycleReport {
            generation,
            events: events.len(),
            documents,
        })
    }
}
