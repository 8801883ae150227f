//! Document cache, refresh scheduler and HTTP surface.
//!
//! This crate provides the roomcal server that handles:
//! - Periodic refresh of the upstream schedule
//! - Grouping events by room and rendering one calendar per room
//! - An atomically swapped cache of rendered documents
//! - Serving the documents, a room index and a status report over HTTP
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use roomcal_core::CalendarRenderer;
//! use roomcal_providers::StaticProvider;
//! use roomcal_server::{AppState, DocumentCache, RefreshConfig, Refresher, UnknownRoomPolicy, router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let refresher = Refresher::new(
//!         Arc::new(StaticProvider::default()),
//!         CalendarRenderer::default(),
//!         DocumentCache::shared(),
//!         RefreshConfig::default(),
//!     );
//!     refresher.run_cycle().await?;
//!
//!     let app = router(AppState::new(refresher.cache(), refresher.health(), UnknownRoomPolicy::NotFound));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod http;
mod refresh;
mod scheduler;
mod signals;

pub use cache::{DocumentCache, RenderedDocument, SharedCache, Snapshot};
pub use config::{DEFAULT_BIND, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use http::{
    AppState, STATUS_KEY, SnapshotSummary, StatusReport, UnknownRoomPolicy, bind, render_index,
    router, serve,
};
pub use refresh::{
    CycleReport, DEFAULT_ALL_EVENTS_KEY, FetchFailurePolicy, RefreshConfig, RefreshHealth,
    RefreshPhase, Refresher, SharedHealth, group_by_room, new_health, render_snapshot,
};
pub use scheduler::{Scheduler, SchedulerCommand, SchedulerConfig, SchedulerExit, SchedulerHandle};
pub use signals::{ShutdownHandle, ShutdownSignal, SignalHandler};
