//! ScheduleProvider trait and implementations.
//!
//! This crate provides the abstraction layer for schedule sources:
//!
//! - [`ScheduleProvider`] - The trait every source implements
//! - [`HttpScheduleProvider`] - Upstream JSON over HTTP
//! - [`FileScheduleProvider`] - A local JSON file
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  HTTP endpoint  │    │   JSON file     │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │  HttpSchedule   │    │  FileSchedule   │
//! │    Provider     │    │    Provider     │
//! └────────┬────────┘    └────────┬────────┘
//!          │   ScheduleProvider   │
//!          └──────────┬───────────┘
//!                     ▼
//!           ┌───────────────────┐
//!           │ Vec<EventRecord>  │
//!           └───────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use roomcal_providers::{HttpScheduleProvider, HttpSourceConfig, ScheduleProvider};
//!
//! let provider = HttpScheduleProvider::new(HttpSourceConfig::new(url)?)?;
//! let events = provider.fetch_schedule().await?;
//! ```

pub mod error;
pub mod file;
pub mod http;
pub mod provider;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use file::FileScheduleProvider;
pub use http::{DEFAULT_SCHEDULE_URL, HttpScheduleProvider, HttpSourceConfig, decode_schedule};
pub use provider::{BoxFuture, ErrorProvider, ScheduleProvider, StaticProvider};
