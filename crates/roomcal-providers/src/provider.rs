//! ScheduleProvider trait definition.
//!
//! This module defines the [`ScheduleProvider`] trait, the seam between the
//! refresh cycle and wherever the upstream schedule comes from.

use std::future::Future;
use std::pin::Pin;

use roomcal_core::EventRecord;

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe, so the server can hold an
/// `Arc<dyn ScheduleProvider>` chosen at runtime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source of the complete conference schedule.
///
/// Every call returns the full event sequence in upstream order; there is no
/// incremental fetching.
///
/// # Example Implementation
///
/// ```ignore
/// struct FixtureProvider(Vec<EventRecord>);
///
/// impl ScheduleProvider for FixtureProvider {
///     fn name(&self) -> &str { "fixture" }
///
///     fn fetch_schedule(&self) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>> {
///         let events = self.0.clone();
///         Box::pin(async move { Ok(events) })
///     }
/// }
/// ```
pub trait ScheduleProvider: Send + Sync {
    /// Returns the name/type of this provider (e.g., "http", "file").
    fn name(&self) -> &str;

    /// Fetches the full schedule.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on transport, timeout or decode failures.
    fn fetch_schedule(&self) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>>;

    /// Human-readable description of where the schedule comes from.
    fn source(&self) -> String {
        self.name().to_string()
    }
}

/// A provider that always returns the same events.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    events: Vec<EventRecord>,
}

impl StaticProvider {
    /// Creates a provider returning `events` on every fetch.
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }
}

impl ScheduleProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_schedule(&self) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>> {
        let events = self.events.clone();
        Box::pin(async move { Ok(events) })
    }
}

/// A provider that always returns an error.
///
/// This is useful for testing or as a placeholder when a provider
/// fails to initialize.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    /// Creates a new error provider.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl ScheduleProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_schedule(&self) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>> {
        // ProviderError is not Clone; rebuild it from its parts.
        let error =
            ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}
