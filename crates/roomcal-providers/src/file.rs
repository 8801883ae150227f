//! Schedule provider reading a local JSON file.

use std::path::{Path, PathBuf};

use roomcal_core::EventRecord;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::http::decode_schedule;
use crate::provider::{BoxFuture, ScheduleProvider};

/// Reads the schedule from a file on every fetch.
#[derive(Debug, Clone)]
pub struct FileScheduleProvider {
    path: PathBuf,
}

impl FileScheduleProvider {
    /// Creates a provider for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the schedule file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn fetch(&self) -> ProviderResult<Vec<EventRecord>> {
        let body = tokio::fs::read(&self.path).await.map_err(|e| {
            ProviderError::io(format!("Failed to read {}: {}", self.path.display(), e))
                .with_source(e)
        })?;
        debug!(path = %self.path.display(), bytes = body.len(), "Read schedule file");
        decode_schedule(&body)
    }
}

impl ScheduleProvider for FileScheduleProvider {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch_schedule(&self) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>> {
        Box::pin(async move { self.fetch().await.map_err(|e| e.with_provider("file")) })
    }

    fn source(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn reads_schedule_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"Title": "Opening", "Place": "Saal1", "Start": "20130530-1723"}},
                {{"Title": "Lunch", "Place": ""}}
            ]"#
        )
        .unwrap();

        let provider = FileScheduleProvider::new(file.path());
        let events = provider.fetch_schedule().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Opening");
        assert!(!events[1].is_placed());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileScheduleProvider::new(dir.path().join("absent.json"));

        let err = provider.fetch_schedule().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::IoError);
        assert_eq!(err.provider(), Some("file"));
    }

    #[tokio::test]
    async fn malformed_file_is_invalid_response() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[{{\"Title\": ").unwrap();

        let err = FileScheduleProvider::new(file.path())
            .fetch_schedule()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }
}
