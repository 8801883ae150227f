//! Rendered document cache.
//!
//! The cache holds one immutable [`Snapshot`] per refresh cycle: a map from
//! room key to the complete calendar document for that room. Publishing swaps
//! the whole snapshot at once, so a reader never sees documents from two
//! different cycles.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// A complete iCalendar document, cheap to clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument(Bytes);

impl RenderedDocument {
    /// Wraps rendered bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the document bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns a shared handle to the document bytes.
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Returns the document length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The output of one refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    documents: BTreeMap<String, RenderedDocument>,
    generation: u64,
    generated_at: Option<DateTime<Utc>>,
    event_count: usize,
}

impl Snapshot {
    /// Creates an empty snapshot stamped with the cycle time.
    pub fn new(generated_at: DateTime<Utc>, event_count: usize) -> Self {
        Self {
            documents: BTreeMap::new(),
            generation: 0,
            generated_at: Some(generated_at),
            event_count,
        }
    }

    /// Adds or replaces the document for `room`.
    pub fn insert(&mut self, room: impl Into<String>, document: RenderedDocument) {
        self.documents.insert(room.into(), document);
    }

    /// Returns the document for `room`.
    pub fn get(&self, room: &str) -> Option<&RenderedDocument> {
        self.documents.get(room)
    }

    /// Returns all room keys in sorted order.
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Returns all documents keyed by room.
    pub fn documents(&self) -> &BTreeMap<String, RenderedDocument> {
        &self.documents
    }

    /// Returns the number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if the snapshot holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Publication counter; 0 for the initial empty snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the cycle producing this snapshot started.
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    /// Number of upstream events the snapshot was built from.
    pub fn event_count(&self) -> usize {
        self.event_count
    }
}

/// Concurrently readable cache of the latest snapshot.
///
/// Readers hold the shared lock only long enough to clone an `Arc`; the
/// refresh task holds the exclusive lock only to swap it.
#[derive(Debug, Default)]
pub struct DocumentCache {
    current: RwLock<Arc<Snapshot>>,
}

/// Cache shared between the refresh task and request handlers.
pub type SharedCache = Arc<DocumentCache>;

impl DocumentCache {
    /// Creates a cache holding an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache ready to share across tasks.
    pub fn shared() -> SharedCache {
        Arc::new(Self::new())
    }

    /// Replaces the current snapshot and returns its generation.
    pub async fn publish(&self, mut snapshot: Snapshot) -> u64 {
        let mut current = self.current.write().await;
        snapshot.generation = current.generation + 1;
        let generation = snapshot.generation;
        let rooms = snapshot.len();
        *current = Arc::new(snapshot);
        drop(current);

        debug!(generation, rooms, "Published snapshot");
        generation
    }

    /// Returns the current snapshot.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Returns the document for `room` in the current snapshot.
    pub async fn lookup(&self, room: &str) -> Option<RenderedDocument> {
        let document = self.current.read().await.get(room).cloned();
        trace!(room, hit = document.is_some(), "Cache lookup");
        document
    }

    /// Returns the room keys of the current snapshot.
    pub async fn rooms(&self) -> Vec<String> {
        self.snapshot().await.rooms().map(str::to_owned).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(rooms: &[(&str, &str)]) -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now(), rooms.len());
        for (room, body) in rooms {
            snapshot.insert(*room, RenderedDocument::new(body.as_bytes().to_vec()));
        }
        snapshot
    }

    #[tokio::test]
    async fn starts_empty() {
        let cache = DocumentCache::new();
        let current = cache.snapshot().await;

        assert!(current.is_empty());
        assert_eq!(current.generation(), 0);
        assert!(current.generated_at().is_none());
        assert!(cache.lookup("Alle").await.is_none());
    }

    #[tokio::test]
    async fn publish_replaces_whole_snapshot() {
        let cache = DocumentCache::new();
        cache
            .publish(snapshot(&[("Alle", "a1"), ("Saal1", "s1"), ("Saal3", "s3")]))
            .await;
        assert_eq!(cache.rooms().await, vec!["Alle", "Saal1", "Saal3"]);

        let generation = cache.publish(snapshot(&[("Alle", "a2"), ("Saal1", "s2")])).await;

        assert_eq!(generation, 2);
        assert!(cache.lookup("Saal3").await.is_none());
        assert_eq!(
            cache.lookup("Saal1").await.unwrap().as_bytes(),
            b"s2".as_slice()
        );
    }

    #[tokio::test]
    async fn held_snapshot_survives_publish() {
        let cache = DocumentCache::new();
        cache.publish(snapshot(&[("Saal1", "old")])).await;
        let held = cache.snapshot().await;

        cache.publish(snapshot(&[("Saal1", "new")])).await;

        assert_eq!(held.get("Saal1").unwrap().as_bytes(), b"old".as_slice());
        assert_eq!(held.generation(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_mix_generations() {
        let cache = DocumentCache::shared();

        let writer = {
            let cache = cache.clone();
            tokio::spawn(async move {
                for round in 0..200 {
                    let tag = round.to_string();
                    let tag = tag.as_str();
                    cache
                        .publish(snapshot(&[("Alle", tag), ("Saal1", tag), ("Saal2", tag)]))
                        .await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let current = cache.snapshot().await;
                        let bodies: Vec<_> =
                            current.documents().values().map(|d| d.bytes()).collect();
                        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(cache.snapshot().await.generation(), 200);
    }

    #[test]
    fn document_is_cheap_to_clone() {
        let document = RenderedDocument::new(b"BEGIN:VCALENDAR\r\n".to_vec());
        let copy = document.clone();
        assert_eq!(copy.len(), 17);
        assert_eq!(copy.bytes().as_ptr(), document.bytes().as_ptr());
    }
}
