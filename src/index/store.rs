//! Holder of the current snapshot.
//!
//! The `Arc<IndexSnapshot>` behind the `RwLock` is the only mutable shared
//! state in the engine. Readers hold the read lock just long enough to clone
//! the `Arc`; writers serialize on a separate mutex so a long build never
//! blocks readers, and publishing is a pointer swap under the write lock.

use crate::error::SearchResult;
use crate::index::snapshot::IndexSnapshot;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

pub struct IndexStore {
    current: RwLock<Arc<IndexSnapshot>>,
    writer: Mutex<()>,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new(IndexSnapshot::empty())
    }
}

impl IndexStore {
    pub fn new(initial: IndexSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            writer: Mutex::new(()),
        }
    }

    /// The last published snapshot. Stays valid for as long as the caller
    /// holds it, regardless of later publishes.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }

    /// Run one update with exclusive writer access.
    ///
    /// `build` receives the current snapshot and returns the next one, or
    /// `None` to publish nothing. Concurrent callers wait their turn; reads
    /// proceed against the current snapshot meanwhile.
    pub fn update<F>(&self, build: F) -> SearchResult<Arc<IndexSnapshot>>
    where
        F: FnOnce(&IndexSnapshot) -> SearchResult<Option<IndexSnapshot>>,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.snapshot();

        match build(base.as_ref())? {
            Some(next) => Ok(self.publish(next)),
            None => Ok(base),
        }
    }

    fn publish(&self, next: IndexSnapshot) -> Arc<IndexSnapshot> {
        let next = Arc::new(next);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(next.version() > guard.version());
        debug!(from = guard.version(), to = next.version(), "publishing snapshot");
        *guard = Arc::clone(&next);
        next
    }
}
