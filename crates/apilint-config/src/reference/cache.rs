//! Per-run document cache
//!
//! Keyed by [`SourceId`] so every reference to one physical source shares a
//! single parse, including references requested concurrently.

use crate::source::{RawDocument, Source, SourceId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

type LoadResult = Result<Arc<RawDocument>, String>;

/// Cache of loaded documents for one resolution run
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: DashMap<SourceId, Arc<OnceCell<LoadResult>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with an already loaded document
    pub fn insert(&self, document: Arc<RawDocument>) {
        let cell = OnceCell::new_with(Some(Ok(document.clone())));
        self.entries.insert(document.source_id(), Arc::new(cell));
    }

    /// Load `source`, or wait for / reuse an in-flight or finished load
    pub async fn load(&self, source: &Source) -> LoadResult {
        let id = source.id();
        // Clone the cell out so the map shard is not locked across the await
        let cell = self.entries.entry(id.clone()).or_default().clone();

        cell.get_or_init(|| async {
            tracing::debug!("Loading $ref target: {}", id);
            source.load().await.map(Arc::new).map_err(|e| e.to_string())
        })
        .await
        .clone()
    }

    /// Number of distinct sources requested so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
