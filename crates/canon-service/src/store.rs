//! Single-slot version record for status reporting
//!
//! Distinct from the buffers pipelines hold: the store answers "what is the
//! platform currently on" for health and status surfaces, nothing more.

use canon_document::SemanticVersion;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct StoreEntry {
    version: SemanticVersion,
    content: Arc<str>,
    loaded_at: DateTime<Utc>,
}

/// Record of the currently loaded canon version
#[derive(Debug, Default)]
pub struct VersionStore {
    slot: RwLock<Option<StoreEntry>>,
}

impl VersionStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a newly loaded version
    pub fn record(&self, version: SemanticVersion, content: Arc<str>, loaded_at: DateTime<Utc>) {
        *self.slot.write() = Some(StoreEntry {
            version,
            content,
            loaded_at,
        });
    }

    /// Version currently recorded, if any
    #[inline]
    #[must_use]
    pub fn current_version(&self) -> Option<SemanticVersion> {
        self.slot.read().as_ref().map(|e| e.version)
    }

    /// Raw content of the recorded version
    #[inline]
    #[must_use]
    pub fn content(&self) -> Option<Arc<str>> {
        self.slot.read().as_ref().map(|e| Arc::clone(&e.content))
    }

    /// When the recorded version was loaded
    #[inline]
    #[must_use]
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.slot.read().as_ref().map(|e| e.loaded_at)
    }
}

/// Serializable status snapshot for external reporting
#[derive(Debug, Clone, Serialize)]
pub struct CanonStatus {
    /// Currently active canon version
    pub version: Option<SemanticVersion>,
    /// When the active version was loaded
    pub loaded_at: Option<DateTime<Utc>>,
    /// Pipelines currently registered
    pub registered_pipelines: usize,
    /// Whether a pending buffer is staged (should be transiently true at most)
    pub pending_load: bool,
    /// Displaced generations retired after draining naturally
    pub retired_generations: u64,
    /// Displaced generations force-retired at the drain ceiling
    pub forced_retirements: u64,
}
