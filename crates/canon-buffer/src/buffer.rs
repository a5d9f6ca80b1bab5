//! Buffers and pipeline identity

use canon_document::SemanticVersion;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique pipeline identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipelineId(pub Uuid);

impl PipelineId {
    /// Generate new pipeline ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PipelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Buffer lifecycle state.
///
/// Transitions are internal to the manager and reaper; there is no external
/// transition API. `Active` is only ever entered through a swap (or the
/// initial install), `Draining` the instant a buffer is displaced, and
/// `Retired` once no pipeline reference remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferState {
    /// Slot allocated, nothing loaded
    Empty,
    /// Content being installed into the pending slot
    Loading,
    /// Pending buffer complete, eligible for swap
    Ready,
    /// The buffer new registrations receive
    Active,
    /// Displaced, kept alive by outstanding pipeline references
    Draining,
    /// Fully released
    Retired,
}

impl fmt::Display for BufferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Draining => "draining",
            Self::Retired => "retired",
        };
        f.write_str(s)
    }
}

/// One immutable in-memory snapshot of a canon version.
///
/// Shared as `Arc<Buffer>`; identity (`Arc::ptr_eq`) is what distinguishes
/// two buffers, never version equality - two loads of the same version are
/// still distinct buffers. Only `state` mutates after publication, and only
/// through the manager and the reaper.
#[derive(Debug)]
pub struct Buffer {
    version: SemanticVersion,
    content: Arc<str>,
    derived_prompt: String,
    state: RwLock<BufferState>,
    created_at: DateTime<Utc>,
}

impl Buffer {
    /// Construct a buffer in the given initial state
    #[must_use]
    pub(crate) fn new(
        version: SemanticVersion,
        content: Arc<str>,
        derived_prompt: String,
        state: BufferState,
    ) -> Arc<Self> {
        Arc::new(Self {
            version,
            content,
            derived_prompt,
            state: RwLock::new(state),
            created_at: Utc::now(),
        })
    }

    /// Canon version this buffer holds
    #[inline]
    #[must_use]
    pub fn version(&self) -> SemanticVersion {
        self.version
    }

    /// Full canon content
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Shared handle to the content, cloneable without copying
    #[inline]
    #[must_use]
    pub fn content_handle(&self) -> Arc<str> {
        Arc::clone(&self.content)
    }

    /// System prompt derived from this canon version
    #[inline]
    #[must_use]
    pub fn derived_prompt(&self) -> &str {
        &self.derived_prompt
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> BufferState {
        *self.state.read()
    }

    /// When this buffer was constructed
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether two handles refer to the same buffer object
    #[inline]
    #[must_use]
    pub fn same_buffer(a: &Arc<Self>, b: &Arc<Self>) -> bool {
        Arc::ptr_eq(a, b)
    }

    pub(crate) fn set_state(&self, state: BufferState) {
        *self.state.write() = state;
    }
}
