//! Canon service error type

use canon_buffer::BufferError;
use canon_loader::{LoadError, ResolveError};

/// Errors surfaced by the canon service.
///
/// Loader and resolver failures propagate synchronously to whoever called
/// `initial_load`/`reload`; drift-poll failures never appear here (they are
/// converted to "no drift" internally), and reclamation timeouts are logged
/// warnings with no synchronous caller to report to.
#[derive(Debug, thiserror::Error)]
pub enum CanonError {
    /// Canon path resolution failed
    #[error("canon resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Canon load or validation failed
    #[error("canon load failed: {0}")]
    Load(#[from] LoadError),

    /// Buffer state machine rejected the operation
    #[error("canon buffer error: {0}")]
    Buffer(#[from] BufferError),
}

impl CanonError {
    /// Whether the error left the system without any loaded canon.
    ///
    /// A failed `reload` keeps the previous version active, so only the
    /// not-loaded case means callers have nothing to read.
    #[inline]
    #[must_use]
    pub fn is_not_loaded(&self) -> bool {
        matches!(self, Self::Buffer(BufferError::NotLoaded))
    }
}
