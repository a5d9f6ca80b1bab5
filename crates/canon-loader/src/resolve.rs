//! Canon path resolution
//!
//! Pure resolution plus existence check; no reads, no fallback chains. An
//! override that is set but wrong fails loudly instead of silently falling
//! back to the default.

use std::path::{Path, PathBuf};

/// Path resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Override configured but nothing exists there
    #[error("canon override path does not exist: {0}")]
    OverrideMissing(PathBuf),

    /// Override configured but points at a directory
    #[error("canon override path is a directory, not a file: {0}")]
    OverrideIsDirectory(PathBuf),

    /// No override and the canonical default is absent
    #[error("canonical canon path does not exist: {0}")]
    DefaultMissing(PathBuf),
}

/// Resolves the on-disk location of the canon document.
///
/// Both paths are injected at construction; reading the override out of the
/// environment is the configuration layer's job, not this one's.
#[derive(Debug, Clone)]
pub struct PathResolver {
    override_path: Option<PathBuf>,
    default_path: PathBuf,
}

impl PathResolver {
    /// Create a resolver from an optional override and the canonical default
    #[inline]
    #[must_use]
    pub fn new(override_path: Option<PathBuf>, default_path: impl Into<PathBuf>) -> Self {
        Self {
            override_path,
            default_path: default_path.into(),
        }
    }

    /// Resolve to exactly one existing file path.
    ///
    /// # Errors
    /// - [`ResolveError::OverrideMissing`] if the override is set but absent
    /// - [`ResolveError::OverrideIsDirectory`] if the override is a directory
    /// - [`ResolveError::DefaultMissing`] if no override and the default is absent
    pub fn resolve(&self) -> Result<PathBuf, ResolveError> {
        if let Some(ref path) = self.override_path {
            if !path.exists() {
                return Err(ResolveError::OverrideMissing(path.clone()));
            }
            if path.is_dir() {
                return Err(ResolveError::OverrideIsDirectory(path.clone()));
            }
            return Ok(path.clone());
        }

        if !self.default_path.exists() {
            return Err(ResolveError::DefaultMissing(self.default_path.clone()));
        }
        Ok(self.default_path.clone())
    }

    /// Canonical default path this resolver falls back to
    #[inline]
    #[must_use]
    pub fn default_path(&self) -> &Path {
        &self.default_path
    }
}
