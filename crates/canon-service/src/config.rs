//! Canon service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable carrying an optional canon path override
pub const CANON_PATH_ENV: &str = "CANON_FLOW_PATH";

/// Canonical default location of the canon document
pub const DEFAULT_CANON_PATH: &str = "config/pipeline_flow.md";

/// Canon service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonConfig {
    /// Canonical default canon path
    pub canon_path: PathBuf,
    /// Optional override path (wins over `canon_path` when set)
    pub override_path: Option<PathBuf>,
    /// Maximum canon file size in bytes
    pub max_canon_bytes: u64,
    /// Swap latency budget in microseconds
    pub swap_budget_us: u64,
    /// Reclamation poll interval in milliseconds
    pub reap_interval_ms: u64,
    /// Bounded drain wait in seconds before force-retirement
    pub drain_ceiling_secs: u64,
}

impl CanonConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration with the override read from `CANON_FLOW_PATH`.
    ///
    /// The environment is consulted exactly once, here; resolution itself
    /// never reads it.
    #[must_use]
    pub fn from_env() -> Self {
        let override_path = std::env::var_os(CANON_PATH_ENV).map(PathBuf::from);
        Self {
            override_path,
            ..Self::default()
        }
    }

    /// With a different canonical default path
    #[inline]
    #[must_use]
    pub fn with_canon_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.canon_path = path.into();
        self
    }

    /// With an explicit override path
    #[inline]
    #[must_use]
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    /// With a different size ceiling
    #[inline]
    #[must_use]
    pub fn with_max_canon_bytes(mut self, bytes: u64) -> Self {
        self.max_canon_bytes = bytes;
        self
    }

    /// With a different reclamation poll interval
    #[inline]
    #[must_use]
    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval_ms = interval.as_millis() as u64;
        self
    }

    /// With a different drain ceiling
    #[inline]
    #[must_use]
    pub fn with_drain_ceiling(mut self, ceiling: Duration) -> Self {
        self.drain_ceiling_secs = ceiling.as_secs();
        self
    }

    /// Swap latency budget as a duration
    #[inline]
    #[must_use]
    pub fn swap_budget(&self) -> Duration {
        Duration::from_micros(self.swap_budget_us)
    }

    /// Reclamation poll interval as a duration
    #[inline]
    #[must_use]
    pub fn reap_interval(&self) -> Duration {
        Duration::from_millis(self.reap_interval_ms)
    }

    /// Drain ceiling as a duration
    #[inline]
    #[must_use]
    pub fn drain_ceiling(&self) -> Duration {
        Duration::from_secs(self.drain_ceiling_secs)
    }
}

impl Default for CanonConfig {
    fn default() -> Self {
        Self {
            canon_path: PathBuf::from(DEFAULT_CANON_PATH),
            override_path: None,
            max_canon_bytes: canon_loader::MAX_CANON_BYTES,
            swap_budget_us: 1_000,
            reap_interval_ms: 100,
            drain_ceiling_secs: 300,
        }
    }
}
