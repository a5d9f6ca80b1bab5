//! Canon version manager
//!
//! The coordinator the rest of the platform talks to. It sequences
//! resolve → load → validate → diff → swap, keeps the single-slot
//! [`VersionStore`] for status reporting, and exposes the narrow interface
//! pipelines and the orchestrator consume:
//!
//! - [`CanonService::initial_load`] - once at process startup
//! - [`CanonService::reload`] - on demand or on a timer; no-ops when the
//!   on-disk version is unchanged
//! - [`CanonService::version_changed`] - cheap drift poll
//! - [`CanonService::register_pipeline`] / [`CanonService::unregister_pipeline`]
//!   - the bracket every pipeline run makes around its execution
//! - [`CanonService::get_current_buffer`] - for status contexts that accept
//!   immediate staleness
//!
//! The service is an explicit constructed object, shared by `Arc`; there is
//! no process-wide singleton.
//!
//! # Example
//!
//! ```rust,ignore
//! use canon_service::{CanonConfig, CanonService};
//!
//! # async fn example() -> Result<(), canon_service::CanonError> {
//! let service = CanonService::new(CanonConfig::from_env());
//! service.initial_load().await?;
//!
//! let pipeline = service.pipeline_scope(PipelineId::new())?;
//! run_pipeline(pipeline.buffer()).await;
//! // guard drops -> pipeline unregisters, even on early return
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use canon_buffer::{Buffer, BufferState, PipelineId};
pub use canon_document::{SemanticVersion, VersionDelta};
pub use config::{CanonConfig, CANON_PATH_ENV, DEFAULT_CANON_PATH};
pub use error::CanonError;
pub use service::{CanonService, PipelineGuard, ReloadOutcome};
pub use store::{CanonStatus, VersionStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
