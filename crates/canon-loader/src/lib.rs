//! Canon filesystem boundary
//!
//! The only part of the version management system that touches disk:
//!
//! - **Resolve**: turn override/default configuration into exactly one
//!   existing file path, with a distinct diagnostic per failure mode
//! - **Load**: size-bounded read producing an immutable [`CanonDocument`],
//!   with strict version extraction and full-diagnostics structural
//!   validation
//! - **Drift**: cheap header-only poll that reports whether the on-disk
//!   version differs from the one in memory
//!
//! None of these operations hold any lock on buffer state; callers are
//! expected to load first and publish afterwards.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod drift;
pub mod load;
pub mod resolve;

pub use canon_document::CanonDocument;
pub use drift::DriftDetector;
pub use load::{LoadError, Loader, MAX_CANON_BYTES};
pub use resolve::{PathResolver, ResolveError};
