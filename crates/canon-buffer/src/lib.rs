//! Canon buffer lifecycle
//!
//! The concurrency core of the version management system. One
//! [`BufferManager`] owns two buffer slots (active and pending) plus the
//! pipeline reference table, all behind a single mutex; every operation
//! holds that lock only for O(1) pointer and field work.
//!
//! # Guarantees
//!
//! - A pipeline that registers before a swap keeps its pre-swap buffer for
//!   its entire run; one that registers after observes the post-swap buffer
//! - No pipeline ever observes a torn buffer: the swap is a single pointer
//!   move under the lock, and buffers are immutable once published
//! - A displaced buffer drains until no pipeline reference remains, then a
//!   single long-lived [`reaper`](crate::reaper) task retires it
//!
//! ```text
//! load_next          swap                    reclamation
//! Loading → Ready → Active ──(displaced)──→ Draining → Retired
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod buffer;
pub mod manager;
pub mod reaper;

pub use buffer::{Buffer, BufferState, PipelineId};
pub use manager::{BufferError, BufferManager, BufferStats, SwapResult, SWAP_LATENCY_BUDGET};
pub use reaper::{spawn_reaper, ReaperConfig, ReaperHandle, ReaperStats};
