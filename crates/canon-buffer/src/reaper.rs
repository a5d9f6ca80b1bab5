//! Draining-buffer reclamation
//!
//! One long-lived task consumes a queue of displaced buffers and processes
//! them one at a time: poll the pipeline reference table at a fixed
//! interval until no entry points at the buffer (identity comparison), then
//! mark it `Retired`. A generation that keeps references past the drain
//! ceiling is force-retired with a warning - tracking stops, but pipelines
//! still holding the `Arc` keep a valid (orphaned) buffer.
//!
//! TODO: confirm with product whether force-retire should instead fail the
//! straggling pipelines; orphaned-but-valid is what the reference counting
//! gives us today.

use crate::buffer::{Buffer, BufferState};
use crate::manager::BufferManager;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Reclamation tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct ReaperConfig {
    /// How often a draining buffer's references are re-checked
    pub poll_interval: Duration,
    /// Bounded wait before a still-referenced buffer is force-retired
    pub drain_ceiling: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            drain_ceiling: Duration::from_secs(300),
        }
    }
}

/// Counters the reaper maintains across its lifetime
#[derive(Debug, Default)]
pub struct ReaperStats {
    retired: AtomicU64,
    forced: AtomicU64,
}

impl ReaperStats {
    /// Generations retired after their references drained naturally
    #[inline]
    #[must_use]
    pub fn retired(&self) -> u64 {
        self.retired.load(Ordering::Relaxed)
    }

    /// Generations force-retired at the drain ceiling
    #[inline]
    #[must_use]
    pub fn forced(&self) -> u64 {
        self.forced.load(Ordering::Relaxed)
    }
}

/// Handle to the running reaper task
#[derive(Debug)]
pub struct ReaperHandle {
    tx: mpsc::Sender<Arc<Buffer>>,
    stats: Arc<ReaperStats>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Hand a freshly-displaced buffer to the reaper.
    ///
    /// If the reaper is gone the buffer is left `Draining`; the table
    /// entries still keep it alive, so nothing leaks beyond the state flag.
    pub async fn notify(&self, buffer: Arc<Buffer>) {
        if self.tx.send(buffer).await.is_err() {
            tracing::warn!("reaper task is gone; draining buffer left untracked");
        }
    }

    /// Lifetime reclamation counters
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &ReaperStats {
        &self.stats
    }

    /// Abort the reaper task
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

/// Spawn the single long-lived reclamation task.
///
/// Per-swap cleanup tasks would pile up under rapid successive reloads;
/// one consumer draining a channel processes displaced generations in
/// arrival order instead.
#[must_use]
pub fn spawn_reaper(manager: Arc<BufferManager>, config: ReaperConfig) -> ReaperHandle {
    let (tx, rx) = mpsc::channel(32);
    let stats = Arc::new(ReaperStats::default());
    let task = tokio::spawn(reaper_task(manager, config, rx, Arc::clone(&stats)));

    ReaperHandle { tx, stats, task }
}

async fn reaper_task(
    manager: Arc<BufferManager>,
    config: ReaperConfig,
    mut rx: mpsc::Receiver<Arc<Buffer>>,
    stats: Arc<ReaperStats>,
) {
    while let Some(buffer) = rx.recv().await {
        reap_one(&manager, &config, &stats, buffer).await;
    }
    tracing::debug!("reaper channel closed; task exiting");
}

async fn reap_one(
    manager: &BufferManager,
    config: &ReaperConfig,
    stats: &ReaperStats,
    buffer: Arc<Buffer>,
) {
    let deadline = Instant::now() + config.drain_ceiling;
    let mut tick = tokio::time::interval(config.poll_interval);

    loop {
        tick.tick().await;

        if !manager.has_reference(&buffer) {
            buffer.set_state(BufferState::Retired);
            stats.retired.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(version = %buffer.version(), "drained canon buffer retired");
            return;
        }

        if Instant::now() >= deadline {
            buffer.set_state(BufferState::Retired);
            stats.forced.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                version = %buffer.version(),
                ceiling_secs = config.drain_ceiling.as_secs(),
                "drain ceiling exceeded; force-retiring buffer still held by pipelines"
            );
            return;
        }
    }
}
