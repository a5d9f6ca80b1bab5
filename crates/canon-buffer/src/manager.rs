//! Double-buffered swap core
//!
//! All mutable shared state - the active slot, the pending slot, and the
//! pipeline reference table - lives in one struct behind one
//! `parking_lot::Mutex`. Every operation holds the lock only for pointer
//! and field work; loading content happens before the lock is ever taken.

use crate::buffer::{Buffer, BufferState, PipelineId};
use canon_document::SemanticVersion;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Latency budget for the swap critical section.
///
/// The swap has already committed by the time duration is checked, so an
/// over-budget swap logs a warning instead of failing.
pub const SWAP_LATENCY_BUDGET: Duration = Duration::from_millis(1);

/// Buffer manager errors
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// Read attempted before the initial load
    #[error("no canon loaded yet")]
    NotLoaded,

    /// Initial install attempted twice
    #[error("canon already loaded; use reload")]
    AlreadyLoaded,

    /// A pending buffer already occupies the next slot
    #[error("canon load already in progress")]
    LoadInProgress,

    /// Swap attempted with no ready pending buffer
    #[error("no ready buffer to swap in")]
    NotReady,
}

/// Outcome of a committed swap
#[derive(Debug)]
pub struct SwapResult {
    /// Version now active
    pub version: SemanticVersion,
    /// Buffer displaced into `Draining`, if one was active
    pub displaced: Option<Arc<Buffer>>,
    /// Pipelines registered at the moment of the swap
    pub in_flight: usize,
    /// Measured duration of the critical section
    pub duration: Duration,
}

/// Point-in-time view of manager state, for status reporting
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferStats {
    /// Version of the active buffer, if any
    pub current_version: Option<SemanticVersion>,
    /// Registered pipeline count
    pub registered_pipelines: usize,
    /// Whether a pending buffer occupies the next slot
    pub pending: bool,
}

// The triple guarded by the manager's single mutex.
#[derive(Debug, Default)]
struct Slots {
    current: Option<Arc<Buffer>>,
    next: Option<Arc<Buffer>>,
    pipeline_refs: HashMap<PipelineId, Arc<Buffer>>,
}

/// Owns the buffer slots and the pipeline reference table.
///
/// The strong `Arc` entries in the reference table are what keep a draining
/// buffer alive; the reaper only observes and flips lifecycle state.
#[derive(Debug)]
pub struct BufferManager {
    slots: Mutex<Slots>,
    swap_budget: Duration,
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferManager {
    /// Create a manager with the standard swap latency budget
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_swap_budget(SWAP_LATENCY_BUDGET)
    }

    /// Create a manager with a specific swap latency budget
    #[inline]
    #[must_use]
    pub fn with_swap_budget(swap_budget: Duration) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            swap_budget,
        }
    }

    /// Install the very first buffer directly as `Active`.
    ///
    /// Startup only: there is no prior consumer to protect, so the
    /// next/swap dance is bypassed.
    ///
    /// # Errors
    /// [`BufferError::AlreadyLoaded`] if a current buffer exists.
    pub fn install_initial(
        &self,
        version: SemanticVersion,
        content: Arc<str>,
        derived_prompt: String,
    ) -> Result<Arc<Buffer>, BufferError> {
        let mut slots = self.slots.lock();
        if slots.current.is_some() {
            return Err(BufferError::AlreadyLoaded);
        }

        let buffer = Buffer::new(version, content, derived_prompt, BufferState::Active);
        slots.current = Some(Arc::clone(&buffer));
        Ok(buffer)
    }

    /// Reference to the active buffer.
    ///
    /// The returned buffer may be displaced immediately after this call;
    /// pipelines that need version stability must use [`register`] instead.
    ///
    /// [`register`]: Self::register
    ///
    /// # Errors
    /// [`BufferError::NotLoaded`] before the initial install.
    pub fn get_current(&self) -> Result<Arc<Buffer>, BufferError> {
        self.slots
            .lock()
            .current
            .clone()
            .ok_or(BufferError::NotLoaded)
    }

    /// Stage a new version into the pending slot.
    ///
    /// The buffer is constructed under the lock in `Loading` state and
    /// marked `Ready` after the lock is released. A second staging attempt
    /// while any pending buffer exists is rejected outright, never queued,
    /// so two pending versions cannot race to become next.
    ///
    /// # Errors
    /// [`BufferError::LoadInProgress`] if the next slot is occupied.
    pub fn load_next(
        &self,
        version: SemanticVersion,
        content: Arc<str>,
        derived_prompt: String,
    ) -> Result<Arc<Buffer>, BufferError> {
        let buffer = {
            let mut slots = self.slots.lock();
            if slots.next.is_some() {
                return Err(BufferError::LoadInProgress);
            }

            let buffer = Buffer::new(version, content, derived_prompt, BufferState::Loading);
            slots.next = Some(Arc::clone(&buffer));
            buffer
        };

        buffer.set_state(BufferState::Ready);
        Ok(buffer)
    }

    /// Promote the pending buffer to active.
    ///
    /// The critical section is pointer reassignment, two state flips, and a
    /// map size read. Duration is measured after commit; exceeding the
    /// budget logs a warning but the swap stands.
    ///
    /// # Errors
    /// [`BufferError::NotReady`] if no pending buffer is in `Ready` state.
    pub fn swap(&self) -> Result<SwapResult, BufferError> {
        let started = Instant::now();

        let (version, displaced, in_flight) = {
            let mut slots = self.slots.lock();

            let ready = slots
                .next
                .as_ref()
                .is_some_and(|next| next.state() == BufferState::Ready);
            if !ready {
                return Err(BufferError::NotReady);
            }

            // Checked above; the lock makes this race-free.
            let next = slots.next.take().ok_or(BufferError::NotReady)?;
            let version = next.version();

            // Buffer states are readable without the slot lock, so the
            // outgoing generation leaves Active before the incoming one
            // enters it. At no instant are two buffers Active.
            let displaced = slots.current.take();
            if let Some(ref old) = displaced {
                old.set_state(BufferState::Draining);
            }
            next.set_state(BufferState::Active);
            slots.current = Some(next);

            (version, displaced, slots.pipeline_refs.len())
        };

        let duration = started.elapsed();
        if duration > self.swap_budget {
            tracing::warn!(
                version = %version,
                duration_us = duration.as_micros() as u64,
                budget_us = self.swap_budget.as_micros() as u64,
                "canon swap exceeded latency budget"
            );
        }

        Ok(SwapResult {
            version,
            displaced,
            in_flight,
            duration,
        })
    }

    /// Register a pipeline against the active buffer.
    ///
    /// The only way a pipeline obtains a buffer. The returned handle is
    /// valid for the pipeline's entire run and is never reassigned; the
    /// table entry keeps the buffer alive even after it drains.
    ///
    /// # Errors
    /// [`BufferError::NotLoaded`] before the initial install.
    pub fn register(&self, pipeline_id: PipelineId) -> Result<Arc<Buffer>, BufferError> {
        let mut slots = self.slots.lock();
        let current = slots.current.clone().ok_or(BufferError::NotLoaded)?;

        if slots
            .pipeline_refs
            .insert(pipeline_id, Arc::clone(&current))
            .is_some()
        {
            tracing::warn!(pipeline = %pipeline_id, "pipeline registered twice; reference replaced");
        }
        Ok(current)
    }

    /// Remove a pipeline's table entry.
    ///
    /// Removing an absent entry is a silent no-op so failure-path cleanup
    /// can run twice.
    pub fn unregister(&self, pipeline_id: PipelineId) {
        let removed = self.slots.lock().pipeline_refs.remove(&pipeline_id);
        if removed.is_none() {
            tracing::debug!(pipeline = %pipeline_id, "unregister of unknown pipeline ignored");
        }
    }

    /// Whether any registered pipeline still points at this exact buffer.
    ///
    /// Identity comparison, not version comparison.
    #[must_use]
    pub fn has_reference(&self, buffer: &Arc<Buffer>) -> bool {
        self.slots
            .lock()
            .pipeline_refs
            .values()
            .any(|held| Arc::ptr_eq(held, buffer))
    }

    /// Snapshot of manager state for status reporting
    #[must_use]
    pub fn stats(&self) -> BufferStats {
        let slots = self.slots.lock();
        BufferStats {
            current_version: slots.current.as_ref().map(|b| b.version()),
            registered_pipelines: slots.pipeline_refs.len(),
            pending: slots.next.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stage(manager: &BufferManager, major: u32, minor: u32) -> Arc<Buffer> {
        manager
            .load_next(
                SemanticVersion::new(major, minor),
                Arc::from("content"),
                "prompt".to_string(),
            )
            .unwrap()
    }

    fn install(manager: &BufferManager, major: u32, minor: u32) -> Arc<Buffer> {
        manager
            .install_initial(
                SemanticVersion::new(major, minor),
                Arc::from("content"),
                "prompt".to_string(),
            )
            .unwrap()
    }

    #[test]
    fn reads_before_initial_install_fail() {
        let manager = BufferManager::new();
        assert!(matches!(manager.get_current(), Err(BufferError::NotLoaded)));
        assert!(matches!(
            manager.register(PipelineId::new()),
            Err(BufferError::NotLoaded)
        ));
    }

    #[test]
    fn install_initial_is_active_and_single_shot() {
        let manager = BufferManager::new();
        let buf = install(&manager, 1, 0);
        assert_eq!(buf.state(), BufferState::Active);

        let again = manager.install_initial(
            SemanticVersion::new(1, 1),
            Arc::from("c"),
            "p".to_string(),
        );
        assert!(matches!(again, Err(BufferError::AlreadyLoaded)));
    }

    #[test]
    fn load_next_rejects_second_pending() {
        let manager = BufferManager::new();
        install(&manager, 1, 0);

        let staged = stage(&manager, 1, 1);
        assert_eq!(staged.state(), BufferState::Ready);

        let second = manager.load_next(
            SemanticVersion::new(1, 2),
            Arc::from("c"),
            "p".to_string(),
        );
        assert!(matches!(second, Err(BufferError::LoadInProgress)));
    }

    #[test]
    fn swap_without_pending_fails() {
        let manager = BufferManager::new();
        install(&manager, 1, 0);
        assert!(matches!(manager.swap(), Err(BufferError::NotReady)));
    }

    #[test]
    fn swap_promotes_and_drains() {
        let manager = BufferManager::new();
        let first = install(&manager, 1, 0);
        stage(&manager, 1, 1);

        let result = manager.swap().unwrap();
        assert_eq!(result.version, SemanticVersion::new(1, 1));
        assert_eq!(first.state(), BufferState::Draining);
        assert!(Buffer::same_buffer(result.displaced.as_ref().unwrap(), &first));

        let current = manager.get_current().unwrap();
        assert_eq!(current.version(), SemanticVersion::new(1, 1));
        assert_eq!(current.state(), BufferState::Active);
    }

    #[test]
    fn swap_snapshots_in_flight_count() {
        let manager = BufferManager::new();
        install(&manager, 1, 0);
        manager.register(PipelineId::new()).unwrap();
        manager.register(PipelineId::new()).unwrap();

        stage(&manager, 1, 1);
        let result = manager.swap().unwrap();
        assert_eq!(result.in_flight, 2);
    }

    #[test]
    fn registered_pipeline_keeps_pre_swap_buffer() {
        let manager = BufferManager::new();
        install(&manager, 1, 0);

        let id = PipelineId::new();
        let held = manager.register(id).unwrap();
        assert_eq!(held.version(), SemanticVersion::new(1, 0));

        stage(&manager, 1, 1);
        manager.swap().unwrap();

        // The held handle is untouched; only new registrations move on
        assert_eq!(held.version(), SemanticVersion::new(1, 0));
        let fresh = manager.register(PipelineId::new()).unwrap();
        assert_eq!(fresh.version(), SemanticVersion::new(1, 1));
    }

    #[test]
    fn has_reference_uses_identity() {
        let manager = BufferManager::new();
        let first = install(&manager, 1, 0);

        let id = PipelineId::new();
        manager.register(id).unwrap();
        assert!(manager.has_reference(&first));

        stage(&manager, 1, 1);
        manager.swap().unwrap();
        let second = manager.get_current().unwrap();
        assert!(manager.has_reference(&first));
        assert!(!manager.has_reference(&second));

        manager.unregister(id);
        assert!(!manager.has_reference(&first));
    }

    #[test]
    fn unregister_absent_is_noop() {
        let manager = BufferManager::new();
        install(&manager, 1, 0);
        // Must not panic or error
        manager.unregister(PipelineId::new());
    }

    #[test]
    fn stats_snapshot() {
        let manager = BufferManager::new();
        assert_eq!(manager.stats().current_version, None);

        install(&manager, 1, 0);
        manager.register(PipelineId::new()).unwrap();
        stage(&manager, 1, 1);

        let stats = manager.stats();
        assert_eq!(stats.current_version, Some(SemanticVersion::new(1, 0)));
        assert_eq!(stats.registered_pipelines, 1);
        assert!(stats.pending);
    }

    #[test]
    fn swap_never_shows_two_active_generations() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

        const SWAPS: u32 = 500;

        let manager = BufferManager::new();
        install(&manager, 1, 0);

        // Outgoing/incoming pair for the swap in progress; states are
        // readable without the slot lock, which is exactly what this
        // test leans on.
        let pair: Arc<Mutex<Option<(Arc<Buffer>, Arc<Buffer>)>>> =
            Arc::new(Mutex::new(None));
        let done = Arc::new(AtomicBool::new(false));
        let violations = Arc::new(AtomicUsize::new(0));

        let observers: Vec<_> = (0..4)
            .map(|_| {
                let pair = Arc::clone(&pair);
                let done = Arc::clone(&done);
                let violations = Arc::clone(&violations);
                std::thread::spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        if let Some((old, new)) = pair.lock().clone() {
                            if old.state() == BufferState::Active
                                && new.state() == BufferState::Active
                            {
                                violations.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        std::hint::spin_loop();
                    }
                })
            })
            .collect();

        for minor in 1..=SWAPS {
            let outgoing = manager.get_current().unwrap();
            let incoming = stage(&manager, 1, minor);
            *pair.lock() = Some((outgoing, incoming));
            manager.swap().unwrap();
        }

        done.store(true, Ordering::Release);
        for observer in observers {
            observer.join().unwrap();
        }

        assert_eq!(violations.load(Ordering::Relaxed), 0);
    }
}
