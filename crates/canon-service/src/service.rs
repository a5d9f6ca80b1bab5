//! The canon version manager
//!
//! Sequences resolve → load → diff → swap and owns every collaborator:
//! resolver, loader, drift detector, buffer manager, reaper, version store.
//! All disk I/O happens before any buffer lock is taken, so an in-progress
//! load of a new version never blocks readers of the current one.

use crate::config::CanonConfig;
use crate::error::CanonError;
use crate::store::{CanonStatus, VersionStore};
use canon_buffer::{
    spawn_reaper, Buffer, BufferManager, PipelineId, ReaperConfig, ReaperHandle,
};
use canon_document::{CanonDocument, SemanticVersion, VersionDelta};
use canon_loader::{DriftDetector, Loader, PathResolver};
use std::sync::Arc;

/// What a `reload` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// On-disk version matched; no swap, buffer identity untouched
    Unchanged {
        /// The version both sides agree on
        version: SemanticVersion,
    },
    /// A new version was swapped in
    Swapped {
        /// Version before the swap
        from: SemanticVersion,
        /// Version now active
        to: SemanticVersion,
        /// Pipelines registered at the moment of the swap
        in_flight: usize,
    },
}

/// Coordinator for canon loading, reloading, and pipeline registration.
///
/// Construct one per process (inside a tokio runtime - construction spawns
/// the reclamation task) and share it by `Arc`.
#[derive(Debug)]
pub struct CanonService {
    config: CanonConfig,
    resolver: PathResolver,
    loader: Loader,
    drift: DriftDetector,
    buffers: Arc<BufferManager>,
    reaper: ReaperHandle,
    store: VersionStore,
}

impl CanonService {
    /// Create a service from configuration.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime (the reaper task is spawned
    /// here).
    #[must_use]
    pub fn new(config: CanonConfig) -> Self {
        let resolver = PathResolver::new(config.override_path.clone(), config.canon_path.clone());
        let buffers = Arc::new(BufferManager::with_swap_budget(config.swap_budget()));
        let reaper = spawn_reaper(
            Arc::clone(&buffers),
            ReaperConfig {
                poll_interval: config.reap_interval(),
                drain_ceiling: config.drain_ceiling(),
            },
        );

        Self {
            resolver: resolver.clone(),
            loader: Loader::with_max_bytes(config.max_canon_bytes),
            drift: DriftDetector::new(resolver),
            buffers,
            reaper,
            store: VersionStore::new(),
            config,
        }
    }

    /// Load the canon for the first time.
    ///
    /// The first buffer is installed directly as `Active` - there is no
    /// prior consumer to protect, so the next/swap dance is bypassed.
    ///
    /// # Errors
    /// Resolution and load failures propagate; a second call fails with
    /// `AlreadyLoaded`.
    pub async fn initial_load(&self) -> Result<SemanticVersion, CanonError> {
        let doc = self.resolve_and_load().await?;
        let version = doc.version;
        let loaded_at = doc.loaded_at;
        let prompt = doc.render_prompt();
        let content: Arc<str> = Arc::from(doc.content);

        self.buffers
            .install_initial(version, Arc::clone(&content), prompt)?;
        self.store.record(version, content, loaded_at);

        tracing::info!(version = %version, "canon initially loaded");
        Ok(version)
    }

    /// Reload the canon from disk if its version changed.
    ///
    /// Fully transactional: any failure before the swap leaves the active
    /// buffer, and every pipeline holding it, completely unaffected. An
    /// unchanged on-disk version returns without touching the buffer
    /// manager, so buffer identity is stable across no-op reloads.
    ///
    /// # Errors
    /// Resolution, load, and staging failures propagate to the caller; the
    /// system stays on the old version.
    pub async fn reload(&self) -> Result<ReloadOutcome, CanonError> {
        // I/O first, outside any buffer lock
        let doc = self.resolve_and_load().await?;

        let current = self
            .store
            .current_version()
            .ok_or(canon_buffer::BufferError::NotLoaded)?;

        match current.delta(doc.version) {
            VersionDelta::Same => {
                tracing::debug!(version = %current, "canon reload: version unchanged");
                Ok(ReloadOutcome::Unchanged { version: current })
            }
            delta => {
                if delta == VersionDelta::Downgrade {
                    tracing::warn!(from = %current, to = %doc.version, "canon reload is a downgrade");
                }
                self.swap_in(doc, current).await
            }
        }
    }

    // Stage and swap a freshly loaded document. Split out so the reload
    // body reads as the decision table it is.
    async fn swap_in(
        &self,
        doc: CanonDocument,
        current: SemanticVersion,
    ) -> Result<ReloadOutcome, CanonError> {
        let version = doc.version;
        let loaded_at = doc.loaded_at;
        let prompt = doc.render_prompt();
        let content: Arc<str> = Arc::from(doc.content);

        self.buffers
            .load_next(version, Arc::clone(&content), prompt)?;
        let result = self.buffers.swap()?;

        if let Some(displaced) = result.displaced {
            self.reaper.notify(displaced).await;
        }
        self.store.record(version, content, loaded_at);

        tracing::info!(
            from = %current,
            to = %version,
            in_flight = result.in_flight,
            swap_us = result.duration.as_micros() as u64,
            "canon swapped"
        );

        Ok(ReloadOutcome::Swapped {
            from: current,
            to: version,
            in_flight: result.in_flight,
        })
    }

    /// Cheap poll: has the on-disk version drifted from the active one?
    ///
    /// Returns `false` before the initial load and on any read/parse
    /// failure; callers use this to decide whether to invoke [`reload`].
    ///
    /// [`reload`]: Self::reload
    pub async fn version_changed(&self) -> bool {
        match self.store.current_version() {
            Some(current) => self.drift.check(current).await.is_some(),
            None => false,
        }
    }

    /// Register a pipeline and hand it the buffer it will hold for its
    /// entire run.
    ///
    /// # Errors
    /// `NotLoaded` before the initial load.
    pub fn register_pipeline(&self, pipeline_id: PipelineId) -> Result<Arc<Buffer>, CanonError> {
        let buffer = self.buffers.register(pipeline_id)?;
        tracing::debug!(pipeline = %pipeline_id, version = %buffer.version(), "pipeline registered");
        Ok(buffer)
    }

    /// Release a pipeline's buffer reference.
    ///
    /// Safe to call twice; removal of an absent entry is a no-op.
    pub fn unregister_pipeline(&self, pipeline_id: PipelineId) {
        self.buffers.unregister(pipeline_id);
        tracing::debug!(pipeline = %pipeline_id, "pipeline unregistered");
    }

    /// Register a pipeline behind an RAII guard that unregisters on drop,
    /// covering every exit path including panics.
    ///
    /// # Errors
    /// `NotLoaded` before the initial load.
    pub fn pipeline_scope(&self, pipeline_id: PipelineId) -> Result<PipelineGuard<'_>, CanonError> {
        let buffer = self.register_pipeline(pipeline_id)?;
        Ok(PipelineGuard {
            service: self,
            pipeline_id,
            buffer,
        })
    }

    /// The buffer currently active, without registering.
    ///
    /// For status contexts only; the result may be displaced immediately
    /// after the call.
    ///
    /// # Errors
    /// `NotLoaded` before the initial load.
    pub fn get_current_buffer(&self) -> Result<Arc<Buffer>, CanonError> {
        Ok(self.buffers.get_current()?)
    }

    /// Serializable status snapshot
    #[must_use]
    pub fn status(&self) -> CanonStatus {
        let stats = self.buffers.stats();
        CanonStatus {
            version: self.store.current_version(),
            loaded_at: self.store.loaded_at(),
            registered_pipelines: stats.registered_pipelines,
            pending_load: stats.pending,
            retired_generations: self.reaper.stats().retired(),
            forced_retirements: self.reaper.stats().forced(),
        }
    }

    /// Service configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CanonConfig {
        &self.config
    }

    async fn resolve_and_load(&self) -> Result<CanonDocument, CanonError> {
        let path = self.resolver.resolve()?;
        Ok(self.loader.load(&path).await?)
    }
}

impl Drop for CanonService {
    fn drop(&mut self) {
        self.reaper.shutdown();
    }
}

/// RAII registration bracket for one pipeline run
#[derive(Debug)]
pub struct PipelineGuard<'a> {
    service: &'a CanonService,
    pipeline_id: PipelineId,
    buffer: Arc<Buffer>,
}

impl PipelineGuard<'_> {
    /// The buffer this pipeline holds for its entire run
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    /// This pipeline's identifier
    #[inline]
    #[must_use]
    pub fn pipeline_id(&self) -> PipelineId {
        self.pipeline_id
    }
}

impl Drop for PipelineGuard<'_> {
    fn drop(&mut self) {
        self.service.unregister_pipeline(self.pipeline_id);
    }
}
