//! Pooled, incremental terrain patch builder.
//!
//! [`ChunkBuilder`] owns every live [`TerrainPatch`] plus a pool of
//! released patches keyed by width. Allocations and rebuilds are queued and
//! built one patch at a time, one build step per [`ChunkBuilder::update`].
//! Queued work, the patch being built, and the patches waiting to be shown
//! or recycled together form a single batch; the batch is finished in one
//! call once the last patch completes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use nebula_mesh::{BuildProgress, PatchParams, TerrainPatch};
use nebula_terrain::{HeightProvider, SurfaceGenerator};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::StreamingError;

/// Handle to a live patch owned by a [`ChunkBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(u64);

impl PatchId {
    /// Raw numeric value, unique for the lifetime of the builder.
    pub fn get(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch#{}", self.0)
    }
}

/// Visibility changes for the rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchEvent {
    /// The patch's mesh is complete and should be drawn (or re-uploaded).
    Shown(PatchId),
    /// The patch was hidden and returned to the pool.
    Recycled(PatchId),
    /// The patch was hidden and dropped because its pool was full.
    Destroyed(PatchId),
}

impl PatchEvent {
    /// The patch this event refers to.
    pub fn patch(self) -> PatchId {
        match self {
            Self::Shown(id) | Self::Recycled(id) | Self::Destroyed(id) => id,
        }
    }
}

/// Scheduling limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuilderSettings {
    /// Triangles splatted per build step.
    pub face_build_batch_size: usize,
    /// Released patches kept per width; the rest are dropped.
    pub max_pooled_per_width: usize,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            face_build_batch_size: 1000,
            max_pooled_per_width: 64,
        }
    }
}

/// Running counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderStats {
    /// Patches handed out by [`ChunkBuilder::allocate_chunk`].
    pub allocations: u64,
    /// Allocations served from the pool.
    pub pool_hits: u64,
    /// Patches returned to the pool.
    pub recycled: u64,
    /// Patches dropped by the pool limit.
    pub destroyed: u64,
    /// Batches finished.
    pub batches_completed: u64,
    /// Build steps executed.
    pub steps: u64,
}

/// What a finished batch did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Patches made visible.
    pub shown: usize,
    /// Patches returned to the pool.
    pub recycled: usize,
    /// Patches dropped.
    pub destroyed: usize,
}

/// Pool key: widths are compared bit-for-bit.
fn width_key(width: f64) -> u64 {
    width.to_bits()
}

/// Incremental patch builder with a width-keyed object pool.
pub struct ChunkBuilder {
    settings: BuilderSettings,
    next_id: u64,
    patches: FxHashMap<PatchId, TerrainPatch>,
    pool: FxHashMap<u64, Vec<TerrainPatch>>,
    queued: VecDeque<PatchId>,
    active: Option<PatchId>,
    new: Vec<PatchId>,
    old: Vec<PatchId>,
    events: Vec<PatchEvent>,
    stats: BuilderStats,
}

impl ChunkBuilder {
    /// Create an empty builder. A zero `face_build_batch_size` is rejected.
    pub fn new(settings: BuilderSettings) -> Result<Self, StreamingError> {
        if settings.face_build_batch_size == 0 {
            return Err(StreamingError::InvalidSetting {
                name: "face_build_batch_size",
                value: settings.face_build_batch_size,
            });
        }
        Ok(Self {
            settings,
            next_id: 0,
            patches: FxHashMap::default(),
            pool: FxHashMap::default(),
            queued: VecDeque::new(),
            active: None,
            new: Vec::new(),
            old: Vec::new(),
            events: Vec::new(),
            stats: BuilderStats::default(),
        })
    }

    /// Scheduling limits in effect.
    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Counters since construction.
    pub fn stats(&self) -> &BuilderStats {
        &self.stats
    }

    /// True while any patch is queued or building, or the current batch has
    /// not yet been shown and recycled.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
            || !self.queued.is_empty()
            || !self.new.is_empty()
            || !self.old.is_empty()
    }

    /// Hand out a hidden patch for `params` and queue its build. The patch
    /// is shown when the current batch completes.
    pub fn allocate_chunk(&mut self, params: PatchParams) -> PatchId {
        let id = PatchId(self.next_id);
        self.next_id += 1;

        let pooled = self
            .pool
            .get_mut(&width_key(params.width))
            .and_then(Vec::pop);
        let patch = match pooled {
            Some(mut patch) => {
                self.stats.pool_hits += 1;
                trace!(%id, width = params.width, "reusing pooled patch");
                patch.reinitialize(params);
                patch
            }
            None => {
                trace!(%id, width = params.width, "allocating patch");
                TerrainPatch::new(params)
            }
        };

        self.stats.allocations += 1;
        self.patches.insert(id, patch);
        self.queued.push_back(id);
        self.new.push(id);
        id
    }

    /// Mark patches for recycling when the current batch completes. Unknown
    /// ids are ignored.
    pub fn retire(&mut self, ids: impl IntoIterator<Item = PatchId>) {
        for id in ids {
            if self.patches.contains_key(&id) && !self.old.contains(&id) {
                self.old.push(id);
            }
        }
    }

    /// Re-queue existing patches for a fresh build. Rejected (returns
    /// `false`) while a batch is in flight. Patches keep showing their
    /// previous mesh until their new one is complete.
    pub fn rebuild(&mut self, ids: &[PatchId]) -> bool {
        self.queue_rebuild(ids, None)
    }

    /// Like [`rebuild`](Self::rebuild), switching the patches to new
    /// height and surface providers first.
    pub fn rebuild_with(
        &mut self,
        ids: &[PatchId],
        height: Arc<dyn HeightProvider>,
        surface: Arc<dyn SurfaceGenerator>,
    ) -> bool {
        self.queue_rebuild(ids, Some((height, surface)))
    }

    fn queue_rebuild(
        &mut self,
        ids: &[PatchId],
        providers: Option<(Arc<dyn HeightProvider>, Arc<dyn SurfaceGenerator>)>,
    ) -> bool {
        if self.is_busy() {
            warn!(patches = ids.len(), "rebuild rejected: batch in flight");
            return false;
        }
        for &id in ids {
            let Some(patch) = self.patches.get_mut(&id) else {
                continue;
            };
            if let Some((height, surface)) = &providers {
                patch.set_providers(height.clone(), surface.clone());
            }
            self.queued.push_back(id);
            self.new.push(id);
        }
        debug!(patches = self.queued.len(), "rebuild queued");
        true
    }

    /// Advance the batch by one build step. Returns a report on the call
    /// that finishes the batch.
    pub fn update(&mut self) -> Option<BatchReport> {
        if self.active.is_none() {
            self.active = self.start_next();
        }

        if let Some(id) = self.active {
            let batch = self.settings.face_build_batch_size;
            let progress = self
                .patches
                .get_mut(&id)
                .map_or(BuildProgress::Complete, |patch| patch.step(batch));
            self.stats.steps += 1;
            if progress == BuildProgress::Complete {
                trace!(%id, "patch built");
                self.active = None;
            }
        }

        if self.active.is_some() || !self.queued.is_empty() {
            return None;
        }
        if self.new.is_empty() && self.old.is_empty() {
            return None;
        }
        Some(self.complete_batch())
    }

    /// Pop the next queued patch that still exists and start its build.
    fn start_next(&mut self) -> Option<PatchId> {
        while let Some(id) = self.queued.pop_front() {
            if let Some(patch) = self.patches.get_mut(&id) {
                patch.begin_build();
                return Some(id);
            }
        }
        None
    }

    fn complete_batch(&mut self) -> BatchReport {
        let mut report = BatchReport::default();

        for id in std::mem::take(&mut self.new) {
            if let Some(patch) = self.patches.get_mut(&id) {
                patch.show();
                self.events.push(PatchEvent::Shown(id));
                report.shown += 1;
            }
        }

        for id in std::mem::take(&mut self.old) {
            match self.recycle(id) {
                Some(PatchEvent::Recycled(_)) => report.recycled += 1,
                Some(PatchEvent::Destroyed(_)) => report.destroyed += 1,
                _ => {}
            }
        }

        self.stats.batches_completed += 1;
        debug!(
            shown = report.shown,
            recycled = report.recycled,
            destroyed = report.destroyed,
            "batch complete"
        );
        report
    }

    fn recycle(&mut self, id: PatchId) -> Option<PatchEvent> {
        let mut patch = self.patches.remove(&id)?;
        patch.release();

        let pool = self.pool.entry(width_key(patch.params().width)).or_default();
        let event = if pool.len() < self.settings.max_pooled_per_width {
            pool.push(patch);
            self.stats.recycled += 1;
            PatchEvent::Recycled(id)
        } else {
            self.stats.destroyed += 1;
            PatchEvent::Destroyed(id)
        };
        trace!(?event, "patch released");
        self.events.push(event);
        Some(event)
    }

    /// Live patch by id.
    pub fn patch(&self, id: PatchId) -> Option<&TerrainPatch> {
        self.patches.get(&id)
    }

    /// Number of live (non-pooled) patches.
    pub fn live_len(&self) -> usize {
        self.patches.len()
    }

    /// Number of pooled patches across all widths.
    pub fn pooled_len(&self) -> usize {
        self.pool.values().map(Vec::len).sum()
    }

    /// Patches still waiting for their build to start.
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Take all events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<PatchEvent> {
        std::mem::take(&mut self.events)
    }
}

impl fmt::Debug for ChunkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkBuilder")
            .field("settings", &self.settings)
            .field("live", &self.patches.len())
            .field("pooled", &self.pooled_len())
            .field("queued", &self.queued.len())
            .field("active", &self.active)
            .field("stats", &self.stats)
            .finish()
    }
}
