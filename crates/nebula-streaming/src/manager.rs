//! Keeps the resident patch set in step with the LOD index.
//!
//! Per tick the manager advances the builder by one step. When no batch is
//! in flight it recomputes the LOD leaves and splits them against the
//! resident set into kept, new, and stale leaves. New leaves get hidden
//! patches, stale patches are retired, and the next resident set (kept plus
//! new) is held back until the builder finishes the batch. Resident entries
//! therefore always point at fully built, visible patches.

use std::sync::Arc;

use glam::DVec3;
use nebula_lod::{CubeQuadtree, LeafKey, LodLeaf, LodSettings};
use nebula_mesh::{PatchParams, TerrainPatch};
use nebula_terrain::{HeightProvider, SurfaceGenerator};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::{BatchReport, BuilderSettings, ChunkBuilder, PatchEvent, PatchId, StreamingError};

/// All streaming knobs in one place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamingSettings {
    /// Planet radius.
    pub planet_radius: f64,
    /// Smallest leaf size.
    pub min_cell_size: f64,
    /// Split threshold as a multiple of cell size.
    pub split_distance_factor: f64,
    /// Grid subdivisions per patch edge.
    pub min_cell_resolution: u32,
    /// Triangles splatted per tick.
    pub face_build_batch_size: usize,
    /// Released patches kept per width.
    pub max_pooled_per_width: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        let lod = LodSettings::default();
        let builder = BuilderSettings::default();
        Self {
            planet_radius: lod.planet_radius,
            min_cell_size: lod.min_cell_size,
            split_distance_factor: lod.split_distance_factor,
            min_cell_resolution: 96,
            face_build_batch_size: builder.face_build_batch_size,
            max_pooled_per_width: builder.max_pooled_per_width,
        }
    }
}

impl StreamingSettings {
    fn lod(&self) -> LodSettings {
        LodSettings {
            planet_radius: self.planet_radius,
            min_cell_size: self.min_cell_size,
            split_distance_factor: self.split_distance_factor,
        }
    }

    fn builder(&self) -> BuilderSettings {
        BuilderSettings {
            face_build_batch_size: self.face_build_batch_size,
            max_pooled_per_width: self.max_pooled_per_width,
        }
    }
}

/// Height and surface providers shared by every patch.
#[derive(Clone)]
pub struct TerrainGenerators {
    /// Height field.
    pub height: Arc<dyn HeightProvider>,
    /// Colour and splat source.
    pub surface: Arc<dyn SurfaceGenerator>,
}

/// A leaf and the patch drawing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResidentChunk {
    /// Footprint.
    pub leaf: LodLeaf,
    /// Patch handle in the builder.
    pub patch: PatchId,
}

/// Result of splitting a fresh leaf set against the resident set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeafDiff {
    /// Keys present in both sets.
    pub keep: Vec<LeafKey>,
    /// Leaves with no resident patch, in input order.
    pub new: Vec<LodLeaf>,
    /// Resident keys absent from the fresh set, sorted.
    pub stale: Vec<LeafKey>,
}

impl LeafDiff {
    /// True when the fresh set equals the resident set.
    pub fn is_unchanged(&self) -> bool {
        self.new.is_empty() && self.stale.is_empty()
    }
}

/// Split `leaves` against `resident` by key.
pub fn diff_leaves(resident: &FxHashMap<LeafKey, ResidentChunk>, leaves: &[LodLeaf]) -> LeafDiff {
    let mut diff = LeafDiff::default();
    let mut seen = FxHashSet::default();
    for leaf in leaves {
        seen.insert(leaf.key);
        if resident.contains_key(&leaf.key) {
            diff.keep.push(leaf.key);
        } else {
            diff.new.push(*leaf);
        }
    }
    diff.stale = resident
        .keys()
        .filter(|key| !seen.contains(*key))
        .copied()
        .collect();
    diff.stale.sort_unstable();
    diff
}

/// Sizes of a diff that started a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Leaves kept as-is.
    pub kept: usize,
    /// Patches allocated.
    pub added: usize,
    /// Patches retired.
    pub stale: usize,
}

/// What one [`ChunkManager::update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Set when a batch finished and the resident set was swapped.
    pub committed: Option<BatchReport>,
    /// Set when a new diff started a batch.
    pub diff: Option<DiffStats>,
    /// Set when a deferred rebuild was queued.
    pub rebuild_started: bool,
}

/// Orchestrates LOD recomputation, patch allocation, and recycling.
pub struct ChunkManager {
    quadtree: CubeQuadtree,
    builder: ChunkBuilder,
    generators: TerrainGenerators,
    resolution: u32,
    resident: FxHashMap<LeafKey, ResidentChunk>,
    pending: Option<FxHashMap<LeafKey, ResidentChunk>>,
    rebuild_requested: bool,
}

impl ChunkManager {
    /// Validate settings and build an empty manager.
    pub fn new(
        settings: StreamingSettings,
        generators: TerrainGenerators,
    ) -> Result<Self, StreamingError> {
        if settings.min_cell_resolution == 0 {
            return Err(StreamingError::InvalidSetting {
                name: "min_cell_resolution",
                value: 0,
            });
        }
        let quadtree = CubeQuadtree::new(settings.lod())?;
        let builder = ChunkBuilder::new(settings.builder())?;
        info!(
            radius = settings.planet_radius,
            min_cell_size = settings.min_cell_size,
            resolution = settings.min_cell_resolution,
            max_depth = quadtree.max_depth(),
            "chunk manager ready"
        );
        Ok(Self {
            quadtree,
            builder,
            generators,
            resolution: settings.min_cell_resolution,
            resident: FxHashMap::default(),
            pending: None,
            rebuild_requested: false,
        })
    }

    /// Advance one tick with the viewer at `focal`.
    pub fn update(&mut self, focal: DVec3) -> TickSummary {
        let mut summary = TickSummary::default();

        if let Some(report) = self.builder.update() {
            if let Some(next) = self.pending.take() {
                self.resident = next;
            }
            summary.committed = Some(report);
        }
        if self.builder.is_busy() {
            return summary;
        }

        if self.rebuild_requested {
            summary.rebuild_started = self.start_rebuild();
            return summary;
        }

        let leaves = self.quadtree.recompute(focal);
        let diff = diff_leaves(&self.resident, &leaves);
        if diff.is_unchanged() {
            return summary;
        }
        summary.diff = Some(self.start_batch(diff));
        summary
    }

    fn start_batch(&mut self, diff: LeafDiff) -> DiffStats {
        let stats = DiffStats {
            kept: diff.keep.len(),
            added: diff.new.len(),
            stale: diff.stale.len(),
        };

        let mut next = FxHashMap::default();
        next.reserve(stats.kept + stats.added);
        for key in &diff.keep {
            if let Some(chunk) = self.resident.get(key) {
                next.insert(*key, *chunk);
            }
        }
        for leaf in diff.new {
            let params = self.patch_params(&leaf);
            let patch = self.builder.allocate_chunk(params);
            next.insert(leaf.key, ResidentChunk { leaf, patch });
        }
        let stale = diff
            .stale
            .iter()
            .filter_map(|key| self.resident.get(key))
            .map(|chunk| chunk.patch);
        self.builder.retire(stale);

        debug!(
            kept = stats.kept,
            added = stats.added,
            stale = stats.stale,
            "lod diff started batch"
        );
        self.pending = Some(next);
        stats
    }

    fn start_rebuild(&mut self) -> bool {
        let mut ids: Vec<PatchId> = self.resident.values().map(|c| c.patch).collect();
        ids.sort_unstable();
        let queued = self.builder.rebuild_with(
            &ids,
            self.generators.height.clone(),
            self.generators.surface.clone(),
        );
        if queued {
            self.rebuild_requested = false;
            debug!(patches = ids.len(), "resident patches rebuilding");
        }
        queued
    }

    fn patch_params(&self, leaf: &LodLeaf) -> PatchParams {
        PatchParams {
            frame: *self.quadtree.frame(leaf.face()),
            offset: leaf.center_local,
            width: leaf.size,
            resolution: self.resolution,
            height: self.generators.height.clone(),
            surface: self.generators.surface.clone(),
        }
    }

    /// Swap in new providers. Resident patches are rebuilt once the
    /// current batch (if any) finishes; new allocations use them at once.
    pub fn set_generators(&mut self, generators: TerrainGenerators) {
        self.generators = generators;
        self.rebuild_requested = true;
    }

    /// Rebuild every resident patch once the builder is idle.
    pub fn request_rebuild(&mut self) {
        self.rebuild_requested = true;
    }

    /// True while a batch is in flight.
    pub fn is_busy(&self) -> bool {
        self.builder.is_busy()
    }

    /// True while a rebuild is waiting for the builder.
    pub fn rebuild_pending(&self) -> bool {
        self.rebuild_requested
    }

    /// The spatial index.
    pub fn quadtree(&self) -> &CubeQuadtree {
        &self.quadtree
    }

    /// The patch builder.
    pub fn builder(&self) -> &ChunkBuilder {
        &self.builder
    }

    /// Current resident set.
    pub fn resident(&self) -> &FxHashMap<LeafKey, ResidentChunk> {
        &self.resident
    }

    /// Number of resident chunks.
    pub fn resident_len(&self) -> usize {
        self.resident.len()
    }

    /// Resident chunk for `key`.
    pub fn chunk(&self, key: &LeafKey) -> Option<&ResidentChunk> {
        self.resident.get(key)
    }

    /// Patch backing a resident chunk.
    pub fn patch(&self, key: &LeafKey) -> Option<&TerrainPatch> {
        self.resident
            .get(key)
            .and_then(|chunk| self.builder.patch(chunk.patch))
    }

    /// Resident leaves paired with their visible patches.
    pub fn visible_patches(&self) -> impl Iterator<Item = (&LodLeaf, &TerrainPatch)> {
        self.resident.values().filter_map(|chunk| {
            self.builder
                .patch(chunk.patch)
                .filter(|patch| patch.is_visible())
                .map(|patch| (&chunk.leaf, patch))
        })
    }

    /// Take all visibility events since the last call.
    pub fn drain_events(&mut self) -> Vec<PatchEvent> {
        self.builder.drain_events()
    }
}
