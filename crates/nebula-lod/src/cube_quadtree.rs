//! Cube quadtree: recomputes the set of LOD leaves covering all six faces
//! of the planet from a focal point.
//!
//! Every call starts from the six whole-face cells and subdivides
//! recursively; nothing is retained between calls. A cell splits into four
//! equal children when the focal point is closer to the cell's projected
//! world-space bounds than `split_distance_factor * size`, until the cell
//! size reaches `min_cell_size`. Because children always tile their parent
//! exactly, the leaves tile every face with no gaps or overlaps.

use glam::{DVec2, DVec3};
use nebula_cubesphere::{CubeFace, FaceFrame};
use tracing::trace;

use crate::{CellBounds, LeafKey, LodError, LodLeaf};

/// Geometric settings of the spatial LOD index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodSettings {
    /// Planet radius. A face spans `2 * planet_radius` on each axis.
    pub planet_radius: f64,
    /// Cells at or below this size are never split.
    pub min_cell_size: f64,
    /// Split threshold as a multiple of the cell size.
    pub split_distance_factor: f64,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            planet_radius: 4000.0,
            min_cell_size: 500.0,
            split_distance_factor: 0.75,
        }
    }
}

impl LodSettings {
    fn validate(&self) -> Result<(), LodError> {
        for (name, value) in [
            ("planet_radius", self.planet_radius),
            ("min_cell_size", self.min_cell_size),
            ("split_distance_factor", self.split_distance_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LodError::InvalidSetting { name, value });
            }
        }
        Ok(())
    }
}

/// Spatial LOD index over the six faces of a cube-sphere.
#[derive(Clone, Debug)]
pub struct CubeQuadtree {
    settings: LodSettings,
    frames: [FaceFrame; 6],
    max_depth: u8,
}

impl CubeQuadtree {
    /// Build the index, rejecting non-positive or non-finite settings.
    pub fn new(settings: LodSettings) -> Result<Self, LodError> {
        settings.validate()?;

        let mut max_depth = 0u8;
        let mut size = 2.0 * settings.planet_radius;
        while size > settings.min_cell_size && max_depth < LeafKey::MAX_DEPTH {
            size *= 0.5;
            max_depth += 1;
        }

        Ok(Self {
            settings,
            frames: FaceFrame::all(settings.planet_radius),
            max_depth,
        })
    }

    /// Settings the index was built with.
    #[must_use]
    pub fn settings(&self) -> &LodSettings {
        &self.settings
    }

    /// Deepest depth any leaf can reach: `ceil(log2(face_size / min_cell_size))`.
    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Edge length of a whole face.
    #[must_use]
    pub fn face_size(&self) -> f64 {
        2.0 * self.settings.planet_radius
    }

    /// Frame placing `face`'s local meshes into world space.
    #[must_use]
    pub fn frame(&self, face: CubeFace) -> &FaceFrame {
        &self.frames[face.index()]
    }

    /// All six frames in [`CubeFace::ALL`] order.
    #[must_use]
    pub fn frames(&self) -> &[FaceFrame; 6] {
        &self.frames
    }

    /// Recompute the leaves for `focal`. Output order is unspecified.
    #[must_use]
    pub fn recompute(&self, focal: DVec3) -> Vec<LodLeaf> {
        let mut leaves = Vec::new();
        for face in CubeFace::ALL {
            self.subdivide(LeafKey::root(face), focal, &mut leaves);
        }
        trace!(leaves = leaves.len(), "LOD leaves recomputed");
        leaves
    }

    /// Geometry of the cell addressed by `key`.
    #[must_use]
    pub fn cell(&self, key: LeafKey) -> LodLeaf {
        let r = self.settings.planet_radius;
        let size = self.face_size() / LeafKey::grid_size(key.depth) as f64;
        let local_min = DVec2::new(-r + key.x as f64 * size, -r + key.y as f64 * size);
        let local_max = local_min + DVec2::splat(size);
        let center_local = (local_min + local_max) * 0.5;

        let frame = self.frame(key.face);
        let mid = center_local;
        let samples = [
            local_min,
            DVec2::new(mid.x, local_min.y),
            DVec2::new(local_max.x, local_min.y),
            DVec2::new(local_min.x, mid.y),
            mid,
            DVec2::new(local_max.x, mid.y),
            DVec2::new(local_min.x, local_max.y),
            DVec2::new(mid.x, local_max.y),
            local_max,
        ];
        let bounds_world = CellBounds::from_points(samples.map(|p| frame.project_to_sphere(p)));

        LodLeaf {
            key,
            center_local,
            local_min,
            local_max,
            center_world: frame.project_to_sphere(center_local),
            bounds_world,
            size,
        }
    }

    /// Whether a cell with these bounds and size should split for `focal`.
    fn should_split(&self, cell: &LodLeaf, focal: DVec3) -> bool {
        cell.key.depth < self.max_depth
            && cell.bounds_world.distance_to(focal) < self.settings.split_distance_factor * cell.size
    }

    fn subdivide(&self, key: LeafKey, focal: DVec3, out: &mut Vec<LodLeaf>) {
        let cell = self.cell(key);
        if self.should_split(&cell, focal)
            && let Some(children) = key.children()
        {
            for child in children {
                self.subdivide(child, focal, out);
            }
        } else {
            out.push(cell);
        }
    }
}
