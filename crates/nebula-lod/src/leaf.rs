//! LOD leaves, their structural keys and their world-space bounds.

use glam::{DVec2, DVec3};
use nebula_cubesphere::CubeFace;

/// Structural identity of a quadtree cell.
///
/// At depth `d` a face is split into a `2^d × 2^d` grid; `x` and `y` index
/// that grid from the face's local `(-radius, -radius)` corner. Two leaves
/// with equal keys cover exactly the same footprint, which makes the key the
/// sole criterion for "same chunk" between recomputations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafKey {
    /// Cube face containing the cell.
    pub face: CubeFace,
    /// Subdivision depth (0 = whole face).
    pub depth: u8,
    /// Column in the face grid at this depth.
    pub x: u32,
    /// Row in the face grid at this depth.
    pub y: u32,
}

impl LeafKey {
    /// Deepest depth a key can address.
    pub const MAX_DEPTH: u8 = 30;

    /// The cell covering an entire face.
    #[must_use]
    pub fn root(face: CubeFace) -> Self {
        Self {
            face,
            depth: 0,
            x: 0,
            y: 0,
        }
    }

    /// Cells per axis at `depth`.
    #[must_use]
    pub fn grid_size(depth: u8) -> u32 {
        1u32 << depth.min(Self::MAX_DEPTH)
    }

    /// The four children, ordered `[(x, y), (x+1, y), (x, y+1), (x+1, y+1)]`
    /// at the next depth. `None` at [`Self::MAX_DEPTH`].
    #[must_use]
    pub fn children(&self) -> Option<[LeafKey; 4]> {
        if self.depth >= Self::MAX_DEPTH {
            return None;
        }
        let depth = self.depth + 1;
        let (cx, cy) = (self.x * 2, self.y * 2);
        Some([(cx, cy), (cx + 1, cy), (cx, cy + 1), (cx + 1, cy + 1)].map(|(x, y)| LeafKey {
            face: self.face,
            depth,
            x,
            y,
        }))
    }

    /// The enclosing cell one depth up, `None` for a face root.
    #[must_use]
    pub fn parent(&self) -> Option<LeafKey> {
        (self.depth > 0).then(|| LeafKey {
            face: self.face,
            depth: self.depth - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }
}

impl std::fmt::Display for LeafKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:?}, depth={}, x={}, y={})",
            self.face, self.depth, self.x, self.y
        )
    }
}

/// Axis-aligned world-space box around a cell's projected sphere patch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellBounds {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl CellBounds {
    /// Smallest box containing every point. Empty input gives a degenerate
    /// box at the origin.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self {
                min: DVec3::ZERO,
                max: DVec3::ZERO,
            };
        };
        iter.fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: b.min.min(p),
                max: b.max.max(p),
            },
        )
    }

    /// Euclidean distance from `p` to the box (0 inside).
    #[must_use]
    pub fn distance_to(&self, p: DVec3) -> f64 {
        let outside = (self.min - p).max(p - self.max).max(DVec3::ZERO);
        outside.length()
    }

    /// Whether `p` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// One terminal cell of a recomputation: the footprint of one terrain patch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodLeaf {
    /// Structural identity.
    pub key: LeafKey,
    /// Centre in face-local coordinates (on the cube face plane).
    pub center_local: DVec2,
    /// Minimum face-local corner.
    pub local_min: DVec2,
    /// Maximum face-local corner.
    pub local_max: DVec2,
    /// Centre projected onto the sphere, world space.
    pub center_world: DVec3,
    /// World-space bounds of the projected patch.
    pub bounds_world: CellBounds,
    /// Edge length in face-local units.
    pub size: f64,
}

impl LodLeaf {
    /// Face containing the leaf.
    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.key.face
    }

    /// Face-local area covered by the leaf.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.size * self.size
    }

    /// Area shared with `other` in face-local space (0 on different faces).
    #[must_use]
    pub fn overlap_area(&self, other: &LodLeaf) -> f64 {
        if self.face() != other.face() {
            return 0.0;
        }
        let min = self.local_min.max(other.local_min);
        let max = self.local_max.min(other.local_max);
        let extent = (max - min).max(DVec2::ZERO);
        extent.x * extent.y
    }
}
