//! Flat, unindexed vertex buffers published by a terrain patch.

/// Per-triangle-corner attribute buffers, three entries per triangle.
///
/// Positions are in the patch's face-local space; the owning face's
/// [`FaceFrame`](nebula_cubesphere::FaceFrame) places them in the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchMesh {
    /// Displaced vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex colours (linear RGB).
    pub colours: Vec<[f32; 3]>,
    /// Smoothed vertex normals, face-local.
    pub normals: Vec<[f32; 3]>,
    /// Tangents with handedness in `w`.
    pub tangents: Vec<[f32; 4]>,
    /// Texture coordinates.
    pub uvs: Vec<[f32; 2]>,
    /// The four strongest texture indices, strongest first.
    pub splat_indices: Vec<[u32; 4]>,
    /// Blend weights matching `splat_indices`.
    pub splat_weights: Vec<[f32; 4]>,
}

impl PatchMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every buffer, keeping allocations for reuse.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colours.clear();
        self.normals.clear();
        self.tangents.clear();
        self.uvs.clear();
        self.splat_indices.clear();
        self.splat_weights.clear();
    }

    /// Number of triangle corners (vertices submitted to the renderer).
    pub fn corner_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// True when no geometry has been published.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when every attribute buffer has one entry per corner.
    pub fn is_consistent(&self) -> bool {
        let n = self.positions.len();
        n % 3 == 0
            && self.colours.len() == n
            && self.normals.len() == n
            && self.tangents.len() == n
            && self.uvs.len() == n
            && self.splat_indices.len() == n
            && self.splat_weights.len() == n
    }

    /// Approximate bytes held by the published buffers.
    pub fn byte_size(&self) -> usize {
        use std::mem::size_of;
        self.positions.len() * size_of::<[f32; 3]>()
            + self.colours.len() * size_of::<[f32; 3]>()
            + self.normals.len() * size_of::<[f32; 3]>()
            + self.tangents.len() * size_of::<[f32; 4]>()
            + self.uvs.len() * size_of::<[f32; 2]>()
            + self.splat_indices.len() * size_of::<[u32; 4]>()
            + self.splat_weights.len() * size_of::<[f32; 4]>()
    }
}
