//! Terrain patches and their resumable mesh-build procedure.
//!
//! A build runs as an explicit state machine. Each call to
//! [`TerrainPatch::step`] performs one phase (or one batch of triangles
//! during splatting) and returns, so a scheduler can spread a build over
//! many frames. All intermediate data lives in the patch's own scratch
//! storage; the published [`PatchMesh`] is replaced in a single swap when
//! the last phase finishes, so readers never see a half-built mesh.

use std::fmt;
use std::sync::Arc;

use glam::{DVec2, DVec3, Vec3};
use nebula_cubesphere::FaceFrame;
use nebula_terrain::{HeightProvider, SurfaceGenerator, TextureType};

use crate::PatchMesh;
use crate::splat::{normalize_weights, strongest_four};

/// World units covered by one UV tile.
const UV_TILE_SIZE: f64 = 200.0;

/// Everything that identifies a patch and drives its geometry.
#[derive(Clone)]
pub struct PatchParams {
    /// Face the patch lies on.
    pub frame: FaceFrame,
    /// Face-local centre of the patch footprint.
    pub offset: DVec2,
    /// Edge length of the footprint in face-local units.
    pub width: f64,
    /// Grid subdivisions per edge. Must be at least 1.
    pub resolution: u32,
    /// Height field sampled once per grid vertex.
    pub height: Arc<dyn HeightProvider>,
    /// Colour and splat source.
    pub surface: Arc<dyn SurfaceGenerator>,
}

impl PatchParams {
    /// Planet radius, taken from the frame.
    pub fn radius(&self) -> f64 {
        self.frame.radius()
    }

    /// Triangles produced by one build: `2 * resolution²`.
    pub fn triangle_count(&self) -> usize {
        let n = self.resolution as usize;
        2 * n * n
    }
}

impl fmt::Debug for PatchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchParams")
            .field("face", &self.frame.face())
            .field("offset", &self.offset)
            .field("width", &self.width)
            .field("resolution", &self.resolution)
            .field("radius", &self.radius())
            .finish_non_exhaustive()
    }
}

/// Indexed attribute being flattened during [`BuildPhase::Unindex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    /// Vertex positions.
    Positions,
    /// Vertex colours.
    Colours,
    /// Vertex normals.
    Normals,
    /// Vertex tangents.
    Tangents,
    /// Texture coordinates. Flattening this one publishes the mesh.
    Uvs,
}

/// Where a patch is in its build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildPhase {
    /// No build requested since allocation.
    Idle,
    /// Sample heights and colours for the `(N+1)²` grid.
    Vertices,
    /// Emit two triangles per grid quad.
    Indices,
    /// Sum triangle face normals into their vertices.
    AccumulateNormals,
    /// Normalise the accumulated normals.
    NormalizeNormals,
    /// Compute per-corner splat weights, resuming at `next_triangle`.
    Splat {
        /// First triangle of the next batch.
        next_triangle: usize,
    },
    /// Flatten one indexed attribute into per-corner form.
    Unindex(Attribute),
    /// The published mesh matches the current params.
    Complete,
}

/// Result of one [`TerrainPatch::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildProgress {
    /// More steps are needed.
    Pending,
    /// The mesh is published; further steps do nothing.
    Complete,
}

/// One sampled grid vertex before normal smoothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GridVertex {
    /// Displaced position in patch-local space.
    pub position: DVec3,
    /// Unit radial direction, face-local. Seeds the normal and is the "up" vector.
    pub direction: DVec3,
    /// Displaced position in world space.
    pub world: DVec3,
}

/// Sample the grid vertex at column `x`, row `y`.
pub(crate) fn grid_vertex(params: &PatchParams, x: u32, y: u32) -> GridVertex {
    let n = params.resolution as f64;
    let radius = params.radius();
    let half = params.width * 0.5;
    let xp = params.width * x as f64 / n;
    let yp = params.width * y as f64 / n;

    let local = DVec2::new(xp - half + params.offset.x, yp - half + params.offset.y);
    let direction = params.frame.local_direction(local);

    let mut position = direction * radius;
    position.z -= radius;
    let on_sphere = params.frame.to_world(position);

    let height = params.height.sample(on_sphere).height;
    position += direction * height;
    let world = on_sphere + params.frame.to_world_direction(direction) * height;

    GridVertex {
        position,
        direction,
        world,
    }
}

/// Indexed working buffers reused across builds.
#[derive(Default)]
struct BuildScratch {
    positions: Vec<DVec3>,
    colours: Vec<Vec3>,
    normals: Vec<DVec3>,
    up: Vec<DVec3>,
    world: Vec<DVec3>,
    tangents: Vec<[f32; 4]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    staged: PatchMesh,
}

impl BuildScratch {
    fn clear(&mut self) {
        self.positions.clear();
        self.colours.clear();
        self.normals.clear();
        self.up.clear();
        self.world.clear();
        self.tangents.clear();
        self.uvs.clear();
        self.indices.clear();
        self.staged.clear();
    }
}

fn to_f32(v: DVec3) -> [f32; 3] {
    v.as_vec3().to_array()
}

/// Copy `src[index]` for every index into `dst`.
fn unindex<T: Copy, U>(src: &[T], indices: &[u32], dst: &mut Vec<U>, convert: impl Fn(T) -> U) {
    dst.clear();
    dst.extend(indices.iter().map(|&i| convert(src[i as usize])));
}

/// A renderable mesh covering one LOD leaf.
///
/// Starts hidden; becomes visible only when its owner shows it after a
/// complete build.
pub struct TerrainPatch {
    params: PatchParams,
    mesh: PatchMesh,
    visible: bool,
    phase: BuildPhase,
    scratch: BuildScratch,
}

impl TerrainPatch {
    /// New hidden patch with no geometry.
    pub fn new(params: PatchParams) -> Self {
        Self {
            params,
            mesh: PatchMesh::new(),
            visible: false,
            phase: BuildPhase::Idle,
            scratch: BuildScratch::default(),
        }
    }

    /// Re-target a pooled patch at new params, keeping buffer allocations.
    pub fn reinitialize(&mut self, params: PatchParams) {
        self.params = params;
        self.visible = false;
        self.phase = BuildPhase::Idle;
        self.mesh.clear();
        self.scratch.clear();
    }

    /// Parameters of the current (or next) build.
    pub fn params(&self) -> &PatchParams {
        &self.params
    }

    /// Replace the providers used by the next build.
    pub fn set_providers(
        &mut self,
        height: Arc<dyn HeightProvider>,
        surface: Arc<dyn SurfaceGenerator>,
    ) {
        self.params.height = height;
        self.params.surface = surface;
    }

    /// The last fully built mesh.
    pub fn mesh(&self) -> &PatchMesh {
        &self.mesh
    }

    /// Whether the renderer should draw this patch.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Mark visible.
    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Mark hidden.
    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Hide and release geometry, keeping allocations for pooling.
    pub fn release(&mut self) {
        self.visible = false;
        self.phase = BuildPhase::Idle;
        self.mesh.clear();
        self.scratch.clear();
    }

    /// Current build phase.
    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// True once a build has published its mesh.
    pub fn is_built(&self) -> bool {
        self.phase == BuildPhase::Complete
    }

    /// Start (or restart) a build from the first phase. The published mesh
    /// stays untouched until the build completes.
    pub fn begin_build(&mut self) {
        self.scratch.clear();
        self.phase = BuildPhase::Vertices;
    }

    /// Run one build step. During splatting at most `splat_batch`
    /// triangles are processed.
    pub fn step(&mut self, splat_batch: usize) -> BuildProgress {
        let next = match self.phase {
            BuildPhase::Idle | BuildPhase::Complete => return BuildProgress::Complete,
            BuildPhase::Vertices => {
                self.generate_vertices();
                BuildPhase::Indices
            }
            BuildPhase::Indices => {
                self.generate_indices();
                BuildPhase::AccumulateNormals
            }
            BuildPhase::AccumulateNormals => {
                self.accumulate_normals();
                BuildPhase::NormalizeNormals
            }
            BuildPhase::NormalizeNormals => {
                self.normalize_normals();
                BuildPhase::Splat { next_triangle: 0 }
            }
            BuildPhase::Splat { next_triangle } => {
                let end = self.splat_triangles(next_triangle, splat_batch.max(1));
                if end >= self.scratch.indices.len() / 3 {
                    BuildPhase::Unindex(Attribute::Positions)
                } else {
                    BuildPhase::Splat { next_triangle: end }
                }
            }
            BuildPhase::Unindex(attribute) => self.unindex_attribute(attribute),
        };
        self.phase = next;
        if next == BuildPhase::Complete {
            BuildProgress::Complete
        } else {
            BuildProgress::Pending
        }
    }

    /// Run every remaining step; returns the number of steps taken.
    pub fn build_to_completion(&mut self, splat_batch: usize) -> usize {
        if matches!(self.phase, BuildPhase::Idle | BuildPhase::Complete) {
            self.begin_build();
        }
        let mut steps = 1;
        while self.step(splat_batch) == BuildProgress::Pending {
            steps += 1;
        }
        steps
    }

    fn generate_vertices(&mut self) {
        let n = self.params.resolution;
        let s = &mut self.scratch;
        let count = (n as usize + 1) * (n as usize + 1);
        s.positions.reserve(count);

        for x in 0..=n {
            for y in 0..=n {
                let v = grid_vertex(&self.params, x, y);
                s.positions.push(v.position);
                s.colours.push(self.params.surface.colour(v.world));
                s.normals.push(v.direction);
                s.up.push(v.direction);
                s.world.push(v.world);
                s.tangents.push([1.0, 0.0, 0.0, 1.0]);
                s.uvs.push([
                    (v.position.x / UV_TILE_SIZE) as f32,
                    (v.position.y / UV_TILE_SIZE) as f32,
                ]);
            }
        }
    }

    fn generate_indices(&mut self) {
        let n = self.params.resolution;
        let stride = n + 1;
        let indices = &mut self.scratch.indices;
        indices.reserve(self.params.triangle_count() * 3);

        // Fixed diagonal from (i, j) to (i+1, j+1) in every quad, so
        // neighbouring patches at equal resolution agree on shared edges.
        for i in 0..n {
            for j in 0..n {
                let a = i * stride + j;
                let b = (i + 1) * stride + j;
                indices.extend_from_slice(&[a, b + 1, a + 1]);
                indices.extend_from_slice(&[b, b + 1, a]);
            }
        }
    }

    fn accumulate_normals(&mut self) {
        let s = &mut self.scratch;
        for tri in s.indices.chunks_exact(3) {
            let (i1, i2, i3) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let (p1, p2, p3) = (s.positions[i1], s.positions[i2], s.positions[i3]);
            let face_normal = (p3 - p2).cross(p1 - p2);
            s.normals[i1] += face_normal;
            s.normals[i2] += face_normal;
            s.normals[i3] += face_normal;
        }
    }

    fn normalize_normals(&mut self) {
        for n in &mut self.scratch.normals {
            *n = n.normalize_or_zero();
        }
    }

    /// Splat triangles `start..start + batch`, returning the end index.
    fn splat_triangles(&mut self, start: usize, batch: usize) -> usize {
        let s = &mut self.scratch;
        let frame = &self.params.frame;
        let surface = &self.params.surface;
        let end = (start + batch).min(s.indices.len() / 3);

        for tri in s.indices[start * 3..end * 3].chunks_exact(3) {
            let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let splats = corners.map(|i| {
                surface.splat(
                    s.world[i],
                    frame.to_world_direction(s.normals[i]),
                    frame.to_world_direction(s.up[i]),
                )
            });

            let mut summed = [0.0f32; TextureType::COUNT];
            for splat in &splats {
                for (total, strength) in summed.iter_mut().zip(splat.strengths()) {
                    *total += strength;
                }
            }
            let top = strongest_four(&summed);

            for splat in &splats {
                let strengths = splat.strengths();
                let weights = normalize_weights(top.map(|k| strengths[k]));
                s.staged.splat_indices.push(top.map(|k| k as u32));
                s.staged.splat_weights.push(weights);
            }
        }
        end
    }

    fn unindex_attribute(&mut self, attribute: Attribute) -> BuildPhase {
        let s = &mut self.scratch;
        match attribute {
            Attribute::Positions => {
                unindex(&s.positions, &s.indices, &mut s.staged.positions, to_f32);
                BuildPhase::Unindex(Attribute::Colours)
            }
            Attribute::Colours => {
                unindex(&s.colours, &s.indices, &mut s.staged.colours, |c| c.to_array());
                BuildPhase::Unindex(Attribute::Normals)
            }
            Attribute::Normals => {
                unindex(&s.normals, &s.indices, &mut s.staged.normals, to_f32);
                BuildPhase::Unindex(Attribute::Tangents)
            }
            Attribute::Tangents => {
                unindex(&s.tangents, &s.indices, &mut s.staged.tangents, |t| t);
                BuildPhase::Unindex(Attribute::Uvs)
            }
            Attribute::Uvs => {
                unindex(&s.uvs, &s.indices, &mut s.staged.uvs, |uv| uv);
                std::mem::swap(&mut self.mesh, &mut s.staged);
                s.clear();
                BuildPhase::Complete
            }
        }
    }
}

impl fmt::Debug for TerrainPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerrainPatch")
            .field("params", &self.params)
            .field("visible", &self.visible)
            .field("phase", &self.phase)
            .field("corners", &self.mesh.corner_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_cubesphere::CubeFace;
    use nebula_terrain::{FixedHeight, FixedSurface, SplatWeights};

    const RADIUS: f64 = 4000.0;

    /// Splat source whose strengths vary with position so corners differ.
    struct Banded;

    impl SurfaceGenerator for Banded {
        fn colour(&self, position: DVec3) -> Vec3 {
            Vec3::splat((position.x.abs() % 1.0) as f32)
        }

        fn splat(&self, position: DVec3, _normal: DVec3, _up: DVec3) -> SplatWeights {
            let mut w = SplatWeights::new();
            for t in TextureType::ALL {
                let phase = position.y * 0.01 + t.index() as f64;
                w.set(t, (phase.sin() * 0.5 + 0.5) as f32);
            }
            w
        }
    }

    /// Splat source that never assigns any strength.
    struct Barren;

    impl SurfaceGenerator for Barren {
        fn colour(&self, _position: DVec3) -> Vec3 {
            Vec3::ZERO
        }

        fn splat(&self, _position: DVec3, _normal: DVec3, _up: DVec3) -> SplatWeights {
            SplatWeights::new()
        }
    }

    fn params(resolution: u32, surface: Arc<dyn SurfaceGenerator>) -> PatchParams {
        PatchParams {
            frame: FaceFrame::new(CubeFace::PosX, RADIUS),
            offset: DVec2::new(250.0, -250.0),
            width: 500.0,
            resolution,
            height: Arc::new(FixedHeight(50.0)),
            surface,
        }
    }

    fn built(resolution: u32, surface: Arc<dyn SurfaceGenerator>) -> TerrainPatch {
        let mut patch = TerrainPatch::new(params(resolution, surface));
        patch.build_to_completion(1000);
        patch
    }

    #[test]
    fn test_corner_count_is_six_n_squared() {
        for n in [1, 4, 7] {
            let patch = built(n, Arc::new(FixedSurface::default()));
            let expected = 6 * (n as usize) * (n as usize);
            assert_eq!(patch.mesh().corner_count(), expected, "resolution {n}");
            assert!(patch.mesh().is_consistent());
            assert!(patch.is_built());
        }
    }

    #[test]
    fn test_new_patch_is_hidden_and_idle() {
        let patch = TerrainPatch::new(params(4, Arc::new(FixedSurface::default())));
        assert!(!patch.is_visible());
        assert_eq!(patch.phase(), BuildPhase::Idle);
        assert!(patch.mesh().is_empty());
    }

    #[test]
    fn test_step_sequence_and_late_publication() {
        // 4x4 grid -> 32 triangles -> 4 splat batches of 10.
        let mut patch = TerrainPatch::new(params(4, Arc::new(Banded)));
        patch.begin_build();

        let expected_steps = 4 + 4 + 5;
        for step in 1..expected_steps {
            assert_eq!(patch.step(10), BuildProgress::Pending, "step {step}");
            assert!(patch.mesh().is_empty(), "mesh published early at step {step}");
        }
        assert_eq!(patch.step(10), BuildProgress::Complete);
        assert_eq!(patch.mesh().corner_count(), 6 * 16);
        assert_eq!(patch.step(10), BuildProgress::Complete);
    }

    #[test]
    fn test_splat_phase_resumes_at_cursor() {
        let mut patch = TerrainPatch::new(params(4, Arc::new(Banded)));
        patch.begin_build();
        for _ in 0..4 {
            patch.step(10);
        }
        assert_eq!(patch.phase(), BuildPhase::Splat { next_triangle: 0 });
        patch.step(10);
        assert_eq!(patch.phase(), BuildPhase::Splat { next_triangle: 10 });
        patch.step(10);
        assert_eq!(patch.phase(), BuildPhase::Splat { next_triangle: 20 });
        patch.step(10);
        assert_eq!(patch.phase(), BuildPhase::Splat { next_triangle: 30 });
        patch.step(10);
        assert_eq!(patch.phase(), BuildPhase::Unindex(Attribute::Positions));
    }

    #[test]
    fn test_rebuild_keeps_old_mesh_until_done() {
        let mut patch = built(3, Arc::new(FixedSurface::default()));
        let before = patch.mesh().clone();
        patch.set_providers(Arc::new(FixedHeight(80.0)), Arc::new(FixedSurface::default()));
        patch.begin_build();
        while patch.phase() != BuildPhase::Unindex(Attribute::Uvs) {
            patch.step(1000);
            assert_eq!(patch.mesh(), &before);
        }
        assert_eq!(patch.step(1000), BuildProgress::Complete);
        assert_ne!(patch.mesh(), &before);
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = built(5, Arc::new(Banded));
        let b = built(5, Arc::new(Banded));
        assert_eq!(a.mesh(), b.mesh());

        let mut c = built(5, Arc::new(Banded));
        c.build_to_completion(7);
        assert_eq!(a.mesh(), c.mesh(), "batch size must not change output");
    }

    #[test]
    fn test_vertices_lie_on_displaced_sphere() {
        let patch = built(4, Arc::new(FixedSurface::default()));
        let frame = patch.params().frame;
        for p in &patch.mesh().positions {
            let local = DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64);
            let world = frame.to_world(local);
            assert!(
                (world.length() - (RADIUS + 50.0)).abs() < 1e-2,
                "vertex at distance {}",
                world.length()
            );
        }
    }

    #[test]
    fn test_normals_are_unit_and_outward() {
        let patch = built(4, Arc::new(FixedSurface::default()));
        for (n, p) in patch.mesh().normals.iter().zip(&patch.mesh().positions) {
            let n = Vec3::from_array(*n);
            assert!((n.length() - 1.0).abs() < 1e-4, "normal length {}", n.length());
            let radial = (Vec3::from_array(*p) + Vec3::new(0.0, 0.0, RADIUS as f32)).normalize();
            assert!(n.dot(radial) > 0.9, "normal {n:?} not outward");
        }
    }

    #[test]
    fn test_tangents_constant() {
        let patch = built(2, Arc::new(FixedSurface::default()));
        assert!(patch.mesh().tangents.iter().all(|t| *t == [1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_splat_weights_sum_to_one() {
        let patch = built(4, Arc::new(Banded));
        for (w, idx) in patch.mesh().splat_weights.iter().zip(&patch.mesh().splat_indices) {
            let total: f32 = w.iter().sum();
            assert!((total - 1.0).abs() < 1e-5, "weights {w:?} sum to {total}");
            assert!(idx.iter().all(|&i| (i as usize) < TextureType::COUNT));
        }
    }

    #[test]
    fn test_corners_of_a_triangle_share_texture_indices() {
        let patch = built(3, Arc::new(Banded));
        for tri in patch.mesh().splat_indices.chunks_exact(3) {
            assert_eq!(tri[0], tri[1]);
            assert_eq!(tri[1], tri[2]);
        }
    }

    #[test]
    fn test_zero_strength_splat_has_no_nan() {
        let patch = built(3, Arc::new(Barren));
        for w in &patch.mesh().splat_weights {
            assert_eq!(*w, [0.0; 4]);
        }
    }

    #[test]
    fn test_adjacent_patches_share_edge_vertices() {
        let surface: Arc<dyn SurfaceGenerator> = Arc::new(FixedSurface::default());
        let left = params(4, surface.clone());
        let right = PatchParams {
            offset: left.offset + DVec2::new(left.width, 0.0),
            ..left.clone()
        };
        for y in 0..=4 {
            let a = grid_vertex(&left, 4, y);
            let b = grid_vertex(&right, 0, y);
            assert_eq!(a.world, b.world, "edge vertex {y} differs");
        }
    }

    #[test]
    fn test_reinitialize_clears_and_hides() {
        let mut patch = built(2, Arc::new(FixedSurface::default()));
        patch.show();
        let cap = patch.mesh().positions.capacity();
        patch.reinitialize(params(2, Arc::new(FixedSurface::default())));
        assert!(!patch.is_visible());
        assert!(patch.mesh().is_empty());
        assert_eq!(patch.phase(), BuildPhase::Idle);
        assert_eq!(patch.mesh().positions.capacity(), cap);
    }

    #[test]
    fn test_idle_step_is_noop() {
        let mut patch = TerrainPatch::new(params(2, Arc::new(FixedSurface::default())));
        assert_eq!(patch.step(10), BuildProgress::Complete);
        assert_eq!(patch.phase(), BuildPhase::Idle);
    }
}
