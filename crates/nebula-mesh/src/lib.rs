//! Terrain patch meshing: the resumable build procedure that turns one LOD
//! leaf into flat, renderable vertex buffers.

mod patch;
mod patch_mesh;
mod splat;

pub use patch::{Attribute, BuildPhase, BuildProgress, PatchParams, TerrainPatch};
pub use patch_mesh::PatchMesh;
pub use splat::{SPLAT_EPSILON, normalize_weights, strongest_four};
