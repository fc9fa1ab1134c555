//! Spatial level-of-detail index: a quadtree over each face of the cube-sphere
//! that turns a focal point into the set of terrain patch footprints.

mod cube_quadtree;
mod error;
mod leaf;

pub use cube_quadtree::{CubeQuadtree, LodSettings};
pub use error::LodError;
pub use leaf::{CellBounds, LeafKey, LodLeaf};
