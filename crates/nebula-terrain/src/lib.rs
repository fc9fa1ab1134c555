//! Procedural terrain providers: fractal noise, height fields, and the
//! colour/texture-splat generator that feed terrain patch meshing.

mod fbm;
mod height;
mod spline;
mod splatter;
mod surface;

pub use fbm::{FbmNoise, NoiseKind, NoiseParams};
pub use height::{BlendedHeight, FixedHeight, HeightProvider, HeightSample, NoiseHeight};
pub use spline::LinearSpline;
pub use splatter::TextureSplatter;
pub use surface::{FixedSurface, SplatWeights, SurfaceGenerator, TextureType};
