//! Colour and texture-splat generation for terrain surfaces.

use glam::{DVec3, Vec3};

/// The fixed palette of ground textures a patch can blend between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TextureType {
    /// Bare dirt.
    Dirt = 0,
    /// Grass.
    Grass = 1,
    /// Sandy gravel.
    Gravel = 2,
    /// Worn rock.
    Rock = 3,
    /// Packed snow.
    Snow = 4,
    /// Rock under snow and ice.
    SnowRock = 5,
    /// Wet cobble (shorelines).
    Cobble = 6,
    /// Sandy rocks (beaches).
    SandyRock = 7,
}

impl TextureType {
    /// Number of texture types in the palette.
    pub const COUNT: usize = 8;

    /// All texture types in index order.
    pub const ALL: [TextureType; Self::COUNT] = [
        TextureType::Dirt,
        TextureType::Grass,
        TextureType::Gravel,
        TextureType::Rock,
        TextureType::Snow,
        TextureType::SnowRock,
        TextureType::Cobble,
        TextureType::SandyRock,
    ];

    /// Index into the texture atlas.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Strength of every palette texture at one surface point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SplatWeights {
    strengths: [f32; TextureType::COUNT],
}

impl SplatWeights {
    /// All strengths zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strength of one texture.
    #[must_use]
    pub fn get(&self, texture: TextureType) -> f32 {
        self.strengths[texture.index()]
    }

    /// Set the strength of one texture.
    pub fn set(&mut self, texture: TextureType, strength: f32) {
        self.strengths[texture.index()] = strength;
    }

    /// Multiply every strength by `factor`.
    pub fn scale(&mut self, factor: f32) {
        for s in &mut self.strengths {
            *s *= factor;
        }
    }

    /// Strengths indexed by [`TextureType::index`].
    #[must_use]
    pub fn strengths(&self) -> &[f32; TextureType::COUNT] {
        &self.strengths
    }

    /// Sum of all strengths.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.strengths.iter().sum()
    }
}

/// Colour and splat source for patch vertices.
///
/// Positions are world-space points on the displaced terrain surface.
pub trait SurfaceGenerator {
    /// Vertex colour (linear RGB in `[0, 1]`).
    fn colour(&self, position: DVec3) -> Vec3;

    /// Texture strengths given the surface normal and the radial up vector.
    fn splat(&self, position: DVec3, normal: DVec3, up: DVec3) -> SplatWeights;
}

/// Constant colour and a single full-strength texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedSurface {
    /// Colour returned everywhere.
    pub colour: Vec3,
    /// Texture returned everywhere at strength 1.
    pub texture: TextureType,
}

impl Default for FixedSurface {
    fn default() -> Self {
        Self {
            colour: Vec3::splat(0.5),
            texture: TextureType::Grass,
        }
    }
}

impl SurfaceGenerator for FixedSurface {
    fn colour(&self, _position: DVec3) -> Vec3 {
        self.colour
    }

    fn splat(&self, _position: DVec3, _normal: DVec3, _up: DVec3) -> SplatWeights {
        let mut w = SplatWeights::new();
        w.set(self.texture, 1.0);
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_indices_are_dense() {
        for (i, t) in TextureType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i);
        }
    }

    #[test]
    fn test_scale_and_total() {
        let mut w = SplatWeights::new();
        w.set(TextureType::Rock, 0.5);
        w.set(TextureType::Snow, 1.5);
        assert_eq!(w.total(), 2.0);
        w.scale(0.5);
        assert_eq!(w.get(TextureType::Snow), 0.75);
        assert_eq!(w.total(), 1.0);
    }

    #[test]
    fn test_fixed_surface_single_texture() {
        let s = FixedSurface::default();
        let w = s.splat(DVec3::ZERO, DVec3::Y, DVec3::Y);
        assert_eq!(w.get(TextureType::Grass), 1.0);
        assert_eq!(w.total(), 1.0);
    }
}
