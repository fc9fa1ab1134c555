//! Elevation- and biome-driven colour and texture splatting.

use glam::{DVec3, Vec3};

use crate::{FbmNoise, LinearSpline, SplatWeights, SurfaceGenerator, TextureType};

const SNOW: u32 = 0xFFFFFF;
const SHORE: u32 = 0x54380E;

/// Elevation that maps to the top of the colour splines.
const COLOUR_ELEVATION_RANGE: f64 = 100.0;

/// Elevation unit for texture bands.
const SPLAT_ELEVATION_UNIT: f64 = 25.0;

/// Strength pinned on dirt so that some texture is always present.
const DIRT_FLOOR: f32 = 0.01;

fn rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xFF) as f32,
        ((hex >> 8) & 0xFF) as f32,
        (hex & 0xFF) as f32,
    ) / 255.0
}

fn lerp_colour(t: f64, a: &Vec3, b: &Vec3) -> Vec3 {
    a.lerp(*b, t as f32)
}

fn sat(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Surface generator blending arid and humid palettes by a biome field.
///
/// Elevation is measured from the planet sphere: `|position| - radius`.
pub struct TextureSplatter {
    biome: FbmNoise,
    colour_noise: FbmNoise,
    planet_radius: f64,
    arid: LinearSpline<Vec3>,
    humid: LinearSpline<Vec3>,
}

impl TextureSplatter {
    /// Build a splatter. `biome` should produce values in `[0, 1]`
    /// (0 = arid, 1 = humid); `colour_noise` drives a small lightness jitter.
    pub fn new(biome: FbmNoise, colour_noise: FbmNoise, planet_radius: f64) -> Self {
        let mut arid = LinearSpline::new(lerp_colour);
        arid.add_point(0.0, rgb(0xB7A67D))
            .add_point(0.5, rgb(0xF1E1BC))
            .add_point(1.0, rgb(SNOW));

        let mut humid = LinearSpline::new(lerp_colour);
        humid
            .add_point(0.0, rgb(0x29C100))
            .add_point(0.5, rgb(0xCEE59C))
            .add_point(1.0, rgb(SNOW));

        Self {
            biome,
            colour_noise,
            planet_radius,
            arid,
            humid,
        }
    }

    fn elevation(&self, position: DVec3) -> f64 {
        position.length() - self.planet_radius
    }

    fn base_colour(&self, position: DVec3) -> Vec3 {
        let m = self.biome.sample(position);
        let h = sat(self.elevation(position) / COLOUR_ELEVATION_RANGE);

        let arid = self.arid.get(h).unwrap_or(Vec3::ONE);
        let humid = self.humid.get(h).unwrap_or(Vec3::ONE);
        let mut c = arid.lerp(humid, m as f32);

        if h < 0.1 {
            c = c.lerp(rgb(SHORE), (1.0 - sat(h / 0.05)) as f32);
        }
        c
    }
}

/// Scale every strength by `keep`, then set `texture` to `strength`.
fn apply(weights: &mut SplatWeights, texture: TextureType, strength: f64, keep: f64) {
    weights.scale(keep as f32);
    weights.set(texture, strength as f32);
}

impl SurfaceGenerator for TextureSplatter {
    fn colour(&self, position: DVec3) -> Vec3 {
        let jitter = (self.colour_noise.sample(position) * 2.0 - 1.0) * 0.01;
        (self.base_colour(position) + Vec3::splat(jitter as f32)).clamp(Vec3::ZERO, Vec3::ONE)
    }

    fn splat(&self, position: DVec3, _normal: DVec3, _up: DVec3) -> SplatWeights {
        let m = self.biome.sample(position);
        let h = self.elevation(position) / SPLAT_ELEVATION_UNIT;

        let mut w = SplatWeights::new();
        w.set(TextureType::Grass, 1.0);
        apply(&mut w, TextureType::Gravel, 1.0 - m, m);

        if h < 0.2 {
            let s = 1.0 - sat((h - 0.1) / 0.05);
            apply(&mut w, TextureType::Cobble, s, 1.0 - s);

            if h < 0.1 {
                let s = 1.0 - sat((h - 0.05) / 0.05);
                apply(&mut w, TextureType::SandyRock, s, 1.0 - s);
            }
        } else {
            if h > 0.125 {
                let s = sat((h - 0.125) / 1.25);
                apply(&mut w, TextureType::Rock, s, 1.0 - s);
            }
            if h > 1.5 {
                let s = sat((h - 0.75) / 2.0);
                apply(&mut w, TextureType::Snow, s, 1.0 - s);
            }
        }

        w.set(TextureType::Dirt, DIRT_FLOOR);
        w
    }
}
