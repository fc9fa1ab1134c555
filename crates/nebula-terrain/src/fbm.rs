//! Normalised multi-octave fractal noise over 3D world positions.
//!
//! Each octave contributes `noise(p / scale * frequency)` remapped to
//! `[0, 1]`; octave amplitudes fall off by `2^-persistence` and frequencies
//! grow by `lacunarity`. The weighted sum is divided by the total amplitude,
//! raised to `exponentiation` (sharpening peaks) and scaled by `height`.

use glam::DVec3;
use noise::{NoiseFn, Perlin, Simplex};

/// Which gradient noise drives the octaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NoiseKind {
    /// Simplex noise.
    #[default]
    Simplex,
    /// Classic Perlin noise.
    Perlin,
}

/// Parameters for [`FbmNoise`].
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// Gradient noise used for every octave.
    pub kind: NoiseKind,
    /// Seed for the underlying permutation table.
    pub seed: u32,
    /// Number of octaves.
    pub octaves: u32,
    /// Amplitude falloff exponent: octave `i` has amplitude `2^(-persistence * i)`.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Exponent applied to the normalised sum.
    pub exponentiation: f64,
    /// Output multiplier.
    pub height: f64,
    /// World distance covered by one unit of first-octave noise.
    pub scale: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            kind: NoiseKind::Simplex,
            seed: 1,
            octaves: 10,
            persistence: 0.5,
            lacunarity: 1.6,
            exponentiation: 7.5,
            height: 900.0,
            scale: 1800.0,
        }
    }
}

enum Source {
    Simplex(Simplex),
    Perlin(Perlin),
}

impl Source {
    fn get(&self, p: [f64; 3]) -> f64 {
        match self {
            Source::Simplex(n) => n.get(p),
            Source::Perlin(n) => n.get(p),
        }
    }
}

/// Deterministic fractal noise field. Output lies in `[0, height]`.
pub struct FbmNoise {
    source: Source,
    params: NoiseParams,
}

impl FbmNoise {
    /// Create a noise field from its parameters.
    pub fn new(params: NoiseParams) -> Self {
        let source = match params.kind {
            NoiseKind::Simplex => Source::Simplex(Simplex::new(params.seed)),
            NoiseKind::Perlin => Source::Perlin(Perlin::new(params.seed)),
        };
        Self { source, params }
    }

    /// Sample the field at a world position.
    pub fn sample(&self, p: DVec3) -> f64 {
        let falloff = 2.0_f64.powf(-self.params.persistence);
        let scaled = p / self.params.scale;

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut normalization = 0.0;
        let mut total = 0.0;
        for _ in 0..self.params.octaves {
            let q = scaled * frequency;
            let value = self.source.get([q.x, q.y, q.z]) * 0.5 + 0.5;
            total += value * amplitude;
            normalization += amplitude;
            amplitude *= falloff;
            frequency *= self.params.lacunarity;
        }
        if normalization <= 0.0 {
            return 0.0;
        }

        // Gradient noise can overshoot [-1, 1] slightly; keep powf real.
        let normalized = (total / normalization).clamp(0.0, 1.0);
        normalized.powf(self.params.exponentiation) * self.params.height
    }

    /// Parameters the field was built with.
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u32) -> NoiseParams {
        NoiseParams {
            seed,
            octaves: 4,
            exponentiation: 1.0,
            height: 100.0,
            scale: 256.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_seed_same_value() {
        let a = FbmNoise::new(params(42));
        let b = FbmNoise::new(params(42));
        let p = DVec3::new(123.5, -77.0, 4001.25);
        assert_eq!(a.sample(p).to_bits(), b.sample(p).to_bits());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = FbmNoise::new(params(1));
        let b = FbmNoise::new(params(999));
        let differs = (0..32).any(|i| {
            let p = DVec3::new(i as f64 * 37.0, 11.0, 3900.0);
            (a.sample(p) - b.sample(p)).abs() > 1e-9
        });
        assert!(differs, "different seeds should produce different fields");
    }

    #[test]
    fn test_output_within_height() {
        for kind in [NoiseKind::Simplex, NoiseKind::Perlin] {
            let noise = FbmNoise::new(NoiseParams {
                kind,
                ..params(7)
            });
            for i in 0..200 {
                let p = DVec3::new(i as f64 * 13.7, i as f64 * -5.1, 4000.0);
                let h = noise.sample(p);
                assert!((0.0..=100.0).contains(&h), "{kind:?} sample {h} out of range");
            }
        }
    }

    #[test]
    fn test_zero_octaves_is_flat() {
        let noise = FbmNoise::new(NoiseParams {
            octaves: 0,
            ..params(3)
        });
        assert_eq!(noise.sample(DVec3::new(1.0, 2.0, 3.0)), 0.0);
    }

    #[test]
    fn test_exponentiation_flattens_lowlands() {
        let linear = FbmNoise::new(params(5));
        let sharp = FbmNoise::new(NoiseParams {
            exponentiation: 4.0,
            ..params(5)
        });
        let p = DVec3::new(400.0, 900.0, -3000.0);
        assert!(sharp.sample(p) <= linear.sample(p) + 1e-9);
    }
}
