//! Height providers: pure scalar fields sampled once per patch vertex.

use std::sync::Arc;

use glam::DVec3;

use crate::FbmNoise;

/// Result of sampling a height provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightSample {
    /// Displacement along the sphere normal.
    pub height: f64,
    /// Blend weight when several providers are combined.
    pub weight: f64,
}

/// A deterministic height field over world positions.
///
/// Implementations must be pure: the same position always returns the same
/// sample, so patches can be regenerated without caching provider output.
/// Non-finite heights are passed through to the mesh unchanged.
pub trait HeightProvider {
    /// Sample the field at a world position on the undisplaced sphere.
    fn sample(&self, position: DVec3) -> HeightSample;
}

/// Noise-driven height: `noise(position) * scale`.
pub struct NoiseHeight {
    noise: FbmNoise,
    scale: f64,
}

impl NoiseHeight {
    /// Wrap a noise field with an output scale.
    pub fn new(noise: FbmNoise, scale: f64) -> Self {
        Self { noise, scale }
    }
}

impl HeightProvider for NoiseHeight {
    fn sample(&self, position: DVec3) -> HeightSample {
        HeightSample {
            height: self.noise.sample(position) * self.scale,
            weight: 1.0,
        }
    }
}

/// Constant height everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedHeight(pub f64);

impl HeightProvider for FixedHeight {
    fn sample(&self, _position: DVec3) -> HeightSample {
        HeightSample {
            height: self.0,
            weight: 1.0,
        }
    }
}

/// Weighted mean of several providers, using each provider's returned weight.
#[derive(Default)]
pub struct BlendedHeight {
    providers: Vec<Arc<dyn HeightProvider>>,
}

impl BlendedHeight {
    /// Blend the given providers.
    pub fn new(providers: Vec<Arc<dyn HeightProvider>>) -> Self {
        Self { providers }
    }

    /// Add another provider to the blend.
    pub fn push(&mut self, provider: Arc<dyn HeightProvider>) {
        self.providers.push(provider);
    }
}

impl HeightProvider for BlendedHeight {
    fn sample(&self, position: DVec3) -> HeightSample {
        let (sum, total_weight) = self
            .providers
            .iter()
            .map(|p| p.sample(position))
            .fold((0.0, 0.0), |(sum, weight), s| {
                (sum + s.height * s.weight, weight + s.weight)
            });
        if total_weight <= 0.0 {
            return HeightSample {
                height: 0.0,
                weight: 0.0,
            };
        }
        HeightSample {
            height: sum / total_weight,
            weight: total_weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoiseParams;

    struct Weighted(f64, f64);

    impl HeightProvider for Weighted {
        fn sample(&self, _position: DVec3) -> HeightSample {
            HeightSample {
                height: self.0,
                weight: self.1,
            }
        }
    }

    #[test]
    fn test_fixed_height_is_constant() {
        let h = FixedHeight(50.0);
        assert_eq!(h.sample(DVec3::ZERO).height, 50.0);
        assert_eq!(h.sample(DVec3::new(9.0, 9.0, 9.0)).height, 50.0);
    }

    #[test]
    fn test_noise_height_scales_noise() {
        let params = NoiseParams {
            octaves: 3,
            height: 10.0,
            exponentiation: 1.0,
            ..Default::default()
        };
        let raw = FbmNoise::new(params.clone());
        let scaled = NoiseHeight::new(FbmNoise::new(params), 0.25);
        let p = DVec3::new(1000.0, 2000.0, 3000.0);
        assert!((scaled.sample(p).height - raw.sample(p) * 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_blend_is_weighted_mean() {
        let blend = BlendedHeight::new(vec![
            Arc::new(Weighted(10.0, 1.0)),
            Arc::new(Weighted(40.0, 3.0)),
        ]);
        let s = blend.sample(DVec3::ZERO);
        assert!((s.height - 32.5).abs() < 1e-12, "got {}", s.height);
        assert_eq!(s.weight, 4.0);
    }

    #[test]
    fn test_empty_blend_is_zero() {
        let s = BlendedHeight::default().sample(DVec3::ONE);
        assert_eq!(s.height, 0.0);
    }
}
