//! Builds the terrain providers described by the config.

use std::sync::Arc;

use nebula_config::{Config, NoiseConfig, NoiseKind as ConfigNoiseKind};
use nebula_streaming::{StreamingSettings, TerrainGenerators};
use nebula_terrain::{FbmNoise, NoiseHeight, NoiseKind, NoiseParams, TextureSplatter};

fn noise(config: &NoiseConfig) -> FbmNoise {
    FbmNoise::new(NoiseParams {
        kind: match config.kind {
            ConfigNoiseKind::Simplex => NoiseKind::Simplex,
            ConfigNoiseKind::Perlin => NoiseKind::Perlin,
        },
        seed: config.seed,
        octaves: config.octaves,
        persistence: config.persistence,
        lacunarity: config.lacunarity,
        exponentiation: config.exponentiation,
        height: config.height,
        scale: config.scale,
    })
}

/// Height field and texture splatter for `config`.
pub fn terrain_generators(config: &Config) -> TerrainGenerators {
    let height = NoiseHeight::new(noise(&config.height_noise), config.terrain.height_scale);
    let splatter = TextureSplatter::new(
        noise(&config.biome_noise),
        noise(&config.colour_noise),
        config.terrain.planet_radius,
    );
    TerrainGenerators {
        height: Arc::new(height),
        surface: Arc::new(splatter),
    }
}

/// Streaming settings for `config`.
pub fn streaming_settings(config: &Config) -> StreamingSettings {
    let t = &config.terrain;
    StreamingSettings {
        planet_radius: t.planet_radius,
        min_cell_size: t.min_cell_size,
        split_distance_factor: t.split_distance_factor,
        min_cell_resolution: t.min_cell_resolution,
        face_build_batch_size: t.face_build_batch_size,
        max_pooled_per_width: t.max_pooled_per_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use nebula_terrain::HeightProvider;

    #[test]
    fn test_settings_follow_config() {
        let mut config = Config::recommended();
        config.terrain.min_cell_resolution = 8;
        config.terrain.face_build_batch_size = 10;
        let settings = streaming_settings(&config);
        assert_eq!(settings.min_cell_resolution, 8);
        assert_eq!(settings.face_build_batch_size, 10);
        assert_eq!(settings.planet_radius, config.terrain.planet_radius);
    }

    #[test]
    fn test_height_is_scaled_noise() {
        let config = Config::recommended();
        let generators = terrain_generators(&config);
        let p = DVec3::new(4000.0, 120.0, -35.0);
        let raw = noise(&config.height_noise).sample(p);
        let sample = generators.height.sample(p);
        assert!((sample.height - raw * config.terrain.height_scale).abs() < 1e-9);
        assert_eq!(sample.weight, 1.0);
    }
}
