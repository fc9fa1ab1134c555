//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// LOD and patch-build settings.
    pub terrain: TerrainConfig,
    /// Fractal noise driving terrain height.
    pub height_noise: NoiseConfig,
    /// Fractal noise blending arid and humid biomes.
    pub biome_noise: NoiseConfig,
    /// Fractal noise jittering surface colour.
    pub colour_noise: NoiseConfig,
    /// Headless demo flight.
    pub demo: DemoConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Terrain LOD and streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Smallest LOD cell edge length.
    pub min_cell_size: f64,
    /// Grid subdivisions per patch edge.
    pub min_cell_resolution: u32,
    /// Planet radius.
    pub planet_radius: f64,
    /// Triangles splatted per tick while building a patch.
    pub face_build_batch_size: usize,
    /// A cell splits when the viewer is closer than this multiple of its size.
    pub split_distance_factor: f64,
    /// Recycled patches kept per patch width.
    pub max_pooled_per_width: usize,
    /// Multiplier applied to the height noise.
    pub height_scale: f64,
}

/// Gradient noise flavour.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum NoiseKind {
    /// Simplex noise.
    #[default]
    Simplex,
    /// Perlin noise.
    Perlin,
}

/// Fractal Brownian motion parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    /// Gradient noise flavour.
    pub kind: NoiseKind,
    /// Permutation seed.
    pub seed: u32,
    /// Number of octaves.
    pub octaves: u32,
    /// Amplitude falloff exponent per octave.
    pub persistence: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Exponent applied to the normalised sum.
    pub exponentiation: f64,
    /// Output multiplier.
    pub height: f64,
    /// World distance covered by one unit of first-octave noise.
    pub scale: f64,
}

/// Headless demo configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Frames to simulate before exiting.
    pub frames: u32,
    /// Viewer altitude above the planet surface.
    pub orbit_altitude: f64,
    /// Orbit angular speed in radians per frame.
    pub orbit_speed: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            min_cell_size: 500.0,
            min_cell_resolution: 96,
            planet_radius: 4000.0,
            face_build_batch_size: 1000,
            split_distance_factor: 0.75,
            max_pooled_per_width: 64,
            height_scale: 0.25,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self::height()
    }
}

impl NoiseConfig {
    /// Defaults for the terrain height field.
    pub fn height() -> Self {
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

    /// Defaults for the biome blend.
    pub fn biome() -> Self {
        Self {
            seed: 2,
            octaves: 2,
            lacunarity: 2.0,
            exponentiation: 1.0,
            height: 1.0,
            scale: 2048.0,
            ..Self::height()
        }
    }

    /// Defaults for the colour jitter.
    pub fn colour() -> Self {
        Self {
            octaves: 1,
            scale: 256.0,
            ..Self::biome()
        }
    }

    fn validate(&self, section: &'static str) -> Result<(), ConfigError> {
        if self.octaves == 0 {
            return Err(ConfigError::InvalidValue {
                field: section,
                reason: "octaves must be at least 1".to_string(),
            });
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: section,
                reason: format!("scale must be positive, got {}", self.scale),
            });
        }
        Ok(())
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 5000,
            orbit_altitude: 100.0,
            orbit_speed: 0.0005,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Reject anything that is not a finite, strictly positive number.
fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be finite and > 0, got {value}"),
        })
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// A config whose noise sections use their per-purpose defaults.
    ///
    /// `Default` gives every noise section the height defaults so partially
    /// written files stay predictable; this is what a fresh file contains.
    pub fn recommended() -> Self {
        Self {
            biome_noise: NoiseConfig::biome(),
            colour_noise: NoiseConfig::colour(),
            ..Self::default()
        }
    }

    /// Check value ranges after loading and applying overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.terrain;
        positive("terrain.min_cell_size", t.min_cell_size)?;
        positive("terrain.planet_radius", t.planet_radius)?;
        positive("terrain.split_distance_factor", t.split_distance_factor)?;
        if t.min_cell_resolution == 0 {
            return Err(ConfigError::InvalidValue {
                field: "terrain.min_cell_resolution",
                reason: "must be at least 1".to_string(),
            });
        }
        if t.face_build_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "terrain.face_build_batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        self.height_noise.validate("height_noise")?;
        self.biome_noise.validate("biome_noise")?;
        self.colour_noise.validate("colour_noise")?;
        Ok(())
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::recommended();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::recommended();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("min_cell_resolution: 96"));
        assert!(ron_str.contains("face_build_batch_size: 1000"));
        assert!(ron_str.contains("scale: 2048.0"));
    }

    #[test]
    fn test_recommended_noise_sections() {
        let config = Config::recommended();
        assert_eq!(config.height_noise.octaves, 10);
        assert_eq!(config.height_noise.exponentiation, 7.5);
        assert_eq!(config.biome_noise.octaves, 2);
        assert_eq!(config.biome_noise.seed, 2);
        assert_eq!(config.colour_noise.octaves, 1);
        assert_eq!(config.colour_noise.scale, 256.0);
        assert_eq!(config.colour_noise.height, 1.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::recommended();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        let ron_str = "(terrain: (planet_radius: 6000.0), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.terrain.planet_radius, 6000.0);
        assert_eq!(config.terrain.min_cell_size, 500.0);
        assert_eq!(config.demo, DemoConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_noise_kind_parses() {
        let config: NoiseConfig = ron::from_str("(kind: Perlin, octaves: 3)").unwrap();
        assert_eq!(config.kind, NoiseKind::Perlin);
        assert_eq!(config.octaves, 3);
        assert_eq!(config.seed, 1);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::recommended().validate().is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::recommended();
        config.terrain.planet_radius = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "terrain.planet_radius",
                ..
            })
        ));

        let mut config = Config::recommended();
        config.terrain.min_cell_resolution = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "terrain.min_cell_resolution",
                ..
            })
        ));

        let mut config = Config::recommended();
        config.biome_noise.octaves = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "biome_noise",
                ..
            })
        ));

        let mut config = Config::recommended();
        config.terrain.min_cell_size = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::recommended();
        config.terrain.min_cell_resolution = 32;
        config.height_noise.seed = 99;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert!(dir.path().join("config.ron").exists());
        assert_eq!(config, Config::recommended());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::recommended();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.terrain.face_build_batch_size = 250;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().terrain.face_build_batch_size, 250);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::recommended();
        config.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
