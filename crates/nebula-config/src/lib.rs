//! Configuration for the terrain streamer.
//!
//! Settings persist to disk as a RON file, can be overridden from the
//! command line via clap, and support hot-reload detection. Every section
//! falls back to defaults for missing fields so older files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, DemoConfig, NoiseConfig, NoiseKind, TerrainConfig};
pub use error::ConfigError;
