//! Command-line arguments for the terrain streaming demo.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Terrain streamer command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nebula-demo", about = "Streams cube-sphere terrain around an orbiting viewpoint")]
pub struct CliArgs {
    /// Smallest LOD cell size.
    #[arg(long)]
    pub min_cell_size: Option<f64>,

    /// Grid subdivisions per patch edge.
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Planet radius.
    #[arg(long)]
    pub planet_radius: Option<f64>,

    /// Triangles splatted per tick.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(size) = args.min_cell_size {
            self.terrain.min_cell_size = size;
        }
        if let Some(n) = args.resolution {
            self.terrain.min_cell_resolution = n;
        }
        if let Some(r) = args.planet_radius {
            self.terrain.planet_radius = r;
        }
        if let Some(batch) = args.batch_size {
            self.terrain.face_build_batch_size = batch;
        }
        if let Some(frames) = args.frames {
            self.demo.frames = frames;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
