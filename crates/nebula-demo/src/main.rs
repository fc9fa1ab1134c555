//! Headless terrain streaming demo.
//!
//! Flies a viewpoint around the planet on a tilted orbit and lets the chunk
//! manager stream patches in and out, logging every committed batch.
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags, e.g. `cargo run -p nebula-demo -- --resolution 16 --frames 2000`.

mod generators;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::DVec3;
use nebula_config::{CliArgs, Config};
use nebula_streaming::{ChunkManager, PatchEvent};
use tracing::{debug, error, info};

/// Viewer position `frame` steps into a tilted circular orbit.
fn orbit_position(config: &Config, frame: u32) -> DVec3 {
    let angle = f64::from(frame) * config.demo.orbit_speed;
    let distance = config.terrain.planet_radius + config.demo.orbit_altitude;
    DVec3::new(angle.cos(), 0.4 * angle.sin(), angle.sin()).normalize() * distance
}

fn config_dir(args: &CliArgs) -> PathBuf {
    args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nebula-terrain")
    })
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_dir = config_dir(&args);

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::recommended()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    nebula_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let mut manager = match ChunkManager::new(
        generators::streaming_settings(&config),
        generators::terrain_generators(&config),
    ) {
        Ok(manager) => manager,
        Err(e) => {
            error!("terrain streaming disabled: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (mut shown, mut released) = (0usize, 0usize);
    for frame in 0..config.demo.frames {
        let focal = orbit_position(&config, frame);
        let summary = manager.update(focal);

        for event in manager.drain_events() {
            match event {
                PatchEvent::Shown(_) => shown += 1,
                PatchEvent::Recycled(_) | PatchEvent::Destroyed(_) => released += 1,
            }
        }
        if let Some(diff) = summary.diff {
            debug!(
                frame,
                kept = diff.kept,
                added = diff.added,
                stale = diff.stale,
                "new LOD batch"
            );
        }
        if let Some(report) = summary.committed {
            info!(
                frame,
                resident = manager.resident_len(),
                shown = report.shown,
                recycled = report.recycled,
                destroyed = report.destroyed,
                "batch committed"
            );
        }
    }

    let stats = manager.builder().stats();
    info!(
        frames = config.demo.frames,
        resident = manager.resident_len(),
        pooled = manager.builder().pooled_len(),
        allocations = stats.allocations,
        pool_hits = stats.pool_hits,
        batches = stats.batches_completed,
        steps = stats.steps,
        shown,
        released,
        "streaming finished"
    );
    ExitCode::SUCCESS
}
