use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::DVec2;
use nebula_cubesphere::{CubeFace, FaceFrame};
use nebula_mesh::{BuildProgress, PatchParams, TerrainPatch, strongest_four};
use nebula_terrain::{FbmNoise, NoiseHeight, NoiseParams, TextureSplatter};

const RADIUS: f64 = 4000.0;

fn params(resolution: u32) -> PatchParams {
    let height = FbmNoise::new(NoiseParams::default());
    let biome = FbmNoise::new(NoiseParams {
        octaves: 2,
        seed: 2,
        exponentiation: 1.0,
        height: 1.0,
        scale: 2048.0,
        lacunarity: 2.0,
        ..NoiseParams::default()
    });
    let colour = FbmNoise::new(NoiseParams {
        octaves: 1,
        seed: 2,
        exponentiation: 1.0,
        height: 1.0,
        scale: 256.0,
        ..NoiseParams::default()
    });
    PatchParams {
        frame: FaceFrame::new(CubeFace::PosY, RADIUS),
        offset: DVec2::new(250.0, 250.0),
        width: 500.0,
        resolution,
        height: Arc::new(NoiseHeight::new(height, 0.25)),
        surface: Arc::new(TextureSplatter::new(biome, colour, RADIUS)),
    }
}

fn bench_full_build(c: &mut Criterion) {
    let mut patch = TerrainPatch::new(params(32));
    c.bench_function("patch_build_32", |bencher| {
        bencher.iter(|| black_box(patch.build_to_completion(1000)))
    });
}

fn bench_full_build_96(c: &mut Criterion) {
    let mut patch = TerrainPatch::new(params(96));
    c.bench_function("patch_build_96", |bencher| {
        bencher.iter(|| black_box(patch.build_to_completion(1000)))
    });
}

fn bench_single_step(c: &mut Criterion) {
    let mut patch = TerrainPatch::new(params(32));
    patch.begin_build();
    c.bench_function("patch_step_batch_1000", |bencher| {
        bencher.iter(|| {
            if patch.step(1000) == BuildProgress::Complete {
                patch.begin_build();
            }
        })
    });
}

fn bench_strongest_four(c: &mut Criterion) {
    let strengths = black_box([0.1, 0.9, 0.0, 0.5, 0.7, 0.2, 0.05, 0.3]);
    c.bench_function("strongest_four", |bencher| {
        bencher.iter(|| black_box(strongest_four(&strengths)))
    });
}

criterion_group!(
    benches,
    bench_full_build,
    bench_full_build_96,
    bench_single_step,
    bench_strongest_four
);
criterion_main!(benches);
