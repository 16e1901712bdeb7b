//! Benchmark for full effect ticks.
//!
//! TARGET: step + render of every built-in effect at 1280x720 well under 1ms;
//! raster present + bloom at 640x360 inside one 16ms frame
//!
//! Run with: cargo bench --package ember_effects --bench effects_benchmark

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ember_core::{seeded_rng, FrameTime};
use ember_effects::{
    BeamOscillatorConfig, Bloom, BorderGlowConfig, DrawSurface, Effect, EffectConfig, EffectVariant,
    Frame, PostProcess, RadialFieldConfig, RasterSurface, RibbonTrailConfig, SurfaceConfig,
};

const TICK: FrameTime = FrameTime {
    delta_ms: 16.0,
    elapsed_ms: 0.0,
    frame: 1,
};

fn variants() -> Vec<EffectConfig> {
    vec![
        EffectConfig::BorderGlow(BorderGlowConfig::default()),
        EffectConfig::RibbonTrail(RibbonTrailConfig::default()),
        EffectConfig::RadialField(RadialFieldConfig {
            inner_count: 2_000,
            outer_count: 3_000,
            ..RadialFieldConfig::default()
        }),
        EffectConfig::BeamOscillator(BeamOscillatorConfig::default()),
    ]
}

fn benchmark_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("effect_tick");
    let surface = SurfaceConfig::new(1280.0, 720.0, 1.0);

    for config in variants() {
        group.bench_function(config.kind(), |b| {
            let mut rng = seeded_rng(7);
            let mut effect = EffectVariant::from_config(&config);
            effect.seed(&surface, &mut rng);
            let mut frame = Frame::new();

            b.iter(|| {
                effect.step(TICK, &mut rng);
                frame.reset(ember_core::Color::TRANSPARENT);
                effect.render(&mut frame);
                black_box(frame.len());
            });
        });
    }

    group.finish();
}

fn benchmark_raster(c: &mut Criterion) {
    let mut group = c.benchmark_group("raster");
    group.sample_size(20);
    let surface_config = SurfaceConfig::new(640.0, 360.0, 1.0);

    let mut rng = seeded_rng(7);
    let mut effect = EffectVariant::from_config(&EffectConfig::BeamOscillator(BeamOscillatorConfig::default()));
    effect.seed(&surface_config, &mut rng);
    effect.step(TICK, &mut rng);
    let mut frame = Frame::new();
    frame.reset(ember_core::Color::BLACK);
    effect.render(&mut frame);

    group.bench_function("present_beams_640x360", |b| {
        let mut surface = RasterSurface::new();
        surface.configure(&surface_config);
        b.iter(|| {
            surface.present(black_box(&frame));
        });
    });

    group.bench_function("bloom_640x360", |b| {
        let mut surface = RasterSurface::new();
        surface.configure(&surface_config);
        surface.present(&frame);
        let mut bloom = Bloom::default();
        b.iter(|| {
            bloom.apply(&mut surface);
            black_box(surface.pixels().len());
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_tick, benchmark_raster);
criterion_main!(benches);
