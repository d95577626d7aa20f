//! Simulation benchmarks for td_core.
//!
//! Run with: `cargo bench -p td_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use td_core::map::{GameMap, MapConfig};
use td_test_utils::fixtures::{campaign_step, sample_generator, sample_orchestrator};

/// Map generation, path walking and wave scheduling benchmarks.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("generate_large_map", |b| {
        let config = MapConfig::large();
        b.iter(|| GameMap::from_config(black_box(&config)));
    });

    let map = GameMap::from_config(&MapConfig::large()).expect("large map generates");
    c.bench_function("walk_full_route", |b| {
        b.iter(|| {
            let mut pos = map.spawn_position();
            while let Ok(Some(next)) = map.next_position(pos, black_box(37)) {
                pos = next;
            }
            pos
        });
    });

    let generator = sample_generator();
    c.bench_function("generate_wave_50", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        b.iter(|| {
            generator
                .generate(black_box(50), &mut rng)
                .map(|wave| wave.flatten().count())
        });
    });

    c.bench_function("campaign_1000_ticks", |b| {
        b.iter(|| {
            let mut orchestrator = sample_orchestrator(7);
            for _ in 0..1_000 {
                campaign_step(&mut orchestrator);
            }
            orchestrator.state_hash()
        });
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
