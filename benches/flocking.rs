//! Benchmarks for the CPU flocking stages and per-frame host work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flockview::agent::AgentStore;
use flockview::batch::{LineBatch, PointBatch};
use flockview::camera::Camera;
use flockview::flocking::HostFlock;
use flockview::interaction::InteractionController;
use flockview::minimap::Minimap;
use flockview::uniforms::SimulationUniforms;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const SCREEN: Vec2 = Vec2::new(1024.0, 768.0);

fn store(count: usize) -> AgentStore {
    let mut rng = StdRng::seed_from_u64(42);
    AgentStore::randomized(count, SCREEN * 4.0, 60.0, &mut rng)
}

fn bench_host_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_step");
    group.sample_size(20);

    let mut uniforms = SimulationUniforms::new(SCREEN * 4.0, 50.0);
    uniforms.set_delta_time(1.0 / 60.0);

    for count in [256usize, 1024, 3000] {
        group.bench_with_input(BenchmarkId::new("agents", count), &count, |b, &count| {
            let mut agents = store(count).agents().to_vec();
            b.iter(|| {
                HostFlock::step(&mut agents, &uniforms);
                black_box(&agents);
            })
        });
    }

    group.finish();
}

fn bench_pick(c: &mut Criterion) {
    let store = store(3000);
    let picker = InteractionController::default();
    c.bench_function("pick_3000", |b| {
        b.iter(|| black_box(picker.pick(black_box(Vec2::new(12.0, -40.0)), &store)))
    });
}

fn bench_minimap_update(c: &mut Criterion) {
    let store = store(3000);
    let camera = Camera::main(SCREEN, 4.0);
    let minimap = Minimap::new(SCREEN, 4.0, 0.25);
    let mut points = PointBatch::new(store.len());
    let mut lines = LineBatch::default();

    c.bench_function("minimap_update_3000", |b| {
        b.iter(|| {
            minimap.update(&camera, &store, &mut points, &mut lines);
            black_box(points.take_vertices());
            black_box(lines.take_vertices());
        })
    });
}

criterion_group!(benches, bench_host_step, bench_pick, bench_minimap_update);
criterion_main!(benches);
