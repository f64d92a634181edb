//! Benchmarks for the experience pipeline.
//!
//! Measures tracer throughput and ReplayBuffer::sample on a full buffer.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smallvec::smallvec;

use rust_muzero_loop::core::{Observation, RngKey};
use rust_muzero_loop::training::{NStepTracer, ReplayBuffer, Trajectory};

const OBS_DIM: usize = 16;

fn episode(tracer: &mut NStepTracer, len: usize) -> Trajectory {
    let mut trajectory = Trajectory::new();
    for t in 0..len {
        tracer
            .add(
                Observation::from_vec(vec![t as f32; OBS_DIM]),
                t % 4,
                1.0,
                t + 1 == len,
                0.5,
                smallvec![0.25, 0.25, 0.25, 0.25],
            )
            .unwrap();
        for transition in tracer.drain_ready().unwrap() {
            trajectory.add(transition).unwrap();
        }
    }
    trajectory
}

fn bench_tracer_episode(c: &mut Criterion) {
    let mut tracer = NStepTracer::new(50, 0.997, 0.5).unwrap();

    c.bench_function("tracer_episode_200", |b| {
        b.iter(|| black_box(episode(&mut tracer, black_box(200))))
    });
}

fn bench_sample(c: &mut Criterion) {
    let mut tracer = NStepTracer::new(50, 0.997, 0.5).unwrap();
    let mut buffer = ReplayBuffer::new(500);
    for i in 0..500 {
        let mut trajectory = episode(&mut tracer, 50 + i % 150);
        let priority = trajectory.finalize().unwrap().mean_weight();
        buffer.add(trajectory, priority).unwrap();
    }

    let mut key = RngKey::new(42);
    c.bench_function("replay_buffer_sample_32x10x10", |b| {
        b.iter(|| {
            let (next, leaf) = key.clone().split();
            key = next;
            black_box(buffer.sample(leaf, 32, 10, 10).unwrap())
        })
    });
}

criterion_group!(benches, bench_tracer_episode, bench_sample);
criterion_main!(benches);
