//! Control loop benchmarks
//!
//! Measures the per-tick cost of the stepper and its parts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rodsim::prelude::*;

fn inputs() -> TickInputs {
    TickInputs {
        setpoint: 0.2,
        gains: PidGains::new(2.0, 1.0, 0.3),
        disturbance: 0.5,
    }
}

/// Single plant update with and without noise sampling
fn bench_plant_update(c: &mut Criterion) {
    let params = PlantParameters::default();

    let mut silent = Plant::with_noise(params, Silent).unwrap();
    c.bench_function("plant update (silent)", |b| {
        b.iter(|| black_box(silent.update(black_box(0.1))));
    });

    let mut noisy = Plant::with_noise(params, GaussianNoise::seeded(1)).unwrap();
    c.bench_function("plant update (gaussian)", |b| {
        b.iter(|| black_box(noisy.update(black_box(0.1))));
    });
}

fn bench_pid_compute(c: &mut Criterion) {
    let mut pid = Pid::new(PidGains::new(2.0, 1.0, 0.3), 0.01).unwrap();
    c.bench_function("pid compute", |b| {
        b.iter(|| black_box(pid.compute(black_box(0.2), black_box(0.19))));
    });
}

/// Full ticks for different history bounds
fn bench_stepper_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stepper 1000 ticks");
    let inputs = inputs();

    for history_len in [100, 500, 5000].iter() {
        group.bench_with_input(
            BenchmarkId::new("history_len", history_len),
            history_len,
            |b, &len| {
                b.iter(|| {
                    let plant = Plant::with_noise(PlantParameters::default(), Silent).unwrap();
                    let pid = Pid::new(inputs.gains, 0.01).unwrap();
                    let mut stepper = Stepper::new(plant, pid, len).unwrap();
                    stepper.start();
                    black_box(stepper.run(&inputs, 1000).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_plant_update, bench_pid_compute, bench_stepper_run);
criterion_main!(benches);
