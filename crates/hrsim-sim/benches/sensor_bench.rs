//! Benchmarks for sensor reads and sample encoding
//!
//! Run with: cargo bench -p hrsim-sim --bench sensor_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hrsim_core::config::{PayloadFormat, SensorConfig};
use hrsim_core::transitions::{bounded_step, ease_in_out};
use hrsim_core::{Sample, ScenarioKind};
use hrsim_sim::sink::{JsonLinesSink, Sink};
use hrsim_sim::{HeartSensor, ManualClock, SimulatedHeartSensor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Sensor Read Benchmarks
// ============================================================================

fn bench_sensor_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("sensor_read");
    group.throughput(Throughput::Elements(1));

    for kind in ScenarioKind::ALL {
        let clock = ManualClock::new();
        let mut sensor = SimulatedHeartSensor::from_rng(
            Some(Arc::new(kind.scenario())),
            SensorConfig::default(),
            StdRng::seed_from_u64(7),
        )
        .unwrap()
        .with_clock(Arc::new(clock.clone()));

        group.bench_with_input(BenchmarkId::new("read", kind.name()), &kind, |b, _| {
            b.iter(|| {
                clock.advance(Duration::from_millis(100));
                black_box(sensor.read().unwrap())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Transition Math Benchmarks
// ============================================================================

fn bench_transitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("transitions");

    group.bench_function("bounded_step", |b| {
        b.iter(|| bounded_step(black_box(60.0), black_box(120.0), black_box(0.4)))
    });

    group.bench_function("ease_in_out", |b| b.iter(|| ease_in_out(black_box(0.37))));

    group.finish();
}

// ============================================================================
// Sink Encoding Benchmarks
// ============================================================================

fn bench_jsonl_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("jsonl_encoding");
    let sample = Sample::new(12.5, 61.3, 979.0, "rest").with_tag("simulated", true);

    for (label, format) in [("minimal", PayloadFormat::Minimal), ("full", PayloadFormat::Full)] {
        let mut sink = JsonLinesSink::new(io::sink(), format);
        group.bench_function(label, |b| b.iter(|| sink.send(black_box(&sample)).unwrap()));
    }

    group.finish();
}

criterion_group!(benches, bench_sensor_read, bench_transitions, bench_jsonl_encoding);
criterion_main!(benches);
