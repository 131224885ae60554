//! Fock engine benchmarks
//!
//! Gate application cost against the number of modes and the cutoff, plus a
//! complete two-photon interference run through the simulation kernel.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qureed::fock::{apply_channel, apply_gate, kets, ops, FockState, Gate};
use qureed::prelude::*;

/// Beam splitter on modes (0, 1) of an n-mode vacuum
fn bench_beamsplitter_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Beamsplitter");
    let cutoff = 4;
    let gate = Gate::beamsplitter(std::f64::consts::FRAC_PI_4, 0.0, cutoff).unwrap();

    for num_modes in [2, 3, 4].iter() {
        let dm = kets::vacuum_dm(*num_modes, cutoff).unwrap();
        group.bench_with_input(BenchmarkId::new("modes", num_modes), num_modes, |b, &n| {
            b.iter(|| apply_gate(black_box(&gate), black_box(&dm), &[0, 1], n, cutoff).unwrap());
        });
    }

    group.finish();
}

/// Single-mode displacement across cutoffs
fn bench_single_mode_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Displacement");

    for cutoff in [5, 10, 20].iter() {
        let gate = Gate::single(ops::displacement(0.8, 0.0, *cutoff)).unwrap();
        let dm = kets::vacuum_dm(3, *cutoff).unwrap();
        group.bench_with_input(BenchmarkId::new("cutoff", cutoff), cutoff, |b, &d| {
            b.iter(|| apply_gate(black_box(&gate), black_box(&dm), &[1], 3, d).unwrap());
        });
    }

    group.finish();
}

fn bench_loss_channel(c: &mut Criterion) {
    let cutoff = 10;
    let kraus: Vec<Gate> = ops::loss_channel(0.5, cutoff)
        .unwrap()
        .into_iter()
        .map(|k| Gate::single(k).unwrap())
        .collect();
    let dm = kets::vacuum_dm(2, cutoff).unwrap();

    c.bench_function("Loss channel (n=2, D=10)", |b| {
        b.iter(|| apply_channel(black_box(&kraus), black_box(&dm), &[0], 2, cutoff).unwrap());
    });
}

/// Hong-Ou-Mandel through sources, splitter and the DES scheduler
fn bench_hom_simulation(c: &mut Criterion) {
    c.bench_function("HOM DES run", |b| {
        b.iter(|| {
            let mut sim = Simulation::new(SimulationSettings::default().with_cutoff(3));
            let s1 = sim.add_device(IdealNPhotonSource::new(None, None)).unwrap();
            let s2 = sim.add_device(IdealNPhotonSource::new(None, None)).unwrap();
            let bs = sim.add_device(IdealBeamSplitter::new(None, None)).unwrap();
            sim.connect(SignalKind::Quantum, (s1, "output"), (bs, "A")).unwrap();
            sim.connect(SignalKind::Quantum, (s2, "output"), (bs, "B")).unwrap();
            sim.register_triggers(&[s1, s2]).unwrap();
            let state: FockState = sim.run_des(1e-6).unwrap().unwrap();
            black_box(state);
        });
    });
}

criterion_group!(
    benches,
    bench_beamsplitter_modes,
    bench_single_mode_gate,
    bench_loss_channel,
    bench_hom_simulation
);
criterion_main!(benches);
