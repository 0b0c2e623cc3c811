//! Throughput of the matched-filter pulse-energy map (C3) over one frame's
//! worth of modulated samples.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cicada_core::config::WaveformConfig;
use cicada_core::signal_processing::pulse_energy_map;
use cicada_core::waveform::Waveform;

fn bench_pulse_energy_map(c: &mut Criterion) {
    let waveform = Waveform::new(WaveformConfig::default()).unwrap();
    let codeword_bits = vec![0u8; waveform.config().s * waveform.config().b];
    let samples = waveform.modulate(&codeword_bits);
    let step = waveform.samples_per_pulse() / waveform.config().p_frac;

    c.bench_function("pulse_energy_map_one_frame", |b| {
        b.iter(|| pulse_energy_map(black_box(&waveform), black_box(&samples), step))
    });
}

criterion_group!(benches, bench_pulse_energy_map);
criterion_main!(benches);
