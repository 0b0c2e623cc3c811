//! Waveform synthesis (C1): pulse bank construction and symbol modulation.
//!
//! Grounded in the Python original's `FSKWaveform` (`imprint/fsk/waveform.py`):
//! a periodic-Hann-windowed tone bank, gain-normalized to unit average power
//! per sample, and a hop-factor modulation table mapping (symbol, hop phase)
//! to pulse index.

use std::f64::consts::PI;

use crate::config::WaveformConfig;
use crate::errors::ConfigError;

/// The precomputed pulse bank and modulation table for one [`WaveformConfig`].
/// Immutable after construction (§3 "Entity lifecycle"); safe to share
/// behind a shared reference or an `Arc` across threads/frames.
#[derive(Debug, Clone)]
pub struct Waveform {
    config: WaveformConfig,
    samples_per_pulse: usize,
    /// `[N_p][P]` cosine-phase pulses.
    pub pulses_cos: Vec<Vec<f32>>,
    /// `[N_p][P]` sine-phase pulses.
    pub pulses_sin: Vec<Vec<f32>>,
    /// `[Q][H]` modulation table: `mod_table[s][h]` is a pulse index.
    pub mod_table: Vec<Vec<usize>>,
}

/// A periodic Hann window of length `n`: the first `n` samples of a Hann
/// window of length `n+1`, so the window does not repeat its endpoint when
/// pulses are placed back-to-back (§3).
pub fn periodic_hann(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let full = n + 1;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (full as f64 - 1.0)).cos())
        .collect()
}

/// Default modulation table: `T[s, h] = H*s + ((pattern*h) mod H)` (§3).
pub fn default_mod_table(q: usize, h: usize, pattern: usize) -> Vec<Vec<usize>> {
    (0..q)
        .map(|s| (0..h).map(|hop| h * s + (pattern * hop) % h).collect())
        .collect()
}

impl Waveform {
    /// Build the pulse bank and modulation table from `config`. Fails on
    /// Nyquist violation, degenerate pulse length, or a mismatched pulse
    /// count (§4.1).
    pub fn new(config: WaveformConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let p = config.samples_per_pulse()?;
        let n_p = config.n_p();
        let window = periodic_hann(p);
        let f0 = config.f0();
        let delta_f = config.delta_f();

        let mut pulses_cos = Vec::with_capacity(n_p);
        let mut pulses_sin = Vec::with_capacity(n_p);

        for k in 0..n_p {
            let tone_hz = f0 + k as f64 * delta_f;
            let mut cos_row = vec![0.0f64; p];
            let mut sin_row = vec![0.0f64; p];
            let mut energy = 0.0f64;
            for n in 0..p {
                let t = n as f64 / config.fs;
                let phase = 2.0 * PI * tone_hz * t;
                let c = phase.cos() * window[n];
                let s = phase.sin() * window[n];
                cos_row[n] = c;
                sin_row[n] = s;
                energy += c * c + s * s;
            }
            let gain = if energy > 0.0 {
                (p as f64).sqrt() / energy
            } else {
                0.0
            };
            pulses_cos.push(cos_row.iter().map(|&v| (v * gain) as f32).collect());
            pulses_sin.push(sin_row.iter().map(|&v| (v * gain) as f32).collect());
        }

        let mod_table = default_mod_table(config.q(), config.h, config.pattern);

        Ok(Self {
            config,
            samples_per_pulse: p,
            pulses_cos,
            pulses_sin,
            mod_table,
        })
    }

    pub fn config(&self) -> &WaveformConfig {
        &self.config
    }

    pub fn samples_per_pulse(&self) -> usize {
        self.samples_per_pulse
    }

    pub fn n_pulses(&self) -> usize {
        self.pulses_cos.len()
    }

    /// Partition `coded_bits` into `S` symbols (LSB-first grouping of `b`
    /// bits, zero-padded), then emit `pulses_cos[T[s_t, t mod H]]` for each
    /// symbol `t` back to back. No overlap, no gap (§4.1).
    pub fn modulate(&self, coded_bits: &[u8]) -> Vec<f32> {
        let b = self.config.b;
        let h = self.config.h;
        let s_count = self.config.s;
        let p = self.samples_per_pulse;

        let mut samples = Vec::with_capacity(s_count * p);
        for t in 0..s_count {
            let mut symbol = 0usize;
            for bit_idx in 0..b {
                let global_bit = t * b + bit_idx;
                let bit = coded_bits.get(global_bit).copied().unwrap_or(0) as usize;
                // LSB-first: bit 0 of the group is the least-significant bit.
                symbol |= bit << bit_idx;
            }
            let pulse_idx = self.mod_table[symbol][t % h];
            samples.extend_from_slice(&self.pulses_cos[pulse_idx]);
        }
        samples
    }
}
