//! Configuration types for the cicada acoustic link.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Waveform configuration, immutable after construction (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaveformConfig {
    /// Sample rate `fs`, Hz.
    pub fs: f64,
    /// Carrier center `fc`, Hz.
    pub fc: f64,
    /// Bandwidth `bw`, Hz.
    pub bw: f64,
    /// Symbol rate `Rs`, Hz.
    pub rs: f64,
    /// Bits per symbol `b`.
    pub b: usize,
    /// Hop factor `H`.
    pub h: usize,
    /// Symbols per frame `S`.
    pub s: usize,
    /// Fine-search oversample factor `p_frac`.
    pub p_frac: usize,
    /// Hop pattern step `p` used by the default modulation table.
    pub pattern: usize,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            fs: 44_100.0,
            fc: 16_500.0,
            bw: 3_000.0,
            rs: 44_100.0 / 128.0,
            b: 1,
            h: 63,
            s: 1024,
            p_frac: 8,
            pattern: 16,
        }
    }
}

impl WaveformConfig {
    /// Modulation order `Q = 2^b`.
    pub fn q(&self) -> usize {
        1usize << self.b
    }

    /// Number of pulses `N_p = Q * H`.
    pub fn n_p(&self) -> usize {
        self.q() * self.h
    }

    /// Per-pulse frequency spacing `Δf = bw / N_p`.
    pub fn delta_f(&self) -> f64 {
        self.bw / self.n_p() as f64
    }

    /// Pulse start frequency `f0 = fc - bw/2`.
    pub fn f0(&self) -> f64 {
        self.fc - self.bw / 2.0
    }

    /// Samples per pulse `P = round(fs / Rs)`, validated against the 1e-3
    /// relative-error tolerance from §3.
    pub fn samples_per_pulse(&self) -> Result<usize, ConfigError> {
        let exact = self.fs / self.rs;
        let rounded = exact.round();
        let rel_err = ((exact - rounded) / exact).abs();
        if rel_err > 1e-3 {
            return Err(ConfigError::SamplesPerPulseMismatch {
                exact,
                rounded: rounded as usize,
                rel_err,
            });
        }
        Ok(rounded as usize)
    }

    /// Validate Nyquist, pulse-count, and pulse-length invariants from §4.1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.samples_per_pulse()?;
        if p < 2 {
            return Err(ConfigError::DegeneratePulseLength { p });
        }
        let qh = self.q() * self.h;
        if qh != self.n_p() {
            return Err(ConfigError::PulseCountMismatch {
                q: self.q(),
                h: self.h,
                qh,
                n_p: self.n_p(),
            });
        }
        let top_hz = self.f0() + self.n_p() as f64 * self.delta_f();
        let nyquist_hz = self.fs / 2.0;
        if top_hz >= nyquist_hz {
            return Err(ConfigError::NyquistViolation {
                top_hz,
                fs: self.fs,
                nyquist_hz,
            });
        }
        Ok(())
    }
}

/// LDPC code configuration (§3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LdpcConfig {
    /// Coded length `N_c`.
    pub n_c: usize,
    /// Message length `K`.
    pub k: usize,
    /// Target variable-node degree `d_v`.
    pub d_v: usize,
    /// Target check-node degree `d_c`.
    pub d_c: usize,
    /// Deterministic construction seed.
    pub seed: u64,
    /// Normalization factor `alpha` for normalized min-sum.
    pub alpha: f64,
    /// LLR clip magnitude.
    pub clip: f64,
    /// Maximum belief-propagation iterations.
    pub max_iterations: usize,
}

impl Default for LdpcConfig {
    fn default() -> Self {
        Self {
            n_c: 1024,
            k: 513,
            d_v: 2,
            d_c: 4,
            seed: 0,
            alpha: 0.8,
            clip: 20.0,
            max_iterations: 300,
        }
    }
}

impl LdpcConfig {
    pub fn m(&self) -> usize {
        self.n_c - self.k
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let expected_m = self.n_c - self.k;
        if self.m() != expected_m {
            return Err(ConfigError::LdpcLengthMismatch {
                n_c: self.n_c,
                k: self.k,
                m: self.m(),
                expected_m,
            });
        }
        Ok(())
    }
}

/// Whitening-mask configuration (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhiteningConfig {
    pub enabled: bool,
    pub seed: u64,
}

impl Default for WhiteningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 0,
        }
    }
}

/// Top-level modem configuration bundling waveform, LDPC, whitening, and the
/// duplicate-suppression toggle described in §4.4.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModemConfig {
    pub waveform: WaveformConfig,
    pub ldpc: LdpcConfig,
    pub whitening: WhiteningConfig,
    pub dedup: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            waveform: WaveformConfig::default(),
            ldpc: LdpcConfig::default(),
            whitening: WhiteningConfig::default(),
            dedup: true,
        }
    }
}

impl ModemConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.waveform.validate()?;
        self.ldpc.validate()?;
        Ok(())
    }

    /// `data_bits_per_frame = min(K, S*b)` (§3 invariant).
    pub fn data_bits_per_frame(&self) -> usize {
        self.ldpc.k.min(self.waveform.s * self.waveform.b)
    }
}

/// Simulation/trial configuration used by the CLI and scenario tests (§10,
/// §8.5's AWGN scenario), grounded in the teacher's `SimulationConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub snr_db: f64,
    pub trials: usize,
    pub rng_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            snr_db: 10.0,
            trials: 100,
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_waveform_is_valid() {
        let cfg = WaveformConfig::default();
        cfg.validate().expect("default waveform config must validate");
        assert_eq!(cfg.q(), 2);
        assert_eq!(cfg.n_p(), 126);
        assert_eq!(cfg.samples_per_pulse().unwrap(), 128);
    }

    #[test]
    fn default_ldpc_lengths_are_consistent() {
        let cfg = LdpcConfig::default();
        cfg.validate().expect("default LDPC config must validate");
        assert_eq!(cfg.m(), 511);
    }

    #[test]
    fn data_bits_per_frame_matches_spec_default() {
        let cfg = ModemConfig::default();
        // S * b = 1024 * 1 = 1024, K = 513, so min is K.
        assert_eq!(cfg.data_bits_per_frame(), 513);
    }

    #[test]
    fn nyquist_violation_is_detected() {
        let mut cfg = WaveformConfig::default();
        cfg.bw = 40_000.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NyquistViolation { .. })
        ));
    }
}
