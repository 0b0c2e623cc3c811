//! Modem encode/decode glue (C2, C6): bytes to coded symbols and back.
//!
//! Grounded in the teacher's `processor/mod.rs` role as the single struct
//! that owns the immutable pipeline state and exposes `encode`/`decode`
//! across the DSP boundary, retargeted from QPSK framing to the FSK
//! pulse-bank/LDPC/whitening stack of C1–C6.

use crate::config::ModemConfig;
use crate::errors::ConfigError;
use crate::ldpc::LdpcCode;
use crate::signal_processing::{demodulate_at_start, find_frame_starts, pulse_energy_map};
use crate::utils::{bytes_to_bits, pack_bits};
use crate::waveform::Waveform;
use crate::whitening;

/// One decoded frame: the recovered payload bytes, the sample offset of its
/// start, and LDPC convergence diagnostics.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub bytes: Vec<u8>,
    pub start_sample: usize,
    pub ldpc_iterations: usize,
    pub ldpc_converged: bool,
}

/// Owns the immutable waveform, LDPC code, and configuration, and exposes
/// the encode/decode contract of §4.4. Built once; safe to share across
/// frames and threads (§3 "Entity lifecycle").
pub struct Modem {
    config: ModemConfig,
    waveform: Waveform,
    ldpc: LdpcCode,
}

impl Modem {
    pub fn new(config: ModemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let waveform = Waveform::new(config.waveform.clone())?;
        let ldpc = LdpcCode::new(config.ldpc.clone())?;
        Ok(Self { config, waveform, ldpc })
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Encode up to `data_bits_per_frame` bits of `payload` into a sample
    /// buffer of exactly `S·P` samples (§4.4). Excess bytes are silently
    /// truncated at the bit level; short input is zero-padded.
    pub fn encode(&self, payload: &[u8]) -> Vec<f32> {
        let data_bits = self.config.data_bits_per_frame();

        let mut bits = bytes_to_bits(payload);
        bits.truncate(data_bits);
        bits.resize(data_bits, 0);

        whitening::apply(&self.config.whitening, &mut bits);

        let mut message = vec![0u8; self.ldpc.k()];
        message[..bits.len()].copy_from_slice(&bits);

        let codeword = self.ldpc.encode(&message);
        self.waveform.modulate(&codeword)
    }

    /// Decode a sample buffer into zero or more recovered frames, in input
    /// order, with optional per-call duplicate suppression (§4.4).
    pub fn decode(&self, samples: &[f32]) -> Vec<DecodedFrame> {
        let step = self.waveform.samples_per_pulse() / self.config.waveform.p_frac;
        let energy = pulse_energy_map(&self.waveform, samples, step);
        let starts = find_frame_starts(&energy, &self.waveform);

        let data_bits = self.config.data_bits_per_frame();
        let mut results = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for start_column in starts {
            let frame = match demodulate_at_start(&energy, &self.waveform, start_column) {
                Ok(frame) => frame,
                Err(_) => continue,
            };

            let (decoded, iterations, converged) = match self.ldpc.decode(&frame.llrs) {
                Ok(result) => result,
                Err(_) => continue,
            };

            let mut bits = decoded[..data_bits].to_vec();
            whitening::apply(&self.config.whitening, &mut bits);
            let remainder = bits.len() % 8;
            if remainder != 0 {
                bits.resize(bits.len() + (8 - remainder), 0);
            }
            let bytes = pack_bits(&bits);

            if self.config.dedup && !seen.insert(bytes.clone()) {
                continue;
            }

            results.push(DecodedFrame {
                bytes,
                start_sample: frame.start_sample,
                ldpc_iterations: iterations,
                ldpc_converged: converged,
            });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_modem() -> Modem {
        Modem::new(ModemConfig::default()).expect("default config builds a modem")
    }

    #[test]
    fn silence_decodes_to_empty() {
        let modem = test_modem();
        let samples = vec![0.0f32; 44_100];
        assert!(modem.decode(&samples).is_empty());
    }

    #[test]
    fn round_trip_single_frame_no_noise() {
        let modem = test_modem();
        let mut message = b"hello world".to_vec();
        message.resize(64, 0);

        let samples = modem.encode(&message);
        assert_eq!(samples.len(), modem.config.waveform.s * modem.waveform.samples_per_pulse());

        let frames = modem.decode(&samples);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0].bytes[..message.len()], message.as_slice());
        assert!(frames[0].ldpc_converged);
    }

    #[test]
    fn prefix_padding_shifts_start_sample() {
        let modem = test_modem();
        let mut message = b"hello world".to_vec();
        message.resize(64, 0);
        let frame_samples = modem.encode(&message);

        let mut samples = vec![0.0f32; 10_000];
        samples.extend_from_slice(&frame_samples);

        let frames = modem.decode(&samples);
        assert_eq!(frames.len(), 1);
        let p = modem.waveform.samples_per_pulse();
        let p_frac = modem.config.waveform.p_frac;
        let tolerance = p / p_frac;
        assert!(
            (frames[0].start_sample as i64 - 10_000i64).unsigned_abs() as usize <= tolerance,
            "start_sample {} should be within {} of 10000",
            frames[0].start_sample,
            tolerance
        );
    }

    #[test]
    fn duplicate_frames_collapse_to_one_when_dedup_enabled() {
        let modem = test_modem();
        let mut message = b"same message".to_vec();
        message.resize(64, 0);
        let frame_samples = modem.encode(&message);

        let mut samples = frame_samples.clone();
        samples.extend(std::iter::repeat(0.0f32).take(5_000));
        samples.extend_from_slice(&frame_samples);

        let frames = modem.decode(&samples);
        assert_eq!(frames.len(), 1);
    }
}
