//! Channel modeling and impairment simulation
//!
//! Used by the AWGN scenario (§8.5) and by the CLI's `simulate` batch-trial
//! mode; the acoustic modem itself has no channel-estimation stage (§1
//! Non-goals), so this module is test/simulation tooling, not part of C1-C6.

use rand::Rng;
use rand_distr::StandardNormal;

/// Apply AWGN to audio samples with the given noise standard deviation.
pub fn apply_audio_noise<R: Rng>(audio: &[f32], noise_std: f64, rng: &mut R) -> Vec<f32> {
    let mut noisy = audio.to_vec();
    for sample in noisy.iter_mut() {
        let noise: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
        *sample += noise as f32;
    }
    noisy
}

/// Noise standard deviation that yields the requested post-filter SNR (dB)
/// for a signal whose mean-square sample power is `signal_power`.
pub fn noise_std_for_snr_db(snr_db: f64, signal_power: f64) -> f64 {
    let snr_linear = 10f64.powf(snr_db / 10.0);
    (signal_power / snr_linear).sqrt()
}

/// Mean-square power of a sample buffer.
pub fn signal_power(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / samples.len() as f64
}
