//! Pulse-energy matched filtering (C3).
//!
//! Conceptually a sliding dot product of the sample stream against every row
//! of the pulse bank, viewing the signal as overlapping windows (a Hankel
//! matrix) multiplied against the pulse bank. Implemented here as direct
//! per-bin accumulation, parallelized across pulses with `rayon` since pulses
//! are independent (§5).

use ndarray::Array2;
use rayon::prelude::*;

use crate::waveform::Waveform;

/// Typical high-pass length in pulses, used to size the running-median
/// detrend kernel (§4.2).
const H_PL: usize = 8;

/// `E_p[k, i] = (Σ_n pulses_cos[k,n]·x[i·step+n])² + (Σ_n pulses_sin[k,n]·x[i·step+n])²`,
/// row-normalized by its own mean, then high-pass filtered by subtracting a
/// running median along the time axis (§4.2).
pub fn pulse_energy_map(waveform: &Waveform, samples: &[f32], step: usize) -> Array2<f32> {
    let p = waveform.samples_per_pulse();
    let n_p = waveform.n_pulses();

    let n = if samples.len() < p {
        0
    } else {
        1 + (samples.len() - p) / step
    };

    let mut energy = Array2::<f32>::zeros((n_p, n));
    if n == 0 {
        return energy;
    }

    let rows: Vec<Vec<f32>> = (0..n_p)
        .into_par_iter()
        .map(|k| {
            let cos_pulse = &waveform.pulses_cos[k];
            let sin_pulse = &waveform.pulses_sin[k];
            (0..n)
                .map(|i| {
                    let window = &samples[i * step..i * step + p];
                    let mut cos_acc = 0.0f32;
                    let mut sin_acc = 0.0f32;
                    for j in 0..p {
                        cos_acc += cos_pulse[j] * window[j];
                        sin_acc += sin_pulse[j] * window[j];
                    }
                    cos_acc * cos_acc + sin_acc * sin_acc
                })
                .collect()
        })
        .collect();

    for (k, row) in rows.into_iter().enumerate() {
        energy.row_mut(k).assign(&ndarray::Array1::from_vec(row));
    }

    normalize_rows_by_mean(&mut energy);
    detrend_rows(&mut energy, median_kernel_len(waveform.config().p_frac));
    energy
}

/// `2·⌊H_pl·p_frac/2⌋ + 1`, always odd.
fn median_kernel_len(p_frac: usize) -> usize {
    2 * ((H_PL * p_frac) / 2) + 1
}

fn normalize_rows_by_mean(energy: &mut Array2<f32>) {
    for mut row in energy.rows_mut() {
        let n = row.len();
        if n == 0 {
            continue;
        }
        let mean = row.sum() / n as f32;
        if mean > 0.0 {
            row.mapv_inplace(|v| v / mean);
        }
    }
}

fn detrend_rows(energy: &mut Array2<f32>, kernel_len: usize) {
    if kernel_len < 3 {
        return;
    }
    let half = kernel_len / 2;
    for mut row in energy.rows_mut() {
        let n = row.len();
        if n == 0 {
            continue;
        }
        let original: Vec<f32> = row.to_vec();
        for i in 0..n {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            let mut window: Vec<f32> = original[lo..hi].to_vec();
            window.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let median = window[window.len() / 2];
            row[i] = original[i] - median;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveformConfig;

    fn test_waveform() -> Waveform {
        Waveform::new(WaveformConfig::default()).expect("default config builds")
    }

    #[test]
    fn empty_for_buffer_shorter_than_one_pulse() {
        let wf = test_waveform();
        let samples = vec![0.0f32; wf.samples_per_pulse() - 1];
        let map = pulse_energy_map(&wf, &samples, wf.samples_per_pulse());
        assert_eq!(map.ncols(), 0);
    }

    #[test]
    fn clean_pulse_is_a_local_maximum_at_its_own_bin_and_column() {
        let wf = test_waveform();
        let k = 10;
        let p = wf.samples_per_pulse();
        let step = p / wf.config().p_frac;

        let mut samples = vec![0.0f32; 3 * p];
        samples[p..2 * p].copy_from_slice(&wf.pulses_cos[k]);

        let map = pulse_energy_map(&wf, &samples, step);
        let target_col = p / step;

        let target_energy = map[[k, target_col]];
        for kk in 0..wf.n_pulses() {
            if kk != k {
                assert!(
                    map[[kk, target_col]] <= target_energy,
                    "bin {kk} should not exceed the excited bin {k} at the aligned column"
                );
            }
        }
    }

    #[test]
    fn median_kernel_len_is_always_odd() {
        assert_eq!(median_kernel_len(8) % 2, 1);
        assert_eq!(median_kernel_len(1) % 2, 1);
    }
}
