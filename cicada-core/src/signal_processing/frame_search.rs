//! Frame search (C4) and symbol demodulation (C5).
//!
//! Self-synchronizing frame-start detection over the pulse-energy map,
//! followed by per-symbol hard/soft decisions and bit log-likelihood ratios.

use ndarray::Array2;

use crate::errors::ConfigError;
use crate::waveform::Waveform;

/// Sliding-window width factor applied to `S·p_frac` (§4.3).
const WINDOW_FACTOR: f64 = 1.2;
/// Sliding-window step factor applied to `S·p_frac` (§4.3).
const STEP_FACTOR: f64 = 0.3;

/// One demodulated frame: the chosen start, its sample offset, hard symbol
/// decisions, and bit LLRs (positive = bit 0 more likely).
#[derive(Debug, Clone)]
pub struct DemodulatedFrame {
    pub start_column: usize,
    pub start_sample: usize,
    pub syms: Vec<usize>,
    pub llrs: Vec<f32>,
}

/// Per-start symbol-energy gather: `E_s[s, t] = E_p[T[s, t mod H], c + t·p_frac]`.
/// Returns `None` if `c` cannot host a full frame (§4.3).
fn gather_symbol_energy(
    energy: &Array2<f32>,
    waveform: &Waveform,
    start_column: usize,
) -> Option<Array2<f32>> {
    let q = waveform.config().q();
    let h = waveform.config().h;
    let s_count = waveform.config().s;
    let p_frac = waveform.config().p_frac;
    let n_cols = energy.ncols();

    let last_col = start_column + (s_count.saturating_sub(1)) * p_frac;
    if last_col >= n_cols {
        return None;
    }

    let mut e_s = Array2::<f32>::zeros((q, s_count));
    for t in 0..s_count {
        let col = start_column + t * p_frac;
        let hop = t % h;
        for s in 0..q {
            let pulse_idx = waveform.mod_table[s][hop];
            e_s[[s, t]] = energy[[pulse_idx, col]];
        }
    }
    Some(e_s)
}

/// Per-start score `Φ(c) = Σ_t max_s E_s(c)[s, t]` (§4.3), computed at every
/// column for which a full frame fits.
fn frame_score(energy: &Array2<f32>, waveform: &Waveform) -> Vec<f32> {
    let s_count = waveform.config().s;
    let p_frac = waveform.config().p_frac;
    let n_cols = energy.ncols();
    let span = (s_count.saturating_sub(1)) * p_frac;
    if n_cols <= span {
        return Vec::new();
    }
    let valid_starts = n_cols - span;

    (0..valid_starts)
        .map(|c| {
            let e_s = gather_symbol_energy(energy, waveform, c)
                .expect("c within valid_starts always yields a full frame");
            (0..s_count)
                .map(|t| {
                    (0..e_s.nrows())
                        .map(|s| e_s[[s, t]])
                        .fold(f32::NEG_INFINITY, f32::max)
                })
                .sum()
        })
        .collect()
}

/// Slide a window across `phi`, take the argmax column per window, append a
/// tail-anchored window, dedupe while preserving order, sort ascending (§4.3).
fn select_frame_starts(phi: &[f32]) -> Vec<usize> {
    if phi.is_empty() {
        return Vec::new();
    }

    let s_est = phi.len() as f64;
    let window_len = (WINDOW_FACTOR * s_est).ceil().max(1.0) as usize;
    let window_step = (STEP_FACTOR * s_est).ceil().max(1.0) as usize;

    let mut picks = Vec::new();
    let mut start = 0usize;
    while start < phi.len() {
        let end = (start + window_len).min(phi.len());
        let argmax = (start..end)
            .max_by(|&a, &b| phi[a].partial_cmp(&phi[b]).unwrap())
            .unwrap();
        picks.push(argmax);
        if end == phi.len() {
            break;
        }
        start += window_step;
    }

    let tail_start = phi.len().saturating_sub(window_len.min(phi.len()));
    let tail_argmax = (tail_start..phi.len())
        .max_by(|&a, &b| phi[a].partial_cmp(&phi[b]).unwrap())
        .unwrap();
    picks.push(tail_argmax);

    let mut seen = std::collections::HashSet::new();
    let mut deduped: Vec<usize> = picks.into_iter().filter(|c| seen.insert(*c)).collect();
    deduped.sort_unstable();
    deduped
}

/// Run frame search over a pulse-energy map, returning candidate frame-start
/// columns in ascending order (§4.3).
pub fn find_frame_starts(energy: &Array2<f32>, waveform: &Waveform) -> Vec<usize> {
    let phi = frame_score(energy, waveform);
    select_frame_starts(&phi)
}

/// Demodulate the frame anchored at `start_column`: hard decisions, a
/// temperature-1 softmax, and bit LLRs (b=1 only; higher orders are refused,
/// per §4.3 reserving multi-bit symbols) (§4.3).
pub fn demodulate_at_start(
    energy: &Array2<f32>,
    waveform: &Waveform,
    start_column: usize,
) -> Result<DemodulatedFrame, ConfigError> {
    let b = waveform.config().b;
    if b != 1 {
        return Err(ConfigError::UnsupportedModulationOrder { b });
    }

    let e_s = gather_symbol_energy(energy, waveform, start_column).ok_or(
        ConfigError::FrameDoesNotFit {
            start_column,
            s: waveform.config().s,
        },
    )?;

    let s_count = waveform.config().s;
    let q = waveform.config().q();
    let p = waveform.samples_per_pulse();
    let p_frac = waveform.config().p_frac;

    let mut syms = Vec::with_capacity(s_count);
    let mut llrs = Vec::with_capacity(s_count);

    for t in 0..s_count {
        let col: Vec<f32> = (0..q).map(|s| e_s[[s, t]]).collect();
        let (argmax, _) = col
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        syms.push(argmax);

        let max_val = col.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let log_sum_exp: f32 = col.iter().map(|&v| (v - max_val).exp()).sum::<f32>().ln() + max_val;
        let log_probs: Vec<f32> = col.iter().map(|&v| v - log_sum_exp).collect();
        // b == 1 so q == 2: positive LLR means bit 0 more likely.
        llrs.push(log_probs[0] - log_probs[1]);
    }

    let start_sample = start_column * (p / p_frac);

    Ok(DemodulatedFrame {
        start_column,
        start_sample,
        syms,
        llrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveformConfig;
    use crate::signal_processing::pulse_energy_map;

    fn test_waveform() -> Waveform {
        Waveform::new(WaveformConfig::default()).expect("default config builds")
    }

    #[test]
    fn frame_starts_are_sorted_and_deduped() {
        let wf = test_waveform();
        let bits = vec![0u8; wf.config().s * wf.config().b];
        let samples = wf.modulate(&bits);
        let step = wf.samples_per_pulse() / wf.config().p_frac;
        let energy = pulse_energy_map(&wf, &samples, step);
        let starts = find_frame_starts(&energy, &wf);
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn frame_search_is_idempotent() {
        let wf = test_waveform();
        let bits = vec![1u8; wf.config().s * wf.config().b];
        let samples = wf.modulate(&bits);
        let step = wf.samples_per_pulse() / wf.config().p_frac;
        let energy = pulse_energy_map(&wf, &samples, step);
        let starts1 = find_frame_starts(&energy, &wf);
        let starts2 = find_frame_starts(&energy, &wf);
        assert_eq!(starts1, starts2);
    }

    #[test]
    fn demodulate_round_trips_clean_symbols() {
        let wf = test_waveform();
        let mut bits = vec![0u8; wf.config().s * wf.config().b];
        for (i, b) in bits.iter_mut().enumerate() {
            *b = (i % 2) as u8;
        }
        let samples = wf.modulate(&bits);
        let step = wf.samples_per_pulse() / wf.config().p_frac;
        let energy = pulse_energy_map(&wf, &samples, step);

        let frame = demodulate_at_start(&energy, &wf, 0).expect("b=1 is supported");
        assert_eq!(frame.syms.len(), wf.config().s);
        assert_eq!(frame.syms, bits.iter().map(|&b| b as usize).collect::<Vec<_>>());
    }

    #[test]
    fn unsupported_modulation_order_is_refused() {
        let mut cfg = WaveformConfig::default();
        cfg.b = 2;
        cfg.h = 31;
        let wf = Waveform::new(cfg).expect("b=2 still builds a valid waveform");
        let energy = Array2::<f32>::zeros((wf.n_pulses(), 10_000));
        let result = demodulate_at_start(&energy, &wf, 0);
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedModulationOrder { b: 2 })
        ));
    }
}
