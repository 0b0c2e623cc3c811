//! Diagnostic data structures for reporting.
use serde::{Deserialize, Serialize};

pub mod metrics;

/// Per-frame decode diagnostics: LDPC convergence and timing, attached to
/// each surviving frame alongside its bytes and start sample.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FrameDiagnostics {
    pub start_column: usize,
    pub start_sample: usize,
    pub ldpc_iterations: usize,
    pub ldpc_converged: bool,
}

/// Summary of a single AWGN trial or batch-decode run (§8.5, §10).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimulationReport {
    pub trials: usize,
    pub pre_fec_errors: usize,
    pub pre_fec_ber: f64,
    pub post_fec_errors: usize,
    pub post_fec_ber: f64,
    pub converged_trials: usize,
}

impl SimulationReport {
    pub fn converged_fraction(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.converged_trials as f64 / self.trials as f64
        }
    }
}
