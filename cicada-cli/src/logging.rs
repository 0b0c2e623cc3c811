//! Structured event logging for the CLI front-end: json/logfmt/pretty output
//! over a small set of modem-relevant events, grounded in the teacher's
//! `StructuredLogger` output-format switch.

use std::time::Instant;

use serde::Serialize;

use crate::config::LogFormat;

/// One decoded frame, ready for display or structured emission.
#[derive(Debug, Clone, Serialize)]
pub struct FrameDecodeEvent {
    pub frame_index: usize,
    pub start_sample: usize,
    pub ldpc_iterations: usize,
    pub ldpc_converged: bool,
    pub payload_hex: String,
}

/// A signature match attempt against a transcript.
#[derive(Debug, Clone, Serialize)]
pub struct SignatureMatchEvent {
    pub frame_index: usize,
    pub header_message: String,
    pub matched: bool,
    pub token_offset: Option<usize>,
}

/// One AWGN trial batch's aggregate outcome, mirroring
/// `cicada_core::diagnostics::SimulationReport`.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationEvent {
    pub trials: usize,
    pub post_fec_errors: usize,
    pub post_fec_ber: f64,
    pub converged_trials: usize,
    pub converged_fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    Info { message: String },
    Warn { message: String },
    Error { message: String },
    FrameDecoded(FrameDecodeEvent),
    SignatureMatch(SignatureMatchEvent),
    Simulation(SimulationEvent),
}

/// Emits [`LogEvent`]s to stdout in the configured format, with an elapsed
/// timer since construction (useful for batch/simulation progress).
pub struct StructuredLogger {
    format: LogFormat,
    start: Instant,
}

impl StructuredLogger {
    pub fn new(format: LogFormat) -> Self {
        Self { format, start: Instant::now() }
    }

    pub fn log(&self, event: &LogEvent) {
        let elapsed = self.start.elapsed().as_secs_f64();
        match self.format {
            LogFormat::Json => {
                let mut value = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
                if let serde_json::Value::Object(ref mut map) = value {
                    map.insert("elapsed_secs".to_string(), serde_json::json!(elapsed));
                }
                println!("{value}");
            }
            LogFormat::Logfmt => println!("elapsed={elapsed:.3} {}", logfmt_fields(event)),
            LogFormat::Pretty => println!("[{elapsed:8.3}s] {}", pretty_fields(event)),
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(&LogEvent::Info { message: message.into() });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(&LogEvent::Warn { message: message.into() });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(&LogEvent::Error { message: message.into() });
    }
}

fn logfmt_fields(event: &LogEvent) -> String {
    match event {
        LogEvent::Info { message } => format!("event=info message=\"{message}\""),
        LogEvent::Warn { message } => format!("event=warn message=\"{message}\""),
        LogEvent::Error { message } => format!("event=error message=\"{message}\""),
        LogEvent::FrameDecoded(f) => format!(
            "event=frame_decoded frame_index={} start_sample={} ldpc_iterations={} ldpc_converged={} payload_hex={}",
            f.frame_index, f.start_sample, f.ldpc_iterations, f.ldpc_converged, f.payload_hex
        ),
        LogEvent::SignatureMatch(m) => format!(
            "event=signature_match frame_index={} header_message=\"{}\" matched={} token_offset={}",
            m.frame_index,
            m.header_message,
            m.matched,
            m.token_offset.map(|o| o.to_string()).unwrap_or_else(|| "none".to_string())
        ),
        LogEvent::Simulation(s) => format!(
            "event=simulation trials={} post_fec_errors={} post_fec_ber={:.6} converged_trials={} converged_fraction={:.4}",
            s.trials, s.post_fec_errors, s.post_fec_ber, s.converged_trials, s.converged_fraction
        ),
    }
}

fn pretty_fields(event: &LogEvent) -> String {
    match event {
        LogEvent::Info { message } => format!("INFO  {message}"),
        LogEvent::Warn { message } => format!("WARN  {message}"),
        LogEvent::Error { message } => format!("ERROR {message}"),
        LogEvent::FrameDecoded(f) => format!(
            "frame #{} @ sample {}: ldpc {} in {} iterations, payload {}",
            f.frame_index,
            f.start_sample,
            if f.ldpc_converged { "converged" } else { "did not converge" },
            f.ldpc_iterations,
            f.payload_hex
        ),
        LogEvent::SignatureMatch(m) => format!(
            "frame #{} header='{}': {}",
            m.frame_index,
            m.header_message,
            match m.token_offset {
                Some(offset) => format!("matched at token offset {offset}"),
                None => "no match".to_string(),
            }
        ),
        LogEvent::Simulation(s) => format!(
            "{} trials, post-FEC BER {:.6} ({} errors), {:.1}% converged",
            s.trials,
            s.post_fec_ber,
            s.post_fec_errors,
            s.converged_fraction * 100.0
        ),
    }
}
