//! Frame CSV exchange format and markdown verification appendix (§4.6, §6).
//!
//! Grounded in the Python original's `SignaturePayload.write_csv`/`load_csv`
//! and `cicada/verification.py`'s `write_appendix_md`: a flat CSV of decoded
//! frames (`frame_start_sam, timestamp, word_count, header_message,
//! bls_signature`) plus a markdown report binding each frame against a
//! transcript via the sliding-window match used by `match_chunk`.

use std::fmt::Write as _;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cicada_core::frame::{signed_message, FrameHeader, Token};
use cicada_core::signature;
use color_eyre::eyre::{eyre, Context, Result};

/// One decoded frame as it round-trips through CSV.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub frame_start_sample: i64,
    pub timestamp: u32,
    pub word_count: u8,
    pub header_message: String,
    pub signature: [u8; 48],
}

/// Escape a header message for a CSV field: control and non-ASCII characters
/// become `\uXXXX`, and characters that would otherwise confuse a naive CSV
/// reader (comma, quote, apostrophe) are escaped too.
pub fn escape_csv_text_field(value: &str) -> String {
    let mut out = String::new();
    for c in value.chars() {
        match c {
            ',' => out.push_str("\\u002c"),
            '"' => out.push_str("\\u0022"),
            '\'' => out.push_str("\\u0027"),
            c if c.is_ascii_graphic() || c == ' ' => out.push(c),
            c => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
        }
    }
    out
}

/// Inverse of [`escape_csv_text_field`].
pub fn unescape_csv_text_field(value: &str) -> String {
    let mut out = String::new();
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'u') {
            chars.next();
            let hex: String = (0..4).filter_map(|_| chars.next()).collect();
            if let Ok(code) = u32::from_str_radix(&hex, 16) {
                if let Some(decoded) = char::from_u32(code) {
                    out.push(decoded);
                    continue;
                }
            }
            out.push('\\');
            out.push('u');
            out.push_str(&hex);
        } else {
            out.push(c);
        }
    }
    out
}

pub fn write_frames_csv(path: &Path, records: &[FrameRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;
    writer.write_record(["frame_start_sam", "timestamp", "word_count", "header_message", "bls_signature"])?;
    for record in records {
        writer.write_record([
            record.frame_start_sample.to_string(),
            format!("{:010}", record.timestamp),
            record.word_count.to_string(),
            escape_csv_text_field(&record.header_message),
            BASE64.encode(record.signature),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_frames_csv(path: &Path) -> Result<Vec<FrameRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .wrap_err_with(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let frame_start_sample: i64 = row
            .get(0)
            .ok_or_else(|| eyre!("missing frame_start_sam column"))?
            .parse()?;
        let timestamp: u32 = row.get(1).ok_or_else(|| eyre!("missing timestamp column"))?.parse()?;
        let word_count: u8 = row.get(2).ok_or_else(|| eyre!("missing word_count column"))?.parse()?;
        let header_message = unescape_csv_text_field(row.get(3).unwrap_or(""));
        let sig_bytes = BASE64
            .decode(row.get(4).ok_or_else(|| eyre!("missing bls_signature column"))?)
            .wrap_err("bls_signature column is not valid base64")?;
        let mut signature = [0u8; 48];
        if sig_bytes.len() != signature.len() {
            return Err(eyre!("bls_signature must decode to 48 bytes, got {}", sig_bytes.len()));
        }
        signature.copy_from_slice(&sig_bytes);
        records.push(FrameRecord { frame_start_sample, timestamp, word_count, header_message, signature });
    }
    Ok(records)
}

/// Outcome of matching one decoded frame against a transcript.
pub struct MatchResult {
    pub record: FrameRecord,
    /// Index into the transcript's token list where the matched window
    /// begins, if `match_chunk`'s sliding search found one.
    pub token_offset: Option<usize>,
}

impl MatchResult {
    pub fn matched(&self) -> bool {
        self.token_offset.is_some()
    }
}

/// Slide a `word_count`-token window across `tokens`, verifying the frame's
/// signature at each offset; returns the first matching offset, mirroring
/// the Python original's `match_chunk`.
pub fn match_frame_against_transcript(
    record: &FrameRecord,
    public_key: &[u8; 96],
    tokens: &[Token],
) -> MatchResult {
    let word_count = record.word_count as usize;
    let header = match FrameHeader::new(record.timestamp, record.word_count, record.header_message.clone()) {
        Ok(h) => h,
        Err(_) => return MatchResult { record: record.clone(), token_offset: None },
    };

    if tokens.len() < word_count {
        return MatchResult { record: record.clone(), token_offset: None };
    }

    for start in 0..=(tokens.len() - word_count) {
        let Ok(msg) = signed_message(&header, &tokens[start..]) else { continue };
        if signature::verify(public_key, &record.signature, &msg).is_ok() {
            return MatchResult { record: record.clone(), token_offset: Some(start) };
        }
    }
    MatchResult { record: record.clone(), token_offset: None }
}

/// Render a decoded-and-matched frame as one appendix line, in the Python
/// original's `describe()` style.
fn describe_match(index: usize, m: &MatchResult, sample_rate: f64) -> String {
    let start_sec = m.record.frame_start_sample as f64 / sample_rate;
    let timestamp_utc = chrono::DateTime::from_timestamp(m.record.timestamp as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "invalid timestamp".to_string());
    let match_desc = match m.token_offset {
        Some(offset) => format!("matched at transcript token offset {offset}"),
        None => "no match".to_string(),
    };
    format!(
        "[{}]: BLS signature payload near sample {} ({:.2} sec). header='{}', timestamp={} UTC, words={}, signature={}, {}",
        index + 1,
        m.record.frame_start_sample,
        start_sec,
        m.record.header_message,
        timestamp_utc,
        m.record.word_count,
        hex::encode(m.record.signature),
        match_desc,
    )
}

/// Write the full markdown verification report: a transcript header followed
/// by the appendix of every detected payload and its match outcome.
pub fn write_markdown_appendix(
    path: &Path,
    transcript: &str,
    matches: &[MatchResult],
    sample_rate: f64,
) -> Result<()> {
    let mut out = String::new();
    out.push_str("# Transcript\n\n");
    out.push_str(transcript);
    out.push_str("\n\n# Appendix: All Detected Payloads\n\n");
    for (idx, m) in matches.iter().enumerate() {
        out.push_str(&describe_match(idx, m, sample_rate));
        out.push('\n');
    }
    std::fs::write(path, out).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Minimal hex-encoding helper so `report.rs` doesn't need a dedicated crate
/// for the one hex field in the appendix text.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}
