//! cicada error types with granular categories

use thiserror::Error;

/// Top-level error type for all cicada operations
#[derive(Debug, Error)]
pub enum CicadaError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("LDPC error: {0}")]
    Ldpc(#[from] LdpcError),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("audio I/O error: {0}")]
    Audio(#[from] AudioError),
}

/// Configuration errors. Reported at construction; fatal (§7 kind 1).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Nyquist violation: pulse bank occupies up to {top_hz} Hz, sample rate {fs} Hz requires it below {nyquist_hz} Hz")]
    NyquistViolation {
        top_hz: f64,
        fs: f64,
        nyquist_hz: f64,
    },

    #[error("samples per pulse must be at least 2, got {p}")]
    DegeneratePulseLength { p: usize },

    #[error("pulse count mismatch: Q={q} * H={h} = {qh}, expected N_p={n_p}")]
    PulseCountMismatch { q: usize, h: usize, qh: usize, n_p: usize },

    #[error("samples-per-pulse rounding error: fs/Rs = {exact}, rounded to {rounded}, relative error {rel_err} exceeds 1e-3")]
    SamplesPerPulseMismatch {
        exact: f64,
        rounded: usize,
        rel_err: f64,
    },

    #[error("LDPC code length mismatch: N_c={n_c}, K={k}, M=N_c-K={m} (expected {expected_m})")]
    LdpcLengthMismatch { n_c: usize, k: usize, m: usize, expected_m: usize },

    #[error("LDPC construction did not converge on a valid graph within {attempts} attempts")]
    LdpcConstructionFailed { attempts: usize },

    #[error("key file {path} not found")]
    KeyFileMissing { path: String },

    #[error("key file {path} has wrong length: expected {expected} bytes, got {actual}")]
    KeyFileMalformed { path: String, expected: usize, actual: usize },

    #[error("bits_per_symbol={b} is not supported; bit LLR demodulation is defined for b=1 only")]
    UnsupportedModulationOrder { b: usize },

    #[error("start column {start_column} cannot host a full frame of {s} symbols")]
    FrameDoesNotFit { start_column: usize, s: usize },
}

/// Encoding-side hard failures. Capacity warnings (§7 kind 2) are carried as
/// data on the encode report, not raised here; this type is for conditions
/// that make encoding impossible outright.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("header message {len} bytes exceeds the 11-byte field")]
    HeaderMessageTooLong { len: usize },

    #[error("word_count {count} exceeds the 8-bit field (max 255)")]
    WordCountTooLarge { count: usize },

    #[error("token text contains an embedded NUL byte, which is the token separator")]
    TokenContainsNul,

    #[error("decoded header message has {non_ascii_bytes} non-ASCII byte(s) out of {len}, above the zero-tolerance threshold (§7 kind 3)")]
    HeaderNotAscii { non_ascii_bytes: usize, len: usize },
}

/// LDPC decode soft failures (§7 kind 3: the frame is retained with an
/// `undecoded` marker, never a hard error, by the caller).
#[derive(Debug, Error)]
pub enum LdpcError {
    #[error("belief propagation did not converge after {iterations} iterations")]
    ConvergenceFailed { iterations: usize },

    #[error("parity-check and codeword length mismatch: H is {m}x{n_c}, codeword has {len} bits")]
    LengthMismatch { m: usize, n_c: usize, len: usize },
}

/// Signature parse/verify soft failures (§7 kind 3).
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("public key bytes do not decode to a valid G2 point")]
    InvalidPublicKey,

    #[error("signature bytes do not decode to a valid G1 point")]
    InvalidSignature,

    #[error("private key bytes do not decode to a valid scalar")]
    InvalidPrivateKey,
}

/// External audio I/O errors.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open audio file {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("failed to decode audio file {path}: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("resampling from {from_hz} Hz to {to_hz} Hz failed: {reason}")]
    ResampleFailed { from_hz: u32, to_hz: u32, reason: String },

    #[error("failed to write WAV file {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Result type alias for cicada operations
pub type Result<T> = std::result::Result<T, CicadaError>;
