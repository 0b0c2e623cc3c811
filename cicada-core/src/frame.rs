//! 64-byte signed wire frame layout (§3, §4.5).
//!
//! Grounded in the Python original's `SignaturePayloadHeader`/`SignaturePayload`
//! (`cicada/payload/signature.py`): a fixed header followed by a compressed
//! BLS12-381 G1 signature, with the signed message built by concatenating the
//! header bytes and each bound token's UTF-8 text plus a NUL separator.

use crate::errors::EncodingError;

/// Width of the ASCII header-message field, in bytes.
pub const HEADER_MESSAGE_LEN: usize = 11;
/// Width of a compressed BLS12-381 G1 signature, in bytes.
pub const SIGNATURE_LEN: usize = 48;
/// Total wire-frame size: 4 (timestamp) + 1 (word_count) + 11 (message) + 48 (signature).
pub const FRAME_LEN: usize = 4 + 1 + HEADER_MESSAGE_LEN + SIGNATURE_LEN;

/// A token bound into the signed message: canonical text plus its original
/// character offset in the source transcript (offset is carried for callers
/// that report match locations; it plays no role in the signed bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub char_offset: usize,
}

/// The fixed 16-byte header: timestamp, word count, and a short ASCII
/// message, laid out per §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub timestamp: u32,
    pub word_count: u8,
    /// ASCII text, right-padded with `0x00` to [`HEADER_MESSAGE_LEN`] on the
    /// wire; stored here without padding.
    pub message: String,
}

/// Non-ASCII bytes tolerated in a decoded header message before it is
/// treated as corrupted rather than merely containing stray high bits: the
/// wire field is defined as ASCII (§3), so any non-ASCII byte can only come
/// from a mis-synced or uncorrected frame, and zero tolerance is the
/// threshold named by §7 kind 3.
pub const HEADER_MAX_NON_ASCII_BYTES: usize = 0;

impl FrameHeader {
    /// Non-ASCII characters in `message` are replaced with `?`, matching the
    /// original's `str.encode("ascii", errors="replace")` (the wire field is
    /// ASCII-only; see [`FrameHeader::to_bytes`]).
    pub fn new(timestamp: u32, word_count: u8, message: impl Into<String>) -> Result<Self, EncodingError> {
        let message: String = message
            .into()
            .chars()
            .map(|c| if c.is_ascii() { c } else { '?' })
            .collect();
        if message.len() > HEADER_MESSAGE_LEN {
            return Err(EncodingError::HeaderMessageTooLong { len: message.len() });
        }
        Ok(Self { timestamp, word_count, message })
    }

    pub fn to_bytes(&self) -> [u8; 5 + HEADER_MESSAGE_LEN] {
        let mut out = [0u8; 5 + HEADER_MESSAGE_LEN];
        out[0..4].copy_from_slice(&self.timestamp.to_be_bytes());
        out[4] = self.word_count;
        let message_bytes = self.message.as_bytes();
        out[5..5 + message_bytes.len()].copy_from_slice(message_bytes);
        out
    }

    /// Parse a header, rejecting it as a soft failure (§7 kind 3) if the
    /// trimmed message carries more non-ASCII bytes than
    /// [`HEADER_MAX_NON_ASCII_BYTES`] — a lossy `from_utf8_lossy` would
    /// otherwise happily turn an uncorrected/mis-synced frame into a
    /// plausible-looking string.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let timestamp = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let word_count = bytes[4];
        let message_bytes = &bytes[5..5 + HEADER_MESSAGE_LEN];
        let trimmed_len = message_bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let trimmed = &message_bytes[..trimmed_len];

        let non_ascii_bytes = trimmed.iter().filter(|b| !b.is_ascii()).count();
        if non_ascii_bytes > HEADER_MAX_NON_ASCII_BYTES {
            return Err(EncodingError::HeaderNotAscii { non_ascii_bytes, len: trimmed.len() });
        }

        let message = String::from_utf8_lossy(trimmed).into_owned();
        Ok(Self { timestamp, word_count, message })
    }
}

/// The wire-ready signed frame: header bytes followed by a 48-byte compressed
/// signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedFrame {
    pub header: FrameHeader,
    pub signature: [u8; SIGNATURE_LEN],
}

impl SignedFrame {
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut out = [0u8; FRAME_LEN];
        out[..5 + HEADER_MESSAGE_LEN].copy_from_slice(&self.header.to_bytes());
        out[5 + HEADER_MESSAGE_LEN..].copy_from_slice(&self.signature);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        debug_assert_eq!(bytes.len(), FRAME_LEN);
        let header = FrameHeader::from_bytes(bytes)?;
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&bytes[5 + HEADER_MESSAGE_LEN..]);
        Ok(Self { header, signature })
    }
}

/// Build the exact byte sequence that is hashed-to-curve and signed:
/// `header_bytes ∥ (token.text.utf8 ∥ 0x00)*` for the first `word_count`
/// tokens of `tokens` (§3, §4.5).
pub fn signed_message(header: &FrameHeader, tokens: &[Token]) -> Result<Vec<u8>, EncodingError> {
    let mut msg = header.to_bytes().to_vec();
    for tok in tokens.iter().take(header.word_count as usize) {
        if tok.text.as_bytes().contains(&0) {
            return Err(EncodingError::TokenContainsNul);
        }
        msg.extend_from_slice(tok.text.as_bytes());
        msg.push(0);
    }
    Ok(msg)
}
