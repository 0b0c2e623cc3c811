//! BLS12-381 min-sig signing and verification (§6).
//!
//! Grounded in the Python original's `imprint/bls_min_sig.py`: signatures on
//! G1 (48 bytes compressed), public keys on G2 (96 bytes compressed), domain
//! separation tag `BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_`. Curve
//! arithmetic is delegated entirely to `blst`'s `min_sig` module, which is
//! exactly this ciphersuite.

use blst::min_sig::{PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;

use crate::errors::SignatureError;

pub const DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";
pub const PRIVATE_KEY_LEN: usize = 32;
pub const PUBLIC_KEY_LEN: usize = 96;
pub const SIGNATURE_LEN: usize = 48;

/// A BLS12-381 keypair, raw bytes on disk (§6).
pub struct Keypair {
    secret: SecretKey,
    public: PublicKey,
}

impl Keypair {
    /// Derive a keypair from arbitrary key material (`ikm`), at least 32
    /// bytes of entropy, following `blst`'s `key_gen` convention.
    pub fn from_ikm(ikm: &[u8]) -> Result<Self, SignatureError> {
        let secret = SecretKey::key_gen(ikm, &[]).map_err(|_| SignatureError::InvalidPrivateKey)?;
        let public = secret.sk_to_pk();
        Ok(Self { secret, public })
    }

    pub fn from_private_key_bytes(bytes: &[u8; PRIVATE_KEY_LEN]) -> Result<Self, SignatureError> {
        let secret = SecretKey::from_bytes(bytes).map_err(|_| SignatureError::InvalidPrivateKey)?;
        let public = secret.sk_to_pk();
        Ok(Self { secret, public })
    }

    pub fn private_key_bytes(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.secret.to_bytes()
    }

    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.public.compress()
    }

    /// Sign `msg`, producing a 48-byte compressed G1 point.
    pub fn sign(&self, msg: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.secret.sign(msg, DST, &[]).compress()
    }
}

/// Verify a compressed signature against a compressed public key and a
/// message, returning `Ok(())` on success or the specific parse/verify
/// failure otherwise (soft failure, §7 kind 3 — callers fold this into a
/// no-match result rather than propagating).
pub fn verify(
    public_key_bytes: &[u8; PUBLIC_KEY_LEN],
    signature_bytes: &[u8; SIGNATURE_LEN],
    msg: &[u8],
) -> Result<(), SignatureError> {
    let public_key =
        PublicKey::from_bytes(public_key_bytes).map_err(|_| SignatureError::InvalidPublicKey)?;
    let signature =
        Signature::from_bytes(signature_bytes).map_err(|_| SignatureError::InvalidSignature)?;

    let err = signature.verify(true, msg, DST, &[], &public_key, true);
    if err == BLST_ERROR::BLST_SUCCESS {
        Ok(())
    } else {
        Err(SignatureError::InvalidSignature)
    }
}
