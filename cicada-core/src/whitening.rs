//! Whitening mask: a fixed pseudorandom bit vector XORed onto message bits
//! before LDPC encoding and onto decoded bits after LDPC decoding, to avoid
//! long runs (§3).

use std::sync::OnceLock;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::WhiteningConfig;

/// Per-seed cached masks, since the CLI and tests may each want a distinct
/// seed; the common case (seed 0) resolves to one shared allocation.
static MASK_CACHE: OnceLock<std::sync::Mutex<std::collections::HashMap<(u64, usize), &'static [u8]>>> =
    OnceLock::new();

fn generate_mask(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut mask = vec![0u8; len];
    let mut buf = [0u8; 1];
    for bit in mask.iter_mut() {
        rng.fill_bytes(&mut buf);
        *bit = buf[0] & 1;
    }
    mask
}

/// The whitening mask for `(seed, len)`, built once and cached for the
/// process lifetime (§3 "Entity lifecycle").
pub fn mask(seed: u64, len: usize) -> &'static [u8] {
    let cache = MASK_CACHE.get_or_init(|| std::sync::Mutex::new(std::collections::HashMap::new()));
    let mut guard = cache.lock().expect("whitening mask cache poisoned");
    if let Some(existing) = guard.get(&(seed, len)) {
        return existing;
    }
    let mask: &'static [u8] = Vec::leak(generate_mask(seed, len));
    guard.insert((seed, len), mask);
    mask
}

/// XOR `bits` with the whitening mask in place, truncating the mask to
/// `bits.len()` (length-min XOR, §4.4).
pub fn apply(config: &WhiteningConfig, bits: &mut [u8]) {
    if !config.enabled {
        return;
    }
    let m = mask(config.seed, bits.len());
    for (b, &mbit) in bits.iter_mut().zip(m.iter()) {
        *b ^= mbit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_deterministic_for_same_seed() {
        let a = mask(0, 1024).to_vec();
        let b = mask(0, 1024).to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn mask_values_are_binary() {
        let m = mask(0, 64);
        assert!(m.iter().all(|&b| b == 0 || b == 1));
    }

    #[test]
    fn apply_is_its_own_inverse() {
        let config = WhiteningConfig { enabled: true, seed: 0 };
        let original = vec![1u8, 0, 1, 1, 0, 0, 1, 0];
        let mut bits = original.clone();
        apply(&config, &mut bits);
        apply(&config, &mut bits);
        assert_eq!(bits, original);
    }

    #[test]
    fn disabled_whitening_is_a_no_op() {
        let config = WhiteningConfig { enabled: false, seed: 0 };
        let original = vec![1u8, 0, 1, 1];
        let mut bits = original.clone();
        apply(&config, &mut bits);
        assert_eq!(bits, original);
    }

    #[test]
    fn all_zero_input_produces_the_mask_itself() {
        let config = WhiteningConfig { enabled: true, seed: 0 };
        let mut bits = vec![0u8; 32];
        apply(&config, &mut bits);
        assert_eq!(bits, mask(0, 32));
    }
}
