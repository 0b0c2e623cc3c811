//! Signal quality metrics used by the AWGN scenario and CLI reporting.

/// Bit error rate between two equal-length (or shortest-prefix-compared) bit
/// sequences, each element 0 or 1.
pub fn compute_ber(tx_bits: &[u8], rx_bits: &[u8]) -> f64 {
    if tx_bits.is_empty() || rx_bits.is_empty() {
        return 0.0;
    }
    let count = tx_bits.len().min(rx_bits.len());
    let errors = (0..count).filter(|&i| tx_bits[i] != rx_bits[i]).count();
    errors as f64 / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ber_zero_for_perfect_match() {
        let bits = vec![0, 1, 0, 1, 1, 0];
        assert_eq!(compute_ber(&bits, &bits), 0.0);
    }

    #[test]
    fn test_ber_calculation() {
        let tx = vec![0, 1, 0, 1, 1, 0, 1, 0];
        let rx = vec![0, 1, 1, 1, 1, 0, 0, 0]; // 2 errors out of 8
        let ber = compute_ber(&tx, &rx);
        assert!((ber - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_empty_input_returns_zero() {
        let empty: Vec<u8> = vec![];
        assert_eq!(compute_ber(&empty, &empty), 0.0);
    }
}
