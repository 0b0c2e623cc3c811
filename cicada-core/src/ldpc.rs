//! Systematic binary LDPC code: configuration-model construction (§3, §4.4)
//! and normalized min-sum belief-propagation decoding.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::LdpcConfig;
use crate::errors::{ConfigError, LdpcError};

const MAX_CONSTRUCTION_ATTEMPTS: usize = 200;

/// Sparse parity-check matrix stored as per-check variable-index lists, plus
/// the reverse per-variable check-index lists needed by belief propagation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParityCheckMatrix {
    pub n_c: usize,
    pub m: usize,
    /// `checks[c]` lists the variable indices incident to check `c`.
    pub checks: Vec<Vec<usize>>,
    /// `variables[v]` lists the check indices incident to variable `v`.
    pub variables: Vec<Vec<usize>>,
}

impl ParityCheckMatrix {
    /// `H·x ≡ 0 (mod 2)` for a hard-decision vector `x` of length `n_c`.
    pub fn syndrome_is_zero(&self, x: &[u8]) -> bool {
        self.checks
            .iter()
            .all(|vars| vars.iter().fold(0u8, |acc, &v| acc ^ x[v]) == 0)
    }
}

/// The code: parity-check matrix plus the systematic generator used for
/// encoding. `generator[k]` gives the parity columns produced by message bit
/// `k` (the identity block is implicit: the first `K` coded bits equal the
/// message). `parity_vars[j]` gives the true `H`-variable index that
/// `generator[..][j]` is parity for — Gaussian elimination may permute the
/// parity columns via row-pivot swaps, so this is not simply `k + j`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdpcCode {
    pub config: LdpcConfig,
    pub h: ParityCheckMatrix,
    generator: Vec<Vec<u8>>,
    parity_vars: Vec<usize>,
}

impl LdpcCode {
    /// Build the code deterministically from `config.seed` (§4.4). The exact
    /// construction: a configuration-model bipartite graph with variable
    /// degree fixed at `d_v`, check degrees at `d_c` with a few checks
    /// absorbing the surplus at `d_c+1` when `n_c·d_v` is not a multiple of
    /// `m·d_c`, rejecting multi-edges and length-4 cycles, then a generator
    /// built by systematic Gaussian elimination over GF(2). A candidate graph
    /// whose parity-column block turns out rank-deficient (no generator
    /// could be built) is discarded and another graph is drawn from the same
    /// deterministic RNG stream, so the result stays reproducible from seed.
    pub fn new(config: LdpcConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (h, generator, parity_vars) = build_code(&config)?;
        Ok(Self { config, h, generator, parity_vars })
    }

    pub fn n_c(&self) -> usize {
        self.config.n_c
    }

    pub fn k(&self) -> usize {
        self.config.k
    }

    pub fn m(&self) -> usize {
        self.h.m
    }

    /// Systematic encode: `message` (length `K`) to a length-`N_c` codeword
    /// whose first `K` bits equal `message` exactly.
    pub fn encode(&self, message: &[u8]) -> Vec<u8> {
        debug_assert_eq!(message.len(), self.config.k);
        let mut codeword = vec![0u8; self.config.n_c];
        codeword[..self.config.k].copy_from_slice(message);
        for (k, row) in self.generator.iter().enumerate() {
            if message[k] == 1 {
                for (j, &bit) in row.iter().enumerate() {
                    codeword[self.parity_vars[j]] ^= bit;
                }
            }
        }
        codeword
    }

    /// Normalized min-sum belief propagation (§4.4). `channel_llrs` has
    /// length `N_c`, positive meaning bit 0 more likely. Returns the hard
    /// decision codeword, the iteration count, and whether the syndrome
    /// check succeeded before the iteration cap.
    pub fn decode(&self, channel_llrs: &[f32]) -> Result<(Vec<u8>, usize, bool), LdpcError> {
        if channel_llrs.len() != self.config.n_c {
            return Err(LdpcError::LengthMismatch {
                m: self.h.m,
                n_c: self.config.n_c,
                len: channel_llrs.len(),
            });
        }

        let clip = self.config.clip as f32;
        let alpha = self.config.alpha as f32;
        let l_ch: Vec<f32> = channel_llrs.iter().map(|&l| l.clamp(-clip, clip)).collect();

        // Check-to-variable messages, same shape/indexing as h.checks.
        let mut r: Vec<Vec<f32>> = self.h.checks.iter().map(|vars| vec![0.0f32; vars.len()]).collect();
        let mut hard = vec![0u8; self.config.n_c];

        for iteration in 1..=self.config.max_iterations {
            let var_r_sum = sum_incoming_r(&self.h, &r, self.config.n_c);

            // Variable -> check: q[c,v] = l_ch[v] + (sum of r into v) - r[c,v].
            let mut q: Vec<Vec<f32>> = self.h.checks.iter().map(|vars| vec![0.0f32; vars.len()]).collect();
            for (c, vars) in self.h.checks.iter().enumerate() {
                for (slot, &v) in vars.iter().enumerate() {
                    q[c][slot] = (l_ch[v] + var_r_sum[v] - r[c][slot]).clamp(-clip, clip);
                }
            }

            // Check -> variable: normalized min-sum over the other incident edges.
            for (c, vars) in self.h.checks.iter().enumerate() {
                let deg = vars.len();
                for slot in 0..deg {
                    let mut sign_product = 1.0f32;
                    let mut min_mag = f32::INFINITY;
                    for other in 0..deg {
                        if other == slot {
                            continue;
                        }
                        let msg = q[c][other];
                        sign_product *= if msg < 0.0 { -1.0 } else { 1.0 };
                        min_mag = min_mag.min(msg.abs());
                    }
                    r[c][slot] = (alpha * sign_product * min_mag).clamp(-clip, clip);
                }
            }

            let var_r_sum = sum_incoming_r(&self.h, &r, self.config.n_c);
            for v in 0..self.config.n_c {
                hard[v] = if l_ch[v] + var_r_sum[v] >= 0.0 { 0 } else { 1 };
            }

            if self.h.syndrome_is_zero(&hard) {
                return Ok((hard, iteration, true));
            }
        }

        Ok((hard, self.config.max_iterations, false))
    }
}

fn sum_incoming_r(h: &ParityCheckMatrix, r: &[Vec<f32>], n_c: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; n_c];
    for (c, vars) in h.checks.iter().enumerate() {
        for (slot, &v) in vars.iter().enumerate() {
            sum[v] += r[c][slot];
        }
    }
    sum
}

/// Build the parity-check matrix and its systematic generator together,
/// retrying both the configuration-model pairing (on multi-edges or
/// length-4 cycles) and the generator construction (on a rank-deficient
/// parity-column block) from the same deterministic RNG stream (§4.4,
/// `DESIGN.md` Open Question 1).
fn build_code(config: &LdpcConfig) -> Result<(ParityCheckMatrix, Vec<Vec<u8>>, Vec<usize>), ConfigError> {
    let n_c = config.n_c;
    let m = config.m();
    let total_edges = n_c * config.d_v;

    let base_degree = total_edges / m;
    let surplus = total_edges - base_degree * m;
    let mut check_degrees = vec![base_degree; m];
    for d in check_degrees.iter_mut().take(surplus) {
        *d += 1;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    for _ in 0..MAX_CONSTRUCTION_ATTEMPTS {
        let Some(h) = try_build_graph(n_c, m, config.d_v, &check_degrees, &mut rng) else {
            continue;
        };
        if let Some((generator, parity_vars)) = build_generator(&h, config.k) {
            return Ok((h, generator, parity_vars));
        }
    }

    Err(ConfigError::LdpcConstructionFailed {
        attempts: MAX_CONSTRUCTION_ATTEMPTS,
    })
}

/// One configuration-model pairing attempt: shuffle variable sockets into
/// check buckets of the given degrees, rejecting multi-edges and length-4
/// cycles. Returns `None` on either rejection so the caller can draw again.
fn try_build_graph(
    n_c: usize,
    m: usize,
    d_v: usize,
    check_degrees: &[usize],
    rng: &mut ChaCha8Rng,
) -> Option<ParityCheckMatrix> {
    let mut variable_sockets: Vec<usize> = (0..n_c).flat_map(|v| std::iter::repeat(v).take(d_v)).collect();
    variable_sockets.shuffle(rng);

    let mut checks: Vec<Vec<usize>> = Vec::with_capacity(m);
    let mut cursor = 0usize;
    let mut ok = true;
    for &deg in check_degrees {
        let mut vars: Vec<usize> = variable_sockets[cursor..cursor + deg].to_vec();
        cursor += deg;
        let mut sorted = vars.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            ok = false;
        }
        vars.sort_unstable();
        vars.dedup();
        checks.push(vars);
    }

    if ok && !has_length_four_cycle(&checks) {
        let variables = invert_checks(&checks, n_c);
        Some(ParityCheckMatrix { n_c, m, checks, variables })
    } else {
        None
    }
}

/// Two checks sharing two or more variables close a length-4 cycle.
fn has_length_four_cycle(checks: &[Vec<usize>]) -> bool {
    for (i, a) in checks.iter().enumerate() {
        for b in checks.iter().skip(i + 1) {
            let overlap = a.iter().filter(|v| b.contains(v)).count();
            if overlap >= 2 {
                return true;
            }
        }
    }
    false
}

fn invert_checks(checks: &[Vec<usize>], n_c: usize) -> Vec<Vec<usize>> {
    let mut variables = vec![Vec::new(); n_c];
    for (c, vars) in checks.iter().enumerate() {
        for &v in vars {
            variables[v].push(c);
        }
    }
    variables
}

/// Build a systematic generator by Gaussian elimination of `H` over GF(2),
/// reducing the last `m` columns to the identity (swapping in later columns
/// when a pivot is missing) so the first `k` columns give `A` with
/// `generator[col] = A^T[col]`.
///
/// A missing pivot is resolved by swapping dense-matrix *columns*, which
/// relabels which original `H`-variable index sits at that column position.
/// `col_variable[c]` tracks that mapping (column swaps never touch the
/// message block `[0, k)`, only the parity block `[k, n_c)`), so the
/// returned `parity_vars[j]` gives the true variable index that
/// `generator[..][j]` is parity for. Returns `None`, rather than silently
/// leaving a row unreduced, if the parity-column block is rank-deficient and
/// no pivot can be found for some row.
fn build_generator(h: &ParityCheckMatrix, k: usize) -> Option<(Vec<Vec<u8>>, Vec<usize>)> {
    let n_c = h.n_c;
    let m = h.m;

    let mut dense = vec![vec![0u8; n_c]; m];
    for (c, vars) in h.checks.iter().enumerate() {
        for &v in vars {
            dense[c][v] = 1;
        }
    }

    let mut col_variable: Vec<usize> = (0..n_c).collect();

    for row in 0..m {
        let pivot_col = k + row;
        if dense[row][pivot_col] == 0 {
            let swap_col = (pivot_col + 1..n_c).find(|&c| dense[row][c] == 1)?;
            for r in dense.iter_mut() {
                r.swap(pivot_col, swap_col);
            }
            col_variable.swap(pivot_col, swap_col);
        }
        for r in 0..m {
            if r != row && dense[r][pivot_col] == 1 {
                for c in 0..n_c {
                    dense[r][c] ^= dense[row][c];
                }
            }
        }
    }

    let mut generator = vec![vec![0u8; m]; k];
    for row in 0..m {
        for col in 0..k {
            generator[col][row] = dense[row][col];
        }
    }

    let parity_vars: Vec<usize> = (0..m).map(|row| col_variable[k + row]).collect();
    Some((generator, parity_vars))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_code() -> LdpcCode {
        LdpcCode::new(LdpcConfig::default()).expect("default LDPC config builds")
    }

    #[test]
    fn construction_is_deterministic_across_runs() {
        let a = LdpcCode::new(LdpcConfig::default()).unwrap();
        let b = LdpcCode::new(LdpcConfig::default()).unwrap();
        assert_eq!(a.h.checks, b.h.checks);
    }

    #[test]
    fn encode_is_systematic() {
        let code = test_code();
        let message: Vec<u8> = (0..code.k()).map(|i| (i % 3 == 0) as u8).collect();
        let codeword = code.encode(&message);
        assert_eq!(&codeword[..code.k()], message.as_slice());
        assert!(code.h.syndrome_is_zero(&codeword));
    }

    #[test]
    fn decode_recovers_clean_codeword() {
        let code = test_code();
        let message: Vec<u8> = (0..code.k()).map(|i| (i % 5 == 0) as u8).collect();
        let codeword = code.encode(&message);
        let llrs: Vec<f32> = codeword.iter().map(|&b| if b == 0 { 10.0 } else { -10.0 }).collect();
        let (decoded, _iterations, converged) = code.decode(&llrs).unwrap();
        assert!(converged);
        assert_eq!(&decoded[..code.k()], message.as_slice());
    }

    #[test]
    fn decode_reports_iteration_count_and_syndrome() {
        let code = test_code();
        let message = vec![0u8; code.k()];
        let codeword = code.encode(&message);
        let llrs: Vec<f32> = codeword.iter().map(|&b| if b == 0 { 8.0 } else { -8.0 }).collect();
        let (decoded, iterations, converged) = code.decode(&llrs).unwrap();
        assert!(converged);
        assert!(iterations <= code.config.max_iterations);
        assert!(code.h.syndrome_is_zero(&decoded));
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let code = test_code();
        let short_llrs = vec![1.0f32; code.n_c() - 1];
        assert!(matches!(
            code.decode(&short_llrs),
            Err(LdpcError::LengthMismatch { .. })
        ));
    }

    /// `H = [[1,0,0,1],[0,1,1,0]]`, `k=2`: the first pivot (row 0, column 2)
    /// is zero and requires a swap with column 3, which relabels the parity
    /// column. `build_generator` must track that relabeling so the caller
    /// writes generated parity bits to the right original variable index.
    #[test]
    fn build_generator_tracks_column_swap_permutation() {
        let h = ParityCheckMatrix {
            n_c: 4,
            m: 2,
            checks: vec![vec![0, 3], vec![1, 2]],
            variables: invert_checks(&[vec![0, 3], vec![1, 2]], 4),
        };
        let (generator, parity_vars) = build_generator(&h, 2).expect("full-rank parity block");
        assert_eq!(parity_vars, vec![3, 2]);

        let message = [1u8, 0u8];
        let mut codeword = vec![0u8; h.n_c];
        codeword[..2].copy_from_slice(&message);
        for (k, row) in generator.iter().enumerate() {
            if message[k] == 1 {
                for (j, &bit) in row.iter().enumerate() {
                    codeword[parity_vars[j]] ^= bit;
                }
            }
        }

        assert_eq!(codeword, vec![1, 0, 0, 1]);
        assert!(h.syndrome_is_zero(&codeword));
    }

    /// A rank-deficient parity-column block (both checks touch only column
    /// 0, leaving column 1 with no possible pivot for row 1) must be
    /// reported as a construction failure, not silently skipped.
    #[test]
    fn build_generator_rejects_rank_deficient_parity_block() {
        let h = ParityCheckMatrix {
            n_c: 2,
            m: 2,
            checks: vec![vec![0], vec![0]],
            variables: invert_checks(&[vec![0], vec![0]], 2),
        };
        assert!(build_generator(&h, 0).is_none());
    }
}
