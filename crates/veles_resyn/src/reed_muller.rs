//! Fixed-polarity Reed–Muller synthesis with polarity search.

use crate::zhegalkin::{build_esop, rm_polynomial};
use crate::Synthesizer;
use veles_subnet::Subnet;
use veles_tt::TruthTable;

/// The default polynomial metric: total term weight, each term costing one
/// plus its literal count.
pub fn term_weight(coeffs: &[bool]) -> u64 {
    coeffs
        .iter()
        .enumerate()
        .filter(|(_, &c)| c)
        .map(|(m, _)| 1 + m.count_ones() as u64)
        .sum()
}

/// Fixed-polarity Reed–Muller synthesis.
///
/// Tries all `2^n` polarities (each variable optionally pre-complemented)
/// and keeps the polynomial minimizing the metric. Polarities are walked in
/// Gray-code order: a single variable flips between neighbors, so each step
/// updates the polynomial in `O(2^n)` instead of recomputing it.
pub struct ReedMullerSynthesizer {
    metric: fn(&[bool]) -> u64,
}

impl ReedMullerSynthesizer {
    /// A synthesizer with the default term-weight metric.
    pub fn new() -> Self {
        Self {
            metric: term_weight,
        }
    }

    /// A synthesizer with a custom polynomial metric.
    pub fn with_metric(metric: fn(&[bool]) -> u64) -> Self {
        Self { metric }
    }

    /// Finds the polarity (bit i set = variable i complemented) whose FPRM
    /// polynomial minimizes the metric, returning it with its coefficients.
    pub fn best_polarity(&self, func: &TruthTable) -> (u32, Vec<bool>) {
        let n = func.num_vars();
        let mut coeffs = rm_polynomial(func);
        let mut polarity: u32 = 0;
        let mut best = (polarity, coeffs.clone(), (self.metric)(&coeffs));

        for step in 1u64..1 << n {
            let var = step.trailing_zeros();
            flip_polarity(&mut coeffs, var);
            polarity ^= 1 << var;
            let score = (self.metric)(&coeffs);
            if score < best.2 {
                best = (polarity, coeffs.clone(), score);
            }
        }
        (best.0, best.1)
    }
}

impl Default for ReedMullerSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Substituting `x = y ^ 1` folds every monomial containing the variable
/// into its cofactor monomial; targets and sources are disjoint, so the
/// update is order-free.
fn flip_polarity(coeffs: &mut [bool], var: u32) {
    let stride = 1usize << var;
    for m in 0..coeffs.len() {
        if m & stride != 0 {
            let carry = coeffs[m];
            coeffs[m ^ stride] ^= carry;
        }
    }
}

impl Synthesizer for ReedMullerSynthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        _care: &TruthTable,
        max_arity: usize,
    ) -> Option<Subnet> {
        let (polarity, coeffs) = self.best_polarity(func);
        Some(build_esop(&coeffs, polarity, func.num_vars(), max_arity))
    }
}
