//! Simulation-based switching-activity estimation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use veles_subnet::{CellSymbol, SubnetBuilder};

/// Default simulation seed; fixed so reports are reproducible run to run.
pub const DEFAULT_SEED: u64 = 0x5EED_CAFE;

/// Default number of random input assignments (bit-parallel words).
pub const DEFAULT_VECTORS: usize = 1024;

/// Estimates per-cell signal probabilities by bit-parallel random
/// simulation and derives switching activity `2 p (1 - p)` per cell.
///
/// The estimate is written into each entry's weight, so power-aware passes
/// and `stat_design` read it without recomputing.
pub struct ActivityEstimator {
    vectors: usize,
    seed: u64,
}

impl ActivityEstimator {
    /// An estimator with the default sampling policy.
    pub fn new() -> Self {
        Self {
            vectors: DEFAULT_VECTORS,
            seed: DEFAULT_SEED,
        }
    }

    /// An estimator with an explicit vector count and seed.
    pub fn with_policy(vectors: usize, seed: u64) -> Self {
        Self {
            vectors: vectors.max(64),
            seed,
        }
    }

    /// Simulates the builder and loads per-entry activities into the cell
    /// weights. Returns the summed switching activity.
    pub fn estimate(&self, builder: &mut SubnetBuilder) -> f32 {
        let words = self.vectors.div_ceil(64);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut signals: Vec<Option<Vec<u64>>> = vec![None; builder.len()];

        let order: Vec<usize> = builder.iter_order().collect();
        let mut total = 0.0f32;
        for entry in order {
            let symbol = builder.symbol(entry);
            let value: Vec<u64> = match symbol {
                CellSymbol::In => (0..words).map(|_| rng.gen::<u64>()).collect(),
                CellSymbol::Zero => vec![0; words],
                CellSymbol::One => vec![u64::MAX; words],
                _ => {
                    let mut fanins: Vec<Vec<u64>> = Vec::new();
                    for link in builder.links_of(entry) {
                        let Some(base) = signals[link.idx()].as_ref() else {
                            fanins.clear();
                            break;
                        };
                        fanins.push(if link.is_inv() {
                            base.iter().map(|w| !w).collect()
                        } else {
                            base.clone()
                        });
                    }
                    if fanins.is_empty() {
                        continue;
                    }
                    match simulate_words(symbol, &fanins, words) {
                        Some(value) => value,
                        None => continue,
                    }
                }
            };

            let ones: u32 = value.iter().map(|w| w.count_ones()).sum();
            let p = ones as f32 / (words as f32 * 64.0);
            let activity = 2.0 * p * (1.0 - p);
            if symbol != CellSymbol::In && symbol != CellSymbol::Out {
                builder.set_weight(entry, activity);
                total += activity;
            }
            signals[entry] = Some(value);
        }
        total
    }
}

impl Default for ActivityEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn simulate_words(symbol: CellSymbol, fanins: &[Vec<u64>], words: usize) -> Option<Vec<u64>> {
    let fold = |init: u64, op: fn(u64, u64) -> u64| -> Vec<u64> {
        (0..words)
            .map(|w| fanins.iter().map(|f| f[w]).fold(init, op))
            .collect()
    };
    let value = match symbol {
        CellSymbol::Buf | CellSymbol::Not | CellSymbol::Out => fanins[0].clone(),
        CellSymbol::And => fold(u64::MAX, |a, b| a & b),
        CellSymbol::Nand => fold(u64::MAX, |a, b| a & b).iter().map(|w| !w).collect(),
        CellSymbol::Or => fold(0, |a, b| a | b),
        CellSymbol::Nor => fold(0, |a, b| a | b).iter().map(|w| !w).collect(),
        CellSymbol::Xor => fold(0, |a, b| a ^ b),
        CellSymbol::Xnor => fold(0, |a, b| a ^ b).iter().map(|w| !w).collect(),
        CellSymbol::Maj => {
            let threshold = fanins.len() / 2;
            (0..words)
                .map(|w| {
                    let mut out = 0u64;
                    for bit in 0..64 {
                        let count = fanins.iter().filter(|f| f[w] >> bit & 1 == 1).count();
                        if count > threshold {
                            out |= 1 << bit;
                        }
                    }
                    out
                })
                .collect()
        }
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_runs() {
        let build = || {
            let mut builder = SubnetBuilder::new();
            let ins = builder.add_inputs(3);
            let ab = builder.add_cell(CellSymbol::And, &[ins[0], ins[1]]);
            let root = builder.add_cell(CellSymbol::Xor, &[ab, ins[2]]);
            builder.add_output(root);
            builder
        };
        let mut b1 = build();
        let mut b2 = build();
        let t1 = ActivityEstimator::new().estimate(&mut b1);
        let t2 = ActivityEstimator::new().estimate(&mut b2);
        assert_eq!(t1, t2);
    }

    #[test]
    fn and_activity_below_xor_activity() {
        // p(AND of two) = 1/4 -> activity 0.375; p(XOR) = 1/2 -> 0.5.
        let mut builder = SubnetBuilder::new();
        let ins = builder.add_inputs(2);
        let and = builder.add_cell(CellSymbol::And, &[ins[0], ins[1]]);
        let xor = builder.add_cell(CellSymbol::Xor, &[ins[0], ins[1]]);
        builder.add_output(and);
        builder.add_output(xor);
        ActivityEstimator::new().estimate(&mut builder);
        let a_and = builder.weight(and.idx());
        let a_xor = builder.weight(xor.idx());
        assert!(a_and < a_xor, "AND {a_and} must switch less than XOR {a_xor}");
        assert!((a_and - 0.375).abs() < 0.05);
        assert!((a_xor - 0.5).abs() < 0.05);
    }

    #[test]
    fn constants_never_switch() {
        let mut builder = SubnetBuilder::new();
        let _ = builder.add_input();
        let zero = builder.add_cell(CellSymbol::Zero, &[]);
        builder.add_output(zero);
        ActivityEstimator::new().estimate(&mut builder);
        assert_eq!(builder.weight(zero.idx()), 0.0);
    }
}
