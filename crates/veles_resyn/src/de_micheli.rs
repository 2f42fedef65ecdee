//! De Micheli top-down majority synthesis.

use crate::Synthesizer;
use veles_subnet::{CellSymbol, Link, Subnet, SubnetBuilder};
use veles_tt::TruthTable;

/// Bound on expanded tree nodes, after the reference algorithm.
const NODE_BOUND: usize = 2000;

#[derive(Clone, Debug)]
enum DmExpr {
    Const(bool),
    Lit(u32, bool),
    Maj(Box<[DmExpr; 3]>),
}

/// Top-down MAJ synthesis after Lee, Riener and De Micheli.
///
/// Starting from the output, greedily picks two leaf divisors whose
/// agreement with the target is total wherever they coincide, then recurses
/// into the third argument on the rows where the pair disagrees (the rows
/// the third argument controls). Every accepted pair strictly shrinks the
/// care set, and the expansion count is bounded; if no pair qualifies the
/// synthesis fails and the caller falls back to another algorithm.
#[derive(Default)]
pub struct DmSynthesizer;

fn leaf_pool(n: u32) -> Vec<(TruthTable, DmExpr)> {
    let mut pool = vec![
        (TruthTable::zeros(n), DmExpr::Const(false)),
        (TruthTable::ones(n), DmExpr::Const(true)),
    ];
    for i in 0..n {
        let var = TruthTable::nth_var(n, i);
        pool.push((!&var, DmExpr::Lit(i, true)));
        pool.push((var, DmExpr::Lit(i, false)));
    }
    pool
}

fn agreement(table: &TruthTable, func: &TruthTable, care: &TruthTable) -> u32 {
    (&!&(table ^ func) & care).count_ones()
}

fn synth_rec(
    func: &TruthTable,
    care: &TruthTable,
    pool: &[(TruthTable, DmExpr)],
    budget: &mut usize,
) -> Option<DmExpr> {
    let full = care.count_ones();
    if full == 0 {
        return Some(DmExpr::Const(false));
    }
    for (table, expr) in pool {
        if agreement(table, func, care) == full {
            return Some(expr.clone());
        }
    }
    if *budget == 0 {
        return None;
    }
    *budget -= 1;

    // First divisor: highest care-overlap with the target.
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(agreement(&pool[i].0, func, care)));

    for &first in &order {
        let d1 = &pool[first].0;
        let agree1 = !&(d1 ^ func);
        // Second divisor, weighted toward fixing rows the first gets wrong;
        // wherever the pair agrees the majority is already decided, so the
        // pair must be jointly correct there.
        let mut seconds: Vec<usize> = (0..pool.len())
            .filter(|&i| i != first)
            .filter(|&i| {
                let joint = &!&(d1 ^ &pool[i].0) & care;
                (&joint & &!&agree1).is_zero()
            })
            .collect();
        seconds.sort_by_key(|&i| {
            let cand = &!&(&pool[i].0 ^ func);
            let score = (&(&agree1 & cand) & care).count_ones()
                + 2 * (&(&!&agree1 & cand) & care).count_ones();
            std::cmp::Reverse(score)
        });

        for second in seconds {
            let d2 = &pool[second].0;
            let controlled = &(d1 ^ d2) & care;
            if controlled == *care {
                // The third argument would face the unchanged problem.
                continue;
            }
            if let Some(third) = synth_rec(func, &controlled, pool, budget) {
                return Some(DmExpr::Maj(Box::new([
                    pool[first].1.clone(),
                    pool[second].1.clone(),
                    third,
                ])));
            }
        }
    }
    None
}

fn lower(expr: &DmExpr, builder: &mut SubnetBuilder, inputs: &[Link]) -> Link {
    match expr {
        DmExpr::Const(false) => builder.add_cell(CellSymbol::Zero, &[]),
        DmExpr::Const(true) => builder.add_cell(CellSymbol::One, &[]),
        DmExpr::Lit(v, inv) => inputs[*v as usize].with_inv(*inv),
        DmExpr::Maj(args) => {
            let a = lower(&args[0], builder, inputs);
            let b = lower(&args[1], builder, inputs);
            let c = lower(&args[2], builder, inputs);
            builder.add_cell(CellSymbol::Maj, &[a, b, c])
        }
    }
}

impl Synthesizer for DmSynthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        care: &TruthTable,
        _max_arity: usize,
    ) -> Option<Subnet> {
        let pool = leaf_pool(func.num_vars());
        let mut budget = NODE_BOUND;
        let expr = synth_rec(func, care, &pool, &mut budget)?;
        let mut builder = SubnetBuilder::new();
        let inputs = builder.add_inputs(func.num_vars() as usize);
        let out = lower(&expr, &mut builder, &inputs);
        builder.add_output(out);
        Some(builder.make(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::eval::evaluate_single_out;

    fn check_if_some(f: &TruthTable) -> bool {
        match DmSynthesizer.synthesize_exact(f) {
            Some(subnet) => {
                assert_eq!(evaluate_single_out(&subnet), *f, "wrong function");
                true
            }
            None => false,
        }
    }

    #[test]
    fn majority_is_one_gate() {
        let f = TruthTable::from_hex_str("e8").unwrap();
        let subnet = DmSynthesizer.synthesize_exact(&f).unwrap();
        assert_eq!(subnet.internal_count(), 1);
        assert_eq!(evaluate_single_out(&subnet).to_binary_string(), "11101000");
    }

    #[test]
    fn unate_functions_synthesize() {
        for f in [
            TruthTable::from_binary_str("1000").unwrap(), // AND2
            TruthTable::from_binary_str("1110").unwrap(), // OR2
            TruthTable::from_hex_str("80").unwrap(),      // AND3
            TruthTable::from_hex_str("fe").unwrap(),      // OR3
            TruthTable::nth_var(3, 0),
            TruthTable::zeros(3),
            TruthTable::ones(3),
        ] {
            assert!(check_if_some(&f), "must synthesize {f:?}");
        }
    }

    #[test]
    fn parity_fails_and_falls_back() {
        // No leaf pair is jointly correct wherever it coincides for parity;
        // the synthesizer reports failure instead of a wrong subnet.
        let xor3 = TruthTable::from_hex_str("96").unwrap();
        assert!(DmSynthesizer.synthesize_exact(&xor3).is_none());
    }

    #[test]
    fn never_returns_a_wrong_subnet() {
        for bits in [0x1eu64, 0xd8, 0xb2, 0x2b, 0x7f, 0x11] {
            let f = TruthTable::from_bits(3, bits);
            check_if_some(&f);
        }
    }

    #[test]
    fn care_relaxes_the_target() {
        let f = TruthTable::from_hex_str("e9").unwrap();
        let care = TruthTable::from_hex_str("fe").unwrap(); // row 0 free
        if let Some(subnet) = DmSynthesizer.synthesize(&f, &care, crate::NO_ARITY_BOUND) {
            let got = evaluate_single_out(&subnet);
            assert_eq!(&got & &care, &f & &care);
        }
    }
}
