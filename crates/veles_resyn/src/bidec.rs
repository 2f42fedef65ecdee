//! Bi-decomposition: factoring over disjoint variable subsets.

use crate::Synthesizer;
use veles_subnet::{CellSymbol, Link, Subnet, SubnetBuilder};
use veles_tt::TruthTable;

#[derive(Clone, Debug)]
enum BiNode {
    Const(bool),
    Lit(u32, bool),
    Op(CellSymbol, Box<BiNode>, Box<BiNode>),
}

/// Synthesis through recursive bi-decomposition.
///
/// Searches all bipartitions `(A, B)` of the support for a factorization
/// `f = g(A) op h(B)` with `op` in {AND, OR, XOR}, recursing on `g` and
/// `h`. Base cases are constants and single literals. Functions admitting
/// no factorization at some level fail, and the caller falls back.
#[derive(Default)]
pub struct BiDecSynthesizer;

fn support(f: &TruthTable) -> Vec<u32> {
    (0..f.num_vars()).filter(|&v| f.depends_on(v)).collect()
}

/// Existentially quantifies every variable in `mask` out of `f`.
fn smooth(f: &TruthTable, vars: &[u32]) -> TruthTable {
    let mut out = f.clone();
    for &v in vars {
        out = &out.cofactor(v, false) | &out.cofactor(v, true);
    }
    out
}

/// Fixes every variable in `vars` to zero.
fn ground(f: &TruthTable, vars: &[u32]) -> TruthTable {
    let mut out = f.clone();
    for &v in vars {
        out = out.cofactor(v, false);
    }
    out
}

fn decompose(f: &TruthTable) -> Option<BiNode> {
    if f.is_zero() {
        return Some(BiNode::Const(false));
    }
    if f.is_ones() {
        return Some(BiNode::Const(true));
    }
    let vars = support(f);
    if vars.len() == 1 {
        let v = vars[0];
        let inv = !f.cofactor(v, true).is_ones();
        return Some(BiNode::Lit(v, inv));
    }

    // All bipartitions of the support; the mask enumerates subsets and the
    // half-range skips the mirrored duplicates.
    for mask in 1u32..(1 << (vars.len() - 1)) {
        let side_a: Vec<u32> = vars
            .iter()
            .enumerate()
            .filter(|(i, _)| mask >> i & 1 == 1)
            .map(|(_, &v)| v)
            .collect();
        let side_b: Vec<u32> = vars
            .iter()
            .enumerate()
            .filter(|(i, _)| mask >> i & 1 == 0)
            .map(|(_, &v)| v)
            .collect();

        // AND: both factors are the existential projections.
        let g = smooth(f, &side_b);
        let h = smooth(f, &side_a);
        if &g & &h == *f {
            if let (Some(left), Some(right)) = (decompose(&g), decompose(&h)) {
                return Some(BiNode::Op(CellSymbol::And, Box::new(left), Box::new(right)));
            }
        }

        // OR: the AND rule applied to the complement.
        let nf = !f;
        let g = smooth(&nf, &side_b);
        let h = smooth(&nf, &side_a);
        if &g & &h == nf {
            if let (Some(left), Some(right)) = (decompose(&!&g), decompose(&!&h)) {
                return Some(BiNode::Op(CellSymbol::Or, Box::new(left), Box::new(right)));
            }
        }

        // XOR: cofactor slices, the shared constant folded into one side.
        let g = ground(f, &side_b);
        let mut h = ground(f, &side_a);
        if ground(f, &vars).get_bit(0) {
            h = !&h;
        }
        if &g ^ &h == *f {
            if let (Some(left), Some(right)) = (decompose(&g), decompose(&h)) {
                return Some(BiNode::Op(CellSymbol::Xor, Box::new(left), Box::new(right)));
            }
        }
    }
    None
}

fn lower(node: &BiNode, builder: &mut SubnetBuilder, inputs: &[Link]) -> Link {
    match node {
        BiNode::Const(false) => builder.add_cell(CellSymbol::Zero, &[]),
        BiNode::Const(true) => builder.add_cell(CellSymbol::One, &[]),
        BiNode::Lit(v, inv) => inputs[*v as usize].with_inv(*inv),
        BiNode::Op(op, left, right) => {
            let a = lower(left, builder, inputs);
            let b = lower(right, builder, inputs);
            builder.add_cell(*op, &[a, b])
        }
    }
}

impl Synthesizer for BiDecSynthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        _care: &TruthTable,
        _max_arity: usize,
    ) -> Option<Subnet> {
        let node = decompose(func)?;
        let mut builder = SubnetBuilder::new();
        let inputs = builder.add_inputs(func.num_vars() as usize);
        let out = lower(&node, &mut builder, &inputs);
        builder.add_output(out);
        Some(builder.make(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::eval::evaluate_single_out;

    fn check_some(f: &TruthTable) {
        let subnet = BiDecSynthesizer.synthesize_exact(f).expect("decomposable");
        assert_eq!(evaluate_single_out(&subnet), *f);
    }

    #[test]
    fn and_or_xor_chains_decompose() {
        let x0 = TruthTable::nth_var(4, 0);
        let x1 = TruthTable::nth_var(4, 1);
        let x2 = TruthTable::nth_var(4, 2);
        let x3 = TruthTable::nth_var(4, 3);
        check_some(&(&(&x0 & &x1) & &(&x2 & &x3)));
        check_some(&(&(&x0 | &x1) & &(&x2 | &x3)));
        check_some(&(&(&x0 ^ &x1) ^ &(&x2 & &x3)));
        check_some(&(&(&x0 & &x1) ^ &x2));
    }

    #[test]
    fn xnor_folds_constant_into_a_side() {
        let x0 = TruthTable::nth_var(2, 0);
        let x1 = TruthTable::nth_var(2, 1);
        check_some(&!&(&x0 ^ &x1));
    }

    #[test]
    fn constants_and_literals() {
        check_some(&TruthTable::zeros(3));
        check_some(&TruthTable::ones(3));
        check_some(&TruthTable::nth_var(3, 2));
        check_some(&!&TruthTable::nth_var(3, 0));
    }

    #[test]
    fn prime_function_fails() {
        // MAJ has no disjoint bi-decomposition.
        let maj = TruthTable::from_hex_str("e8").unwrap();
        assert!(BiDecSynthesizer.synthesize_exact(&maj).is_none());
    }
}
