//! Disjoint-support decomposition driven synthesis.

use crate::isop_synth::MmSynthesizer;
use crate::Synthesizer;
use veles_subnet::{CellSymbol, Link, Subnet, SubnetBuilder};
use veles_tt::TruthTable;

/// Prime blocks of at most this many variables go to the fallback
/// synthesizer.
const PRIME_LIMIT: u32 = 6;

#[derive(Clone, Debug)]
enum DsdNode {
    Const(bool),
    Lit(u32, bool),
    /// `var op rest` with the literal split off the top.
    Bin(CellSymbol, u32, bool, Box<DsdNode>),
    /// Shannon split `ITE(var, high, low)`.
    Ite(u32, Box<DsdNode>, Box<DsdNode>),
    /// An irreducible block handed to the fallback synthesizer.
    Prime(TruthTable),
}

/// Synthesis through recursive disjoint-support decomposition.
///
/// Peels top-level AND/OR/XOR splits where one operand is a single
/// literal, falls back to a Shannon (ITE) split on the most binate
/// variable, and dispatches remaining prime blocks of at most six
/// variables to ISOP synthesis. Polarities are pushed onto links when the
/// tree is lowered.
#[derive(Default)]
pub struct DsdSynthesizer;

fn support(f: &TruthTable) -> Vec<u32> {
    (0..f.num_vars()).filter(|&v| f.depends_on(v)).collect()
}

fn decompose(f: &TruthTable, depth: u32) -> DsdNode {
    if f.is_zero() {
        return DsdNode::Const(false);
    }
    if f.is_ones() {
        return DsdNode::Const(true);
    }
    let vars = support(f);
    if vars.len() == 1 {
        let v = vars[0];
        let inv = !f.cofactor(v, true).is_ones();
        return DsdNode::Lit(v, inv);
    }

    // Single-literal AND/OR/XOR splits.
    for &v in &vars {
        let f0 = f.cofactor(v, false);
        let f1 = f.cofactor(v, true);
        if f0.is_zero() {
            return DsdNode::Bin(CellSymbol::And, v, false, Box::new(decompose(&f1, depth + 1)));
        }
        if f1.is_zero() {
            return DsdNode::Bin(CellSymbol::And, v, true, Box::new(decompose(&f0, depth + 1)));
        }
        if f1.is_ones() {
            return DsdNode::Bin(CellSymbol::Or, v, false, Box::new(decompose(&f0, depth + 1)));
        }
        if f0.is_ones() {
            return DsdNode::Bin(CellSymbol::Or, v, true, Box::new(decompose(&f1, depth + 1)));
        }
        if f1 == !&f0 {
            return DsdNode::Bin(CellSymbol::Xor, v, false, Box::new(decompose(&f0, depth + 1)));
        }
    }

    if vars.len() as u32 <= PRIME_LIMIT && depth > 0 {
        // An irreducible block small enough for the fallback.
        return DsdNode::Prime(f.clone());
    }

    // Shannon split on the variable with the largest sensitive set.
    let v = *vars
        .iter()
        .max_by_key(|&&v| (f.cofactor(v, false) ^ f.cofactor(v, true)).count_ones())
        .expect("non-constant function has a support");
    let high = decompose(&f.cofactor(v, true), depth + 1);
    let low = decompose(&f.cofactor(v, false), depth + 1);
    DsdNode::Ite(v, Box::new(high), Box::new(low))
}

fn lower(
    node: &DsdNode,
    builder: &mut SubnetBuilder,
    inputs: &[Link],
    max_arity: usize,
) -> Link {
    match node {
        DsdNode::Const(false) => builder.add_cell(CellSymbol::Zero, &[]),
        DsdNode::Const(true) => builder.add_cell(CellSymbol::One, &[]),
        DsdNode::Lit(v, inv) => inputs[*v as usize].with_inv(*inv),
        DsdNode::Bin(op, v, inv, rest) => {
            let lit = inputs[*v as usize].with_inv(*inv);
            let inner = lower(rest, builder, inputs, max_arity);
            builder.add_cell(*op, &[lit, inner])
        }
        DsdNode::Ite(v, high, low) => {
            let s = inputs[*v as usize];
            let t = lower(high, builder, inputs, max_arity);
            let e = lower(low, builder, inputs, max_arity);
            let st = builder.add_cell(CellSymbol::And, &[s, t]);
            let se = builder.add_cell(CellSymbol::And, &[!s, e]);
            builder.add_cell(CellSymbol::Or, &[st, se])
        }
        DsdNode::Prime(table) => {
            let fallback = MmSynthesizer
                .synthesize(table, &TruthTable::ones(table.num_vars()), max_arity)
                .expect("ISOP synthesis is total");
            builder.add_subnet(&fallback, inputs)[0]
        }
    }
}

impl Synthesizer for DsdSynthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        _care: &TruthTable,
        max_arity: usize,
    ) -> Option<Subnet> {
        let node = decompose(func, 0);
        let mut builder = SubnetBuilder::new();
        let inputs = builder.add_inputs(func.num_vars() as usize);
        let out = lower(&node, &mut builder, &inputs, max_arity);
        builder.add_output(out);
        Some(builder.make(true))
    }
}
