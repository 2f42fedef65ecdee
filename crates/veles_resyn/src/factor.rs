//! Algebraic factoring of sum-of-products covers.

use crate::Synthesizer;
use veles_subnet::{CellSymbol, Link, Subnet, SubnetBuilder, IN_PLACE_LINKS};
use veles_tt::{isop, Cube, TruthTable};

#[derive(Clone, Debug)]
enum FactorNode {
    Const(bool),
    Lit(u32, bool),
    And(Vec<FactorNode>),
    Or(Vec<FactorNode>),
}

/// Area-oriented synthesis through algebraic factoring.
///
/// Starts from the Minato–Morreale cover and repeatedly divides by the
/// most frequent literal: `f = lit * (f / lit) + remainder`. The division
/// recurses into both the quotient and the remainder, so shared literals
/// are pulled out of parentheses and the emitted AND/OR tree carries fewer
/// literals than the flat cover.
#[derive(Default)]
pub struct FactorSynthesizer;

fn literal_counts(cover: &[Cube], n_vars: u32) -> Vec<(u32, bool, usize)> {
    let mut counts = Vec::new();
    for v in 0..n_vars {
        for inv in [false, true] {
            let count = cover
                .iter()
                .filter(|c| {
                    let mask = if inv { c.neg } else { c.pos };
                    mask >> v & 1 == 1
                })
                .count();
            counts.push((v, inv, count));
        }
    }
    counts
}

fn cube_node(cube: &Cube, n_vars: u32) -> FactorNode {
    let mut literals = Vec::new();
    for v in 0..n_vars {
        if cube.pos >> v & 1 == 1 {
            literals.push(FactorNode::Lit(v, false));
        }
        if cube.neg >> v & 1 == 1 {
            literals.push(FactorNode::Lit(v, true));
        }
    }
    match literals.len() {
        0 => FactorNode::Const(true),
        1 => literals.pop().expect("one literal"),
        _ => FactorNode::And(literals),
    }
}

fn factor_cover(cover: &[Cube], n_vars: u32) -> FactorNode {
    if cover.is_empty() {
        return FactorNode::Const(false);
    }
    if cover.len() == 1 {
        return cube_node(&cover[0], n_vars);
    }

    // The best divisor is the literal shared by the most cubes.
    let best = literal_counts(cover, n_vars)
        .into_iter()
        .max_by_key(|&(v, inv, count)| (count, std::cmp::Reverse((v, inv))))
        .filter(|&(_, _, count)| count > 1);

    let Some((var, inv, _)) = best else {
        // No shared literal: a flat OR of the cube ANDs.
        return FactorNode::Or(cover.iter().map(|c| cube_node(c, n_vars)).collect());
    };

    let bit = 1u32 << var;
    let mut quotient = Vec::new();
    let mut remainder = Vec::new();
    for cube in cover {
        let mask = if inv { cube.neg } else { cube.pos };
        if mask & bit != 0 {
            let mut reduced = *cube;
            if inv {
                reduced.neg &= !bit;
            } else {
                reduced.pos &= !bit;
            }
            quotient.push(reduced);
        } else {
            remainder.push(*cube);
        }
    }

    let factored = FactorNode::And(vec![
        FactorNode::Lit(var, inv),
        factor_cover(&quotient, n_vars),
    ]);
    if remainder.is_empty() {
        factored
    } else {
        FactorNode::Or(vec![factored, factor_cover(&remainder, n_vars)])
    }
}

fn lower(
    node: &FactorNode,
    builder: &mut SubnetBuilder,
    inputs: &[Link],
    max_arity: usize,
) -> Link {
    match node {
        FactorNode::Const(false) => builder.add_cell(CellSymbol::Zero, &[]),
        FactorNode::Const(true) => builder.add_cell(CellSymbol::One, &[]),
        FactorNode::Lit(v, inv) => inputs[*v as usize].with_inv(*inv),
        FactorNode::And(children) => {
            let fanins: Vec<Link> = children
                .iter()
                .map(|c| lower(c, builder, inputs, max_arity))
                .collect();
            builder.add_cell_tree(CellSymbol::And, &fanins, max_arity)
        }
        FactorNode::Or(children) => {
            let fanins: Vec<Link> = children
                .iter()
                .map(|c| lower(c, builder, inputs, max_arity))
                .collect();
            builder.add_cell_tree(CellSymbol::Or, &fanins, max_arity)
        }
    }
}

impl Synthesizer for FactorSynthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        care: &TruthTable,
        max_arity: usize,
    ) -> Option<Subnet> {
        let max_arity = max_arity.clamp(2, IN_PLACE_LINKS);
        let cover = isop(func, care);
        let node = factor_cover(&cover, func.num_vars());
        let mut builder = SubnetBuilder::new();
        let inputs = builder.add_inputs(func.num_vars() as usize);
        let out = lower(&node, &mut builder, &inputs, max_arity);
        builder.add_output(out);
        Some(builder.make(true))
    }
}
