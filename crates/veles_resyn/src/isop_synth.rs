//! Minato–Morreale ISOP synthesis: an irredundant cover lowered to
//! AND/OR trees.

use crate::Synthesizer;
use veles_subnet::{CellSymbol, Link, Subnet, SubnetBuilder, IN_PLACE_LINKS};
use veles_tt::{isop, Cube, TruthTable};

/// Builds the AND of a cube's literals into `builder`.
pub(crate) fn build_cube(
    builder: &mut SubnetBuilder,
    inputs: &[Link],
    cube: &Cube,
    max_arity: usize,
) -> Link {
    let fanins: Vec<Link> = (0..inputs.len() as u32)
        .filter_map(|v| {
            if cube.pos >> v & 1 == 1 {
                Some(inputs[v as usize])
            } else if cube.neg >> v & 1 == 1 {
                Some(!inputs[v as usize])
            } else {
                None
            }
        })
        .collect();
    match fanins.len() {
        0 => builder.add_cell(CellSymbol::One, &[]),
        1 => fanins[0],
        _ => builder.add_cell_tree(CellSymbol::And, &fanins, max_arity),
    }
}

/// Lowers a cover to a subnet: AND per cube, OR over the cubes.
pub(crate) fn build_cover(cover: &[Cube], n_vars: u32, max_arity: usize) -> Subnet {
    let max_arity = max_arity.clamp(2, IN_PLACE_LINKS);
    let mut builder = SubnetBuilder::new();
    let inputs = builder.add_inputs(n_vars as usize);
    let terms: Vec<Link> = cover
        .iter()
        .map(|cube| build_cube(&mut builder, &inputs, cube, max_arity))
        .collect();
    let out = match terms.len() {
        0 => builder.add_cell(CellSymbol::Zero, &[]),
        1 => terms[0],
        _ => builder.add_cell_tree(CellSymbol::Or, &terms, max_arity),
    };
    builder.add_output(out);
    builder.make(true)
}

/// Minato–Morreale sum-of-products synthesis.
#[derive(Default)]
pub struct MmSynthesizer;

impl Synthesizer for MmSynthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        care: &TruthTable,
        max_arity: usize,
    ) -> Option<Subnet> {
        let cover = isop(func, care);
        Some(build_cover(&cover, func.num_vars(), max_arity))
    }
}
