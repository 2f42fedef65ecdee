//! Reconvergence-driven cut construction.

use veles_subnet::{CellSymbol, InOutMapping, SubnetBuilder, SubnetView};

/// Computes a reconvergence-driven cut of at most `k` leaves rooted at
/// `root`.
///
/// The frontier starts as `{root}`; each step expands the frontier node
/// whose fanins add the fewest new leaves, so paths from the leaves to the
/// root reconverge as much as possible. Expansion stops when no candidate
/// keeps the frontier within `k`.
pub fn reconvergence_cut(builder: &SubnetBuilder, root: usize, k: usize) -> Vec<usize> {
    assert!(k >= 1);
    let mut leaves: Vec<usize> = vec![root];
    let mut visited: Vec<usize> = vec![root];

    loop {
        // Pick the expandable leaf whose expansion grows the frontier least.
        let mut best: Option<(usize, usize, Vec<usize>)> = None; // (growth, leaf, additions)
        for &leaf in &leaves {
            let symbol = builder.symbol(leaf);
            if symbol == CellSymbol::In || symbol.is_constant() {
                continue;
            }
            let additions: Vec<usize> = builder
                .links_of(leaf)
                .iter()
                .map(|l| l.idx())
                .filter(|&t| {
                    !builder.symbol(t).is_constant() && !visited.contains(&t)
                })
                .collect();
            let grown = leaves.len() - 1 + additions.len();
            if grown > k {
                continue;
            }
            let growth = additions.len();
            let replace = match &best {
                Some((g, l, _)) => growth < *g || (growth == *g && leaf < *l),
                None => true,
            };
            if replace {
                best = Some((growth, leaf, additions));
            }
        }
        let Some((_, leaf, additions)) = best else {
            break;
        };
        leaves.retain(|&l| l != leaf);
        for added in additions {
            visited.push(added);
            leaves.push(added);
        }
        if leaves.is_empty() {
            // The cone bottomed out in constants only.
            break;
        }
    }

    leaves.sort_unstable();
    leaves
}

/// The reconvergence cut packaged as a view rooted at `root`.
pub fn reconvergence_view(builder: &SubnetBuilder, root: usize, k: usize) -> SubnetView {
    let leaves = reconvergence_cut(builder, root, k);
    SubnetView::new(InOutMapping::new(leaves, vec![root]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::eval::evaluate_view;

    /// A reconvergent cone: out = (a & b) ^ (b | c).
    fn sample() -> (SubnetBuilder, [usize; 3], usize) {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let c = builder.add_input();
        let ab = builder.add_cell(CellSymbol::And, &[a, b]);
        let bc = builder.add_cell(CellSymbol::Or, &[b, c]);
        let root = builder.add_cell(CellSymbol::Xor, &[ab, bc]);
        builder.add_output(root);
        (builder, [a.idx(), b.idx(), c.idx()], root.idx())
    }

    #[test]
    fn expands_to_the_inputs_when_k_allows() {
        let (builder, ins, root) = sample();
        let cut = reconvergence_cut(&builder, root, 4);
        let mut expected = ins.to_vec();
        expected.sort_unstable();
        assert_eq!(cut, expected, "reconvergent b is shared, 3 leaves suffice");
    }

    #[test]
    fn respects_the_bound() {
        let (builder, _, root) = sample();
        let cut = reconvergence_cut(&builder, root, 2);
        assert!(cut.len() <= 2);
    }

    #[test]
    fn input_root_is_its_own_cut() {
        let (builder, ins, _) = sample();
        let cut = reconvergence_cut(&builder, ins[0], 4);
        assert_eq!(cut, vec![ins[0]]);
    }

    #[test]
    fn view_evaluates_the_cone() {
        let (builder, _, root) = sample();
        let view = reconvergence_view(&builder, root, 4);
        let tts = evaluate_view(&builder, &view);
        // Leaves are sorted as [a, b, c] so variables line up with inputs.
        let a = veles_tt::TruthTable::nth_var(3, 0);
        let b = veles_tt::TruthTable::nth_var(3, 1);
        let c = veles_tt::TruthTable::nth_var(3, 2);
        assert_eq!(tts[0], &(&a & &b) ^ &(&b | &c));
    }
}
