//! Per-entry k-feasible cut extraction with dominance pruning.

use crate::cut::Cut;
use veles_subnet::{CellSymbol, SubnetBuilder};

/// Default cap on the number of cuts kept per entry.
pub const MAX_CUTS_PER_ENTRY: usize = 16;

/// Extracts and stores all k-feasible cuts for every live entry of a
/// builder.
///
/// Cut storage belongs to the extractor; after the builder is mutated,
/// [`CutExtractor::recompute`] must run on every affected entry before its
/// cuts are read again.
pub struct CutExtractor {
    k: usize,
    max_cuts: usize,
    cuts: Vec<Vec<Cut>>,
}

impl CutExtractor {
    /// Extracts cuts of size at most `k` for every entry.
    pub fn new(builder: &SubnetBuilder, k: usize) -> Self {
        Self::with_limit(builder, k, MAX_CUTS_PER_ENTRY)
    }

    /// Extracts with an explicit per-entry cut cap.
    pub fn with_limit(builder: &SubnetBuilder, k: usize, max_cuts: usize) -> Self {
        assert!(k >= 1, "cut bound must be positive");
        let mut extractor = CutExtractor {
            k,
            max_cuts,
            cuts: vec![Vec::new(); builder.len()],
        };
        for entry in builder.iter_order() {
            extractor.find_cuts(builder, entry);
        }
        extractor
    }

    /// The cuts of `entry`, trivial cut included.
    pub fn cuts(&self, entry: usize) -> &[Cut] {
        &self.cuts[entry]
    }

    /// The cut bound k.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Recomputes the cuts of `entry`, assuming every entry preceding it in
    /// the topological order is up to date.
    pub fn recompute(&mut self, builder: &SubnetBuilder, entry: usize) {
        if self.cuts.len() < builder.len() {
            self.cuts.resize(builder.len(), Vec::new());
        }
        self.find_cuts(builder, entry);
    }

    fn find_cuts(&mut self, builder: &SubnetBuilder, entry: usize) {
        let symbol = builder.symbol(entry);
        let links = builder.links_of(entry);
        if symbol == CellSymbol::In || symbol.is_constant() || links.is_empty() {
            self.cuts[entry] = vec![Cut::trivial(entry)];
            return;
        }

        // One cut per combination of fanin cuts, k-feasibility enforced
        // during the merge.
        let fanin_cuts: Vec<&[Cut]> = links.iter().map(|l| self.cuts[l.idx()].as_slice()).collect();
        let mut candidates: Vec<Cut> = Vec::new();
        let mut selector = vec![0usize; fanin_cuts.len()];
        'combinations: loop {
            let mut merged = fanin_cuts[0][selector[0]].clone();
            merged.root = entry;
            let mut feasible = true;
            for (cuts, &pick) in fanin_cuts.iter().zip(&selector).skip(1) {
                match merged.merge_leaves(&cuts[pick], self.k) {
                    Some(leaves) => merged = Cut::new(entry, leaves),
                    None => {
                        feasible = false;
                        break;
                    }
                }
            }
            if feasible && !candidates.contains(&merged) {
                candidates.push(merged);
            }
            // Advance the mixed-radix selector.
            for slot in 0..selector.len() {
                selector[slot] += 1;
                if selector[slot] < fanin_cuts[slot].len() {
                    continue 'combinations;
                }
                selector[slot] = 0;
            }
            break;
        }
        candidates.push(Cut::trivial(entry));

        // Dominance pruning: a kept cut may neither dominate nor be
        // dominated by another kept cut.
        let mut kept: Vec<Cut> = Vec::new();
        for candidate in candidates {
            if kept.iter().any(|c| c.dominates(&candidate)) {
                continue;
            }
            kept.retain(|c| !candidate.dominates(c));
            kept.push(candidate);
        }

        // Deterministic order, smallest cuts first, then cap.
        kept.sort_by(|a, b| {
            (a.leaves.len(), a.signature, &a.leaves).cmp(&(b.leaves.len(), b.signature, &b.leaves))
        });
        kept.truncate(self.max_cuts);
        self.cuts[entry] = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// out = (a & b) ^ (b | c)
    fn sample_builder() -> (SubnetBuilder, [usize; 3], usize) {
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

    fn is_separator(builder: &SubnetBuilder, cut: &Cut) -> bool {
        // Every path from an input to the root must cross a leaf (or the
        // root itself): walking up from the root stopping at leaves must
        // never reach an input that is not a leaf.
        fn reaches_input(
            builder: &SubnetBuilder,
            at: usize,
            cut: &Cut,
        ) -> bool {
            if cut.leaves.binary_search(&at).is_ok() {
                return false;
            }
            if builder.symbol(at) == CellSymbol::In {
                return true;
            }
            builder
                .links_of(at)
                .iter()
                .any(|l| reaches_input(builder, l.idx(), cut))
        }
        !reaches_input(builder, cut.root, cut)
    }

    #[test]
    fn inputs_have_only_trivial_cut() {
        let (builder, ins, _) = sample_builder();
        let extractor = CutExtractor::new(&builder, 4);
        for input in ins {
            let cuts = extractor.cuts(input);
            assert_eq!(cuts.len(), 1);
            assert!(cuts[0].is_trivial());
        }
    }

    #[test]
    fn every_cut_is_a_separator() {
        let (builder, _, root) = sample_builder();
        let extractor = CutExtractor::new(&builder, 4);
        for cut in extractor.cuts(root) {
            assert!(is_separator(&builder, cut), "cut {:?}", cut.leaves);
        }
    }

    #[test]
    fn root_has_input_cut_when_k_large_enough() {
        let (builder, ins, root) = sample_builder();
        let extractor = CutExtractor::new(&builder, 4);
        let mut expected = ins.to_vec();
        expected.sort_unstable();
        assert!(
            extractor.cuts(root).iter().any(|c| c.leaves == expected),
            "the full input frontier must appear as a cut"
        );
        assert!(extractor.cuts(root).iter().any(|c| c.is_trivial()));
    }

    #[test]
    fn k_bounds_cut_size() {
        let (builder, _, root) = sample_builder();
        let extractor = CutExtractor::new(&builder, 2);
        for cut in extractor.cuts(root) {
            assert!(cut.size() <= 2);
        }
    }

    #[test]
    fn dominated_cuts_are_pruned() {
        let (builder, _, root) = sample_builder();
        let extractor = CutExtractor::new(&builder, 4);
        let cuts = extractor.cuts(root);
        for (i, a) in cuts.iter().enumerate() {
            for (j, b) in cuts.iter().enumerate() {
                if i != j {
                    assert!(!a.dominates(b), "{:?} dominates {:?}", a.leaves, b.leaves);
                }
            }
        }
    }

    #[test]
    fn recompute_after_edit() {
        let (mut builder, ins, root) = sample_builder();
        let mut extractor = CutExtractor::new(&builder, 4);

        // Replace the root cone with a single AND of the inputs' cells.
        let mut rhs = SubnetBuilder::new();
        let r = rhs.add_inputs(3);
        let out = rhs.add_cell(CellSymbol::And, &[r[0], r[1], r[2]]);
        rhs.add_output(out);
        let rhs = rhs.make(true);
        builder.replace(
            &rhs,
            &veles_subnet::InOutMapping::new(ins.to_vec(), vec![root]),
        );

        // The new root is the And cell driving the output.
        let out_entry = builder.outputs()[0];
        let new_root = builder.links_of(out_entry)[0].idx();
        extractor.recompute(&builder, new_root);
        let mut expected = ins.to_vec();
        expected.sort_unstable();
        assert!(extractor
            .cuts(new_root)
            .iter()
            .any(|c| c.leaves == expected));
    }

    #[test]
    fn max_cuts_cap_respected() {
        let (builder, _, root) = sample_builder();
        let extractor = CutExtractor::with_limit(&builder, 4, 2);
        assert!(extractor.cuts(root).len() <= 2);
    }
}
