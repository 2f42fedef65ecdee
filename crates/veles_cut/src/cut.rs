//! k-feasible cuts with 64-bit signatures.

use veles_common::entry_hash;

/// A cut of a root entry: a leaf set every input-to-root path crosses.
///
/// Leaves are kept sorted; the signature is the OR of the leaves' entry
/// hashes and makes most non-subset pairs fail the dominance pre-check
/// without an element-wise comparison.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Cut {
    /// The root entry.
    pub root: usize,
    /// Sorted leaf entries.
    pub leaves: Vec<usize>,
    /// OR of the leaves' entry hashes.
    pub signature: u64,
}

impl Cut {
    /// Builds a cut from a leaf set (sorted and deduplicated here).
    pub fn new(root: usize, mut leaves: Vec<usize>) -> Self {
        leaves.sort_unstable();
        leaves.dedup();
        let signature = leaves.iter().fold(0u64, |acc, &l| acc | entry_hash(l));
        Cut {
            root,
            leaves,
            signature,
        }
    }

    /// The trivial cut `{root}`.
    pub fn trivial(root: usize) -> Self {
        Cut::new(root, vec![root])
    }

    /// `true` iff the cut is `{root}`.
    pub fn is_trivial(&self) -> bool {
        self.leaves.len() == 1 && self.leaves[0] == self.root
    }

    /// Number of leaves.
    pub fn size(&self) -> usize {
        self.leaves.len()
    }

    /// `true` iff this cut's leaves are a strict subset of `other`'s.
    ///
    /// The signature test is necessary but not sufficient, so it only
    /// short-circuits the negative case.
    pub fn dominates(&self, other: &Cut) -> bool {
        if self.leaves.len() >= other.leaves.len() {
            return false;
        }
        if self.signature & other.signature != self.signature {
            return false;
        }
        self.leaves
            .iter()
            .all(|l| other.leaves.binary_search(l).is_ok())
    }

    /// The union of two leaf sets, or `None` when it exceeds `k`.
    pub fn merge_leaves(&self, other: &Cut, k: usize) -> Option<Vec<usize>> {
        let mut merged = Vec::with_capacity(self.leaves.len() + other.leaves.len());
        let (mut i, mut j) = (0, 0);
        while i < self.leaves.len() || j < other.leaves.len() {
            let next = match (self.leaves.get(i), other.leaves.get(j)) {
                (Some(&a), Some(&b)) if a == b => {
                    i += 1;
                    j += 1;
                    a
                }
                (Some(&a), Some(&b)) if a < b => {
                    i += 1;
                    a
                }
                (Some(_), Some(&b)) => {
                    j += 1;
                    b
                }
                (Some(&a), None) => {
                    i += 1;
                    a
                }
                (None, Some(&b)) => {
                    j += 1;
                    b
                }
                (None, None) => unreachable!(),
            };
            merged.push(next);
            if merged.len() > k {
                return None;
            }
        }
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_cut() {
        let cut = Cut::trivial(7);
        assert!(cut.is_trivial());
        assert_eq!(cut.size(), 1);
        assert_eq!(cut.signature, veles_common::entry_hash(7));
    }

    #[test]
    fn dominance_is_strict_subset() {
        let small = Cut::new(9, vec![1, 2]);
        let large = Cut::new(9, vec![1, 2, 3]);
        assert!(small.dominates(&large));
        assert!(!large.dominates(&small));
        assert!(!small.dominates(&small));
    }

    #[test]
    fn non_subset_not_dominated() {
        let a = Cut::new(9, vec![1, 4]);
        let b = Cut::new(9, vec![1, 2, 3]);
        assert!(!a.dominates(&b));
    }

    #[test]
    fn merge_respects_bound() {
        let a = Cut::new(9, vec![1, 2, 3]);
        let b = Cut::new(9, vec![3, 4, 5]);
        assert_eq!(a.merge_leaves(&b, 5), Some(vec![1, 2, 3, 4, 5]));
        assert_eq!(a.merge_leaves(&b, 4), None);
    }

    #[test]
    fn merge_dedups_shared_leaves() {
        let a = Cut::new(9, vec![1, 2]);
        let b = Cut::new(9, vec![1, 2]);
        assert_eq!(a.merge_leaves(&b, 2), Some(vec![1, 2]));
    }
}
