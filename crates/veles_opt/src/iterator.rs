//! Cone iterators feeding the transformer loop.

use veles_cut::{mffc_fragment, reconvergence_cut};
use veles_subnet::{CellSymbol, SafePasser, SubnetBuilder, SubnetFragment};

/// Produces, for each live gate cell under the passer, the local cone a
/// pass considers rewriting.
pub trait SubnetIterator {
    /// The next fragment, or `None` when the builder is exhausted.
    fn next(
        &mut self,
        builder: &mut SubnetBuilder,
        passer: &mut SafePasser,
    ) -> Option<SubnetFragment>;
}

fn next_gate(builder: &SubnetBuilder, passer: &mut SafePasser) -> Option<usize> {
    while let Some(entry) = passer.next(builder) {
        let symbol = builder.symbol(entry);
        if symbol == CellSymbol::Out {
            // Outputs close the topological order; nothing rewritable past
            // this point.
            return None;
        }
        if symbol.is_gate() {
            return Some(entry);
        }
    }
    None
}

/// Reconvergence cut of `n_in` leaves, then the MFFC inside it. The cone
/// every area-oriented pass rewrites.
pub struct AreaSubnetIterator {
    n_in: usize,
}

impl AreaSubnetIterator {
    /// An iterator yielding MFFCs bounded by `n_in`-leaf cuts.
    pub fn new(n_in: usize) -> Self {
        Self { n_in }
    }
}

impl SubnetIterator for AreaSubnetIterator {
    fn next(
        &mut self,
        builder: &mut SubnetBuilder,
        passer: &mut SafePasser,
    ) -> Option<SubnetFragment> {
        let root = next_gate(builder, passer)?;
        let leaves = reconvergence_cut(builder, root, self.n_in);
        Some(mffc_fragment(builder, root, &leaves))
    }
}

/// A cut grown by frontier expansion bounded by `cut_size`, with the whole
/// cone inside extracted. The cone depth-oriented passes rewrite.
pub struct DepthSubnetIterator {
    cut_size: usize,
}

impl DepthSubnetIterator {
    /// An iterator yielding frontier-grown cones of at most `cut_size`
    /// leaves.
    pub fn new(cut_size: usize) -> Self {
        Self { cut_size }
    }
}

impl SubnetIterator for DepthSubnetIterator {
    fn next(
        &mut self,
        builder: &mut SubnetBuilder,
        passer: &mut SafePasser,
    ) -> Option<SubnetFragment> {
        let root = next_gate(builder, passer)?;
        let leaves = reconvergence_cut(builder, root, self.cut_size);
        let view = veles_subnet::SubnetView::new(veles_subnet::InOutMapping::new(
            leaves,
            vec![root],
        ));
        Some(view.extract(builder))
    }
}
