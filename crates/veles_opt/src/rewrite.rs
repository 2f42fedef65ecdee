//! Cut rewriting against the NPN4 database.

use crate::transform::SubnetTransform;
use veles_cut::CutExtractor;
use veles_resyn::Npn4Database;
use veles_subnet::{
    eval::evaluate_view, CellSymbol, InOutMapping, SafePasser, SubnetBuilder, SubnetView,
};
use std::cell::RefCell;

/// The `rw` / `rwz` pass: for every gate, enumerate k-feasible cuts
/// (k <= 4), look the cone function up in the NPN4 database, and commit
/// the candidate with the best size gain. With `zero_cost`, replacements
/// with zero gain are admitted as local moves between other transforms.
pub struct Rewriter {
    name: String,
    k: usize,
    zero_cost: bool,
    db: RefCell<Npn4Database>,
}

impl Rewriter {
    /// A rewriter with cut bound `k` (clamped to 4) over a fresh database.
    pub fn new(k: usize, zero_cost: bool) -> Self {
        Self::with_database(k, zero_cost, Npn4Database::new())
    }

    /// A rewriter sharing a pre-warmed database.
    pub fn with_database(k: usize, zero_cost: bool, db: Npn4Database) -> Self {
        Self {
            name: if zero_cost { "rwz" } else { "rw" }.to_string(),
            k: k.clamp(2, 4),
            zero_cost,
            db: RefCell::new(db),
        }
    }

    /// Unwraps the database (for persisting a warmed cache).
    pub fn into_database(self) -> Npn4Database {
        self.db.into_inner()
    }

    fn ensure_cuts(extractor: &mut CutExtractor, builder: &SubnetBuilder, entry: usize) {
        if !extractor.cuts(entry).is_empty() {
            return;
        }
        let fanins: Vec<usize> = builder.links_of(entry).iter().map(|l| l.idx()).collect();
        for fanin in fanins {
            Self::ensure_cuts(extractor, builder, fanin);
        }
        extractor.recompute(builder, entry);
    }
}

impl SubnetTransform for Rewriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, builder: &mut SubnetBuilder) {
        let mut extractor = CutExtractor::new(builder, self.k);
        let mut passer = SafePasser::new();
        let mut rewrites = 0usize;

        while let Some(entry) = passer.next(builder) {
            let symbol = builder.symbol(entry);
            if symbol == CellSymbol::Out {
                break;
            }
            if !symbol.is_gate() {
                continue;
            }
            // Cells spliced in by earlier replacements have no cuts yet;
            // fill them bottom-up, then refresh the pivot.
            let fanins: Vec<usize> = builder.links_of(entry).iter().map(|l| l.idx()).collect();
            for fanin in fanins {
                Self::ensure_cuts(&mut extractor, builder, fanin);
            }
            extractor.recompute(builder, entry);

            // Pick the best-gain candidate over all non-trivial cuts.
            let mut best: Option<(i32, veles_subnet::Subnet, InOutMapping)> = None;
            let cuts: Vec<Vec<usize>> = extractor
                .cuts(entry)
                .iter()
                .filter(|c| !c.is_trivial() && c.size() >= 2)
                .map(|c| c.leaves.clone())
                .collect();
            for leaves in cuts {
                let view = SubnetView::new(InOutMapping::new(leaves, vec![entry]));
                let tt = evaluate_view(builder, &view).pop().expect("one root");
                let rhs = self.db.borrow_mut().lookup(&tt);
                let effect = builder.evaluate_replace(&rhs, view.io());
                let better = match &best {
                    Some((gain, ..)) => effect.size > *gain,
                    None => true,
                };
                if better {
                    best = Some((effect.size, rhs, view.io().clone()));
                }
            }

            let Some((gain, rhs, io)) = best else {
                continue;
            };
            if gain > 0 || (self.zero_cost && gain == 0) {
                builder.replace(&rhs, &io);
                rewrites += 1;
            }
        }
        tracing::debug!(pass = self.name.as_str(), rewrites, "rewriting done");
    }
}
