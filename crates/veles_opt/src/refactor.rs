//! MFFC refactoring.

use crate::iterator::{AreaSubnetIterator, SubnetIterator};
use veles_resyn::{FactorSynthesizer, MmSynthesizer, Synthesizer};
use veles_subnet::{
    eval::{evaluate_single_out, evaluate_view},
    CellSymbol, InOutMapping, SafePasser, SubnetBuilder, SubnetView, IN_PLACE_LINKS,
};
use veles_tt::TruthTable;

use crate::transform::SubnetTransform;

/// Which metric a refactor run must improve.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RefactorObjective {
    /// Cell count (`rf`, `rfz`, `rfa`).
    Size,
    /// Critical path (`rfd`).
    Depth,
    /// Total cell weight, as loaded by the activity estimator (`rfp`).
    Power,
}

/// The `rf` family: re-expresses each node's MFFC from its truth table and
/// commits improvements.
///
/// The cone is the MFFC inside a reconvergence cut; the resynthesizer is
/// Minato–Morreale SOP synthesis, or algebraic factoring for the
/// area-aware variant. Cones with more inputs than the bound are skipped.
pub struct Refactorer {
    name: String,
    cut_size: usize,
    zero_cost: bool,
    objective: RefactorObjective,
    use_factoring: bool,
}

impl Refactorer {
    /// The default `rf` pass.
    pub fn new() -> Self {
        Self::with_options("rf", 8, false, RefactorObjective::Size, false)
    }

    /// The zero-cost `rfz` flavor.
    pub fn zero_cost() -> Self {
        Self::with_options("rfz", 8, true, RefactorObjective::Size, false)
    }

    /// The area-aware `rfa` flavor (algebraic factoring).
    pub fn area() -> Self {
        Self::with_options("rfa", 8, false, RefactorObjective::Size, true)
    }

    /// The depth-aware `rfd` flavor.
    pub fn depth() -> Self {
        Self::with_options("rfd", 8, false, RefactorObjective::Depth, false)
    }

    /// The power-aware `rfp` flavor; run the activity estimator first so
    /// cell weights carry switching activity.
    pub fn power() -> Self {
        Self::with_options("rfp", 8, false, RefactorObjective::Power, false)
    }

    /// Fully parameterized construction.
    pub fn with_options(
        name: &str,
        cut_size: usize,
        zero_cost: bool,
        objective: RefactorObjective,
        use_factoring: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            cut_size,
            zero_cost,
            objective,
            use_factoring,
        }
    }

    fn accepts(&self, effect: &veles_subnet::Effect) -> bool {
        match self.objective {
            RefactorObjective::Size => {
                effect.size > 0 || (self.zero_cost && effect.size == 0)
            }
            RefactorObjective::Depth => effect.depth > 0,
            RefactorObjective::Power => effect.weight > 0.0,
        }
    }
}

/// The structural don't-care mask at a cone boundary: the image of the
/// primary inputs through the boundary functions. `None` when the design
/// is too wide to evaluate or the cone reaches non-combinational cells.
fn structural_care(builder: &SubnetBuilder, leaves: &[usize]) -> Option<TruthTable> {
    if builder.inputs().len() > 10 || leaves.len() > 16 {
        return None;
    }
    let view = SubnetView::new(InOutMapping::new(
        builder.inputs().to_vec(),
        leaves.to_vec(),
    ));
    for entry in view.cone(builder) {
        let symbol = builder.symbol(entry);
        let evaluable = symbol == CellSymbol::In
            || symbol.is_constant()
            || symbol.is_buf()
            || symbol.is_gate()
            || symbol == CellSymbol::Mux2;
        if !evaluable {
            return None;
        }
    }
    Some(veles_tt::compute_care(&evaluate_view(builder, &view)))
}

impl Default for Refactorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SubnetTransform for Refactorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, builder: &mut SubnetBuilder) {
        builder.enable_fanouts();
        let mut passer = SafePasser::new();
        let mut iterator = AreaSubnetIterator::new(self.cut_size);
        let mut accepted = 0usize;

        while let Some(fragment) = iterator.next(builder, &mut passer) {
            if fragment.subnet.internal_count() < 2 {
                continue;
            }
            if fragment.subnet.input_count() > 10 {
                continue;
            }
            let tt = evaluate_single_out(&fragment.subnet);
            let care = structural_care(builder, &fragment.io.inputs)
                .unwrap_or_else(|| TruthTable::ones(tt.num_vars()));
            let rhs = if self.use_factoring {
                FactorSynthesizer.synthesize(&tt, &care, IN_PLACE_LINKS)
            } else {
                MmSynthesizer.synthesize(&tt, &care, IN_PLACE_LINKS)
            };
            let Some(rhs) = rhs else {
                continue;
            };
            let effect = builder.evaluate_replace(&rhs, &fragment.io);
            if self.accepts(&effect) {
                builder.replace(&rhs, &fragment.io);
                builder.enable_fanouts();
                accepted += 1;
            }
        }
        tracing::debug!(pass = self.name.as_str(), accepted, "refactoring done");
    }
}
