//! Replacement policies: when does a candidate rewrite commit.

use veles_subnet::{Effect, Subnet, SubnetBuilder, SubnetFragment};

/// Decides whether a candidate replacement for a fragment commits.
pub trait Replacer {
    /// Evaluates `rhs` against the fragment and commits it when the policy
    /// accepts. Returns `true` when the builder was mutated.
    fn replace(
        &self,
        builder: &mut SubnetBuilder,
        fragment: &SubnetFragment,
        rhs: &Subnet,
    ) -> bool;
}

/// Area policy: accept when the size does not grow, or when the growth
/// stays within a slack percentage of the fragment size.
pub struct AreaReplacer {
    /// Acceptable size deterioration, in percent of the fragment size.
    pub delta: f64,
}

impl AreaReplacer {
    /// A strict replacer (no deterioration allowed).
    pub fn strict() -> Self {
        Self { delta: 0.0 }
    }
}

impl Replacer for AreaReplacer {
    fn replace(
        &self,
        builder: &mut SubnetBuilder,
        fragment: &SubnetFragment,
        rhs: &Subnet,
    ) -> bool {
        let gain = builder.evaluate_replace(rhs, &fragment.io).size;
        if gain < 0 {
            let fragment_size = fragment.subnet.internal_count().max(1) as f64;
            if f64::from(-gain) / fragment_size * 100.0 > self.delta {
                return false;
            }
        }
        builder.replace(rhs, &fragment.io);
        true
    }
}

/// Depth policy: accept only replacements that strictly lower the
/// builder's critical path through the fragment.
pub struct DepthReplacer;

impl Replacer for DepthReplacer {
    fn replace(
        &self,
        builder: &mut SubnetBuilder,
        fragment: &SubnetFragment,
        rhs: &Subnet,
    ) -> bool {
        let effect = builder.evaluate_replace(rhs, &fragment.io);
        if effect.depth <= 0 {
            return false;
        }
        builder.replace(rhs, &fragment.io);
        true
    }
}

/// The default rewriter policy: accept when the weighed gain is positive,
/// or zero when zero-cost moves are admitted.
pub struct GainReplacer {
    weight: fn(&Effect) -> f32,
    zero_cost: bool,
}

impl GainReplacer {
    /// A size-gain policy.
    pub fn new(zero_cost: bool) -> Self {
        Self {
            weight: |effect| effect.size as f32,
            zero_cost,
        }
    }

    /// A policy with a custom weight function over the effect.
    pub fn with_weight(weight: fn(&Effect) -> f32, zero_cost: bool) -> Self {
        Self { weight, zero_cost }
    }
}

impl Replacer for GainReplacer {
    fn replace(
        &self,
        builder: &mut SubnetBuilder,
        fragment: &SubnetFragment,
        rhs: &Subnet,
    ) -> bool {
        let effect = builder.evaluate_replace(rhs, &fragment.io);
        let gain = (self.weight)(&effect);
        if gain > 0.0 || (self.zero_cost && gain == 0.0) {
            builder.replace(rhs, &fragment.io);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::{CellSymbol, InOutMapping};

    /// out = (a & b) | (a & ~b); fragment = the whole two-level cone.
    fn redundant_cone() -> (SubnetBuilder, SubnetFragment) {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let t1 = builder.add_cell(CellSymbol::And, &[a, b]);
        let t2 = builder.add_cell(CellSymbol::And, &[a, !b]);
        let root = builder.add_cell(CellSymbol::Or, &[t1, t2]);
        builder.add_output(root);

        let view = veles_subnet::SubnetView::new(InOutMapping::new(
            vec![a.idx(), b.idx()],
            vec![root.idx()],
        ));
        let fragment = view.extract(&builder);
        (builder, fragment)
    }

    /// rhs: out = a (the simplified cone).
    fn wire_rhs() -> Subnet {
        let mut rhs = SubnetBuilder::new();
        let a = rhs.add_input();
        rhs.add_input();
        rhs.add_output(a);
        rhs.make(false)
    }

    /// rhs: an equivalent cone one cell larger than the fragment.
    fn bloated_rhs() -> Subnet {
        let mut rhs = SubnetBuilder::new();
        let a = rhs.add_input();
        let b = rhs.add_input();
        let m1 = rhs.add_cell(CellSymbol::Mux2, &[b, a, a]);
        let m2 = rhs.add_cell(CellSymbol::Mux2, &[b, m1, m1]);
        let m3 = rhs.add_cell(CellSymbol::Mux2, &[b, m2, m2]);
        let and = rhs.add_cell(CellSymbol::And, &[m3, a]);
        rhs.add_output(and);
        rhs.make(false)
    }

    #[test]
    fn area_replacer_accepts_shrinking_rewrite() {
        let (mut builder, fragment) = redundant_cone();
        assert!(AreaReplacer::strict().replace(&mut builder, &fragment, &wire_rhs()));
        assert_eq!(builder.live_internal_count(), 0);
    }

    #[test]
    fn area_replacer_rejects_growth_without_slack() {
        let (mut builder, fragment) = redundant_cone();
        let before = builder.live_internal_count();
        assert!(!AreaReplacer::strict().replace(&mut builder, &fragment, &bloated_rhs()));
        assert_eq!(builder.live_internal_count(), before, "builder untouched");
    }

    #[test]
    fn gain_replacer_zero_cost_flag() {
        let (mut builder, fragment) = redundant_cone();
        // Replacing the cone by an equal-size equivalent: gain 0.
        let rhs = fragment.subnet.clone();
        assert!(!GainReplacer::new(false).replace(&mut builder, &fragment, &rhs));
        assert!(GainReplacer::new(true).replace(&mut builder, &fragment, &rhs));
    }

    #[test]
    fn depth_replacer_needs_strict_improvement() {
        let (mut builder, fragment) = redundant_cone();
        let rhs = fragment.subnet.clone();
        assert!(
            !DepthReplacer.replace(&mut builder, &fragment, &rhs),
            "same depth must be rejected"
        );
        assert!(
            DepthReplacer.replace(&mut builder, &fragment, &wire_rhs()),
            "a wire removes the whole path"
        );
    }

    #[test]
    fn area_slack_admits_bounded_growth() {
        let (mut builder, fragment) = redundant_cone();
        let generous = AreaReplacer { delta: 100.0 };
        assert!(generous.replace(&mut builder, &fragment, &bloated_rhs()));
    }
}
