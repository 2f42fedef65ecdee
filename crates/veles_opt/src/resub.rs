//! Resubstitution: re-express a pivot through existing divisors.

use crate::transform::SubnetTransform;
use std::collections::{HashMap, HashSet};
use veles_cut::{mffc_interior, reconvergence_view};
use veles_subnet::{
    CellSymbol, InOutMapping, Link, SafePasser, SubnetBuilder, SubnetView,
};
use veles_tt::TruthTable;

/// Branch variables admitted into the care computation.
const MAX_BRANCHES: usize = 8;

/// A divisor candidate: an existing entry, possibly inverted.
#[derive(Clone, Copy, Debug)]
struct Divisor {
    entry: usize,
    inv: bool,
}

/// The `rs` / `rsz` pass.
///
/// For each pivot: build the reconvergence cut, derive the observability
/// care set from the cut's transitive fanout (side inputs of the region
/// become free branch variables), split the pivot function into onset and
/// offset, classify nearby cells as positive-unate, negative-unate, or
/// binate divisors, and try constant, zero-, one-, two-, and
/// three-resubstitutions in that order. The first candidate whose size
/// gain passes the policy commits.
pub struct Resubstitutor {
    name: String,
    cut_size: usize,
    max_levels: usize,
    max_divisors: usize,
    zero_cost: bool,
}

impl Resubstitutor {
    /// The default `rs` pass with the given cut size.
    pub fn new(cut_size: usize) -> Self {
        Self::with_options(cut_size, 1, 150, false)
    }

    /// The zero-cost `rsz` flavor.
    pub fn zero_cost(cut_size: usize) -> Self {
        let mut pass = Self::with_options(cut_size, 1, 150, true);
        pass.name = "rsz".to_string();
        pass
    }

    /// Fully parameterized construction.
    pub fn with_options(
        cut_size: usize,
        max_levels: usize,
        max_divisors: usize,
        zero_cost: bool,
    ) -> Self {
        Self {
            name: "rs".to_string(),
            cut_size: cut_size.max(2),
            max_levels,
            max_divisors,
            zero_cost,
        }
    }

    fn accepts(&self, gain: i32) -> bool {
        gain > 0 || (self.zero_cost && gain == 0)
    }

    /// Builds the trivial rhs `out = divisor` over a single-input boundary
    /// and commits it when the gain passes.
    fn commit_wire(
        &self,
        builder: &mut SubnetBuilder,
        pivot: usize,
        divisor: Divisor,
    ) -> bool {
        let mut rhs = SubnetBuilder::new();
        let d = rhs.add_input();
        rhs.add_output(d.with_inv(divisor.inv));
        let rhs = rhs.make(false);
        let io = InOutMapping::new(vec![divisor.entry], vec![pivot]);
        let gain = builder.evaluate_replace(&rhs, &io).size;
        if self.accepts(gain) {
            builder.replace(&rhs, &io);
            builder.enable_fanouts();
            return true;
        }
        false
    }

    /// Builds `out = op(divisors...)` and commits it when the gain passes.
    fn commit_gate(
        &self,
        builder: &mut SubnetBuilder,
        pivot: usize,
        symbol: CellSymbol,
        divisors: &[Divisor],
        invert_out: bool,
    ) -> bool {
        let mut rhs = SubnetBuilder::new();
        let inputs: Vec<Link> = divisors
            .iter()
            .map(|d| {
                let link = rhs.add_input();
                link.with_inv(d.inv)
            })
            .collect();
        let gate = rhs.add_cell(symbol, &inputs);
        rhs.add_output(gate.with_inv(gate.is_inv() ^ invert_out));
        let rhs = rhs.make(false);
        let io = InOutMapping::new(
            divisors.iter().map(|d| d.entry).collect(),
            vec![pivot],
        );
        let gain = builder.evaluate_replace(&rhs, &io).size;
        if self.accepts(gain) {
            builder.replace(&rhs, &io);
            builder.enable_fanouts();
            return true;
        }
        false
    }
}

/// The observability context of one pivot.
struct CareContext {
    /// Cone cells between the cut and the pivot, pivot included.
    cone: HashSet<usize>,
    /// The transitive-fanout region the care computation observes.
    region: HashSet<usize>,
    /// Output roots of the region.
    roots: Vec<usize>,
}

/// Marks the transitive fanout of the cut up to `max_levels` beyond the
/// pivot's depth; reconvergence through this region is what creates
/// observability don't-cares.
fn mark_region(
    builder: &SubnetBuilder,
    view: &SubnetView,
    pivot: usize,
    max_levels: usize,
) -> HashSet<usize> {
    let limit = builder.depth(pivot) + max_levels;
    let mut region: HashSet<usize> = HashSet::new();
    region.insert(pivot);
    let mut stack: Vec<usize> = view.inputs().to_vec();
    let mut seen: HashSet<usize> = stack.iter().copied().collect();
    while let Some(at) = stack.pop() {
        for &fanout in builder.fanouts(at) {
            if seen.contains(&fanout) || builder.depth(fanout) > limit {
                continue;
            }
            seen.insert(fanout);
            region.insert(fanout);
            stack.push(fanout);
        }
    }
    region
}

/// Walks fanouts from the pivot inside the region; a cell with a consumer
/// outside the region (or an output cell) becomes a root.
fn collect_roots(builder: &SubnetBuilder, region: &HashSet<usize>, pivot: usize) -> Vec<usize> {
    let mut roots = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![pivot];
    seen.insert(pivot);
    while let Some(at) = stack.pop() {
        let fanouts = builder.fanouts(at);
        let escapes = builder.symbol(at) == CellSymbol::Out
            || fanouts.is_empty()
            || fanouts.iter().any(|f| !region.contains(f));
        if escapes {
            roots.push(at);
            continue;
        }
        for &fanout in fanouts {
            if seen.insert(fanout) {
                stack.push(fanout);
            }
        }
    }
    roots.sort_unstable();
    roots
}

/// Evaluates `root` over the cut variables with branch cells fixed to
/// constants and the pivot's table overridden.
#[allow(clippy::too_many_arguments)]
fn eval_with_branches(
    builder: &SubnetBuilder,
    root: usize,
    context: &CareContext,
    cone_tables: &HashMap<usize, TruthTable>,
    pivot: usize,
    pivot_table: &TruthTable,
    branches: &mut HashMap<usize, usize>,
    fill: u64,
    vars: u32,
    memo: &mut HashMap<usize, Option<TruthTable>>,
) -> Option<TruthTable> {
    if root == pivot {
        return Some(pivot_table.clone());
    }
    if let Some(table) = memo.get(&root) {
        return table.clone();
    }
    let result = (|| {
        if let Some(table) = cone_tables.get(&root) {
            if root != pivot {
                return Some(table.clone());
            }
        }
        let symbol = builder.symbol(root);
        if symbol == CellSymbol::Zero {
            return Some(TruthTable::zeros(vars));
        }
        if symbol == CellSymbol::One {
            return Some(TruthTable::ones(vars));
        }
        let in_scope = context.region.contains(&root) || context.cone.contains(&root);
        if !in_scope || symbol == CellSymbol::In {
            // A side input of the region: a free branch variable, fixed to
            // a constant for this round.
            let next_id = branches.len();
            let id = *branches.entry(root).or_insert(next_id);
            if id >= MAX_BRANCHES {
                return None;
            }
            return Some(if fill >> id & 1 == 1 {
                TruthTable::ones(vars)
            } else {
                TruthTable::zeros(vars)
            });
        }
        let mut fanins = Vec::new();
        for &link in builder.links_of(root) {
            let table = eval_with_branches(
                builder,
                link.idx(),
                context,
                cone_tables,
                pivot,
                pivot_table,
                branches,
                fill,
                vars,
                memo,
            )?;
            fanins.push(if link.is_inv() { !&table } else { table });
        }
        combine_gate(symbol, &fanins, vars)
    })();
    memo.insert(root, result.clone());
    result
}

fn combine_gate(symbol: CellSymbol, fanins: &[TruthTable], vars: u32) -> Option<TruthTable> {
    let table = match symbol {
        CellSymbol::Buf | CellSymbol::Not | CellSymbol::Out => fanins[0].clone(),
        CellSymbol::And | CellSymbol::Nand => {
            let mut tt = fanins[0].clone();
            for f in &fanins[1..] {
                tt = &tt & f;
            }
            if symbol == CellSymbol::Nand {
                !tt
            } else {
                tt
            }
        }
        CellSymbol::Or | CellSymbol::Nor => {
            let mut tt = fanins[0].clone();
            for f in &fanins[1..] {
                tt = &tt | f;
            }
            if symbol == CellSymbol::Nor {
                !tt
            } else {
                tt
            }
        }
        CellSymbol::Xor | CellSymbol::Xnor => {
            let mut tt = fanins[0].clone();
            for f in &fanins[1..] {
                tt = &tt ^ f;
            }
            if symbol == CellSymbol::Xnor {
                !tt
            } else {
                tt
            }
        }
        CellSymbol::Maj if fanins.len() == 3 => {
            TruthTable::maj3(&fanins[0], &fanins[1], &fanins[2])
        }
        _ => return None,
    };
    Some(table)
}

/// The care set: minterms where some root observes the pivot, computed by
/// evaluating every root with the pivot and its complement under all
/// branch fills.
fn compute_care(
    builder: &SubnetBuilder,
    context: &CareContext,
    cone_tables: &HashMap<usize, TruthTable>,
    pivot: usize,
    vars: u32,
) -> Option<TruthTable> {
    let pivot_tt = cone_tables.get(&pivot).expect("pivot evaluated").clone();
    let inverted = !&pivot_tt;

    // First pass discovers the branch set.
    let mut branches: HashMap<usize, usize> = HashMap::new();
    {
        let mut memo = HashMap::new();
        for &root in &context.roots {
            eval_with_branches(
                builder, root, context, cone_tables, pivot, &pivot_tt, &mut branches, 0,
                vars, &mut memo,
            )?;
        }
    }
    if branches.len() > MAX_BRANCHES {
        return None;
    }

    let rounds = 1u64 << branches.len();
    let mut care = TruthTable::zeros(vars);
    for fill in 0..rounds {
        let mut straight = HashMap::new();
        let mut toggled = HashMap::new();
        for &root in &context.roots {
            let normal = eval_with_branches(
                builder, root, context, cone_tables, pivot, &pivot_tt, &mut branches, fill,
                vars, &mut straight,
            )?;
            let flipped = eval_with_branches(
                builder, root, context, cone_tables, pivot, &inverted, &mut branches, fill,
                vars, &mut toggled,
            )?;
            care = &care | &(&normal ^ &flipped);
        }
        if care.is_ones() {
            break;
        }
    }
    Some(care)
}

/// Collects divisor candidates with their functions over the cut
/// variables: the cut leaves, cone cells outside the pivot's MFFC, and
/// side cells whose fanins are already evaluated.
fn collect_divisors(
    builder: &SubnetBuilder,
    view: &SubnetView,
    cone_tables: &HashMap<usize, TruthTable>,
    mffc: &HashSet<usize>,
    pivot: usize,
    max_divisors: usize,
) -> Vec<(usize, TruthTable)> {
    let mut divisors: Vec<(usize, TruthTable)> = Vec::new();
    let mut known: HashMap<usize, TruthTable> = cone_tables.clone();
    let mut listed: HashSet<usize> = HashSet::new();

    // Inner divisors in cone order, so runs are reproducible.
    for entry in view.cone(builder) {
        if entry != pivot && !mffc.contains(&entry) && listed.insert(entry) {
            divisors.push((entry, cone_tables[&entry].clone()));
        }
    }

    // Side divisors: fanouts of known cells computable from known tables.
    // Every divisor must precede the pivot in the topological order — the
    // replacement gate is spliced in before the pivot and may only
    // reference earlier entries (this also rules out anything depending
    // on the pivot).
    let depth_limit = builder.depth(pivot);
    let mut frontier: Vec<usize> = view.inputs().to_vec();
    let mut visited: HashSet<usize> = known.keys().copied().collect();
    while let Some(at) = frontier.pop() {
        if divisors.len() >= max_divisors {
            break;
        }
        for &fanout in builder.fanouts(at) {
            if visited.contains(&fanout)
                || mffc.contains(&fanout)
                || fanout == pivot
                || !builder.precedes(fanout, pivot)
                || builder.depth(fanout) > depth_limit
                || !builder.symbol(fanout).is_gate()
            {
                continue;
            }
            let fanins: Option<Vec<TruthTable>> = builder
                .links_of(fanout)
                .iter()
                .map(|l| {
                    known.get(&l.idx()).map(|t| if l.is_inv() { !t } else { t.clone() })
                })
                .collect();
            let Some(fanins) = fanins else {
                continue;
            };
            let Some(table) =
                combine_gate(builder.symbol(fanout), &fanins, view.input_count() as u32)
            else {
                continue;
            };
            visited.insert(fanout);
            known.insert(fanout, table.clone());
            if listed.insert(fanout) {
                divisors.push((fanout, table));
            }
            frontier.push(fanout);
            if divisors.len() >= max_divisors {
                break;
            }
        }
    }
    divisors
}

impl SubnetTransform for Resubstitutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, builder: &mut SubnetBuilder) {
        builder.enable_fanouts();
        let mut passer = SafePasser::new();
        let mut accepted = 0usize;

        while let Some(pivot) = passer.next(builder) {
            let symbol = builder.symbol(pivot);
            if symbol == CellSymbol::Out {
                break;
            }
            if !symbol.is_gate() {
                continue;
            }

            let view = reconvergence_view(builder, pivot, self.cut_size);
            let vars = view.input_count() as u32;
            if vars < 2 {
                continue;
            }

            // Cone functions over the cut variables, in topological order.
            let cone_order = view.cone(builder);
            let cone: HashSet<usize> = cone_order.iter().copied().collect();
            let mut cone_tables: HashMap<usize, TruthTable> = HashMap::new();
            for (i, &input) in view.inputs().iter().enumerate() {
                cone_tables.insert(input, TruthTable::nth_var(vars, i as u32));
            }
            for &entry in &cone_order {
                if cone_tables.contains_key(&entry) {
                    continue;
                }
                let fanins: Vec<TruthTable> = builder
                    .links_of(entry)
                    .iter()
                    .map(|l| {
                        let t = &cone_tables[&l.idx()];
                        if l.is_inv() {
                            !t
                        } else {
                            t.clone()
                        }
                    })
                    .collect();
                let Some(table) = combine_gate(builder.symbol(entry), &fanins, vars) else {
                    break;
                };
                cone_tables.insert(entry, table);
            }
            if !cone_tables.contains_key(&pivot) {
                continue;
            }

            // Observability: region, roots, care.
            let region = mark_region(builder, &view, pivot, self.max_levels);
            let roots = collect_roots(builder, &region, pivot);
            let context = CareContext {
                cone: cone.clone(),
                region,
                roots,
            };
            let reconverges = !(context.roots.len() == 1 && context.roots[0] == pivot);
            let care = if reconverges {
                compute_care(builder, &context, &cone_tables, pivot, vars)
                    .unwrap_or_else(|| TruthTable::ones(vars))
            } else {
                TruthTable::ones(vars)
            };
            if care.is_zero() {
                continue;
            }

            let pivot_tt = cone_tables[&pivot].clone();
            let onset = &pivot_tt & &care;
            let offset = &!&pivot_tt & &care;

            // Constants first.
            if onset.is_zero() {
                let mut rhs = SubnetBuilder::new();
                for _ in 0..vars {
                    rhs.add_input();
                }
                let z = rhs.add_cell(CellSymbol::Zero, &[]);
                rhs.add_output(z);
                let rhs = rhs.make(false);
                let io = InOutMapping::new(view.inputs().to_vec(), vec![pivot]);
                if self.accepts(builder.evaluate_replace(&rhs, &io).size) {
                    builder.replace(&rhs, &io);
                    builder.enable_fanouts();
                    accepted += 1;
                }
                continue;
            }
            if offset.is_zero() {
                let mut rhs = SubnetBuilder::new();
                for _ in 0..vars {
                    rhs.add_input();
                }
                let one = rhs.add_cell(CellSymbol::One, &[]);
                rhs.add_output(one);
                let rhs = rhs.make(false);
                let io = InOutMapping::new(view.inputs().to_vec(), vec![pivot]);
                if self.accepts(builder.evaluate_replace(&rhs, &io).size) {
                    builder.replace(&rhs, &io);
                    builder.enable_fanouts();
                    accepted += 1;
                }
                continue;
            }

            let mffc: HashSet<usize> =
                mffc_interior(builder, pivot, view.inputs()).into_iter().collect();
            let divisors =
                collect_divisors(builder, &view, &cone_tables, &mffc, pivot, self.max_divisors);

            // Classify: positive-unate never covers the offset, negative-
            // unate covers the whole onset; a polarity matching both sides
            // is the pivot itself under care.
            let mut zero_resub: Option<Divisor> = None;
            let mut pos_unate: Vec<(Divisor, TruthTable)> = Vec::new();
            let mut neg_unate: Vec<(Divisor, TruthTable)> = Vec::new();
            let mut binate: Vec<(Divisor, TruthTable)> = Vec::new();
            'classify: for (entry, table) in &divisors {
                for inv in [false, true] {
                    let candidate = if inv { !table } else { table.clone() };
                    let divisor = Divisor {
                        entry: *entry,
                        inv,
                    };
                    let positive = (&candidate & &offset).is_zero();
                    let negative = (&!&candidate & &onset).is_zero();
                    match (positive, negative) {
                        (true, true) => {
                            zero_resub = Some(divisor);
                            break 'classify;
                        }
                        (true, false) => pos_unate.push((divisor, candidate)),
                        (false, true) => neg_unate.push((divisor, candidate)),
                        (false, false) => {
                            if !inv {
                                binate.push((divisor, candidate));
                            }
                        }
                    }
                }
            }

            // Zero- and one-resubstitution: an (inverted) divisor equal to
            // the pivot under care.
            if let Some(divisor) = zero_resub {
                if self.commit_wire(builder, pivot, divisor) {
                    accepted += 1;
                    continue;
                }
            }

            let mffc_size = mffc.len();
            if mffc_size <= 1 {
                // Rebuilding for a single-cell gain is not worth it.
                continue;
            }

            // Two-resubstitution.
            let mut committed = false;
            let pair_limit = 40.min(pos_unate.len());
            'two_or: for i in 0..pair_limit {
                for j in i + 1..pair_limit {
                    let or = &pos_unate[i].1 | &pos_unate[j].1;
                    if (&!&or & &onset).is_zero() {
                        let pair = [pos_unate[i].0, pos_unate[j].0];
                        if self.commit_gate(builder, pivot, CellSymbol::Or, &pair, false) {
                            committed = true;
                            break 'two_or;
                        }
                    }
                }
            }
            if committed {
                accepted += 1;
                continue;
            }
            let pair_limit = 40.min(neg_unate.len());
            'two_and: for i in 0..pair_limit {
                for j in i + 1..pair_limit {
                    let and = &neg_unate[i].1 & &neg_unate[j].1;
                    if (&and & &offset).is_zero() {
                        let pair = [neg_unate[i].0, neg_unate[j].0];
                        if self.commit_gate(builder, pivot, CellSymbol::And, &pair, false) {
                            committed = true;
                            break 'two_and;
                        }
                    }
                }
            }
            if committed {
                accepted += 1;
                continue;
            }
            let pair_limit = 40.min(binate.len());
            'two_xor: for i in 0..pair_limit {
                for j in i + 1..pair_limit {
                    let xor = &binate[i].1 ^ &binate[j].1;
                    for inv in [false, true] {
                        let candidate = if inv { !&xor } else { xor.clone() };
                        if (&candidate & &offset).is_zero()
                            && (&!&candidate & &onset).is_zero()
                        {
                            let pair = [binate[i].0, binate[j].0];
                            if self.commit_gate(builder, pivot, CellSymbol::Xor, &pair, inv) {
                                committed = true;
                                break 'two_xor;
                            }
                        }
                    }
                }
            }
            if committed {
                accepted += 1;
                continue;
            }

            if mffc_size <= 2 {
                continue;
            }

            // Three-resubstitution over the unate pools.
            let triple_limit = 16.min(pos_unate.len());
            'three_or: for i in 0..triple_limit {
                for j in i + 1..triple_limit {
                    for k in j + 1..triple_limit {
                        let or = &(&pos_unate[i].1 | &pos_unate[j].1) | &pos_unate[k].1;
                        if (&!&or & &onset).is_zero() {
                            let triple =
                                [pos_unate[i].0, pos_unate[j].0, pos_unate[k].0];
                            if self.commit_gate(builder, pivot, CellSymbol::Or, &triple, false)
                            {
                                committed = true;
                                break 'three_or;
                            }
                        }
                    }
                }
            }
            if committed {
                accepted += 1;
                continue;
            }
            let triple_limit = 16.min(neg_unate.len());
            'three_and: for i in 0..triple_limit {
                for j in i + 1..triple_limit {
                    for k in j + 1..triple_limit {
                        let and = &(&neg_unate[i].1 & &neg_unate[j].1) & &neg_unate[k].1;
                        if (&and & &offset).is_zero() {
                            let triple =
                                [neg_unate[i].0, neg_unate[j].0, neg_unate[k].0];
                            if self.commit_gate(builder, pivot, CellSymbol::And, &triple, false)
                            {
                                committed = true;
                                break 'three_and;
                            }
                        }
                    }
                }
            }
            if committed {
                accepted += 1;
            }
        }
        tracing::debug!(pass = self.name.as_str(), accepted, "resubstitution done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::eval::{evaluate, evaluate_single_out};

    #[test]
    fn redundant_pivot_redirects_to_divisor() {
        // g = a & b is computed twice through different structure; the
        // duplicate pivot resubstitutes onto the surviving divisor.
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let c = builder.add_input();
        let g = builder.add_cell(CellSymbol::And, &[a, b]);
        let keep = builder.add_cell(CellSymbol::Or, &[g, c]);
        // pivot = ~(~a | ~b) & c, computing (a & b) & c without sharing g.
        let na = builder.add_cell(CellSymbol::Or, &[!a, !b]);
        let pivot = builder.add_cell(CellSymbol::And, &[!na, c]);
        builder.add_output(keep);
        builder.add_output(pivot);
        let reference = evaluate(&builder.make(true));
        let before = builder.live_internal_count();

        Resubstitutor::new(8).transform(&mut builder);

        assert!(builder.live_internal_count() <= before);
        assert_eq!(evaluate(&builder.make(true)), reference);
    }

    #[test]
    fn constant_pivot_collapses() {
        // pivot = (a & b) & (a & ~b) == 0 spelled without sharing.
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let t1 = builder.add_cell(CellSymbol::And, &[a, b]);
        let t2 = builder.add_cell(CellSymbol::And, &[a, !b]);
        let pivot = builder.add_cell(CellSymbol::And, &[t1, t2]);
        builder.add_output(pivot);
        let before = builder.live_internal_count();

        Resubstitutor::new(8).transform(&mut builder);

        let subnet = builder.make(true);
        assert!(subnet.internal_count() < before);
        assert!(evaluate_single_out(&subnet).is_zero());
    }

    #[test]
    fn two_resubstitution_reuses_existing_gates() {
        // f = (a & b) | (c & d) is rebuilt from scratch next to existing
        // AND divisors; resub must reuse them and drop the rebuilt cone.
        let mut builder = SubnetBuilder::new();
        let ins = builder.add_inputs(4);
        let ab = builder.add_cell(CellSymbol::And, &[ins[0], ins[1]]);
        let cd = builder.add_cell(CellSymbol::And, &[ins[2], ins[3]]);
        let keep1 = builder.add_cell(CellSymbol::Xor, &[ab, ins[2]]);
        let keep2 = builder.add_cell(CellSymbol::Xor, &[cd, ins[0]]);
        // The pivot computes the same OR through fresh structure.
        let nab = builder.add_cell(CellSymbol::Or, &[!ins[0], !ins[1]]);
        let ncd = builder.add_cell(CellSymbol::Or, &[!ins[2], !ins[3]]);
        let pivot = builder.add_cell(CellSymbol::Or, &[!nab, !ncd]);
        builder.add_output(keep1);
        builder.add_output(keep2);
        builder.add_output(pivot);
        let reference = evaluate(&builder.make(true));
        let before = builder.live_internal_count();

        Resubstitutor::new(8).transform(&mut builder);

        assert!(builder.live_internal_count() <= before);
        assert_eq!(evaluate(&builder.make(true)), reference);
    }

    #[test]
    fn function_preserved_across_random_network() {
        let mut builder = SubnetBuilder::new();
        let ins = builder.add_inputs(5);
        let n1 = builder.add_cell(CellSymbol::And, &[ins[0], ins[1]]);
        let n2 = builder.add_cell(CellSymbol::Or, &[n1, ins[2]]);
        let n3 = builder.add_cell(CellSymbol::Xor, &[n2, ins[3]]);
        let n4 = builder.add_cell(CellSymbol::And, &[n3, ins[4]]);
        let n5 = builder.add_cell(CellSymbol::Or, &[n4, n1]);
        builder.add_output(n5);
        builder.add_output(n3);
        let reference = evaluate(&builder.make(true));

        Resubstitutor::new(6).transform(&mut builder);
        Resubstitutor::zero_cost(8).transform(&mut builder);

        assert_eq!(evaluate(&builder.make(true)), reference);
    }
}
