//! Dynamic-programming technology mapping over k-feasible cuts.

use crate::liberty::{CellMatch, Library};
use std::collections::HashMap;
use veles_common::{CostVector, Criterion, Indicator};
use veles_cut::CutExtractor;
use veles_resyn::{MmSynthesizer, Synthesizer};
use veles_subnet::{
    eval::evaluate_view, CellSymbol, CellType, CellTypeAttrs, CellTypeDb, CellTypeId,
    InOutMapping, Link, SubnetBuilder, SubnetView,
};
use veles_tt::TruthTable;

/// Nominal input transition assumed at every cell boundary.
const NOMINAL_TRANSITION: f32 = 0.05;
/// Nominal output load assumed for delay lookups.
const NOMINAL_LOAD: f32 = 1.0;

/// Errors surfaced by a mapping run.
#[derive(Debug, thiserror::Error)]
pub enum TechmapError {
    /// No library cell implements some cone and no recovery was possible.
    #[error("entry {0} has no feasible library realization")]
    Unmappable(usize),
    /// A wiring required an inverter but the library has none.
    #[error("library provides no inverter cell")]
    NoInverter,
}

/// Aggregate characteristics of a mapped subnet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TechmapStats {
    /// Summed cell area.
    pub area: f32,
    /// Worst output arrival time.
    pub delay: f32,
    /// Summed leakage power.
    pub power: f32,
}

/// The best partial solution of one entry.
#[derive(Clone)]
struct Solution {
    leaves: Vec<usize>,
    matched: CellMatch,
    cost: CostVector,
}

/// DP-based subnet mapper against a liberty library.
///
/// For each cell in topological order the mapper scans its cuts, combines
/// the fanin solutions with a flow aggregator (area and power flow divided
/// by fanout, arrival as a max), adds each candidate cell's own cost from
/// the NLDM tables, checks the criterion, and keeps the objective-best
/// solution. The cover is recovered by backtracking from the outputs.
pub struct TechMapper<'a> {
    library: &'a Library,
    criterion: Criterion,
    k: usize,
}

impl<'a> TechMapper<'a> {
    /// A mapper minimizing `objective` with cut bound 4.
    pub fn new(library: &'a Library, objective: Indicator) -> Self {
        Self {
            library,
            criterion: Criterion::minimize(objective),
            k: 4,
        }
    }

    /// A mapper with a full criterion.
    pub fn with_criterion(library: &'a Library, criterion: Criterion) -> Self {
        Self {
            library,
            criterion,
            k: 4,
        }
    }

    /// The candidate's own cost, inverters the wiring needs included.
    fn cell_cost(&self, matched: &CellMatch) -> Option<CostVector> {
        let cell = &self.library.cells[matched.cell];
        let inverters = matched
            .wiring
            .iter()
            .filter(|(_, inverted)| *inverted)
            .count()
            + matched.output_inverted as usize;
        let mut cost = CostVector {
            size: 1.0 + inverters as f32,
            depth: 1.0 + matched.output_inverted as u8 as f32,
            area: cell.area,
            delay: cell.delay(NOMINAL_TRANSITION, NOMINAL_LOAD),
            power: cell.leakage_power,
        };
        if inverters > 0 {
            let inverter = &self.library.cells[self.library.inverter()?];
            cost.area += inverters as f32 * inverter.area;
            cost.power += inverters as f32 * inverter.leakage_power;
            cost.delay += inverter.delay(NOMINAL_TRANSITION, NOMINAL_LOAD);
        }
        Some(cost)
    }

    /// Area/power flow over the leaf solutions plus arrival-time maximum.
    fn flow_cost(space: &HashMap<usize, Solution>, builder: &SubnetBuilder, leaves: &[usize]) -> CostVector {
        let mut flow = CostVector::default();
        for &leaf in leaves {
            let leaf_cost = space
                .get(&leaf)
                .map(|s| s.cost)
                .unwrap_or_default();
            let fanout = builder.refcount(leaf).max(1) as f32;
            flow.size += leaf_cost.size / fanout;
            flow.area += leaf_cost.area / fanout;
            flow.power += leaf_cost.power / fanout;
            flow.depth = flow.depth.max(leaf_cost.depth);
            flow.delay = flow.delay.max(leaf_cost.delay);
        }
        flow
    }

    /// Maps the builder, registering the library cells it instantiates in
    /// `db`, and returns the mapped builder with its characteristics.
    pub fn map(
        &self,
        builder: &SubnetBuilder,
        db: &mut CellTypeDb,
    ) -> Result<(SubnetBuilder, TechmapStats), TechmapError> {
        let extractor = CutExtractor::new(builder, self.k);
        let mut space: HashMap<usize, Solution> = HashMap::new();

        for entry in builder.iter_order() {
            let symbol = builder.symbol(entry);
            if symbol == CellSymbol::In || symbol == CellSymbol::Out || symbol.is_constant() {
                continue;
            }

            let mut best: Option<Solution> = None;
            for cut in extractor.cuts(entry) {
                if cut.is_trivial() {
                    continue;
                }
                let view = SubnetView::new(InOutMapping::new(
                    cut.leaves.clone(),
                    vec![entry],
                ));
                let function = evaluate_view(builder, &view).pop().expect("one root");
                let flow = Self::flow_cost(&space, builder, &cut.leaves);
                if !self.criterion.check(&flow) {
                    continue;
                }
                for matched in self.library.matches(&function) {
                    let Some(own) = self.cell_cost(&matched) else {
                        continue;
                    };
                    let cost = CostVector {
                        size: flow.size + own.size,
                        depth: flow.depth + own.depth,
                        area: flow.area + own.area,
                        delay: flow.delay + own.delay,
                        power: flow.power + own.power,
                    };
                    if !self.criterion.check(&cost) {
                        continue;
                    }
                    let better = match &best {
                        Some(current) => self.criterion.better(&cost, &current.cost),
                        None => true,
                    };
                    if better {
                        best = Some(Solution {
                            leaves: cut.leaves.clone(),
                            matched,
                            cost,
                        });
                    }
                }
            }
            let Some(solution) = best else {
                return Err(TechmapError::Unmappable(entry));
            };
            space.insert(entry, solution);
        }
        tracing::debug!(covered = space.len(), "cut covering complete");

        self.recover(builder, db, &space)
    }

    /// Rebuilds the mapped netlist by backtracking the chosen covers from
    /// the outputs.
    fn recover(
        &self,
        builder: &SubnetBuilder,
        db: &mut CellTypeDb,
        space: &HashMap<usize, Solution>,
    ) -> Result<(SubnetBuilder, TechmapStats), TechmapError> {
        let mut mapped = SubnetBuilder::new();
        mapped.set_tech_mapped(true);
        let mut wires: HashMap<usize, Link> = HashMap::new();
        let mut stats = TechmapStats::default();

        for &input in builder.inputs() {
            wires.insert(input, mapped.add_input());
        }

        let outputs: Vec<(Link, usize)> = builder
            .outputs()
            .iter()
            .map(|&out| (builder.links_of(out)[0], out))
            .collect();
        for (driver, _) in &outputs {
            self.emit(builder, db, space, &mut mapped, &mut wires, &mut stats, driver.idx())?;
        }

        let mut arrivals: Vec<f32> = Vec::new();
        for (driver, _) in &outputs {
            let mut link = wires[&driver.idx()];
            if driver.is_inv() {
                link = self.invert(db, &mut mapped, &mut stats, link)?;
            }
            mapped.add_output(link);
            arrivals.push(
                space
                    .get(&driver.idx())
                    .map(|s| s.cost.delay)
                    .unwrap_or(0.0),
            );
        }
        stats.delay = arrivals.into_iter().fold(0.0, f32::max);
        Ok((mapped, stats))
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        builder: &SubnetBuilder,
        db: &mut CellTypeDb,
        space: &HashMap<usize, Solution>,
        mapped: &mut SubnetBuilder,
        wires: &mut HashMap<usize, Link>,
        stats: &mut TechmapStats,
        entry: usize,
    ) -> Result<Link, TechmapError> {
        if let Some(&link) = wires.get(&entry) {
            return Ok(link);
        }
        let symbol = builder.symbol(entry);
        if symbol.is_constant() {
            let link = mapped.add_cell(symbol, &[]);
            wires.insert(entry, link);
            return Ok(link);
        }
        let solution = space
            .get(&entry)
            .ok_or(TechmapError::Unmappable(entry))?;

        let mut leaf_links = Vec::with_capacity(solution.leaves.len());
        for &leaf in &solution.leaves {
            leaf_links.push(self.emit(builder, db, space, mapped, wires, stats, leaf)?);
        }

        let cell = &self.library.cells[solution.matched.cell];
        let mut pin_links = Vec::with_capacity(solution.matched.wiring.len());
        for &(leaf_pos, inverted) in &solution.matched.wiring {
            let mut link = leaf_links[leaf_pos];
            if inverted {
                link = self.invert(db, mapped, stats, link)?;
            }
            pin_links.push(link);
        }

        let type_id = self.register(db, solution.matched.cell);
        let mut link = mapped.add_typed_cell(CellSymbol::Undef, type_id, &pin_links);
        stats.area += cell.area;
        stats.power += cell.leakage_power;
        if solution.matched.output_inverted {
            link = self.invert(db, mapped, stats, link)?;
        }
        wires.insert(entry, link);
        Ok(link)
    }

    /// Inserts a library inverter; a mapped netlist carries no free
    /// polarity on links.
    fn invert(
        &self,
        db: &mut CellTypeDb,
        mapped: &mut SubnetBuilder,
        stats: &mut TechmapStats,
        link: Link,
    ) -> Result<Link, TechmapError> {
        let inverter = self.library.inverter().ok_or(TechmapError::NoInverter)?;
        let cell = &self.library.cells[inverter];
        let type_id = self.register(db, inverter);
        stats.area += cell.area;
        stats.power += cell.leakage_power;
        Ok(mapped.add_typed_cell(CellSymbol::Undef, type_id, &[link]))
    }

    /// Registers the library cell as a cell type, synthesizing an
    /// implementation subnet so the unmapper can inline it later.
    fn register(&self, db: &mut CellTypeDb, cell_index: usize) -> CellTypeId {
        let cell = &self.library.cells[cell_index];
        if let Some(existing) = db.lookup(&cell.name) {
            return existing;
        }
        let implementation = MmSynthesizer
            .synthesize(
                &cell.function,
                &TruthTable::ones(cell.function.num_vars()),
                veles_subnet::IN_PLACE_LINKS,
            )
            .expect("ISOP synthesis is total");
        db.register(CellType {
            name: cell.name.clone(),
            symbol: CellSymbol::Undef,
            n_inputs: cell.inputs.len() as u16,
            n_outputs: 1,
            in_widths: vec![],
            implementation: Some(implementation),
            attrs: CellTypeAttrs {
                area: cell.area,
                delay: cell.delay(NOMINAL_TRANSITION, NOMINAL_LOAD),
                power: cell.leakage_power,
                is_cell: true,
                ..Default::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liberty::parse_liberty;
    use crate::unmap::unmap;
    use veles_subnet::eval::{evaluate, evaluate_single_out};

    fn sample_library() -> Library {
        parse_liberty(crate::liberty::SAMPLE_LIB).unwrap()
    }

    fn and_xor_builder() -> SubnetBuilder {
        let mut builder = SubnetBuilder::new();
        let ins = builder.add_inputs(3);
        let ab = builder.add_cell(CellSymbol::And, &[ins[0], ins[1]]);
        let root = builder.add_cell(CellSymbol::Or, &[ab, ins[2]]);
        builder.add_output(root);
        builder
    }

    #[test]
    fn mapping_preserves_function_through_unmap() {
        let library = sample_library();
        let builder = and_xor_builder();
        let reference = evaluate_single_out(&builder.make(true));

        let mut db = CellTypeDb::new();
        let mapper = TechMapper::new(&library, Indicator::Area);
        let (mapped, stats) = mapper.map(&builder, &mut db).unwrap();
        assert!(mapped.is_tech_mapped());
        assert!(stats.area > 0.0);

        // Every internal cell is a library cell; no free inverters.
        let frozen = mapped.make(true);
        for (idx, cell) in frozen.iter() {
            match cell.symbol {
                CellSymbol::In | CellSymbol::Out => {}
                CellSymbol::Undef => assert!(cell.type_id.is_some()),
                other => panic!("non-library cell {other:?} at {idx}"),
            }
            for link in frozen.links_of(idx) {
                assert!(!link.is_inv(), "mapped netlists carry no free inverters");
            }
        }

        let unmapped = unmap(&mapped, &db);
        assert_eq!(evaluate_single_out(&unmapped.make(true)), reference);
    }

    #[test]
    fn delay_objective_also_maps() {
        let library = sample_library();
        let builder = and_xor_builder();
        let mut db = CellTypeDb::new();
        let mapper = TechMapper::new(&library, Indicator::Delay);
        let (mapped, stats) = mapper.map(&builder, &mut db).unwrap();
        assert!(stats.delay > 0.0);
        assert!(mapped.is_tech_mapped());
    }

    #[test]
    fn multi_output_mapping() {
        let library = sample_library();
        let mut builder = SubnetBuilder::new();
        let ins = builder.add_inputs(2);
        let and = builder.add_cell(CellSymbol::And, &[ins[0], ins[1]]);
        let or = builder.add_cell(CellSymbol::Or, &[ins[0], ins[1]]);
        builder.add_output(and);
        builder.add_output(or);
        let reference = evaluate(&builder.make(true));

        let mut db = CellTypeDb::new();
        let (mapped, _) = TechMapper::new(&library, Indicator::Area)
            .map(&builder, &mut db)
            .unwrap();
        let unmapped = unmap(&mapped, &db);
        assert_eq!(evaluate(&unmapped.make(true)), reference);
    }

    #[test]
    fn inverted_output_gets_an_inverter() {
        let library = sample_library();
        let mut builder = SubnetBuilder::new();
        let ins = builder.add_inputs(2);
        let nand = builder.add_cell(CellSymbol::Nand, &[ins[0], ins[1]]);
        builder.add_output(nand);
        let reference = evaluate_single_out(&builder.make(true));

        let mut db = CellTypeDb::new();
        let (mapped, _) = TechMapper::new(&library, Indicator::Area)
            .map(&builder, &mut db)
            .unwrap();
        let unmapped = unmap(&mapped, &db);
        assert_eq!(evaluate_single_out(&unmapped.make(true)), reference);
    }

    #[test]
    fn xor_maps_after_aig_premapping() {
        // The sample library has no XOR cell; after premapping to AIG the
        // cone is covered with NAND/NOR/INV cells.
        use veles_opt::SubnetTransform;

        let library = sample_library();
        let mut builder = SubnetBuilder::new();
        let ins = builder.add_inputs(2);
        let xor = builder.add_cell(CellSymbol::Xor, &[ins[0], ins[1]]);
        builder.add_output(xor);
        let reference = evaluate_single_out(&builder.make(true));

        crate::premap::Premapper::new(crate::premap::Basis::Aig).transform(&mut builder);

        let mut db = CellTypeDb::new();
        let (mapped, _) = TechMapper::new(&library, Indicator::Area)
            .map(&builder, &mut db)
            .unwrap();
        let unmapped = unmap(&mapped, &db);
        assert_eq!(evaluate_single_out(&unmapped.make(true)), reference);
    }
}
