//! A graph of subnets with named save points.

use crate::builder::SubnetBuilder;
use crate::subnet::Subnet;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;
use veles_common::ContentHash;

/// The declared type of a signal bundle between two subnets.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArcKind {
    /// Ordinary data signals.
    Data,
    /// A clock bundle.
    Clock,
    /// A reset bundle.
    Reset,
}

/// Errors surfaced by design-level operations.
#[derive(Debug, thiserror::Error)]
pub enum DesignError {
    /// A save point with the given tag does not exist.
    #[error("unknown point '{0}'")]
    UnknownPoint(String),
}

#[derive(Clone)]
struct Snapshot {
    subnets: Vec<SubnetBuilder>,
    fingerprint: ContentHash,
}

/// A stable structural fingerprint over frozen subnets, used to tell save
/// points apart without comparing whole netlists.
fn fingerprint(subnets: &[SubnetBuilder]) -> ContentHash {
    let mut bytes: Vec<u8> = Vec::new();
    for builder in subnets {
        let frozen = builder.make(true);
        for (idx, cell) in frozen.iter() {
            bytes.push(cell.symbol as u8);
            for link in frozen.links_of(idx) {
                bytes.extend_from_slice(&(link.idx() as u32).to_le_bytes());
                bytes.push(link.is_inv() as u8);
            }
        }
        bytes.push(0xFF);
    }
    ContentHash::from_bytes(&bytes)
}

/// A hierarchical design: named, holding one subnet builder per
/// combinational island plus a typed arc graph between them.
///
/// Checkpoints capture a full snapshot of every builder under a label and
/// can be restored at any time; they live in memory only.
pub struct DesignBuilder {
    name: String,
    subnets: Vec<SubnetBuilder>,
    nodes: Vec<NodeIndex>,
    graph: DiGraph<usize, ArcKind>,
    points: BTreeMap<String, Snapshot>,
}

impl DesignBuilder {
    /// Creates an empty design.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subnets: Vec::new(),
            nodes: Vec::new(),
            graph: DiGraph::new(),
            points: BTreeMap::new(),
        }
    }

    /// Creates a design holding a single subnet.
    pub fn from_subnet(name: impl Into<String>, subnet: &Subnet) -> Self {
        let mut design = Self::new(name);
        design.add_subnet(SubnetBuilder::from_subnet(subnet));
        design
    }

    /// The design name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the design.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Adds a subnet and returns its index.
    pub fn add_subnet(&mut self, builder: SubnetBuilder) -> usize {
        let index = self.subnets.len();
        self.subnets.push(builder);
        self.nodes.push(self.graph.add_node(index));
        index
    }

    /// Adds a typed arc between two subnets.
    pub fn add_arc(&mut self, from: usize, to: usize, kind: ArcKind) {
        self.graph.add_edge(self.nodes[from], self.nodes[to], kind);
    }

    /// Number of subnets.
    pub fn subnet_count(&self) -> usize {
        self.subnets.len()
    }

    /// The i-th subnet builder.
    pub fn builder(&self, i: usize) -> &SubnetBuilder {
        &self.subnets[i]
    }

    /// The i-th subnet builder, mutably.
    pub fn builder_mut(&mut self, i: usize) -> &mut SubnetBuilder {
        &mut self.subnets[i]
    }

    /// All subnet builders, mutably (for parallel per-subnet passes).
    pub fn builders_mut(&mut self) -> &mut [SubnetBuilder] {
        &mut self.subnets
    }

    /// Arcs of the given kind, as `(from, to)` subnet index pairs.
    pub fn arcs(&self, kind: ArcKind) -> Vec<(usize, usize)> {
        self.graph
            .edge_indices()
            .filter(|&e| self.graph[e] == kind)
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a], self.graph[b]))
            .collect()
    }

    /// `true` once every subnet has been tech-mapped.
    pub fn is_tech_mapped(&self) -> bool {
        !self.subnets.is_empty() && self.subnets.iter().all(|b| b.is_tech_mapped())
    }

    /// `(inputs, outputs, internal)` cell counts summed over all subnets.
    pub fn cell_stats(&self) -> (usize, usize, usize) {
        let mut n_in = 0;
        let mut n_out = 0;
        let mut n_int = 0;
        for builder in &self.subnets {
            n_in += builder.inputs().len();
            n_out += builder.outputs().len();
            n_int += builder.live_internal_count();
        }
        (n_in, n_out, n_int)
    }

    /// The deepest output path over all subnets.
    pub fn max_depth(&self) -> usize {
        self.subnets.iter().map(|b| b.max_depth()).max().unwrap_or(0)
    }

    /// Snapshots every subnet under `tag`, overwriting an existing tag.
    pub fn save_point(&mut self, tag: impl Into<String>) {
        self.points.insert(
            tag.into(),
            Snapshot {
                fingerprint: fingerprint(&self.subnets),
                subnets: self.subnets.clone(),
            },
        );
    }

    /// The structural fingerprint of the snapshot saved under `tag`.
    pub fn point_fingerprint(&self, tag: &str) -> Result<ContentHash, DesignError> {
        self.points
            .get(tag)
            .map(|s| s.fingerprint)
            .ok_or_else(|| DesignError::UnknownPoint(tag.to_string()))
    }

    /// Restores the snapshot saved under `tag`.
    pub fn goto_point(&mut self, tag: &str) -> Result<(), DesignError> {
        let snapshot = self
            .points
            .get(tag)
            .ok_or_else(|| DesignError::UnknownPoint(tag.to_string()))?;
        self.subnets = snapshot.subnets.clone();
        Ok(())
    }

    /// `true` when a snapshot exists under `tag`.
    pub fn has_point(&self, tag: &str) -> bool {
        self.points.contains_key(tag)
    }

    /// The frozen subnets of the snapshot saved under `tag`.
    pub fn point_subnets(&self, tag: &str) -> Result<Vec<Subnet>, DesignError> {
        let snapshot = self
            .points
            .get(tag)
            .ok_or_else(|| DesignError::UnknownPoint(tag.to_string()))?;
        Ok(snapshot.subnets.iter().map(|b| b.make(true)).collect())
    }

    /// Save-point tags in sorted order.
    pub fn list_points(&self) -> Vec<&str> {
        self.points.keys().map(|s| s.as_str()).collect()
    }

    /// Drops the snapshot saved under `tag`.
    pub fn delete_point(&mut self, tag: &str) -> Result<(), DesignError> {
        self.points
            .remove(tag)
            .map(|_| ())
            .ok_or_else(|| DesignError::UnknownPoint(tag.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::CellSymbol;

    fn and_design() -> DesignBuilder {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let c = builder.add_cell(CellSymbol::And, &[a, b]);
        builder.add_output(c);
        let subnet = builder.make(true);
        DesignBuilder::from_subnet("top", &subnet)
    }

    #[test]
    fn stats_count_cells() {
        let design = and_design();
        assert_eq!(design.subnet_count(), 1);
        assert_eq!(design.cell_stats(), (2, 1, 1));
        assert_eq!(design.max_depth(), 1);
        assert!(!design.is_tech_mapped());
    }

    #[test]
    fn save_and_restore_points() {
        let mut design = and_design();
        design.save_point("orig");
        assert!(design.has_point("orig"));

        // Mutate: replace the AND with a constant zero.
        let builder = design.builder_mut(0);
        let root = builder.outputs()[0] - 1;
        let mut rhs = SubnetBuilder::new();
        rhs.add_inputs(2);
        let z = rhs.add_cell(CellSymbol::Zero, &[]);
        rhs.add_output(z);
        let rhs = rhs.make(false);
        let inputs = builder.inputs().to_vec();
        builder.replace(&rhs, &crate::view::InOutMapping::new(inputs, vec![root]));
        assert_eq!(design.cell_stats().2, 1); // the ZERO cell

        design.goto_point("orig").unwrap();
        let restored = design.builder(0).make(true);
        let tt = crate::eval::evaluate_single_out(&restored);
        assert_eq!(tt.to_binary_string(), "1000");
    }

    #[test]
    fn unknown_point_is_an_error() {
        let mut design = and_design();
        assert!(matches!(
            design.goto_point("missing"),
            Err(DesignError::UnknownPoint(_))
        ));
        assert!(design.list_points().is_empty());
    }

    #[test]
    fn list_points_sorted() {
        let mut design = and_design();
        design.save_point("b");
        design.save_point("a");
        assert_eq!(design.list_points(), vec!["a", "b"]);
    }

    #[test]
    fn arcs_by_kind() {
        let mut design = and_design();
        let mut other = SubnetBuilder::new();
        let x = other.add_input();
        other.add_output(x);
        let second = design.add_subnet(other);
        design.add_arc(0, second, ArcKind::Data);
        design.add_arc(0, second, ArcKind::Clock);
        assert_eq!(design.arcs(ArcKind::Data), vec![(0, 1)]);
        assert_eq!(design.arcs(ArcKind::Clock), vec![(0, 1)]);
        assert!(design.arcs(ArcKind::Reset).is_empty());
    }

    #[test]
    fn point_fingerprints_distinguish_states() {
        let mut design = and_design();
        design.save_point("a");
        // Same netlist saved twice: identical fingerprints.
        design.save_point("b");
        assert_eq!(
            design.point_fingerprint("a").unwrap(),
            design.point_fingerprint("b").unwrap()
        );
        // A structurally different netlist fingerprints differently.
        let builder = design.builder_mut(0);
        let inputs = builder.inputs().to_vec();
        let root = builder.outputs()[0] - 1;
        let mut rhs = SubnetBuilder::new();
        rhs.add_inputs(2);
        let one = rhs.add_cell(CellSymbol::One, &[]);
        rhs.add_output(one);
        let rhs = rhs.make(false);
        builder.replace(&rhs, &crate::view::InOutMapping::new(inputs, vec![root]));
        design.save_point("c");
        assert_ne!(
            design.point_fingerprint("a").unwrap(),
            design.point_fingerprint("c").unwrap()
        );
        assert!(design.point_fingerprint("missing").is_err());
    }

    #[test]
    fn point_subnets_are_frozen_copies() {
        let mut design = and_design();
        design.save_point("p");
        let subnets = design.point_subnets("p").unwrap();
        assert_eq!(subnets.len(), 1);
        assert_eq!(subnets[0].size(), 4);
    }
}
