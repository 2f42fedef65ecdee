//! Read-only cone projections of a builder.

use crate::builder::SubnetBuilder;
use crate::subnet::{Link, Subnet};
use crate::symbol::CellSymbol;
use std::collections::HashMap;

/// Maps a fragment's boundary onto builder entries: which builder entry
/// each input reuses and which builder entry each output replaces.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct InOutMapping {
    /// Builder entries standing in for the fragment inputs, in order.
    pub inputs: Vec<usize>,
    /// Builder entries whose fanouts the fragment outputs take over.
    pub outputs: Vec<usize>,
}

impl InOutMapping {
    /// Creates a mapping from input and output entry lists.
    pub fn new(inputs: Vec<usize>, outputs: Vec<usize>) -> Self {
        Self { inputs, outputs }
    }
}

/// An extracted cone: a self-contained subnet plus its boundary mapping
/// into the builder it was cut from.
#[derive(Clone, Debug)]
pub struct SubnetFragment {
    /// The cone as a standalone subnet (view inputs become primary inputs).
    pub subnet: Subnet,
    /// The boundary mapping into the originating builder.
    pub io: InOutMapping,
}

/// A projection of a builder: an input frontier and a root set. Everything
/// reachable from the roots down to the frontier is implicitly part of the
/// view.
///
/// The view borrows nothing; it holds entry indices and is re-validated
/// against the builder on every walk, so passes can keep mutating the
/// builder between uses.
#[derive(Clone, Debug)]
pub struct SubnetView {
    io: InOutMapping,
}

impl SubnetView {
    /// Creates a view with the given boundary.
    pub fn new(io: InOutMapping) -> Self {
        Self { io }
    }

    /// The input frontier.
    pub fn inputs(&self) -> &[usize] {
        &self.io.inputs
    }

    /// The root set.
    pub fn outputs(&self) -> &[usize] {
        &self.io.outputs
    }

    /// The i-th root.
    pub fn output(&self, i: usize) -> usize {
        self.io.outputs[i]
    }

    /// Number of inputs.
    pub fn input_count(&self) -> usize {
        self.io.inputs.len()
    }

    /// Number of roots.
    pub fn output_count(&self) -> usize {
        self.io.outputs.len()
    }

    /// The boundary mapping.
    pub fn io(&self) -> &InOutMapping {
        &self.io
    }

    /// The cone entries in topological order: inputs first, then every
    /// internal entry on a path from the frontier to a root.
    pub fn cone(&self, builder: &SubnetBuilder) -> Vec<usize> {
        let mut order: Vec<usize> = self.io.inputs.clone();
        let mut visited: HashMap<usize, bool> = self
            .io
            .inputs
            .iter()
            .map(|&i| (i, true))
            .collect();
        for &root in &self.io.outputs {
            Self::visit(builder, root, &mut visited, &mut order);
        }
        order
    }

    fn visit(
        builder: &SubnetBuilder,
        idx: usize,
        visited: &mut HashMap<usize, bool>,
        order: &mut Vec<usize>,
    ) {
        if visited.contains_key(&idx) {
            return;
        }
        visited.insert(idx, true);
        for link in builder.links_of(idx) {
            Self::visit(builder, link.idx(), visited, order);
        }
        order.push(idx);
    }

    /// Extracts the cone into a standalone subnet together with its
    /// boundary mapping.
    pub fn extract(&self, builder: &SubnetBuilder) -> SubnetFragment {
        let mut cone_builder = SubnetBuilder::new();
        let mut map: HashMap<usize, Link> = HashMap::new();
        for &input in &self.io.inputs {
            map.insert(input, cone_builder.add_input());
        }
        for &root in &self.io.outputs {
            let link = Self::emit(builder, root, &mut cone_builder, &mut map);
            cone_builder.add_output(link);
        }
        SubnetFragment {
            subnet: cone_builder.make(false),
            io: self.io.clone(),
        }
    }

    fn emit(
        builder: &SubnetBuilder,
        idx: usize,
        cone_builder: &mut SubnetBuilder,
        map: &mut HashMap<usize, Link>,
    ) -> Link {
        if let Some(&link) = map.get(&idx) {
            return link;
        }
        let symbol = builder.symbol(idx);
        assert!(
            symbol != CellSymbol::In,
            "view frontier does not separate the cone from the inputs"
        );
        let links: Vec<Link> = builder
            .links_of(idx)
            .iter()
            .map(|&l| {
                let inner = Self::emit(builder, l.idx(), cone_builder, map);
                inner.with_inv(inner.is_inv() ^ l.is_inv())
            })
            .collect();
        let link = cone_builder.add_cell(symbol, &links);
        map.insert(idx, link);
        link
    }
}
