//! The immutable subnet arena.

use crate::celltype::CellTypeId;
use crate::symbol::CellSymbol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fanins stored in place before spilling; also the default maximum arity
/// used by tree-decomposing constructors.
pub const IN_PLACE_LINKS: usize = 5;

const IDX_BITS: u32 = 26;
const OUT_BITS: u32 = 5;
const IDX_MAX: u32 = (1 << IDX_BITS) - 1;
const OUT_MAX: u32 = (1 << OUT_BITS) - 1;

/// A reference to a driver: entry index, output port, inversion flag,
/// packed into 32 bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link(u32);

impl Link {
    /// A non-inverted link to port 0 of `idx`.
    pub fn new(idx: usize) -> Self {
        Self::with_parts(idx, 0, false)
    }

    /// A link with all three fields.
    pub fn with_parts(idx: usize, out: u32, inv: bool) -> Self {
        assert!(idx as u32 <= IDX_MAX, "entry index overflows link packing");
        assert!(out <= OUT_MAX, "output port overflows link packing");
        Link(((idx as u32) << (OUT_BITS + 1)) | (out << 1) | inv as u32)
    }

    /// The referenced entry index.
    pub fn idx(self) -> usize {
        (self.0 >> (OUT_BITS + 1)) as usize
    }

    /// The referenced output port.
    pub fn out(self) -> u32 {
        (self.0 >> 1) & OUT_MAX
    }

    /// `true` when the link inverts its driver.
    pub fn is_inv(self) -> bool {
        self.0 & 1 == 1
    }

    /// The same link with inversion set to `inv`.
    pub fn with_inv(self, inv: bool) -> Link {
        Link((self.0 & !1) | inv as u32)
    }

    /// The same link with the referenced entry replaced.
    pub fn with_idx(self, idx: usize) -> Link {
        Link::with_parts(idx, self.out(), self.is_inv())
    }
}

impl std::ops::Not for Link {
    type Output = Link;

    /// Toggles the inversion flag.
    fn not(self) -> Link {
        Link(self.0 ^ 1)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inv() {
            write!(f, "~")?;
        }
        write!(f, "{}", self.idx())?;
        if self.out() != 0 {
            write!(f, ".{}", self.out())?;
        }
        Ok(())
    }
}

/// One cell of an immutable subnet. Fanins live in the subnet's shared
/// link pool at `link_start .. link_start + link_len`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SubnetCell {
    /// The cell's function or port kind.
    pub symbol: CellSymbol,
    /// The library cell type for `Undef` cells.
    pub type_id: Option<CellTypeId>,
    pub(crate) link_start: u32,
    pub(crate) link_len: u16,
}

impl SubnetCell {
    /// Declared fanin count.
    pub fn arity(&self) -> usize {
        self.link_len as usize
    }
}

/// An immutable, topologically ordered Boolean network.
///
/// Entries are stored inputs-first, internal cells in topological order,
/// outputs last; every fanin link references a strictly earlier entry.
/// Obtained only from [`SubnetBuilder::make`](crate::SubnetBuilder::make).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Subnet {
    pub(crate) cells: Vec<SubnetCell>,
    pub(crate) links: Vec<Link>,
    pub(crate) n_inputs: u32,
    pub(crate) n_outputs: u32,
    pub(crate) tech_mapped: bool,
}

impl Subnet {
    /// Total number of entries including inputs and outputs.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Number of internal cells (everything except inputs and outputs).
    pub fn internal_count(&self) -> usize {
        self.cells.len() - self.n_inputs as usize - self.n_outputs as usize
    }

    /// Number of primary inputs.
    pub fn input_count(&self) -> usize {
        self.n_inputs as usize
    }

    /// Number of primary outputs.
    pub fn output_count(&self) -> usize {
        self.n_outputs as usize
    }

    /// The entry index of the i-th input.
    pub fn input(&self, i: usize) -> usize {
        assert!(i < self.input_count());
        i
    }

    /// The entry index of the j-th output cell.
    pub fn output(&self, j: usize) -> usize {
        assert!(j < self.output_count());
        self.cells.len() - self.output_count() + j
    }

    /// The cell at entry `idx`.
    pub fn cell(&self, idx: usize) -> &SubnetCell {
        &self.cells[idx]
    }

    /// The fanin links of entry `idx`.
    pub fn links_of(&self, idx: usize) -> &[Link] {
        let cell = &self.cells[idx];
        let start = cell.link_start as usize;
        &self.links[start..start + cell.link_len as usize]
    }

    /// Iterates `(entry index, cell)` in topological order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &SubnetCell)> {
        self.cells.iter().enumerate()
    }

    /// `true` when every cell is a library cell and no free inverters remain.
    pub fn is_tech_mapped(&self) -> bool {
        self.tech_mapped
    }

    /// Longest input-to-output path counted in non-passthrough cells.
    pub fn depth(&self) -> usize {
        let mut depth = vec![0usize; self.cells.len()];
        let mut max = 0;
        for (idx, cell) in self.cells.iter().enumerate() {
            let fanin_max = self
                .links_of(idx)
                .iter()
                .map(|l| depth[l.idx()])
                .max()
                .unwrap_or(0);
            depth[idx] = match cell.symbol {
                CellSymbol::In | CellSymbol::Zero | CellSymbol::One => 0,
                CellSymbol::Buf | CellSymbol::Not | CellSymbol::Out => fanin_max,
                _ => fanin_max + 1,
            };
            max = max.max(depth[idx]);
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SubnetBuilder;
    use crate::symbol::CellSymbol;

    #[test]
    fn link_packing_roundtrip() {
        let l = Link::with_parts(12345, 3, true);
        assert_eq!(l.idx(), 12345);
        assert_eq!(l.out(), 3);
        assert!(l.is_inv());
        let n = !l;
        assert!(!n.is_inv());
        assert_eq!(n.idx(), 12345);
    }

    #[test]
    fn link_fits_in_word() {
        assert_eq!(std::mem::size_of::<Link>(), 4);
    }

    #[test]
    fn link_with_idx_preserves_rest() {
        let l = Link::with_parts(7, 2, true);
        let m = l.with_idx(9);
        assert_eq!(m.idx(), 9);
        assert_eq!(m.out(), 2);
        assert!(m.is_inv());
    }

    #[test]
    fn and_gate_subnet_shape() {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let c = builder.add_cell(CellSymbol::And, &[a, b]);
        builder.add_output(c);
        let subnet = builder.make(true);

        assert_eq!(subnet.size(), 4);
        assert_eq!(subnet.input_count(), 2);
        assert_eq!(subnet.output_count(), 1);
        assert_eq!(subnet.internal_count(), 1);
        assert_eq!(subnet.cell(subnet.output(0)).symbol, CellSymbol::Out);
        assert_eq!(subnet.depth(), 1);
    }

    #[test]
    fn links_point_backwards() {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let c = builder.add_cell(CellSymbol::And, &[a, b]);
        let d = builder.add_cell(CellSymbol::Xor, &[c, a]);
        builder.add_output(d);
        let subnet = builder.make(true);

        for (idx, _) in subnet.iter() {
            for link in subnet.links_of(idx) {
                assert!(link.idx() < idx, "link must reference an earlier entry");
            }
        }
    }

    #[test]
    fn serde_roundtrip() {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let c = builder.add_cell(CellSymbol::Or, &[a, !b]);
        builder.add_output(c);
        let subnet = builder.make(true);

        let json = serde_json::to_string(&subnet).unwrap();
        let back: Subnet = serde_json::from_str(&json).unwrap();
        assert_eq!(subnet, back);
    }
}
