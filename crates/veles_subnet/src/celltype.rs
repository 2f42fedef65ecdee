//! Cell types — templates for cells of a given symbol.

use crate::subnet::Subnet;
use crate::symbol::CellSymbol;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque, copyable ID of a [`CellType`] in a [`CellTypeDb`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CellTypeId(u32);

impl CellTypeId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Physical and technology attributes of a cell type.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CellTypeAttrs {
    /// Cell area in library units.
    pub area: f32,
    /// Nominal propagation delay in ns.
    pub delay: f32,
    /// Leakage / nominal switching power in uW.
    pub power: f32,
    /// A hard macro that must not be decomposed.
    pub is_hard: bool,
    /// A standard cell from a technology library.
    pub is_cell: bool,
    /// Implemented by a subnet.
    pub is_subnet: bool,
    /// A hierarchical net rather than a leaf.
    pub is_net: bool,
}

/// A template for cells: name, symbol, pin counts, optional implementation
/// subnet, and physical attributes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CellType {
    /// The type name (library cell name or synthetic).
    pub name: String,
    /// The symbol instances of this type carry.
    pub symbol: CellSymbol,
    /// Number of input pins.
    pub n_inputs: u16,
    /// Number of output pins.
    pub n_outputs: u16,
    /// Per-input port bit widths; empty means all single-bit.
    pub in_widths: Vec<u16>,
    /// A subnet realizing the function, if one is attached.
    pub implementation: Option<Subnet>,
    /// Physical properties and technology flags.
    pub attrs: CellTypeAttrs,
}

impl CellType {
    /// `true` when the type carries an implementation subnet.
    pub fn has_impl(&self) -> bool {
        self.implementation.is_some()
    }
}

/// The cell-type catalog.
///
/// Append-only; threaded through builders and the techmapper by reference
/// instead of living in process-global state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CellTypeDb {
    types: Vec<CellType>,
    by_name: HashMap<String, CellTypeId>,
}

impl CellTypeDb {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type and returns its ID.
    ///
    /// # Panics
    ///
    /// Panics if a type with the same name is already registered.
    pub fn register(&mut self, ty: CellType) -> CellTypeId {
        assert!(
            !self.by_name.contains_key(&ty.name),
            "cell type '{}' registered twice",
            ty.name
        );
        let id = CellTypeId(self.types.len() as u32);
        self.by_name.insert(ty.name.clone(), id);
        self.types.push(ty);
        id
    }

    /// Returns the type with the given ID.
    pub fn get(&self, id: CellTypeId) -> &CellType {
        &self.types[id.0 as usize]
    }

    /// Looks a type up by name.
    pub fn lookup(&self, name: &str) -> Option<CellTypeId> {
        self.by_name.get(name).copied()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// `true` when no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates `(ID, type)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (CellTypeId, &CellType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, ty)| (CellTypeId(i as u32), ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nand2() -> CellType {
        CellType {
            name: "NAND2_X1".to_string(),
            symbol: CellSymbol::Undef,
            n_inputs: 2,
            n_outputs: 1,
            in_widths: vec![],
            implementation: None,
            attrs: CellTypeAttrs {
                area: 1.064,
                delay: 0.03,
                power: 0.5,
                is_cell: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut db = CellTypeDb::new();
        let id = db.register(nand2());
        assert_eq!(db.lookup("NAND2_X1"), Some(id));
        assert_eq!(db.get(id).n_inputs, 2);
        assert!(db.get(id).attrs.is_cell);
    }

    #[test]
    fn unknown_name_is_none() {
        let db = CellTypeDb::new();
        assert!(db.lookup("INV_X1").is_none());
        assert!(db.is_empty());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_name_panics() {
        let mut db = CellTypeDb::new();
        db.register(nand2());
        db.register(nand2());
    }

    #[test]
    fn iter_in_registration_order() {
        let mut db = CellTypeDb::new();
        db.register(nand2());
        let mut inv = nand2();
        inv.name = "INV_X1".to_string();
        inv.n_inputs = 1;
        db.register(inv);
        let names: Vec<_> = db.iter().map(|(_, ty)| ty.name.as_str()).collect();
        assert_eq!(names, vec!["NAND2_X1", "INV_X1"]);
    }
}
