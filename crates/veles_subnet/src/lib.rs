//! Canonical arena-backed netlist model for the Veles toolchain.
//!
//! The central objects are the immutable [`Subnet`] — a packed, topologically
//! ordered array of cells over a shared link pool — and the mutable
//! [`SubnetBuilder`] that supports structural hashing, refcounting, depth
//! tracking, sessions, and in-place replacement. [`SubnetView`] projects a
//! cone out of a builder, [`SafePasser`] iterates a builder safely across
//! replacements, and [`DesignBuilder`] groups subnets into a named design
//! with save points.

#![warn(missing_docs)]

pub mod builder;
pub mod celltype;
pub mod design;
pub mod eval;
pub mod passer;
pub mod subnet;
pub mod symbol;
pub mod validate;
pub mod view;

pub use builder::{Effect, SubnetBuilder};
pub use celltype::{CellType, CellTypeAttrs, CellTypeDb, CellTypeId};
pub use design::{ArcKind, DesignBuilder, DesignError};
pub use eval::{evaluate, evaluate_single_out, evaluate_view};
pub use passer::SafePasser;
pub use subnet::{Link, Subnet, SubnetCell, IN_PLACE_LINKS};
pub use symbol::CellSymbol;
pub use validate::{validate, ValidateError};
pub use view::{InOutMapping, SubnetFragment, SubnetView};
