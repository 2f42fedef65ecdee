//! Truth-table engine for the Veles logic-synthesis toolchain.
//!
//! Boolean functions of n variables are materialized either as a single
//! 64-bit word (n <= 6) or as a packed bit-vector over 2^n bits (n > 6).
//! On top of the tables this crate provides the Minato–Morreale irredundant
//! sum-of-products cover and NPN canonicalization for functions of up to
//! four variables.

#![warn(missing_docs)]

pub mod isop;
pub mod npn;
pub mod table;

pub use isop::{isop, Cube};
pub use npn::{canonicalize, NpnTransform};
pub use table::{compute_care, ParseTableError, TruthTable};
