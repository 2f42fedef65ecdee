//! Premapping and technology mapping for the Veles toolchain.
//!
//! The premapper lowers arbitrary-symbol subnets into one of the canonical
//! technology-independent bases (AIG, XAG, MIG, XMG). The techmapper then
//! runs dynamic programming over k-feasible cuts against a liberty
//! standard-cell library, and the unmapper undoes a mapping by inlining
//! cell implementations.

#![warn(missing_docs)]

pub mod liberty;
pub mod premap;
pub mod techmap;
pub mod unmap;

pub use liberty::{parse_liberty, Library, LibertyError, Nldm};
pub use premap::{Basis, Premapper};
pub use techmap::{TechMapper, TechmapError, TechmapStats};
pub use unmap::unmap;
