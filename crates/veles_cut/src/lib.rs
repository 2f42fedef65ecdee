//! Cut enumeration for the Veles optimizer.
//!
//! Provides k-feasible cut extraction with dominance pruning, the
//! reconvergence-driven cut used by resubstitution and area passes, and
//! maximum fanout-free cone construction.

#![warn(missing_docs)]

pub mod cut;
pub mod extractor;
pub mod mffc;
pub mod reconv;

pub use cut::Cut;
pub use extractor::CutExtractor;
pub use mffc::{mffc_fragment, mffc_interior, mffc_view};
pub use reconv::{reconvergence_cut, reconvergence_view};
