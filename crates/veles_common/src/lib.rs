//! Shared foundational types used across the Veles logic-synthesis toolchain.
//!
//! This crate provides interned identifiers, content hashing, and the cost
//! vectors / optimization criteria shared by the optimizer and the techmapper.

#![warn(missing_docs)]

pub mod cost;
pub mod hash;
pub mod ident;

pub use cost::{CostVector, Criterion, Indicator};
pub use hash::{entry_hash, ContentHash};
pub use ident::{Ident, Interner};
