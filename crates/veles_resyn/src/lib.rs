//! Resynthesizers: truth table in, subnet out.
//!
//! Every algorithm here implements the same contract: given a function, a
//! care mask, and a fanin bound, produce a single-output subnet whose
//! output agrees with the function wherever the care mask is set. The
//! algorithms differ in target basis (AND/OR/XOR vs MAJ) and in the cost
//! they implicitly minimize.

#![warn(missing_docs)]

pub mod akers;
pub mod bidec;
pub mod de_micheli;
pub mod dsd;
pub mod factor;
pub mod isop_synth;
pub mod npn4;
pub mod reed_muller;
pub mod zhegalkin;

pub use akers::AkersSynthesizer;
pub use bidec::BiDecSynthesizer;
pub use de_micheli::DmSynthesizer;
pub use dsd::DsdSynthesizer;
pub use factor::FactorSynthesizer;
pub use isop_synth::MmSynthesizer;
pub use npn4::{Npn4Database, Npn4Synthesizer};
pub use reed_muller::ReedMullerSynthesizer;
pub use zhegalkin::ZhegalkinSynthesizer;

use veles_subnet::Subnet;
use veles_tt::TruthTable;

/// Unbounded fanin for [`Synthesizer::synthesize`].
pub const NO_ARITY_BOUND: usize = usize::MAX;

/// The common resynthesis contract.
///
/// The returned subnet has exactly `func.num_vars()` inputs and one output
/// that equals `func` wherever `care = 1`; the function is free elsewhere.
/// `None` means the algorithm could not synthesize the function (callers
/// fall back to another synthesizer).
pub trait Synthesizer {
    /// Synthesizes `func` under `care` with cell fanin bounded by
    /// `max_arity`.
    fn synthesize(&self, func: &TruthTable, care: &TruthTable, max_arity: usize)
        -> Option<Subnet>;

    /// Synthesizes a fully-specified function with unbounded fanin.
    fn synthesize_exact(&self, func: &TruthTable) -> Option<Subnet> {
        self.synthesize(func, &TruthTable::ones(func.num_vars()), NO_ARITY_BOUND)
    }
}
