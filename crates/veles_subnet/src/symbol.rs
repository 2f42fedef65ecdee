//! Cell symbols — the closed set of logical functions and port kinds.

use serde::{Deserialize, Serialize};

/// The logical function or port kind of a cell.
///
/// Dispatch over cell kinds is always a `match` on this enum; there is no
/// inheritance hierarchy behind it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CellSymbol {
    /// Primary input.
    In,
    /// Primary output.
    Out,
    /// Constant 0.
    Zero,
    /// Constant 1.
    One,
    /// Buffer; with an inverted fanin link it acts as an inverter.
    Buf,
    /// Inverter; normalized to a `Buf` with an inverted fanin on construction.
    Not,
    /// n-ary conjunction.
    And,
    /// n-ary disjunction.
    Or,
    /// n-ary parity.
    Xor,
    /// Negated conjunction.
    Nand,
    /// Negated disjunction.
    Nor,
    /// Negated parity.
    Xnor,
    /// Odd-arity majority.
    Maj,
    /// D flip-flop (clock, data).
    Dff,
    /// Synchronous-reset D flip-flop.
    SDff,
    /// Asynchronous-reset D flip-flop.
    ADff,
    /// D flip-flop with set/reset.
    DffRs,
    /// Level-sensitive latch.
    DLatch,
    /// Asynchronous-reset latch.
    ADLatch,
    /// Latch with set/reset.
    DLatchRs,
    /// Set/reset latch.
    LatchRs,
    /// Bitwise multi-bit AND.
    BAnd,
    /// Bitwise multi-bit OR.
    BOr,
    /// Bitwise multi-bit XOR.
    BXor,
    /// Multi-bit addition.
    Add,
    /// Multi-bit subtraction.
    Sub,
    /// Multi-bit multiplication.
    Mul,
    /// Two-way multiplexer (select, a, b).
    Mux2,
    /// Left shift.
    Shl,
    /// Right shift.
    Shr,
    /// Equality comparison.
    Eq,
    /// Inequality comparison.
    Neq,
    /// A user-defined cell; its function lives in the cell type.
    Undef,
}

impl CellSymbol {
    /// `true` for the primary-input symbol.
    pub fn is_in(self) -> bool {
        self == CellSymbol::In
    }

    /// `true` for the primary-output symbol.
    pub fn is_out(self) -> bool {
        self == CellSymbol::Out
    }

    /// `true` for constant cells.
    pub fn is_constant(self) -> bool {
        matches!(self, CellSymbol::Zero | CellSymbol::One)
    }

    /// `true` for buffers (and the `Not` alias).
    pub fn is_buf(self) -> bool {
        matches!(self, CellSymbol::Buf | CellSymbol::Not)
    }

    /// `true` for cells that add no logic depth: constants and buffers.
    pub fn is_passthrough(self) -> bool {
        self.is_constant() || self.is_buf()
    }

    /// `true` for the single-bit combinational gate symbols.
    pub fn is_gate(self) -> bool {
        matches!(
            self,
            CellSymbol::And
                | CellSymbol::Or
                | CellSymbol::Xor
                | CellSymbol::Nand
                | CellSymbol::Nor
                | CellSymbol::Xnor
                | CellSymbol::Maj
        )
    }

    /// `true` when operand order does not matter, so fanin links are sorted
    /// into a canonical order for structural hashing.
    pub fn is_symmetric(self) -> bool {
        matches!(
            self,
            CellSymbol::And
                | CellSymbol::Or
                | CellSymbol::Xor
                | CellSymbol::Nand
                | CellSymbol::Nor
                | CellSymbol::Xnor
                | CellSymbol::Maj
                | CellSymbol::BAnd
                | CellSymbol::BOr
                | CellSymbol::BXor
                | CellSymbol::Add
                | CellSymbol::Mul
                | CellSymbol::Eq
                | CellSymbol::Neq
        )
    }

    /// `true` for state-holding cells.
    pub fn is_sequential(self) -> bool {
        matches!(
            self,
            CellSymbol::Dff
                | CellSymbol::SDff
                | CellSymbol::ADff
                | CellSymbol::DffRs
                | CellSymbol::DLatch
                | CellSymbol::ADLatch
                | CellSymbol::DLatchRs
                | CellSymbol::LatchRs
        )
    }

    /// The symbol computing the complement, where one exists.
    pub fn negated(self) -> Option<CellSymbol> {
        match self {
            CellSymbol::And => Some(CellSymbol::Nand),
            CellSymbol::Nand => Some(CellSymbol::And),
            CellSymbol::Or => Some(CellSymbol::Nor),
            CellSymbol::Nor => Some(CellSymbol::Or),
            CellSymbol::Xor => Some(CellSymbol::Xnor),
            CellSymbol::Xnor => Some(CellSymbol::Xor),
            _ => None,
        }
    }

    /// Parses the symbol name used by frontends (GraphML, liberty glue).
    pub fn parse(name: &str) -> Option<CellSymbol> {
        let sym = match name.to_ascii_uppercase().as_str() {
            "IN" => CellSymbol::In,
            "OUT" => CellSymbol::Out,
            "ZERO" => CellSymbol::Zero,
            "ONE" => CellSymbol::One,
            "BUF" => CellSymbol::Buf,
            "NOT" | "INV" => CellSymbol::Not,
            "AND" => CellSymbol::And,
            "OR" => CellSymbol::Or,
            "XOR" => CellSymbol::Xor,
            "NAND" => CellSymbol::Nand,
            "NOR" => CellSymbol::Nor,
            "XNOR" => CellSymbol::Xnor,
            "MAJ" => CellSymbol::Maj,
            "DFF" => CellSymbol::Dff,
            "SDFF" => CellSymbol::SDff,
            "ADFF" => CellSymbol::ADff,
            "DFFRS" => CellSymbol::DffRs,
            "DLATCH" => CellSymbol::DLatch,
            "ADLATCH" => CellSymbol::ADLatch,
            "DLATCHRS" => CellSymbol::DLatchRs,
            "LATCHRS" => CellSymbol::LatchRs,
            "MUX2" => CellSymbol::Mux2,
            _ => return None,
        };
        Some(sym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(CellSymbol::In.is_in());
        assert!(CellSymbol::Zero.is_constant());
        assert!(CellSymbol::Buf.is_passthrough());
        assert!(CellSymbol::And.is_gate());
        assert!(!CellSymbol::Dff.is_gate());
        assert!(CellSymbol::Dff.is_sequential());
    }

    #[test]
    fn symmetric_gates_sorted() {
        assert!(CellSymbol::And.is_symmetric());
        assert!(CellSymbol::Maj.is_symmetric());
        assert!(!CellSymbol::Mux2.is_symmetric());
        assert!(!CellSymbol::Sub.is_symmetric());
        assert!(!CellSymbol::Dff.is_symmetric());
    }

    #[test]
    fn negation_pairs() {
        assert_eq!(CellSymbol::And.negated(), Some(CellSymbol::Nand));
        assert_eq!(CellSymbol::Nand.negated(), Some(CellSymbol::And));
        assert_eq!(CellSymbol::Maj.negated(), None);
    }

    #[test]
    fn parse_names() {
        assert_eq!(CellSymbol::parse("and"), Some(CellSymbol::And));
        assert_eq!(CellSymbol::parse("INV"), Some(CellSymbol::Not));
        assert_eq!(CellSymbol::parse("maj"), Some(CellSymbol::Maj));
        assert_eq!(CellSymbol::parse("bogus"), None);
    }
}
