//! Structural validation of frozen subnets.
//!
//! Frontends run this after instantiating a subnet; violations indicate a
//! malformed input file rather than an internal bug, so they surface as
//! errors instead of assertions.

use crate::subnet::Subnet;
use crate::symbol::CellSymbol;

/// A structural defect found in a subnet.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    /// A fanin link references the entry itself or a later entry.
    #[error("entry {entry}: link to {target} breaks topological order")]
    NonTopologicalLink {
        /// The offending entry.
        entry: usize,
        /// The referenced entry.
        target: usize,
    },
    /// An input cell appears after the first internal cell.
    #[error("entry {0}: input cell after internal cells")]
    MisplacedInput(usize),
    /// An output cell appears before the output block.
    #[error("entry {0}: output cell before the output block")]
    MisplacedOutput(usize),
    /// A cell has an arity its symbol does not admit.
    #[error("entry {entry}: symbol {symbol:?} cannot take {arity} fanins")]
    BadArity {
        /// The offending entry.
        entry: usize,
        /// The cell's symbol.
        symbol: CellSymbol,
        /// The actual fanin count.
        arity: usize,
    },
}

fn arity_ok(symbol: CellSymbol, arity: usize) -> bool {
    match symbol {
        CellSymbol::In | CellSymbol::Zero | CellSymbol::One => arity == 0,
        CellSymbol::Out | CellSymbol::Buf | CellSymbol::Not => arity == 1,
        CellSymbol::And
        | CellSymbol::Or
        | CellSymbol::Xor
        | CellSymbol::Nand
        | CellSymbol::Nor
        | CellSymbol::Xnor => arity >= 2,
        CellSymbol::Maj => arity >= 3 && arity % 2 == 1,
        CellSymbol::Mux2 => arity == 3,
        _ => arity >= 1,
    }
}

/// Checks the structural invariants of a frozen subnet.
pub fn validate(subnet: &Subnet) -> Result<(), ValidateError> {
    let n_in = subnet.input_count();
    let first_out = subnet.size() - subnet.output_count();

    for (idx, cell) in subnet.iter() {
        match cell.symbol {
            CellSymbol::In if idx >= n_in => return Err(ValidateError::MisplacedInput(idx)),
            CellSymbol::Out if idx < first_out => {
                return Err(ValidateError::MisplacedOutput(idx))
            }
            _ => {}
        }
        let links = subnet.links_of(idx);
        if !arity_ok(cell.symbol, links.len()) {
            return Err(ValidateError::BadArity {
                entry: idx,
                symbol: cell.symbol,
                arity: links.len(),
            });
        }
        for link in links {
            if link.idx() >= idx {
                return Err(ValidateError::NonTopologicalLink {
                    entry: idx,
                    target: link.idx(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SubnetBuilder;
    use crate::subnet::{Link, SubnetCell};

    #[test]
    fn builder_output_validates() {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let c = builder.add_cell(CellSymbol::Maj, &[a, b, !a]);
        builder.add_output(c);
        assert!(validate(&builder.make(true)).is_ok());
    }

    #[test]
    fn forward_link_rejected() {
        let subnet = Subnet {
            cells: vec![
                SubnetCell {
                    symbol: CellSymbol::In,
                    type_id: None,
                    link_start: 0,
                    link_len: 0,
                },
                SubnetCell {
                    symbol: CellSymbol::Buf,
                    type_id: None,
                    link_start: 0,
                    link_len: 1,
                },
                SubnetCell {
                    symbol: CellSymbol::Out,
                    type_id: None,
                    link_start: 1,
                    link_len: 1,
                },
            ],
            links: vec![Link::new(2), Link::new(1)],
            n_inputs: 1,
            n_outputs: 1,
            tech_mapped: false,
        };
        assert!(matches!(
            validate(&subnet),
            Err(ValidateError::NonTopologicalLink { entry: 1, target: 2 })
        ));
    }

    #[test]
    fn bad_arity_rejected() {
        let subnet = Subnet {
            cells: vec![
                SubnetCell {
                    symbol: CellSymbol::In,
                    type_id: None,
                    link_start: 0,
                    link_len: 0,
                },
                SubnetCell {
                    symbol: CellSymbol::And,
                    type_id: None,
                    link_start: 0,
                    link_len: 1,
                },
                SubnetCell {
                    symbol: CellSymbol::Out,
                    type_id: None,
                    link_start: 1,
                    link_len: 1,
                },
            ],
            links: vec![Link::new(0), Link::new(1)],
            n_inputs: 1,
            n_outputs: 1,
            tech_mapped: false,
        };
        assert!(matches!(
            validate(&subnet),
            Err(ValidateError::BadArity { entry: 1, .. })
        ));
    }
}
