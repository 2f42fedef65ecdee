//! Premapping into the canonical technology-independent bases.

use veles_opt::SubnetTransform;
use veles_subnet::{CellSymbol, Link, SubnetBuilder};

/// The target basis of a premap run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Basis {
    /// Binary ANDs with inversion on links.
    Aig,
    /// AIG plus XOR as a primitive.
    Xag,
    /// Everything in terms of 3-input majorities.
    Mig,
    /// MIG plus XOR.
    Xmg,
}

/// Lowers every gate into the target basis, with structural hashing
/// folding duplicate constants and shared substructure as it goes.
pub struct Premapper {
    basis: Basis,
}

impl Premapper {
    /// A premapper targeting `basis`.
    pub fn new(basis: Basis) -> Self {
        Self { basis }
    }

    fn and2(&self, new: &mut SubnetBuilder, a: Link, b: Link) -> Link {
        match self.basis {
            Basis::Aig | Basis::Xag => new.add_cell(CellSymbol::And, &[a, b]),
            Basis::Mig | Basis::Xmg => {
                let zero = new.add_cell(CellSymbol::Zero, &[]);
                new.add_cell(CellSymbol::Maj, &[a, b, zero])
            }
        }
    }

    fn or2(&self, new: &mut SubnetBuilder, a: Link, b: Link) -> Link {
        match self.basis {
            Basis::Aig | Basis::Xag => !self.and2(new, !a, !b),
            Basis::Mig | Basis::Xmg => {
                let one = new.add_cell(CellSymbol::One, &[]);
                new.add_cell(CellSymbol::Maj, &[a, b, one])
            }
        }
    }

    fn xor2(&self, new: &mut SubnetBuilder, a: Link, b: Link) -> Link {
        match self.basis {
            Basis::Xag | Basis::Xmg => new.add_cell(CellSymbol::Xor, &[a, b]),
            Basis::Aig | Basis::Mig => {
                // (a & ~b) | (~a & b)
                let left = self.and2(new, a, !b);
                let right = self.and2(new, !a, b);
                self.or2(new, left, right)
            }
        }
    }

    fn maj3(&self, new: &mut SubnetBuilder, a: Link, b: Link, c: Link) -> Link {
        match self.basis {
            Basis::Mig | Basis::Xmg => new.add_cell(CellSymbol::Maj, &[a, b, c]),
            Basis::Aig | Basis::Xag => {
                // OR(AND(a,b), AND(a,c), AND(b,c))
                let ab = self.and2(new, a, b);
                let ac = self.and2(new, a, c);
                let bc = self.and2(new, b, c);
                let left = self.or2(new, ab, ac);
                self.or2(new, left, bc)
            }
        }
    }

    fn fold(
        &self,
        new: &mut SubnetBuilder,
        fanins: &[Link],
        op: impl Fn(&Self, &mut SubnetBuilder, Link, Link) -> Link,
    ) -> Link {
        let mut acc = fanins[0];
        for &next in &fanins[1..] {
            acc = op(self, new, acc, next);
        }
        acc
    }

    fn map_cell(&self, new: &mut SubnetBuilder, symbol: CellSymbol, fanins: &[Link]) -> Link {
        match symbol {
            CellSymbol::Zero => new.add_cell(CellSymbol::Zero, &[]),
            CellSymbol::One => new.add_cell(CellSymbol::One, &[]),
            CellSymbol::Buf | CellSymbol::Not => new.add_cell(CellSymbol::Buf, &[fanins[0]]),
            CellSymbol::And => self.fold(new, fanins, Self::and2),
            CellSymbol::Nand => !self.fold(new, fanins, Self::and2),
            CellSymbol::Or => self.fold(new, fanins, Self::or2),
            CellSymbol::Nor => !self.fold(new, fanins, Self::or2),
            CellSymbol::Xor => self.fold(new, fanins, Self::xor2),
            CellSymbol::Xnor => !self.fold(new, fanins, Self::xor2),
            CellSymbol::Maj => {
                assert_eq!(fanins.len(), 3, "premapping covers 3-input majorities");
                self.maj3(new, fanins[0], fanins[1], fanins[2])
            }
            CellSymbol::Mux2 => {
                let high = self.and2(new, fanins[0], fanins[1]);
                let low = self.and2(new, !fanins[0], fanins[2]);
                self.or2(new, high, low)
            }
            other => panic!("cell symbol {other:?} has no premapping rule"),
        }
    }
}

impl SubnetTransform for Premapper {
    fn name(&self) -> &str {
        match self.basis {
            Basis::Aig => "aig",
            Basis::Xag => "xag",
            Basis::Mig => "mig",
            Basis::Xmg => "xmg",
        }
    }

    fn transform(&self, builder: &mut SubnetBuilder) {
        let mut new = SubnetBuilder::new();
        let mut map: Vec<Option<Link>> = vec![None; builder.len()];
        for &input in builder.inputs() {
            map[input] = Some(new.add_input());
        }
        for entry in builder.iter_order().collect::<Vec<_>>() {
            let symbol = builder.symbol(entry);
            if symbol == CellSymbol::In || symbol == CellSymbol::Out {
                continue;
            }
            let fanins: Vec<Link> = builder
                .links_of(entry)
                .iter()
                .map(|l| {
                    let m = map[l.idx()].expect("topological order");
                    m.with_inv(m.is_inv() ^ l.is_inv())
                })
                .collect();
            if symbol.is_sequential() || symbol == CellSymbol::Undef {
                // State-holding and library cells pass through untouched.
                let link = match builder.type_id(entry) {
                    Some(type_id) => new.add_typed_cell(symbol, type_id, &fanins),
                    None => new.add_cell(symbol, &fanins),
                };
                map[entry] = Some(link);
                continue;
            }
            map[entry] = Some(self.map_cell(&mut new, symbol, &fanins));
        }
        for &out in builder.outputs() {
            let driver = builder.links_of(out)[0];
            let mapped = map[driver.idx()].expect("driver mapped");
            new.add_output(mapped.with_inv(mapped.is_inv() ^ driver.is_inv()));
        }
        *builder = new;
    }
}
