//! Depth-aware balancing of associative operator trees.

use crate::transform::SubnetTransform;
use veles_subnet::{CellSymbol, Link, SubnetBuilder};

/// The `b` pass: re-associates AND/OR/XOR chains into depth-balanced
/// binary trees.
///
/// Maximal same-operator chains whose interior nodes have a single fanout
/// are flattened into one operand list, then rebuilt by repeatedly
/// combining the two shallowest operands, so late-arriving signals meet as
/// few gates as possible. The result replaces the builder only when the
/// critical path did not get worse.
pub struct Balancer;

impl Balancer {
    /// Collects the operand leaves of a maximal `symbol` chain rooted at
    /// `entry`. Interior nodes must be single-fanout cells of the same
    /// symbol; inversion on a link stops the flattening (the polarity
    /// belongs to the operand).
    fn flatten(
        builder: &SubnetBuilder,
        symbol: CellSymbol,
        link: Link,
        operands: &mut Vec<Link>,
    ) {
        let target = link.idx();
        if !link.is_inv()
            && builder.symbol(target) == symbol
            && builder.refcount(target) == 1
        {
            for &inner in builder.links_of(target) {
                Self::flatten(builder, symbol, inner, operands);
            }
        } else {
            operands.push(link);
        }
    }

    fn rebuild(
        old: &SubnetBuilder,
        new: &mut SubnetBuilder,
        map: &mut Vec<Option<Link>>,
        entry: usize,
    ) -> Link {
        if let Some(link) = map[entry] {
            return link;
        }
        let symbol = old.symbol(entry);
        let link = match symbol {
            CellSymbol::And | CellSymbol::Or | CellSymbol::Xor => {
                let mut operands = Vec::new();
                for &fanin in old.links_of(entry) {
                    Self::flatten(old, symbol, fanin, &mut operands);
                }
                let mut mapped: Vec<Link> = operands
                    .iter()
                    .map(|l| {
                        let m = Self::rebuild(old, new, map, l.idx());
                        m.with_inv(m.is_inv() ^ l.is_inv())
                    })
                    .collect();
                // Huffman-style combining: the two shallowest first.
                while mapped.len() > 2 {
                    mapped.sort_by_key(|l| std::cmp::Reverse(new.depth(l.idx())));
                    let a = mapped.pop().expect("two operands");
                    let b = mapped.pop().expect("two operands");
                    mapped.push(new.add_cell(symbol, &[a, b]));
                }
                new.add_cell(symbol, &mapped)
            }
            _ => {
                let fanins: Vec<Link> = old
                    .links_of(entry)
                    .iter()
                    .map(|l| {
                        let m = Self::rebuild(old, new, map, l.idx());
                        m.with_inv(m.is_inv() ^ l.is_inv())
                    })
                    .collect();
                match old.type_id(entry) {
                    Some(type_id) => new.add_typed_cell(symbol, type_id, &fanins),
                    None => new.add_cell(symbol, &fanins),
                }
            }
        };
        map[entry] = Some(link);
        link
    }
}

impl SubnetTransform for Balancer {
    fn name(&self) -> &str {
        "b"
    }

    fn transform(&self, builder: &mut SubnetBuilder) {
        let mut new = SubnetBuilder::new();
        new.set_tech_mapped(builder.is_tech_mapped());
        let mut map: Vec<Option<Link>> = vec![None; builder.len()];
        for &input in builder.inputs() {
            map[input] = Some(new.add_input());
        }
        let outputs: Vec<(usize, Link)> = builder
            .outputs()
            .iter()
            .map(|&out| {
                let driver = builder.links_of(out)[0];
                let mapped = Self::rebuild(builder, &mut new, &mut map, driver.idx());
                (out, mapped.with_inv(mapped.is_inv() ^ driver.is_inv()))
            })
            .collect();
        for (_, link) in outputs {
            new.add_output(link);
        }

        if new.max_depth() <= builder.max_depth() {
            *builder = new;
        }
    }
}
