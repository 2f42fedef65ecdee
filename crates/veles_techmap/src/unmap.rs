//! Undoing a technology mapping by inlining cell implementations.

use veles_subnet::{CellSymbol, CellTypeDb, Link, SubnetBuilder};

/// Rebuilds a tech-mapped builder with every cell whose type carries an
/// implementation subnet inlined recursively. The result is a plain
/// technology-independent netlist ready for further optimization.
pub fn unmap(builder: &SubnetBuilder, db: &CellTypeDb) -> SubnetBuilder {
    let mut new = SubnetBuilder::new();
    new.set_tech_mapped(false);
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
        let link = match builder.type_id(entry) {
            Some(type_id) if db.get(type_id).has_impl() => {
                new.add_cell_recursively(type_id, &fanins, db)[0]
            }
            Some(type_id) => new.add_typed_cell(symbol, type_id, &fanins),
            None => new.add_cell(symbol, &fanins),
        };
        map[entry] = Some(link);
    }
    for &out in builder.outputs() {
        let driver = builder.links_of(out)[0];
        let mapped = map[driver.idx()].expect("driver mapped");
        new.add_output(mapped.with_inv(mapped.is_inv() ^ driver.is_inv()));
    }
    new
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::eval::evaluate_single_out;
    use veles_subnet::{CellType, CellTypeAttrs};

    #[test]
    fn inlines_implementation_subnets() {
        // A hand-made AND2 type with an implementation.
        let mut impl_builder = SubnetBuilder::new();
        let a = impl_builder.add_input();
        let b = impl_builder.add_input();
        let and = impl_builder.add_cell(CellSymbol::And, &[a, b]);
        impl_builder.add_output(and);

        let mut db = CellTypeDb::new();
        let and2 = db.register(CellType {
            name: "AND2".to_string(),
            symbol: CellSymbol::Undef,
            n_inputs: 2,
            n_outputs: 1,
            in_widths: vec![],
            implementation: Some(impl_builder.make(true)),
            attrs: CellTypeAttrs {
                is_cell: true,
                ..Default::default()
            },
        });

        let mut mapped = SubnetBuilder::new();
        mapped.set_tech_mapped(true);
        let x = mapped.add_input();
        let y = mapped.add_input();
        let z = mapped.add_input();
        let first = mapped.add_typed_cell(CellSymbol::Undef, and2, &[x, y]);
        let second = mapped.add_typed_cell(CellSymbol::Undef, and2, &[first, z]);
        mapped.add_output(second);

        let plain = unmap(&mapped, &db);
        assert!(!plain.is_tech_mapped());
        let subnet = plain.make(true);
        for (_, cell) in subnet.iter() {
            assert_ne!(cell.symbol, CellSymbol::Undef, "all types inlined");
        }
        let tt = evaluate_single_out(&subnet);
        assert_eq!(tt.to_binary_string(), "10000000");
    }

    #[test]
    fn typed_cells_without_impl_survive() {
        let mut db = CellTypeDb::new();
        let hard = db.register(CellType {
            name: "HARD_MACRO".to_string(),
            symbol: CellSymbol::Undef,
            n_inputs: 1,
            n_outputs: 1,
            in_widths: vec![],
            implementation: None,
            attrs: CellTypeAttrs {
                is_hard: true,
                ..Default::default()
            },
        });

        let mut mapped = SubnetBuilder::new();
        let x = mapped.add_input();
        let cell = mapped.add_typed_cell(CellSymbol::Undef, hard, &[x]);
        mapped.add_output(cell);

        let plain = unmap(&mapped, &db);
        let subnet = plain.make(true);
        let kept = subnet
            .iter()
            .any(|(_, c)| c.symbol == CellSymbol::Undef && c.type_id == Some(hard));
        assert!(kept, "hard macros stay");
    }
}
