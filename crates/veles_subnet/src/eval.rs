//! Truth-table evaluation of subnets and views.

use crate::builder::SubnetBuilder;
use crate::subnet::{Link, Subnet};
use crate::symbol::CellSymbol;
use crate::view::SubnetView;
use veles_tt::TruthTable;

fn fanin_table(tables: &[Option<TruthTable>], link: Link) -> TruthTable {
    let tt = tables[link.idx()]
        .as_ref()
        .expect("fanin evaluated before use");
    if link.is_inv() {
        !tt
    } else {
        tt.clone()
    }
}

fn combine(symbol: CellSymbol, fanins: &[TruthTable], vars: u32) -> TruthTable {
    match symbol {
        CellSymbol::Zero => TruthTable::zeros(vars),
        CellSymbol::One => TruthTable::ones(vars),
        CellSymbol::Buf | CellSymbol::Not | CellSymbol::Out => fanins[0].clone(),
        CellSymbol::And | CellSymbol::Nand => {
            let mut tt = fanins[0].clone();
            for f in &fanins[1..] {
                tt = &tt & f;
            }
            if symbol == CellSymbol::Nand {
                !tt
            } else {
                tt
            }
        }
        CellSymbol::Or | CellSymbol::Nor => {
            let mut tt = fanins[0].clone();
            for f in &fanins[1..] {
                tt = &tt | f;
            }
            if symbol == CellSymbol::Nor {
                !tt
            } else {
                tt
            }
        }
        CellSymbol::Xor | CellSymbol::Xnor => {
            let mut tt = fanins[0].clone();
            for f in &fanins[1..] {
                tt = &tt ^ f;
            }
            if symbol == CellSymbol::Xnor {
                !tt
            } else {
                tt
            }
        }
        CellSymbol::Maj => {
            if fanins.len() == 3 {
                return TruthTable::maj3(&fanins[0], &fanins[1], &fanins[2]);
            }
            let threshold = fanins.len() / 2;
            let mut tt = TruthTable::zeros(vars);
            for i in 0..tt.num_bits() {
                let count = fanins.iter().filter(|f| f.get_bit(i)).count();
                if count > threshold {
                    tt.set_bit(i);
                }
            }
            tt
        }
        CellSymbol::Mux2 => {
            // (select, a, b): select ? a : b.
            let (s, a, b) = (&fanins[0], &fanins[1], &fanins[2]);
            &(s & a) | &(&!s & b)
        }
        other => panic!("cell symbol {other:?} is not combinationally evaluable"),
    }
}

/// Evaluates a subnet, returning one truth table per output over the
/// subnet's primary inputs.
pub fn evaluate(subnet: &Subnet) -> Vec<TruthTable> {
    let vars = subnet.input_count() as u32;
    let mut tables: Vec<Option<TruthTable>> = vec![None; subnet.size()];
    for (idx, cell) in subnet.iter() {
        let table = if cell.symbol == CellSymbol::In {
            TruthTable::nth_var(vars, idx as u32)
        } else {
            let fanins: Vec<TruthTable> = subnet
                .links_of(idx)
                .iter()
                .map(|&l| fanin_table(&tables, l))
                .collect();
            combine(cell.symbol, &fanins, vars)
        };
        tables[idx] = Some(table);
    }
    (0..subnet.output_count())
        .map(|j| tables[subnet.output(j)].clone().expect("output evaluated"))
        .collect()
}

/// Evaluates a single-output subnet.
///
/// # Panics
///
/// Panics if the subnet has more than one output.
pub fn evaluate_single_out(subnet: &Subnet) -> TruthTable {
    assert_eq!(subnet.output_count(), 1, "subnet must have a single output");
    evaluate(subnet).pop().expect("one output")
}

/// Evaluates a view cone over its own input frontier: frontier entry `i`
/// becomes elementary variable `i`.
pub fn evaluate_view(builder: &SubnetBuilder, view: &SubnetView) -> Vec<TruthTable> {
    let vars = view.input_count() as u32;
    let cone = view.cone(builder);
    let mut tables: std::collections::HashMap<usize, TruthTable> = std::collections::HashMap::new();
    for (i, &input) in view.inputs().iter().enumerate() {
        tables.insert(input, TruthTable::nth_var(vars, i as u32));
    }
    for &entry in &cone {
        if tables.contains_key(&entry) {
            continue;
        }
        let fanins: Vec<TruthTable> = builder
            .links_of(entry)
            .iter()
            .map(|&l| {
                let tt = &tables[&l.idx()];
                if l.is_inv() {
                    !tt
                } else {
                    tt.clone()
                }
            })
            .collect();
        let table = combine(builder.symbol(entry), &fanins, vars);
        tables.insert(entry, table);
    }
    view.outputs()
        .iter()
        .map(|root| tables[root].clone())
        .collect()
}
