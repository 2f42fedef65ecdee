//! Akers majority synthesis: greedy column covering over a reduced table.

use crate::Synthesizer;
use veles_subnet::{CellSymbol, Link, Subnet, SubnetBuilder};
use veles_tt::TruthTable;

/// Cap on MAJ gates emitted by one greedy covering phase.
const MAX_GATES: usize = 24;

/// A majority-basis expression built during synthesis and lowered to the
/// builder at the end. Inversions ride on links.
#[derive(Clone, Debug)]
enum MajExpr {
    Const(bool),
    Lit(u32, bool),
    Maj(Box<[MajExpr; 3]>),
}

/// MAJ-basis synthesis after Akers.
///
/// The reduced table has one row per care minterm and one column per
/// signal already available (constants, literals, emitted MAJ gates). Each
/// greedy step emits the majority of the column triple leaving the fewest
/// essential (still-uncovered) rows, so coverage strictly grows. When no
/// triple improves coverage the function is split by a Shannon step in the
/// MAJ basis and both cofactors are covered recursively.
#[derive(Default)]
pub struct AkersSynthesizer;

struct Column {
    table: TruthTable,
    expr: MajExpr,
}

fn agreement(table: &TruthTable, func: &TruthTable, care: &TruthTable) -> u32 {
    (&!&(table ^ func) & care).count_ones()
}

fn base_columns(n: u32) -> Vec<Column> {
    let mut columns = vec![
        Column {
            table: TruthTable::zeros(n),
            expr: MajExpr::Const(false),
        },
        Column {
            table: TruthTable::ones(n),
            expr: MajExpr::Const(true),
        },
    ];
    for i in 0..n {
        let var = TruthTable::nth_var(n, i);
        columns.push(Column {
            table: var.clone(),
            expr: MajExpr::Lit(i, false),
        });
        columns.push(Column {
            table: !&var,
            expr: MajExpr::Lit(i, true),
        });
    }
    columns
}

fn synthesize_expr(func: &TruthTable, care: &TruthTable) -> MajExpr {
    let n = func.num_vars();
    let full = care.count_ones();
    if full == 0 {
        return MajExpr::Const(false);
    }
    let mut columns = base_columns(n);

    for column in &columns {
        if agreement(&column.table, func, care) == full {
            return column.expr.clone();
        }
    }

    let mut best_covered: u32 = columns
        .iter()
        .map(|c| agreement(&c.table, func, care))
        .max()
        .unwrap_or(0);

    for _ in 0..MAX_GATES {
        let mut best: Option<(u32, usize, usize, usize)> = None;
        for a in 0..columns.len() {
            for b in a + 1..columns.len() {
                for c in b + 1..columns.len() {
                    let maj = TruthTable::maj3(
                        &columns[a].table,
                        &columns[b].table,
                        &columns[c].table,
                    );
                    let covered = agreement(&maj, func, care);
                    if covered <= best_covered {
                        continue;
                    }
                    if best.map(|(score, ..)| covered > score).unwrap_or(true) {
                        best = Some((covered, a, b, c));
                    }
                }
            }
        }
        let Some((covered, a, b, c)) = best else {
            break;
        };
        let table = TruthTable::maj3(&columns[a].table, &columns[b].table, &columns[c].table);
        let expr = MajExpr::Maj(Box::new([
            columns[a].expr.clone(),
            columns[b].expr.clone(),
            columns[c].expr.clone(),
        ]));
        if covered == full {
            return expr;
        }
        best_covered = covered;
        columns.push(Column { table, expr });
    }

    // Covering stalled: Shannon step in the MAJ basis,
    // f = (x & f1) | (~x & f0) with AND/OR spelled as majorities.
    let var = (0..n)
        .max_by_key(|&v| {
            let sens = func.cofactor(v, false) ^ func.cofactor(v, true);
            (&sens & care).count_ones()
        })
        .expect("non-constant function has a support");
    let f0 = synthesize_expr(&func.cofactor(var, false), &care.cofactor(var, false));
    let f1 = synthesize_expr(&func.cofactor(var, true), &care.cofactor(var, true));
    let low = MajExpr::Maj(Box::new([
        MajExpr::Lit(var, true),
        MajExpr::Const(false),
        f0,
    ]));
    let high = MajExpr::Maj(Box::new([
        MajExpr::Lit(var, false),
        MajExpr::Const(false),
        f1,
    ]));
    MajExpr::Maj(Box::new([low, high, MajExpr::Const(true)]))
}

fn lower(expr: &MajExpr, builder: &mut SubnetBuilder, inputs: &[Link]) -> Link {
    match expr {
        MajExpr::Const(false) => builder.add_cell(CellSymbol::Zero, &[]),
        MajExpr::Const(true) => builder.add_cell(CellSymbol::One, &[]),
        MajExpr::Lit(v, inv) => inputs[*v as usize].with_inv(*inv),
        MajExpr::Maj(args) => {
            let a = lower(&args[0], builder, inputs);
            let b = lower(&args[1], builder, inputs);
            let c = lower(&args[2], builder, inputs);
            builder.add_cell(CellSymbol::Maj, &[a, b, c])
        }
    }
}

impl Synthesizer for AkersSynthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        care: &TruthTable,
        _max_arity: usize,
    ) -> Option<Subnet> {
        let expr = synthesize_expr(func, care);
        let mut builder = SubnetBuilder::new();
        let inputs = builder.add_inputs(func.num_vars() as usize);
        let out = lower(&expr, &mut builder, &inputs);
        builder.add_output(out);
        Some(builder.make(true))
    }
}
