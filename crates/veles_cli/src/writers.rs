//! Design emitters: structural Verilog, DOT, dataflow, and debug dumps.

use std::fmt::Write as _;
use veles_subnet::{CellSymbol, CellTypeDb, DesignBuilder, Subnet};

fn wire_name(subnet: &Subnet, idx: usize) -> String {
    match subnet.cell(idx).symbol {
        CellSymbol::In => format!("pi{idx}"),
        CellSymbol::Out => format!("po{idx}"),
        _ => format!("n{idx}"),
    }
}

fn operand(subnet: &Subnet, link: veles_subnet::Link) -> String {
    let name = wire_name(subnet, link.idx());
    if link.is_inv() {
        format!("~{name}")
    } else {
        name
    }
}

fn verilog_expr(subnet: &Subnet, idx: usize) -> Option<String> {
    let cell = subnet.cell(idx);
    let links = subnet.links_of(idx);
    let operands: Vec<String> = links.iter().map(|&l| operand(subnet, l)).collect();
    let joined = |op: &str| operands.join(&format!(" {op} "));
    let expr = match cell.symbol {
        CellSymbol::Zero => "1'b0".to_string(),
        CellSymbol::One => "1'b1".to_string(),
        CellSymbol::Buf | CellSymbol::Not => operands[0].clone(),
        CellSymbol::And => joined("&"),
        CellSymbol::Nand => format!("~({})", joined("&")),
        CellSymbol::Or => joined("|"),
        CellSymbol::Nor => format!("~({})", joined("|")),
        CellSymbol::Xor => joined("^"),
        CellSymbol::Xnor => format!("~({})", joined("^")),
        CellSymbol::Maj if links.len() == 3 => format!(
            "({a} & {b}) | ({a} & {c}) | ({b} & {c})",
            a = operands[0],
            b = operands[1],
            c = operands[2]
        ),
        CellSymbol::Mux2 => format!(
            "{s} ? {a} : {b}",
            s = operands[0],
            a = operands[1],
            b = operands[2]
        ),
        _ => return None,
    };
    Some(expr)
}

/// Emits one subnet as a structural Verilog module.
pub fn write_verilog(subnet: &Subnet, name: &str, db: &CellTypeDb) -> String {
    let mut out = String::new();
    let inputs: Vec<String> = (0..subnet.input_count())
        .map(|i| wire_name(subnet, subnet.input(i)))
        .collect();
    let outputs: Vec<String> = (0..subnet.output_count())
        .map(|j| wire_name(subnet, subnet.output(j)))
        .collect();
    let mut ports = inputs.clone();
    ports.extend(outputs.iter().cloned());

    let _ = writeln!(out, "module {name} ({});", ports.join(", "));
    for input in &inputs {
        let _ = writeln!(out, "  input {input};");
    }
    for output in &outputs {
        let _ = writeln!(out, "  output {output};");
    }
    for (idx, cell) in subnet.iter() {
        if cell.symbol == CellSymbol::In || cell.symbol == CellSymbol::Out {
            continue;
        }
        let _ = writeln!(out, "  wire {};", wire_name(subnet, idx));
    }
    for (idx, cell) in subnet.iter() {
        match cell.symbol {
            CellSymbol::In => {}
            CellSymbol::Out => {
                let driver = operand(subnet, subnet.links_of(idx)[0]);
                let _ = writeln!(out, "  assign {} = {};", wire_name(subnet, idx), driver);
            }
            CellSymbol::Undef => {
                let type_name = cell
                    .type_id
                    .map(|id| db.get(id).name.clone())
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                let pins: Vec<String> = subnet
                    .links_of(idx)
                    .iter()
                    .enumerate()
                    .map(|(i, &l)| format!(".I{i}({})", operand(subnet, l)))
                    .collect();
                let _ = writeln!(
                    out,
                    "  {type_name} u{idx} ({}, .Y({}));",
                    pins.join(", "),
                    wire_name(subnet, idx)
                );
            }
            _ => {
                if let Some(expr) = verilog_expr(subnet, idx) {
                    let _ =
                        writeln!(out, "  assign {} = {};", wire_name(subnet, idx), expr);
                }
            }
        }
    }
    let _ = writeln!(out, "endmodule");
    out
}

/// Emits one subnet as a DOT digraph; inverted links are dashed.
pub fn write_dot(subnet: &Subnet, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph \"{name}\" {{");
    let _ = writeln!(out, "  rankdir=LR;");
    for (idx, cell) in subnet.iter() {
        let shape = match cell.symbol {
            CellSymbol::In => "triangle",
            CellSymbol::Out => "invtriangle",
            _ => "box",
        };
        let _ = writeln!(
            out,
            "  n{idx} [label=\"{:?} {idx}\", shape={shape}];",
            cell.symbol
        );
    }
    for (idx, _) in subnet.iter() {
        for link in subnet.links_of(idx) {
            let style = if link.is_inv() { " [style=dashed]" } else { "" };
            let _ = writeln!(out, "  n{} -> n{idx}{style};", link.idx());
        }
    }
    let _ = writeln!(out, "}}");
    out
}

/// Emits the dataflow listing: one line per entry with its fanins.
pub fn write_dataflow(design: &DesignBuilder) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "design {}", design.name());
    for i in 0..design.subnet_count() {
        let subnet = design.builder(i).make(false);
        let _ = writeln!(out, "subnet {i}:");
        for (idx, cell) in subnet.iter() {
            let fanins: Vec<String> = subnet
                .links_of(idx)
                .iter()
                .map(|&l| operand(&subnet, l))
                .collect();
            let _ = writeln!(
                out,
                "  {:>4}  {:<8} {}",
                idx,
                format!("{:?}", cell.symbol),
                fanins.join(" ")
            );
        }
    }
    out
}

/// Emits a JSON debug dump of every subnet.
pub fn write_debug(design: &DesignBuilder) -> String {
    let subnets: Vec<Subnet> = (0..design.subnet_count())
        .map(|i| design.builder(i).make(false))
        .collect();
    serde_json::to_string_pretty(&serde_json::json!({
        "design": design.name(),
        "subnets": subnets,
        "points": design.list_points(),
    }))
    .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}
