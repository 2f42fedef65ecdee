//! A tolerant GraphML reader for gate-level netlists.
//!
//! The accepted schema is the benchmark interchange form: `node` elements
//! carrying a `type` data key naming the cell symbol, and directed `edge`
//! elements whose appearance order fixes the fanin order. An edge may
//! carry an `inverted` data key.

use std::collections::HashMap;
use veles_common::{Ident, Interner};
use veles_subnet::{CellSymbol, Link, Subnet, SubnetBuilder};

/// Errors raised while reading a GraphML netlist.
#[derive(Debug, thiserror::Error)]
pub enum GraphmlError {
    /// The XML structure is broken.
    #[error("malformed graphml: {0}")]
    Malformed(String),
    /// A node carries an unknown cell type.
    #[error("unknown cell type '{0}'")]
    UnknownType(String),
    /// An edge references an undeclared node.
    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),
    /// The netlist has a combinational cycle.
    #[error("the netlist is cyclic")]
    Cyclic,
}

#[derive(Debug)]
struct Tag {
    name: String,
    attrs: HashMap<String, String>,
    text: String,
}

/// A scanned element: the tag, its attributes, and the `data` children
/// keyed by their `key` attribute.
#[derive(Debug)]
struct Element {
    tag: Tag,
    data: HashMap<String, String>,
}

fn scan_tag(source: &str, at: &mut usize) -> Option<Tag> {
    let open = source[*at..].find('<')? + *at;
    let close = source[open..].find('>')? + open;
    *at = close + 1;
    let inner = &source[open + 1..close];
    let inner = inner.trim_end_matches('/').trim();
    let mut parts = inner.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_string();
    let mut attrs = HashMap::new();
    if let Some(rest) = parts.next() {
        let mut rest = rest;
        while let Some(eq) = rest.find('=') {
            let key = rest[..eq].trim().to_string();
            let tail = rest[eq + 1..].trim_start();
            let Some(quote) = tail.chars().next() else {
                break;
            };
            if quote != '"' && quote != '\'' {
                break;
            }
            let Some(end) = tail[1..].find(quote) else {
                break;
            };
            attrs.insert(key, tail[1..1 + end].to_string());
            rest = &tail[end + 2..];
        }
    }
    // Capture the text up to the next tag, for <data>value</data>.
    let text_end = source[*at..].find('<').map(|p| p + *at).unwrap_or(*at);
    let text = source[*at..text_end].trim().to_string();
    Some(Tag { name, attrs, text })
}

fn scan_elements(source: &str) -> Result<Vec<Element>, GraphmlError> {
    let mut elements: Vec<Element> = Vec::new();
    let mut at = 0usize;
    let mut open: Option<Element> = None;
    while let Some(tag) = scan_tag(source, &mut at) {
        match tag.name.as_str() {
            "node" | "edge" => {
                if let Some(done) = open.take() {
                    elements.push(done);
                }
                open = Some(Element {
                    tag,
                    data: HashMap::new(),
                });
            }
            "data" => {
                if let Some(element) = open.as_mut() {
                    if let Some(key) = tag.attrs.get("key") {
                        element.data.insert(key.clone(), tag.text.clone());
                    }
                }
            }
            "/node" | "/edge" | "/graph" | "/graphml" => {
                if let Some(done) = open.take() {
                    elements.push(done);
                }
            }
            _ => {}
        }
    }
    if let Some(done) = open.take() {
        elements.push(done);
    }
    Ok(elements)
}

/// Parses a GraphML netlist into a subnet and the graph's declared name.
pub fn parse_graphml(source: &str) -> Result<(Subnet, String), GraphmlError> {
    let name = {
        let mut at = 0usize;
        let mut found = "design".to_string();
        while let Some(tag) = scan_tag(source, &mut at) {
            if tag.name == "graph" {
                if let Some(id) = tag.attrs.get("id") {
                    found = id.clone();
                }
                break;
            }
        }
        found
    };

    let elements = scan_elements(source)?;
    // Node ids repeat once per edge endpoint; interning keeps the maps on
    // u32 keys instead of strings.
    let names = Interner::new();

    // First pass: declared nodes with their symbols.
    let mut symbols: HashMap<Ident, CellSymbol> = HashMap::new();
    let mut node_order: Vec<Ident> = Vec::new();
    for element in &elements {
        if element.tag.name != "node" {
            continue;
        }
        let id = element
            .tag
            .attrs
            .get("id")
            .ok_or_else(|| GraphmlError::Malformed("node without id".to_string()))?;
        let id = names.get_or_intern(id);
        let kind = element
            .data
            .get("type")
            .or_else(|| element.data.get("gate"))
            .cloned()
            .unwrap_or_else(|| "AND".to_string());
        let symbol =
            CellSymbol::parse(&kind).ok_or_else(|| GraphmlError::UnknownType(kind.clone()))?;
        symbols.insert(id, symbol);
        node_order.push(id);
    }

    // Second pass: fanins in edge order.
    let mut fanins: HashMap<Ident, Vec<(Ident, bool)>> = HashMap::new();
    for element in &elements {
        if element.tag.name != "edge" {
            continue;
        }
        let source_id = element
            .tag
            .attrs
            .get("source")
            .ok_or_else(|| GraphmlError::Malformed("edge without source".to_string()))?;
        let target_id = element
            .tag
            .attrs
            .get("target")
            .ok_or_else(|| GraphmlError::Malformed("edge without target".to_string()))?;
        let (source_id, target_id) = (
            names.get_or_intern(source_id),
            names.get_or_intern(target_id),
        );
        for id in [source_id, target_id] {
            if !symbols.contains_key(&id) {
                return Err(GraphmlError::UnknownNode(names.resolve(id).to_string()));
            }
        }
        let inverted = element
            .data
            .get("inverted")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        fanins
            .entry(target_id)
            .or_default()
            .push((source_id, inverted));
    }

    // Kahn's topological order over the node set.
    let mut indegree: HashMap<Ident, usize> = node_order
        .iter()
        .map(|&id| (id, fanins.get(&id).map_or(0, |f| f.len())))
        .collect();
    let mut ready: Vec<Ident> = node_order
        .iter()
        .copied()
        .filter(|id| indegree[id] == 0)
        .collect();
    ready.reverse();
    let mut consumers: HashMap<Ident, Vec<Ident>> = HashMap::new();
    for (&target, sources) in &fanins {
        for &(source, _) in sources {
            consumers.entry(source).or_default().push(target);
        }
    }
    let mut order: Vec<Ident> = Vec::with_capacity(node_order.len());
    while let Some(id) = ready.pop() {
        order.push(id);
        for &consumer in consumers.get(&id).map(|v| v.as_slice()).unwrap_or(&[]) {
            let count = indegree.get_mut(&consumer).expect("declared node");
            *count -= 1;
            if *count == 0 {
                ready.push(consumer);
            }
        }
    }
    if order.len() != node_order.len() {
        return Err(GraphmlError::Cyclic);
    }

    // Emit.
    let mut builder = SubnetBuilder::new();
    let mut links: HashMap<Ident, Link> = HashMap::new();
    for id in order {
        let symbol = symbols[&id];
        let mut node_fanins: Vec<Link> = Vec::new();
        if let Some(list) = fanins.get(&id) {
            for &(source, inverted) in list {
                let link = *links.get(&source).ok_or_else(|| {
                    GraphmlError::Malformed(format!(
                        "'{}' cannot drive a fanin",
                        names.resolve(source)
                    ))
                })?;
                node_fanins.push(link.with_inv(link.is_inv() ^ inverted));
            }
        }
        let link = match symbol {
            CellSymbol::In => builder.add_input(),
            CellSymbol::Out => {
                let driver = *node_fanins.first().ok_or_else(|| {
                    GraphmlError::Malformed(format!(
                        "output '{}' has no driver",
                        names.resolve(id)
                    ))
                })?;
                builder.add_output(driver);
                continue;
            }
            _ => builder.add_cell(symbol, &node_fanins),
        };
        links.insert(id, link);
    }
    Ok((builder.make(false), name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::eval::evaluate_single_out;

    const AND_GATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <graph id="and2" edgedefault="directed">
    <node id="a"><data key="type">IN</data></node>
    <node id="b"><data key="type">IN</data></node>
    <node id="g"><data key="type">AND</data></node>
    <node id="y"><data key="type">OUT</data></node>
    <edge source="a" target="g"/>
    <edge source="b" target="g"/>
    <edge source="g" target="y"/>
  </graph>
</graphml>
"#;

    #[test]
    fn parses_an_and_gate() {
        let (subnet, name) = parse_graphml(AND_GATE).unwrap();
        assert_eq!(name, "and2");
        assert_eq!(subnet.input_count(), 2);
        assert_eq!(subnet.output_count(), 1);
        assert_eq!(evaluate_single_out(&subnet).to_binary_string(), "1000");
    }

    #[test]
    fn inverted_edges_apply() {
        let source = r#"
<graphml><graph id="inv" edgedefault="directed">
  <node id="a"><data key="type">IN</data></node>
  <node id="b"><data key="type">IN</data></node>
  <node id="g"><data key="type">OR</data></node>
  <node id="y"><data key="type">OUT</data></node>
  <edge source="a" target="g"><data key="inverted">true</data></edge>
  <edge source="b" target="g"/>
  <edge source="g" target="y"/>
</graph></graphml>"#;
        let (subnet, _) = parse_graphml(source).unwrap();
        // ~a | b
        assert_eq!(evaluate_single_out(&subnet).to_binary_string(), "1101");
    }

    #[test]
    fn out_of_order_nodes_sort_topologically() {
        let source = r#"
<graphml><graph id="x" edgedefault="directed">
  <node id="y"><data key="type">OUT</data></node>
  <node id="g"><data key="type">XOR</data></node>
  <node id="a"><data key="type">IN</data></node>
  <node id="b"><data key="type">IN</data></node>
  <edge source="a" target="g"/>
  <edge source="b" target="g"/>
  <edge source="g" target="y"/>
</graph></graphml>"#;
        let (subnet, _) = parse_graphml(source).unwrap();
        assert_eq!(evaluate_single_out(&subnet).to_binary_string(), "0110");
    }

    #[test]
    fn unknown_type_is_an_error() {
        let source = r#"<graphml><graph id="x">
  <node id="a"><data key="type">FROB</data></node>
</graph></graphml>"#;
        assert!(matches!(
            parse_graphml(source),
            Err(GraphmlError::UnknownType(_))
        ));
    }

    #[test]
    fn cyclic_netlist_rejected() {
        let source = r#"<graphml><graph id="x">
  <node id="p"><data key="type">AND</data></node>
  <node id="q"><data key="type">AND</data></node>
  <edge source="p" target="q"/>
  <edge source="q" target="p"/>
</graph></graphml>"#;
        assert!(matches!(parse_graphml(source), Err(GraphmlError::Cyclic)));
    }

    #[test]
    fn dangling_edge_rejected() {
        let source = r#"<graphml><graph id="x">
  <node id="a"><data key="type">IN</data></node>
  <edge source="a" target="ghost"/>
</graph></graphml>"#;
        assert!(matches!(
            parse_graphml(source),
            Err(GraphmlError::UnknownNode(_))
        ));
    }
}
