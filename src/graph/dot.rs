//! Serialize a [`Graph`] to DOT text.

use super::{Attrs, Graph, RegionId};

/// Generate the DOT source for `graph`, 2-space indented, with every region
/// written as a nested `subgraph` holding its own nodes and edges.
pub fn to_dot(graph: &Graph) -> String {
    let mut out = String::with_capacity(4096);
    if graph.strict {
        out.push_str("strict ");
    }
    out.push_str("digraph ");
    out.push_str(&quote(graph.name()));
    out.push_str(" {\n");
    write_region_body(&mut out, graph, graph.root(), 1);
    out.push_str("}\n");
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

/// Quote and escape an ID or attribute value. Newlines become the DOT
/// escape `\n`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn attr_list(attrs: &Attrs) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let items: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!("{}={}", k, quote(v)))
        .collect();
    format!(" [{}]", items.join(", "))
}

fn write_region_body(out: &mut String, graph: &Graph, id: RegionId, level: usize) {
    let region = graph.region(id);
    for (k, v) in &region.attrs {
        indent(out, level);
        out.push_str(&format!("{}={};\n", k, quote(v)));
    }
    for name in &region.nodes {
        if let Some(node) = graph.node(name) {
            indent(out, level);
            out.push_str(&quote(name));
            out.push_str(&attr_list(&node.attrs));
            out.push_str(";\n");
        }
    }
    for child in &region.children {
        indent(out, level);
        out.push_str("subgraph ");
        out.push_str(&quote(&graph.region(*child).name));
        out.push_str(" {\n");
        write_region_body(out, graph, *child, level + 1);
        indent(out, level);
        out.push_str("}\n");
    }
    for &e in &region.edges {
        let edge = &graph.edges()[e];
        indent(out, level);
        out.push_str(&format!(
            "{} -> {}{};\n",
            quote(&edge.tail),
            quote(&edge.head),
            attr_list(&edge.attrs)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::attrs;

    #[test]
    fn escapes_quotes_backslashes_and_newlines() {
        assert_eq!(quote("a\"b\\c\nd"), r#""a\"b\\c\nd""#);
    }

    #[test]
    fn writes_nested_subgraphs_nodes_and_edges() {
        let mut g = Graph::new("top", true, attrs([("rankdir", "LR")]));
        let c = g.add_subgraph(g.root(), "cluster_top", attrs([("label", "top")]));
        g.add_node(c, "top@p", attrs([("shape", "record"), ("label", "{ a\nb }")]));
        g.add_edge(c, "top@x", "top@p", attrs([("headport", "i:w")]));
        let dot = to_dot(&g);
        let expected = r#"strict digraph "top" {
  rankdir="LR";
  subgraph "cluster_top" {
    label="top";
    "top@p" [shape="record", label="{ a\nb }"];
    "top@x";
    "top@x" -> "top@p" [headport="i:w"];
  }
}
"#;
        assert_eq!(dot, expected);
    }
}
