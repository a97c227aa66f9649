//! In-memory directed graph handed to Graphviz.
//!
//! Regions (the root graph and its nested subgraphs/clusters) live in an
//! arena and are addressed by [`RegionId`], so a region handle can be passed
//! down a recursive walk while the [`Graph`] itself is threaded as `&mut`.
//!
//! - [`dot`] – serialization to DOT text
//! - [`render`] – layout/rendering through an external Graphviz program

pub mod dot;
pub mod render;

use indexmap::IndexMap;
use serde::Serialize;

/// Ordered `key = value` attributes; insertion order is kept in the output.
pub type Attrs = IndexMap<String, String>;

/// Build [`Attrs`] from literal pairs, dropping empty values.
pub fn attrs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Attrs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .filter(|(_, v)| !v.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RegionId(usize);

#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub name: String,
    pub attrs: Attrs,
    pub parent: Option<RegionId>,
    pub children: Vec<RegionId>,
    /// Names of the nodes declared in this region, in insertion order.
    pub nodes: Vec<String>,
    /// Indices into [`Graph::edges`].
    pub edges: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub name: String,
    pub attrs: Attrs,
    pub region: RegionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub tail: String,
    pub head: String,
    pub attrs: Attrs,
}

#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    pub strict: bool,
    regions: Vec<Region>,
    nodes: IndexMap<String, Node>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new(name: impl Into<String>, strict: bool, attrs: Attrs) -> Self {
        Self {
            strict,
            regions: vec![Region {
                name: name.into(),
                attrs,
                parent: None,
                children: Vec::new(),
                nodes: Vec::new(),
                edges: Vec::new(),
            }],
            nodes: IndexMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn root(&self) -> RegionId {
        RegionId(0)
    }

    pub fn name(&self) -> &str {
        &self.regions[0].name
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.0]
    }

    pub fn find_region(&self, name: &str) -> Option<RegionId> {
        self.regions.iter().position(|r| r.name == name).map(RegionId)
    }

    /// Open a nested subgraph inside `parent`.
    pub fn add_subgraph(&mut self, parent: RegionId, name: impl Into<String>, attrs: Attrs) -> RegionId {
        let id = RegionId(self.regions.len());
        self.regions.push(Region {
            name: name.into(),
            attrs,
            parent: Some(parent),
            children: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        });
        self.regions[parent.0].children.push(id);
        id
    }

    /// Create a node in `region`, or merge `attrs` into an existing node of
    /// the same name (which keeps its original region).
    pub fn add_node(&mut self, region: RegionId, name: impl Into<String>, attrs: Attrs) {
        let name = name.into();
        if let Some(node) = self.nodes.get_mut(&name) {
            node.attrs.extend(attrs);
            return;
        }
        self.regions[region.0].nodes.push(name.clone());
        self.nodes.insert(name.clone(), Node { name, attrs, region });
    }

    /// Add an edge declared in `region`. Endpoints that do not exist yet are
    /// created there without attributes.
    pub fn add_edge(&mut self, region: RegionId, tail: impl Into<String>, head: impl Into<String>, attrs: Attrs) {
        let (tail, head) = (tail.into(), head.into());
        for end in [&tail, &head] {
            if !self.nodes.contains_key(end) {
                self.add_node(region, end.clone(), Attrs::new());
            }
        }
        self.regions[region.0].edges.push(self.edges.len());
        self.edges.push(Edge { tail, head, attrs });
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_are_unique_and_merge_attributes() {
        let mut g = Graph::new("g", true, Attrs::new());
        let sub = g.add_subgraph(g.root(), "cluster_a", Attrs::new());
        g.add_node(sub, "n", attrs([("shape", "record")]));
        g.add_node(g.root(), "n", attrs([("label", "x")]));
        let n = g.node("n").unwrap();
        assert_eq!(n.region, sub);
        assert_eq!(n.attrs.get("shape").map(String::as_str), Some("record"));
        assert_eq!(n.attrs.get("label").map(String::as_str), Some("x"));
        assert_eq!(g.nodes().count(), 1);
    }

    #[test]
    fn edges_create_missing_endpoints() {
        let mut g = Graph::new("g", true, Attrs::new());
        g.add_node(g.root(), "a", Attrs::new());
        g.add_edge(g.root(), "a", "b@p", Attrs::new());
        assert!(g.node("b@p").is_some());
        assert_eq!(g.edges().len(), 1);
        assert_eq!(g.region(g.root()).edges, vec![0]);
    }

    #[test]
    fn empty_attribute_values_are_dropped() {
        let a = attrs([("style", ""), ("penwidth", "1")]);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn nesting_is_tracked() {
        let mut g = Graph::new("g", false, Attrs::new());
        let a = g.add_subgraph(g.root(), "a", Attrs::new());
        let b = g.add_subgraph(a, "b", Attrs::new());
        assert_eq!(g.region(b).parent, Some(a));
        assert_eq!(g.region(a).parent, Some(g.root()));
        assert_eq!(g.region(g.root()).children, vec![a]);
        assert_eq!(g.find_region("b"), Some(b));
    }
}
