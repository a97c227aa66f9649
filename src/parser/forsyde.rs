//! Hierarchical ForSyDe-XML compiler.
//!
//! [`ModelCompiler`] walks a process network depth first. Every composite is
//! either expanded (its own document is loaded and drawn inside a nested
//! cluster) or, once the configured detail level is reached, drawn as a
//! single record node. Leaves, interface ports and signals of each level are
//! then turned into nodes and edges of one [`Graph`].

use super::helpers::{anchor, compass, resolve_component_file};
use super::source::ContentSource;
use crate::cluster::{Clusters, node_attrs, port_cluster, process_cluster, subgraph_cluster};
use crate::color::compute_background;
use crate::graph::{Attrs, Graph, RegionId, attrs};
use crate::label::{LabelSpec, build_record, evaluate_label, pretty_print};
use crate::model::*;
use crate::settings::Settings;
use anyhow::{Context, Result, anyhow};
use camino::Utf8Path;
use log::{debug, info};
use roxmltree::{Document, Node};
use std::collections::BTreeSet;

/// Processes of one level that are drawn as concrete nodes: leaves and
/// black-boxed composites.
pub type LeafSet = BTreeSet<ProcessIdentity>;

/// One end of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub node: String,
    /// Record field to anchor at, if the node has one for this port.
    pub port: Option<String>,
}

impl Endpoint {
    fn bare(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: None,
        }
    }
}

/// Endpoint for `port` of `process`: the process node's own field when the
/// process is drawn at this level, otherwise the boundary node
/// `process@port` that the expanded composite (or nothing) provides.
pub fn resolve_endpoint(leaves: &LeafSet, process: &ProcessIdentity, port: &str) -> Endpoint {
    if leaves.contains(process) {
        Endpoint {
            node: process.to_string(),
            port: Some(port.to_string()),
        }
    } else {
        Endpoint::bare(process.boundary(port))
    }
}

fn edge_attrs(tail: &Endpoint, head: &Endpoint, vertical: bool, data_type: &str, label: String) -> Attrs {
    let (compass_in, compass_out) = compass(vertical);
    let (style, penwidth) = if is_emphasized(data_type) { ("bold", "2") } else { ("", "1") };
    attrs([
        ("tailport", anchor(tail.port.as_deref(), compass_out)),
        ("headport", anchor(head.port.as_deref(), compass_in)),
        ("style", style.to_string()),
        ("penwidth", penwidth.to_string()),
        ("label", label),
    ])
}

fn port_list(process: Node, spec: &LabelSpec) -> PortList {
    let mut ports = PortList::default();
    for port in children_by_tag(process, PORT_TAG) {
        let direction = PortDirection::from_attr(attr(port, DIRECTION_ATTR));
        ports.push(attr(port, NAME_ATTR).to_string(), direction, evaluate_label(port, spec));
    }
    ports
}

/// Compiles one root model and all composites it references.
pub struct ModelCompiler<'a, S: ContentSource> {
    settings: &'a Settings,
    source: S,
}

impl<'a, S: ContentSource> ModelCompiler<'a, S> {
    pub fn new(settings: &'a Settings, source: S) -> Self {
        Self { settings, source }
    }

    /// Build the graph of `settings.input`.
    pub fn compile(&mut self) -> Result<Graph> {
        let settings = self.settings;
        let cfg = &settings.config;
        let root = ProcessIdentity::root(settings.root_process.as_str());
        let mut graph = Graph::new(
            root.as_str(),
            true,
            attrs([
                ("rankdir", cfg.direction.rankdir()),
                ("fontname", "Helvetica"),
                ("overlap", "prism"),
                ("splines", "true"),
            ]),
        );
        let frame = graph.add_subgraph(
            graph.root(),
            format!("cluster_{}", root),
            attrs([
                ("label", root.to_string()),
                ("style", "filled, rounded".to_string()),
                ("fillcolor", compute_background(cfg.composite_gradient, 1)),
                ("fontsize", "13".to_string()),
            ]),
        );
        info!("Starting the parser on process network \"{}\"", root);
        self.walk(&settings.input, &mut graph, frame, &root, 2)?;
        info!(
            nodes = graph.nodes().count(), edges = graph.edges().len();
            "Compiled process network \"{}\"", root
        );
        Ok(graph)
    }

    /// Draw the process network stored at `path` into `container`, with
    /// `parent` as the identity of the process it implements.
    fn walk(
        &mut self,
        path: &Utf8Path,
        graph: &mut Graph,
        container: RegionId,
        parent: &ProcessIdentity,
        level: u32,
    ) -> Result<()> {
        let text = self
            .source
            .read_to_string(path)
            .with_context(|| format!("Failed to load the model of <{}>", parent))?;
        let doc = Document::parse(&text).with_context(|| format!("Failed to parse XML {}", path))?;
        let network = doc
            .descendants()
            .find(|n| n.has_tag_name(PROCESS_NETWORK_TAG))
            .ok_or_else(|| anyhow!("No <{}> element in {}", PROCESS_NETWORK_TAG, path))?;
        debug!("Parsing <{}> from {} at level {}", parent, path, level);
        self.compile_level(network, graph, container, parent, level)
    }

    fn compile_level(
        &mut self,
        network: Node,
        graph: &mut Graph,
        container: RegionId,
        parent: &ProcessIdentity,
        level: u32,
    ) -> Result<()> {
        let settings = self.settings;
        let cfg = &settings.config;
        let vertical = cfg.direction.is_vertical();

        graph.add_node(container, format!("{}#anchor", parent), attrs([("style", "invis")]));
        let clusters = Clusters::new(graph, container, &cfg.clusters);
        let mut leaves = LeafSet::new();

        for composite in children_by_tag(network, COMPOSITE_PROCESS_TAG) {
            let id = parent.child(attr(composite, NAME_ATTR));
            let label = evaluate_label(composite, &cfg.labels.composite);
            debug!("Labels for composite process <{}>: {:?}", id, label);

            if level >= cfg.max_level {
                let ports = port_list(composite, &cfg.labels.composite_port);
                let cluster = process_cluster(ports.has_inputs(), ports.has_outputs(), &cfg.clusters);
                clusters.place(
                    graph,
                    cluster,
                    id.as_str(),
                    node_attrs([
                        ("label", build_record(&label, &ports)),
                        ("fillcolor", cfg.composite_box_color.clone()),
                    ]),
                );
                debug!(
                    "Converted composite process {} to \"black box\" node in <{}>, clustered in {}",
                    id,
                    parent,
                    cluster.key()
                );
                leaves.insert(id);
                continue;
            }

            let child_path = resolve_component_file(attr(composite, COMPONENT_ATTR), &settings.in_dir);
            let cluster = subgraph_cluster(&cfg.clusters);
            let frame = clusters.subregion(
                graph,
                cluster,
                format!("cluster_{}", id),
                attrs([
                    ("label", pretty_print(&label)),
                    ("style", "filled, rounded".to_string()),
                    ("fillcolor", compute_background(cfg.composite_gradient, level)),
                ]),
            );
            debug!(
                "Found composite process {} in <{}>, building a subgraph in cluster {}",
                id,
                parent,
                cluster.key()
            );
            self.walk(&child_path, graph, frame, &id, level + 1)
                .with_context(|| format!("Failed to expand composite process <{}>", id))?;
        }

        for leaf in children_by_tag(network, LEAF_PROCESS_TAG) {
            let id = parent.child(attr(leaf, NAME_ATTR));
            let label = evaluate_label(leaf, &cfg.labels.leaf);
            debug!("Labels for leaf process <{}>: {:?}", id, label);
            let ports = port_list(leaf, &cfg.labels.leaf_port);
            let cluster = process_cluster(ports.has_inputs(), ports.has_outputs(), &cfg.clusters);
            clusters.place(
                graph,
                cluster,
                id.as_str(),
                node_attrs([
                    ("label", build_record(&label, &ports)),
                    ("fillcolor", cfg.leaf_color.clone()),
                ]),
            );
            leaves.insert(id);
        }
        debug!("Found {} leaf processes in <{}>: {:?}", leaves.len(), parent, leaves);

        for port_node in children_by_tag(network, PORT_TAG) {
            let port = PortBinding::from_node(port_node, parent);
            let label = evaluate_label(port_node, &cfg.labels.composite_port);
            let style = if is_emphasized(&port.data_type) { "bold" } else { "" };
            clusters.place(
                graph,
                port_cluster(port.direction, &cfg.clusters),
                &port.id,
                node_attrs([
                    ("label", pretty_print(&label)),
                    ("shape", "invhouse".to_string()),
                    ("width", "0.5".to_string()),
                    ("height", "0.3".to_string()),
                    ("style", style.to_string()),
                    ("orientation", (if vertical { "0" } else { "90" }).to_string()),
                ]),
            );

            let peer = resolve_endpoint(&leaves, &port.bound_process, &port.bound_port);
            let own = Endpoint::bare(port.id.as_str());
            let (tail, head) = match port.direction {
                PortDirection::In => (own, peer),
                PortDirection::Out => (peer, own),
            };
            let edge = edge_attrs(&tail, &head, vertical, &port.data_type, String::new());
            debug!("Added port edge {:?} -> {:?}", tail, head);
            graph.add_edge(container, tail.node, head.node, edge);
        }

        for signal_node in children_by_tag(network, SIGNAL_TAG) {
            let signal = SignalBinding::from_node(signal_node, parent);
            let label = evaluate_label(signal_node, &cfg.labels.signal);
            let tail = resolve_endpoint(&leaves, &signal.source, &signal.source_port);
            let head = resolve_endpoint(&leaves, &signal.target, &signal.target_port);
            let edge = edge_attrs(&tail, &head, vertical, &signal.data_type, pretty_print(&label));
            debug!("Added signal {} {:?} -> {:?}", signal.name, tail, head);
            graph.add_edge(container, tail.node, head.node, edge);
        }

        Ok(())
    }
}
