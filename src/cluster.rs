//! Per-level grouping of nodes into role clusters.

use crate::graph::{Attrs, Graph, RegionId, attrs};
use crate::model::PortDirection;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Which role clusters are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterFlags {
    pub sources: bool,
    pub sinks: bool,
    pub input_ports: bool,
    pub output_ports: bool,
    pub others: bool,
}

impl Default for ClusterFlags {
    fn default() -> Self {
        Self {
            sources: false,
            sinks: false,
            input_ports: true,
            output_ports: true,
            others: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClusterName {
    Sources,
    Sinks,
    InputPorts,
    OutputPorts,
    Others,
    /// The level's own container.
    Parent,
}

impl ClusterName {
    /// Suffix appended to the level's region name.
    pub fn key(self) -> &'static str {
        match self {
            Self::Sources => "sources",
            Self::Sinks => "sinks",
            Self::InputPorts => "inps",
            Self::OutputPorts => "outps",
            Self::Others => "others",
            Self::Parent => "parent",
        }
    }

    fn enabled(self, flags: &ClusterFlags) -> bool {
        match self {
            Self::Sources => flags.sources,
            Self::Sinks => flags.sinks,
            Self::InputPorts => flags.input_ports,
            Self::OutputPorts => flags.output_ports,
            Self::Others => flags.others,
            Self::Parent => true,
        }
    }
}

/// Placement of a process node (leaf or black box). Priority order: sources,
/// sinks, others, parent. A node without inputs and outputs is a source.
pub fn process_cluster(has_inputs: bool, has_outputs: bool, flags: &ClusterFlags) -> ClusterName {
    if !has_inputs && flags.sources {
        ClusterName::Sources
    } else if !has_outputs && flags.sinks {
        ClusterName::Sinks
    } else if flags.others {
        ClusterName::Others
    } else {
        ClusterName::Parent
    }
}

/// Placement of a composite interface port by direction.
pub fn port_cluster(direction: PortDirection, flags: &ClusterFlags) -> ClusterName {
    match direction {
        PortDirection::In if flags.input_ports => ClusterName::InputPorts,
        PortDirection::Out if flags.output_ports => ClusterName::OutputPorts,
        _ if flags.others => ClusterName::Others,
        _ => ClusterName::Parent,
    }
}

/// Placement of the subgraph of an expanded composite.
pub fn subgraph_cluster(flags: &ClusterFlags) -> ClusterName {
    if flags.others {
        ClusterName::Others
    } else {
        ClusterName::Parent
    }
}

/// The role clusters of one recursion level.
#[derive(Debug)]
pub struct Clusters {
    parent: RegionId,
    regions: BTreeMap<ClusterName, RegionId>,
}

impl Clusters {
    const ORDER: [ClusterName; 5] = [
        ClusterName::Sources,
        ClusterName::Sinks,
        ClusterName::InputPorts,
        ClusterName::OutputPorts,
        ClusterName::Others,
    ];

    /// Create one unlabeled cluster per enabled role inside `parent`.
    pub fn new(graph: &mut Graph, parent: RegionId, flags: &ClusterFlags) -> Self {
        let mut regions = BTreeMap::new();
        let base = graph.region(parent).name.clone();
        for name in Self::ORDER.into_iter().filter(|n| n.enabled(flags)) {
            let id = graph.add_subgraph(
                parent,
                format!("{}{}", base, name.key()),
                attrs([("label", "")]),
            );
            regions.insert(name, id);
        }
        debug!(
            "Added clusters {:?} in <{}>",
            regions.keys().map(|n| n.key()).collect::<Vec<_>>(),
            base
        );
        Self { parent, regions }
    }

    /// Region for `name`, falling back to the level's container.
    pub fn region(&self, name: ClusterName) -> RegionId {
        self.regions.get(&name).copied().unwrap_or(self.parent)
    }

    /// Create or update a node inside the named cluster.
    pub fn place(&self, graph: &mut Graph, name: ClusterName, node: &str, node_attrs: Attrs) {
        graph.add_node(self.region(name), node, node_attrs);
    }

    /// Open a nested container inside the named cluster.
    pub fn subregion(&self, graph: &mut Graph, name: ClusterName, region_name: String, region_attrs: Attrs) -> RegionId {
        graph.add_subgraph(self.region(name), region_name, region_attrs)
    }
}

/// Attributes every process or port node starts from; `overrides` replace
/// entries with the same key and empty values are dropped.
pub fn node_attrs<'a>(overrides: impl IntoIterator<Item = (&'a str, String)>) -> Attrs {
    let mut base: Attrs = attrs([
        ("shape", "record"),
        ("color", "black"),
        ("fillcolor", "transparent"),
        ("style", "rounded,filled"),
        ("fontname", "Helvetica"),
        ("fontsize", "12"),
        ("orientation", "90"),
    ]);
    for (k, v) in overrides {
        if v.is_empty() {
            base.shift_remove(k);
        } else {
            base.insert(k.to_string(), v);
        }
    }
    base
}
