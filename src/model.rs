use roxmltree::Node;
use serde::Serialize;

use crate::label::LabelRows;

// ────────────────────────────────────────────────────────────────────────────
// ForSyDe-XML vocabulary
// ────────────────────────────────────────────────────────────────────────────

pub const PROCESS_NETWORK_TAG: &str = "process_network";
pub const COMPOSITE_PROCESS_TAG: &str = "composite_process";
pub const LEAF_PROCESS_TAG: &str = "leaf_process";
pub const PORT_TAG: &str = "port";
pub const SIGNAL_TAG: &str = "signal";

pub const NAME_ATTR: &str = "name";
pub const COMPONENT_ATTR: &str = "component_name";
pub const DIRECTION_ATTR: &str = "direction";
pub const BOUND_PROCESS_ATTR: &str = "bound_process";
pub const BOUND_PORT_ATTR: &str = "bound_port";
pub const TYPE_ATTR: &str = "type";
pub const SOURCE_ATTR: &str = "source";
pub const SOURCE_PORT_ATTR: &str = "source_port";
pub const TARGET_ATTR: &str = "target";
pub const TARGET_PORT_ATTR: &str = "target_port";

/// Separates the components of a [`ProcessIdentity`] and the identity from
/// the port name of a pseudo-boundary node.
pub const ID_SEP: char = '@';

/// Extension of every ForSyDe-XML document referenced by a composite.
pub const MODEL_EXTENSION: &str = "xml";

/// Attribute value, or the empty string when the attribute is absent.
pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> &'a str {
    node.attribute(name).unwrap_or("")
}

/// Direct element children of `node` carrying the given tag.
pub fn children_by_tag<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |c| c.is_element() && c.has_tag_name(tag))
}

// ────────────────────────────────────────────────────────────────────────────
// Identities
// ────────────────────────────────────────────────────────────────────────────

/// Globally unique name of a process, derived from its ancestor chain:
/// `root@child@grandchild`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProcessIdentity(String);

impl ProcessIdentity {
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Qualify a name local to this scope.
    pub fn child(&self, local_name: &str) -> Self {
        Self(format!("{}{}{}", self.0, ID_SEP, local_name))
    }

    /// Name of the synthesized node standing in for `port` on a process that
    /// has no concrete rendered node at this level.
    pub fn boundary(&self, port: &str) -> String {
        format!("{}{}{}", self.0, ID_SEP, port)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ports and signals
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortDirection {
    In,
    Out,
}

impl PortDirection {
    /// Anything but `in` is treated as an output, the same way port lists of
    /// processes are split.
    pub fn from_attr(value: &str) -> Self {
        if value == "in" { Self::In } else { Self::Out }
    }
}

/// A composite's interface port bound to a port of one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub name: String,
    pub direction: PortDirection,
    /// Identity of the port node itself (`parent@name`).
    pub id: String,
    /// Bound child process, already qualified with the parent identity.
    pub bound_process: ProcessIdentity,
    pub bound_port: String,
    pub data_type: String,
}

impl PortBinding {
    pub fn from_node(node: Node, parent: &ProcessIdentity) -> Self {
        let name = attr(node, NAME_ATTR).to_string();
        Self {
            id: parent.boundary(&name),
            direction: PortDirection::from_attr(attr(node, DIRECTION_ATTR)),
            bound_process: parent.child(attr(node, BOUND_PROCESS_ATTR)),
            bound_port: attr(node, BOUND_PORT_ATTR).to_string(),
            data_type: attr(node, TYPE_ATTR).to_string(),
            name,
        }
    }
}

/// A signal between two process ports of the same scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalBinding {
    pub name: String,
    pub source: ProcessIdentity,
    pub source_port: String,
    pub target: ProcessIdentity,
    pub target_port: String,
    pub data_type: String,
}

impl SignalBinding {
    pub fn from_node(node: Node, parent: &ProcessIdentity) -> Self {
        Self {
            name: attr(node, NAME_ATTR).to_string(),
            source: parent.child(attr(node, SOURCE_ATTR)),
            source_port: attr(node, SOURCE_PORT_ATTR).to_string(),
            target: parent.child(attr(node, TARGET_ATTR)),
            target_port: attr(node, TARGET_PORT_ATTR).to_string(),
            data_type: attr(node, TYPE_ATTR).to_string(),
        }
    }
}

/// Vector and array typed connections are drawn emphasized.
pub fn is_emphasized(data_type: &str) -> bool {
    ["vector", "array"].iter().any(|t| data_type.contains(t))
}

/// Ports of one process split by direction, each with its evaluated label.
#[derive(Debug, Clone, Default)]
pub struct PortList {
    pub in_ports: Vec<(String, LabelRows)>,
    pub out_ports: Vec<(String, LabelRows)>,
}

impl PortList {
    pub fn push(&mut self, name: String, direction: PortDirection, label: LabelRows) {
        match direction {
            PortDirection::In => self.in_ports.push((name, label)),
            PortDirection::Out => self.out_ports.push((name, label)),
        }
    }

    pub fn has_inputs(&self) -> bool {
        !self.in_ports.is_empty()
    }

    pub fn has_outputs(&self) -> bool {
        !self.out_ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_encodes_ancestor_chain() {
        let root = ProcessIdentity::root("top");
        let child = root.child("filter").child("mav");
        assert_eq!(child.as_str(), "top@filter@mav");
        assert_eq!(child.boundary("in1"), "top@filter@mav@in1");
    }

    #[test]
    fn bindings_are_requalified_with_parent() {
        let doc = roxmltree::Document::parse(
            r#"<root>
                 <port name="i" direction="in" bound_process="p" bound_port="x" type="vector"/>
                 <signal name="s" source="a" source_port="o" target="b" target_port="i"/>
               </root>"#,
        )
        .unwrap();
        let parent = ProcessIdentity::root("top@c");
        let port_node = doc.descendants().find(|n| n.has_tag_name("port")).unwrap();
        let port = PortBinding::from_node(port_node, &parent);
        assert_eq!(port.id, "top@c@i");
        assert_eq!(port.direction, PortDirection::In);
        assert_eq!(port.bound_process.as_str(), "top@c@p");
        assert_eq!(port.bound_port, "x");
        assert!(is_emphasized(&port.data_type));

        let sig_node = doc.descendants().find(|n| n.has_tag_name("signal")).unwrap();
        let sig = SignalBinding::from_node(sig_node, &parent);
        assert_eq!(sig.source.as_str(), "top@c@a");
        assert_eq!(sig.target.as_str(), "top@c@b");
        assert!(!is_emphasized(&sig.data_type));
    }

    #[test]
    fn missing_attributes_become_empty() {
        let doc = roxmltree::Document::parse(r#"<port name="q"/>"#).unwrap();
        let port = PortBinding::from_node(doc.root_element(), &ProcessIdentity::root("r"));
        assert_eq!(port.bound_port, "");
        assert_eq!(port.bound_process.as_str(), "r@");
        assert_eq!(port.direction, PortDirection::Out);
    }
}
