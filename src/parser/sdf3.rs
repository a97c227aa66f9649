//! Flat compiler for SDF3 application graphs.

use super::helpers::{anchor, compass};
use super::source::ContentSource;
use crate::cluster::node_attrs;
use crate::color::compute_background;
use crate::graph::{Graph, attrs};
use crate::label::{build_record, evaluate_label, pretty_print};
use crate::model::{NAME_ATTR, PortDirection, PortList, attr, children_by_tag};
use crate::settings::Settings;
use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use roxmltree::Document;

const APPLICATION_GRAPH_TAG: &str = "applicationGraph";
const SDF_TAG: &str = "sdf";
const ACTOR_TAG: &str = "actor";
const PORT_TAG: &str = "port";
const CHANNEL_TAG: &str = "channel";

const PORT_TYPE_ATTR: &str = "type";
const SRC_ACTOR_ATTR: &str = "srcActor";
const SRC_PORT_ATTR: &str = "srcPort";
const DST_ACTOR_ATTR: &str = "dstActor";
const DST_PORT_ATTR: &str = "dstPort";

pub struct Sdf3Compiler<'a, S: ContentSource> {
    settings: &'a Settings,
    source: S,
}

impl<'a, S: ContentSource> Sdf3Compiler<'a, S> {
    pub fn new(settings: &'a Settings, source: S) -> Self {
        Self { settings, source }
    }

    /// Build the graph of the application graph in `settings.input`. Actors
    /// become record nodes, channels edges between their port fields.
    pub fn compile(&mut self) -> Result<Graph> {
        let settings = self.settings;
        let cfg = &settings.config;
        let path = &settings.input;
        let text = self.source.read_to_string(path)?;
        let doc = Document::parse(&text).with_context(|| format!("Failed to parse XML {}", path))?;
        let app = doc
            .descendants()
            .find(|n| n.has_tag_name(APPLICATION_GRAPH_TAG))
            .ok_or_else(|| anyhow!("No <{}> element in {}", APPLICATION_GRAPH_TAG, path))?;
        let app_name = attr(app, NAME_ATTR);
        debug!("Parsing <{}>", app_name);

        let mut graph = Graph::new(
            settings.root_process.as_str(),
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
            format!("cluster_{}", settings.root_process),
            attrs([
                ("label", app_name.to_string()),
                ("style", "filled, rounded".to_string()),
                ("fillcolor", compute_background(cfg.composite_gradient, 1)),
                ("fontsize", "13".to_string()),
            ]),
        );
        info!("Starting the parser on application graph \"{}\"", app_name);
        graph.add_node(frame, format!("{}#anchor", settings.root_process), attrs([("style", "invis")]));

        let (compass_in, compass_out) = compass(cfg.direction.is_vertical());
        for sdf in children_by_tag(app, SDF_TAG) {
            let mut actors = Vec::new();
            for actor in children_by_tag(sdf, ACTOR_TAG) {
                let id = attr(actor, NAME_ATTR);
                let label = evaluate_label(actor, &cfg.labels.leaf);
                let mut ports = PortList::default();
                for port in children_by_tag(actor, PORT_TAG) {
                    ports.push(
                        attr(port, NAME_ATTR).to_string(),
                        PortDirection::from_attr(attr(port, PORT_TYPE_ATTR)),
                        evaluate_label(port, &cfg.labels.leaf_port),
                    );
                }
                graph.add_node(
                    frame,
                    id,
                    node_attrs([
                        ("label", build_record(&label, &ports)),
                        ("fillcolor", cfg.leaf_color.clone()),
                    ]),
                );
                actors.push(id);
            }
            debug!("Found {} actors: {:?}", actors.len(), actors);

            for channel in children_by_tag(sdf, CHANNEL_TAG) {
                let (src, dst) = (attr(channel, SRC_ACTOR_ATTR), attr(channel, DST_ACTOR_ATTR));
                let tailport = anchor(Some(attr(channel, SRC_PORT_ATTR)), compass_out);
                let headport = anchor(Some(attr(channel, DST_PORT_ATTR)), compass_in);
                debug!("Added channel {}:{} -> {}:{}", src, tailport, dst, headport);
                graph.add_edge(
                    frame,
                    src,
                    dst,
                    attrs([
                        ("tailport", tailport),
                        ("headport", headport),
                        ("label", pretty_print(&evaluate_label(channel, &cfg.labels.signal))),
                    ]),
                );
            }
        }
        Ok(graph)
    }
}
