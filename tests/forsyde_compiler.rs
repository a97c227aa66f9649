use anyhow::Result;
use camino::Utf8Path;
use f2dot::graph::{Attrs, Graph};
use f2dot::parser::{ContentSource, ModelCompiler};
use f2dot::settings::{Config, PlotDirection, Settings};
use std::collections::HashMap;

struct MemSource {
    files: HashMap<String, String>,
    opened: Vec<String>,
}

impl MemSource {
    fn new(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            opened: Vec::new(),
        }
    }
}

impl ContentSource for MemSource {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        self.opened.push(path.to_string());
        self.files
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("not found: {}", path))
    }
}

fn get<'a>(attrs: &'a Attrs, key: &str) -> Option<&'a str> {
    attrs.get(key).map(String::as_str)
}

fn edge<'g>(graph: &'g Graph, tail: &str, head: &str) -> &'g Attrs {
    &graph
        .edges()
        .iter()
        .find(|e| e.tail == tail && e.head == head)
        .unwrap_or_else(|| panic!("no edge {} -> {}", tail, head))
        .attrs
}

fn region_of<'g>(graph: &'g Graph, node: &str) -> &'g str {
    &graph.region(graph.node(node).unwrap().region).name
}

fn compile(config: Config, source: &mut MemSource) -> Result<Graph> {
    let settings = Settings::new("/m/ROOT.xml", None, config)?;
    ModelCompiler::new(&settings, source).compile()
}

const ROOT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<process_network name="ROOT">
  <composite_process name="X" component_name="xnet">
    <port name="o" direction="out"/>
  </composite_process>
  <leaf_process name="P">
    <port name="i" direction="in" type="int"/>
    <port name="o" direction="out" type="int"/>
  </leaf_process>
  <signal name="s1" source="X" source_port="o" target="P" target_port="i" type="int"/>
</process_network>
"#;

const XNET: &str = r#"<process_network name="xnet">
  <leaf_process name="L">
    <port name="q" direction="out" type="int"/>
  </leaf_process>
  <port name="o" direction="out" bound_process="L" bound_port="q" type="int"/>
</process_network>
"#;

#[test]
fn leaf_connects_to_expanded_composite_boundary() {
    let mut src = MemSource::new(&[("/m/ROOT.xml", ROOT), ("/m/xnet.xml", XNET)]);
    let graph = compile(Config::default(), &mut src).unwrap();

    let p = graph.node("ROOT@P").expect("leaf node");
    assert_eq!(get(&p.attrs, "label"), Some("{ { <i>i } | { P } | { <o>o } }"));
    assert_eq!(get(&p.attrs, "fillcolor"), Some("#FCD975"));
    assert_eq!(graph.region(p.region).name, "cluster_ROOT");

    let s1 = edge(&graph, "ROOT@X@o", "ROOT@P");
    assert_eq!(get(s1, "tailport"), Some("e"));
    assert_eq!(get(s1, "headport"), Some("i:w"));
    assert_eq!(get(s1, "penwidth"), Some("1"));

    // The boundary node is the port node drawn inside the expanded composite.
    let boundary = graph.node("ROOT@X@o").unwrap();
    assert_eq!(get(&boundary.attrs, "shape"), Some("invhouse"));
    assert_eq!(graph.region(boundary.region).name, "cluster_ROOT@Xoutps");
    let inner = edge(&graph, "ROOT@X@L", "ROOT@X@o");
    assert_eq!(get(inner, "tailport"), Some("q:e"));
    assert_eq!(get(inner, "headport"), Some("w"));

    let frame = graph.find_region("cluster_ROOT@X").unwrap();
    assert_eq!(get(&graph.region(frame).attrs, "fillcolor"), Some("#e9dfd5"));
    assert_eq!(src.opened, vec!["/m/ROOT.xml", "/m/xnet.xml"]);
}

#[test]
fn depth_limit_turns_composites_into_boxes() {
    let mut src = MemSource::new(&[("/m/ROOT.xml", ROOT)]);
    let config = Config {
        max_level: 2,
        ..Config::default()
    };
    let graph = compile(config, &mut src).unwrap();

    let x = graph.node("ROOT@X").expect("black box node");
    assert_eq!(get(&x.attrs, "fillcolor"), Some("#79AB78"));
    assert_eq!(get(&x.attrs, "label"), Some("{ {  } | { X } | { <o>o } }"));
    assert!(graph.find_region("cluster_ROOT@X").is_none());
    assert_eq!(src.opened, vec!["/m/ROOT.xml"]);

    let s1 = edge(&graph, "ROOT@X", "ROOT@P");
    assert_eq!(get(s1, "tailport"), Some("o:e"));
    assert_eq!(get(s1, "headport"), Some("i:w"));
}

#[test]
fn identities_encode_the_ancestor_chain() {
    let root = r#"<process_network name="ROOT">
      <composite_process name="A" component_name="pair"/>
      <composite_process name="B" component_name="pair"/>
    </process_network>"#;
    let pair = r#"<process_network name="pair">
      <composite_process name="in" component_name="unit"/>
      <leaf_process name="f"/>
    </process_network>"#;
    let unit = r#"<process_network name="unit"><leaf_process name="f"/></process_network>"#;
    let mut src = MemSource::new(&[
        ("/m/ROOT.xml", root),
        ("/m/pair.xml", pair),
        ("/m/unit.xml", unit),
    ]);
    let graph = compile(Config::default(), &mut src).unwrap();

    let processes: Vec<&str> = graph
        .nodes()
        .map(|n| n.name.as_str())
        .filter(|n| !n.ends_with("#anchor"))
        .collect();
    assert_eq!(processes, vec!["ROOT@A@in@f", "ROOT@A@f", "ROOT@B@in@f", "ROOT@B@f"]);
    assert_eq!(
        graph.nodes().filter(|n| n.name.ends_with("#anchor")).count(),
        5
    );
}

#[test]
fn missing_child_document_aborts_the_walk() {
    let root = r#"<process_network name="ROOT">
      <composite_process name="C" component_name="missing"/>
    </process_network>"#;
    let mut src = MemSource::new(&[("/m/ROOT.xml", root)]);
    let err = compile(Config::default(), &mut src).unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("<ROOT@C>"), "{}", chain);
    assert!(chain.contains("/m/missing.xml"), "{}", chain);
}

#[test]
fn document_without_process_network_is_rejected() {
    let mut src = MemSource::new(&[("/m/ROOT.xml", "<model/>")]);
    let err = compile(Config::default(), &mut src).unwrap_err();
    assert!(err.to_string().contains("process_network"));
}

#[test]
fn vertical_plots_anchor_north_and_south() {
    let root = r#"<process_network name="ROOT">
      <leaf_process name="a"><port name="o" direction="out"/></leaf_process>
      <leaf_process name="b"><port name="i" direction="in"/></leaf_process>
      <port name="din" direction="in" bound_process="b" bound_port="i"/>
      <signal source="a" source_port="o" target="b" target_port="i"/>
    </process_network>"#;
    let mut src = MemSource::new(&[("/m/ROOT.xml", root)]);
    let config = Config {
        direction: PlotDirection::TopBottom,
        ..Config::default()
    };
    let graph = compile(config, &mut src).unwrap();
    assert_eq!(get(&graph.region(graph.root()).attrs, "rankdir"), Some("TB"));

    let sig = edge(&graph, "ROOT@a", "ROOT@b");
    assert_eq!(get(sig, "tailport"), Some("o:s"));
    assert_eq!(get(sig, "headport"), Some("i:n"));

    let port = graph.node("ROOT@din").unwrap();
    assert_eq!(get(&port.attrs, "orientation"), Some("0"));
    let bind = edge(&graph, "ROOT@din", "ROOT@b");
    assert_eq!(get(bind, "tailport"), Some("s"));
    assert_eq!(get(bind, "headport"), Some("i:n"));
}

#[test]
fn vector_and_array_connections_are_emphasized() {
    let root = r#"<process_network name="ROOT">
      <leaf_process name="a"><port name="o" direction="out"/></leaf_process>
      <leaf_process name="b"><port name="i" direction="in"/></leaf_process>
      <port name="dout" direction="out" bound_process="a" bound_port="o" type="array of int"/>
      <signal source="a" source_port="o" target="b" target_port="i" type="vector&lt;int&gt;"/>
    </process_network>"#;
    let mut src = MemSource::new(&[("/m/ROOT.xml", root)]);
    let graph = compile(Config::default(), &mut src).unwrap();

    let sig = edge(&graph, "ROOT@a", "ROOT@b");
    assert_eq!(get(sig, "style"), Some("bold"));
    assert_eq!(get(sig, "penwidth"), Some("2"));
    let port = graph.node("ROOT@dout").unwrap();
    assert_eq!(get(&port.attrs, "style"), Some("bold"));
    assert_eq!(get(edge(&graph, "ROOT@a", "ROOT@dout"), "penwidth"), Some("2"));
}

#[test]
fn processes_are_clustered_by_port_shape() {
    let root = r#"<process_network name="ROOT">
      <leaf_process name="gen"><port name="o" direction="out"/></leaf_process>
      <leaf_process name="sink"><port name="i" direction="in"/></leaf_process>
      <leaf_process name="mid">
        <port name="i" direction="in"/><port name="o" direction="out"/>
      </leaf_process>
      <port name="din" direction="in" bound_process="mid" bound_port="i"/>
    </process_network>"#;
    let mut src = MemSource::new(&[("/m/ROOT.xml", root)]);
    let mut config = Config::default();
    config.clusters.sources = true;
    config.clusters.sinks = true;
    let graph = compile(config, &mut src).unwrap();

    assert_eq!(region_of(&graph, "ROOT@gen"), "cluster_ROOTsources");
    assert_eq!(region_of(&graph, "ROOT@sink"), "cluster_ROOTsinks");
    assert_eq!(region_of(&graph, "ROOT@mid"), "cluster_ROOT");
    assert_eq!(region_of(&graph, "ROOT@din"), "cluster_ROOTinps");
    assert!(graph.find_region("cluster_ROOTothers").is_none());
}

#[test]
fn labels_follow_the_configured_grammar() {
    let root = r#"<process_network name="ROOT">
      <leaf_process name="P">
        <process_constructor name="mapSY" moc="sy"/>
        <port name="i" direction="in" type="int"/>
      </leaf_process>
      <leaf_process name="Q"><port name="o" direction="out"/></leaf_process>
      <signal name="s" source="Q" source_port="o" target="P" target_port="i"/>
    </process_network>"#;
    let mut src = MemSource::new(&[("/m/ROOT.xml", root)]);
    let mut config = Config::default();
    config.labels.leaf = f2dot::label::LabelSpec::parse(
        "{ @name } { process_constructor/@name && process_constructor/@moc }",
    )
    .unwrap();
    config.labels.leaf_port = f2dot::label::LabelSpec::parse("{ @name && @type }").unwrap();
    config.labels.signal = f2dot::label::LabelSpec::parse("<< @name >> { '$1' }").unwrap();
    let graph = compile(config, &mut src).unwrap();

    let p = graph.node("ROOT@P").unwrap();
    assert_eq!(
        get(&p.attrs, "label"),
        Some("{ { <i>i : int } | { P\nmapSY : sy } | {  } }")
    );
    assert_eq!(get(edge(&graph, "ROOT@Q", "ROOT@P"), "label"), Some("s"));
}

#[test]
fn dot_output_is_a_strict_clustered_digraph() {
    let mut src = MemSource::new(&[("/m/ROOT.xml", ROOT), ("/m/xnet.xml", XNET)]);
    let graph = compile(Config::default(), &mut src).unwrap();
    let dot = f2dot::graph::dot::to_dot(&graph);
    assert!(dot.starts_with("strict digraph \"ROOT\" {\n"));
    assert!(dot.contains("  subgraph \"cluster_ROOT\" {\n"));
    assert!(dot.contains("\"ROOT#anchor\" [style=\"invis\"];"));
    assert!(dot.contains("\"ROOT@X@o\" -> \"ROOT@P\" [tailport=\"e\", headport=\"i:w\", penwidth=\"1\"];"));
}

#[test]
fn depth_limit_applies_below_expanded_composites() {
    let root = r#"<process_network name="ROOT">
      <composite_process name="A" component_name="outer.v2"/>
    </process_network>"#;
    let outer = r#"<process_network name="outer">
      <composite_process name="B" component_name="inner">
        <port name="i" direction="in"/>
      </composite_process>
      <leaf_process name="g"><port name="o" direction="out"/></leaf_process>
      <signal source="g" source_port="o" target="B" target_port="i"/>
    </process_network>"#;
    let mut src = MemSource::new(&[("/m/ROOT.xml", root), ("/m/outer.v2.xml", outer)]);
    let config = Config {
        max_level: 3,
        ..Config::default()
    };
    let graph = compile(config, &mut src).unwrap();

    let frame = graph.find_region("cluster_ROOT@A").expect("expanded composite");
    let b = graph.node("ROOT@A@B").expect("black box node");
    assert_eq!(b.region, frame);
    assert_eq!(get(&b.attrs, "fillcolor"), Some("#79AB78"));
    assert_eq!(get(&b.attrs, "label"), Some("{ { <i>i } | { B } | {  } }"));
    assert!(graph.find_region("cluster_ROOT@A@B").is_none());
    assert_eq!(src.opened, vec!["/m/ROOT.xml", "/m/outer.v2.xml"]);

    let sig = edge(&graph, "ROOT@A@g", "ROOT@A@B");
    assert_eq!(get(sig, "headport"), Some("i:w"));
}

#[test]
fn expanded_composites_go_to_the_others_cluster() {
    let mut src = MemSource::new(&[("/m/ROOT.xml", ROOT), ("/m/xnet.xml", XNET)]);
    let mut config = Config::default();
    config.clusters.others = true;
    let graph = compile(config, &mut src).unwrap();

    let others = graph.find_region("cluster_ROOTothers").expect("others cluster");
    let frame = graph.find_region("cluster_ROOT@X").unwrap();
    assert_eq!(graph.region(frame).parent, Some(others));
    assert_eq!(region_of(&graph, "ROOT@P"), "cluster_ROOTothers");
}
