//! Run-time settings.
//!
//! A [`Config`] is read from a TOML file (`f2dot.toml` next to the input
//! model unless given explicitly), validated key by key and then patched
//! with command-line [`Overrides`]. Unknown keys and unusable values only
//! produce warnings; the built-in default stays in place. Only an
//! unreadable file, broken TOML or a malformed label grammar stop the run.

use crate::cluster::ClusterFlags;
use crate::color::is_valid_color;
use crate::label::grammar::Template;
use crate::label::{GrammarError, LabelSpec};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "f2dot.toml";

/// Output formats accepted by Graphviz.
pub const FORMATS: &[&str] = &[
    "canon", "cmap", "cmapx", "cmapx_np", "dia", "dot", "fig", "gd", "gd2", "gif", "hpgl",
    "imap", "imap_np", "ismap", "jpe", "jpeg", "jpg", "mif", "mp", "pcl", "pdf", "pic", "plain",
    "plain-ext", "png", "ps", "ps2", "svg", "svgz", "vml", "vmlz", "vrml", "vtx", "wbmp", "xdot",
    "xlib",
];

/// Graphviz layout programs.
pub const PROGS: &[&str] = &["neato", "dot", "twopi", "circo", "fdp", "nop"];

/// Written next to the input model when no configuration file exists yet.
pub const DEFAULT_CONFIG: &str = r##"# f2dot configuration
#
# Label grammar:  << var && var >> { column && column } { column } ...
# Columns are path queries (@attr, child, a/b, //x, text(), [n], [@a='v'])
# or quoted literals; $1, $2, ... refer to the values bound in << >>.

direction = "LR"      # LR | TB
detail_level = 99     # composites at or below this depth are drawn as boxes
format = "dot"        # any Graphviz output format
prog = "dot"          # neato | dot | twopi | circo | fdp | nop

[labels]
leaf = "{ @name }"
composite = "{ @name }"
leaf_port = "{ @name }"
composite_port = "{ @name }"
signal = ""

[clusters]
input_ports = true
output_ports = true
sources = false
sinks = false
others = false

[colors]
leaf = "#FCD975"
composite_box = "#79AB78"
composite_gradient = [11, 16, 21]
"##;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write configuration file {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },

    #[error("Invalid label grammar for `labels.{key}`")]
    Label {
        key: &'static str,
        #[source]
        source: GrammarError,
    },

    #[error("Input path `{0}` does not name a model file")]
    Input(Utf8PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotDirection {
    #[default]
    LeftRight,
    TopBottom,
}

impl PlotDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LR" => Some(Self::LeftRight),
            "TB" => Some(Self::TopBottom),
            _ => None,
        }
    }

    /// Value of the Graphviz `rankdir` attribute.
    pub fn rankdir(self) -> &'static str {
        match self {
            Self::LeftRight => "LR",
            Self::TopBottom => "TB",
        }
    }

    pub fn is_vertical(self) -> bool {
        self == Self::TopBottom
    }
}

/// Parsed label grammars, one per element kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub leaf: LabelSpec,
    pub composite: LabelSpec,
    pub leaf_port: LabelSpec,
    pub composite_port: LabelSpec,
    pub signal: LabelSpec,
}

impl Default for Labels {
    fn default() -> Self {
        let name = LabelSpec {
            variables: Vec::new(),
            rows: vec![vec![Template::parse("@name")]],
        };
        Self {
            leaf: name.clone(),
            composite: name.clone(),
            leaf_port: name.clone(),
            composite_port: name,
            signal: LabelSpec::default(),
        }
    }
}

impl Labels {
    const KEYS: [&'static str; 5] = ["leaf", "composite", "leaf_port", "composite_port", "signal"];

    fn slot(&mut self, key: &str) -> Option<&mut LabelSpec> {
        match key {
            "leaf" => Some(&mut self.leaf),
            "composite" => Some(&mut self.composite),
            "leaf_port" => Some(&mut self.leaf_port),
            "composite_port" => Some(&mut self.composite_port),
            "signal" => Some(&mut self.signal),
            _ => None,
        }
    }
}

/// Everything the compilers read from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub direction: PlotDirection,
    /// Depth from which composites are no longer expanded (root frame = 1).
    pub max_level: u32,
    pub format: String,
    pub prog: String,
    pub labels: Labels,
    pub clusters: ClusterFlags,
    pub leaf_color: String,
    pub composite_box_color: String,
    pub composite_gradient: [u8; 3],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            direction: PlotDirection::LeftRight,
            max_level: 99,
            format: "dot".to_string(),
            prog: "dot".to_string(),
            labels: Labels::default(),
            clusters: ClusterFlags::default(),
            leaf_color: "#FCD975".to_string(),
            composite_box_color: "#79AB78".to_string(),
            composite_gradient: [11, 16, 21],
        }
    }
}

type RawTable = BTreeMap<String, toml::Value>;

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    direction: Option<toml::Value>,
    detail_level: Option<toml::Value>,
    format: Option<toml::Value>,
    prog: Option<toml::Value>,
    #[serde(default)]
    labels: RawTable,
    #[serde(default)]
    clusters: RawTable,
    #[serde(default)]
    colors: RawTable,
    #[serde(flatten)]
    extra: RawTable,
}

fn value_text(value: &toml::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn warn_unknown(section: Option<&str>, table: &RawTable) {
    for key in table.keys() {
        match section {
            Some(s) => warn!("Unrecognized configuration key `{}.{}` ignored", s, key),
            None => warn!("Unrecognized configuration key `{}` ignored", key),
        }
    }
}

/// `true`/`false`, also accepting the strings `yes`/`no`.
fn flag_value(value: &toml::Value) -> Option<bool> {
    if let Some(b) = value.as_bool() {
        return Some(b);
    }
    match value.as_str()?.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

fn gradient_value(value: &toml::Value) -> Option<[u8; 3]> {
    let items = value.as_array()?;
    if items.len() != 3 {
        return None;
    }
    let mut out = [0u8; 3];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = u8::try_from(item.as_integer()?).ok()?;
    }
    Some(out)
}

impl Config {
    /// Parse and validate configuration text; `path` names it in messages.
    pub fn from_toml_str(text: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::resolve(raw)
    }

    fn resolve(mut raw: RawConfig) -> Result<Self, ConfigError> {
        let mut cfg = Config::default();
        warn_unknown(None, &raw.extra);

        if let Some(v) = &raw.direction {
            cfg.set_direction(&value_text(v));
        }
        if let Some(v) = &raw.detail_level {
            match v.as_integer() {
                Some(level) => cfg.set_max_level(level),
                None => warn!(
                    "detail_level must be an integer, got `{}`; using {}",
                    v, cfg.max_level
                ),
            }
        }
        if let Some(v) = &raw.format {
            cfg.set_format(&value_text(v));
        }
        if let Some(v) = &raw.prog {
            cfg.set_prog(&value_text(v));
        }

        for key in Labels::KEYS {
            let Some(v) = raw.labels.remove(key) else {
                continue;
            };
            let Some(text) = v.as_str() else {
                warn!("labels.{} must be a string, got `{}`; using default", key, v);
                continue;
            };
            let spec = LabelSpec::parse(text).map_err(|source| ConfigError::Label { key, source })?;
            if let Some(slot) = cfg.labels.slot(key) {
                *slot = spec;
            }
        }
        warn_unknown(Some("labels"), &raw.labels);

        let flags = &mut cfg.clusters;
        for (key, slot) in [
            ("input_ports", &mut flags.input_ports),
            ("output_ports", &mut flags.output_ports),
            ("sources", &mut flags.sources),
            ("sinks", &mut flags.sinks),
            ("others", &mut flags.others),
        ] {
            if let Some(v) = raw.clusters.remove(key) {
                match flag_value(&v) {
                    Some(b) => *slot = b,
                    None => warn!("clusters.{} must be a boolean, got `{}`; using {}", key, v, *slot),
                }
            }
        }
        warn_unknown(Some("clusters"), &raw.clusters);

        for (key, slot) in [
            ("leaf", &mut cfg.leaf_color),
            ("composite_box", &mut cfg.composite_box_color),
        ] {
            if let Some(v) = raw.colors.remove(key) {
                let text = value_text(&v);
                if is_valid_color(&text) {
                    *slot = text.trim().to_string();
                } else {
                    warn!("colors.{} is not a color: `{}`; using {}", key, text, slot);
                }
            }
        }
        if let Some(v) = raw.colors.remove("composite_gradient") {
            match gradient_value(&v) {
                Some(g) => cfg.composite_gradient = g,
                None => warn!(
                    "colors.composite_gradient must be three integers in 0..=255, got `{}`; using {:?}",
                    v, cfg.composite_gradient
                ),
            }
        }
        warn_unknown(Some("colors"), &raw.colors);

        Ok(cfg)
    }

    pub fn set_direction(&mut self, value: &str) {
        match PlotDirection::parse(value) {
            Some(d) => self.direction = d,
            None => warn!(
                "Unrecognized direction `{}` (expected LR or TB); using {}",
                value,
                self.direction.rankdir()
            ),
        }
    }

    pub fn set_max_level(&mut self, level: i64) {
        match u32::try_from(level) {
            Ok(l) if l >= 1 => self.max_level = l,
            _ => warn!("Detail level must be at least 1, got {}; using {}", level, self.max_level),
        }
    }

    pub fn set_format(&mut self, value: &str) {
        let value = value.trim();
        if FORMATS.contains(&value) {
            self.format = value.to_string();
        } else {
            warn!("Unsupported output format `{}`; using {}", value, self.format);
        }
    }

    pub fn set_prog(&mut self, value: &str) {
        let value = value.trim();
        if PROGS.contains(&value) {
            self.prog = value.to_string();
        } else {
            warn!("Unsupported layout program `{}`; using {}", value, self.prog);
        }
    }

    /// Apply command-line values on top of the file configuration.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(d) = &overrides.direction {
            self.set_direction(d);
        }
        if let Some(l) = overrides.level {
            self.set_max_level(l);
        }
        if let Some(f) = &overrides.format {
            self.set_format(f);
        }
        if let Some(p) = &overrides.prog {
            self.set_prog(p);
        }
    }
}

/// Values given on the command line; they take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub direction: Option<String>,
    pub level: Option<i64>,
    pub format: Option<String>,
    pub prog: Option<String>,
}

/// Paths of one run plus its validated [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: Utf8PathBuf,
    /// Directory of the root model; composite documents are resolved here.
    pub in_dir: Utf8PathBuf,
    /// File stem of the input, used as the root process identity.
    pub root_process: String,
    pub output_dir: Utf8PathBuf,
    pub config: Config,
}

impl Settings {
    /// Build settings around an already resolved configuration.
    pub fn new(
        input: impl AsRef<Utf8Path>,
        output_dir: Option<&Utf8Path>,
        config: Config,
    ) -> Result<Self, ConfigError> {
        let input = input.as_ref().to_path_buf();
        let root_process = input
            .file_stem()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Input(input.clone()))?
            .to_string();
        let in_dir = match input.parent() {
            Some(p) if !p.as_str().is_empty() => p.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        let output_dir = output_dir.map(Utf8Path::to_path_buf).unwrap_or_else(|| in_dir.clone());
        Ok(Self {
            input,
            in_dir,
            root_process,
            output_dir,
            config,
        })
    }

    /// Locate (or create), read and validate the configuration file, then
    /// apply `overrides`.
    pub fn load(
        input: impl AsRef<Utf8Path>,
        output_dir: Option<&Utf8Path>,
        config_file: Option<&Utf8Path>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::new(input, output_dir, Config::default())?;
        let path = match config_file {
            Some(p) => {
                info!(path = p.as_str(); "Loading configuration from explicit path");
                p.to_path_buf()
            }
            None => {
                let p = settings.in_dir.join(CONFIG_FILE_NAME);
                if p.exists() {
                    info!(path = p.as_str(); "Loading configuration from input folder");
                } else {
                    write_default_config(&p)?;
                }
                p
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        settings.config = Config::from_toml_str(&text, &path)?;
        settings.config.apply(overrides);
        debug!("Current settings: {:#?}", settings);
        Ok(settings)
    }

    /// `<output_dir>/<root_process>.<extension>`
    pub fn output_file(&self, extension: &str) -> Utf8PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.root_process, extension))
    }
}

fn write_default_config(path: &Utf8Path) -> Result<(), ConfigError> {
    std::fs::write(path, DEFAULT_CONFIG).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = path.as_str(); "Generated default configuration");
    Ok(())
}

/// Write the default configuration into `dir`, overwriting any existing
/// file, and return its path.
pub fn generate_config(dir: &Utf8Path) -> Result<Utf8PathBuf, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    write_default_config(&path)?;
    Ok(path)
}
