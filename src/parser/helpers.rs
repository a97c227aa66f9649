//! Helpers shared by the model parsers.

use crate::label::record::sanitize_field;
use crate::model::MODEL_EXTENSION;
use camino::{Utf8Path, Utf8PathBuf};

/// Resolve a composite's `component_name` (e.g. `"mulacc"`) to the document
/// that defines it: `<base_dir>/mulacc.xml`. The name is taken verbatim.
pub fn resolve_component_file(component: &str, base_dir: &Utf8Path) -> Utf8PathBuf {
    base_dir.join(format!("{}.{}", component, MODEL_EXTENSION))
}

/// Compass points for edge anchors: `(input side, output side)`.
pub fn compass(vertical: bool) -> (&'static str, &'static str) {
    if vertical { ("n", "s") } else { ("w", "e") }
}

/// `port:compass`, or just `compass` when there is no named port. The port
/// name is sanitized the same way as the record field tag it points at.
pub fn anchor(port: Option<&str>, compass: &str) -> String {
    match port.map(sanitize_field).filter(|p| !p.is_empty()) {
        Some(p) => format!("{}:{}", p, compass),
        None => compass.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_names_map_to_sibling_documents() {
        let base = Utf8Path::new("/models/top");
        assert_eq!(resolve_component_file("mulacc", base), "/models/top/mulacc.xml");
        assert_eq!(resolve_component_file("filter.v2", base), "/models/top/filter.v2.xml");
        assert_eq!(resolve_component_file("lib/fir", base), "/models/top/lib/fir.xml");
    }

    #[test]
    fn anchors_follow_plot_direction() {
        assert_eq!(compass(true), ("n", "s"));
        assert_eq!(compass(false), ("w", "e"));
        assert_eq!(anchor(Some("o"), "e"), "o:e");
        assert_eq!(anchor(None, "w"), "w");
        assert_eq!(anchor(Some("d out|1"), "s"), "dout1:s");
        assert_eq!(anchor(Some("<>"), "n"), "n");
    }
}
