//! Display strings built from evaluated label rows.

use super::LabelRows;
use crate::model::PortList;

const FIELD_SEP: &str = " : ";
const RECORD_SEP: &str = "\n";

/// Keep only ASCII letters, digits, `_` and `-` so that model text cannot
/// break the record-label syntax.
pub fn sanitize_field(field: &str) -> String {
    field
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect()
}

/// Flatten label rows into one multi-line string: the non-empty fields of a
/// record are joined with ` : `, records are separated by newlines.
pub fn pretty_print(rows: &LabelRows) -> String {
    let records: Vec<String> = rows
        .iter()
        .flatten()
        .map(|record| {
            record
                .iter()
                .map(|f| sanitize_field(f))
                .filter(|f| !f.is_empty())
                .collect::<Vec<_>>()
                .join(FIELD_SEP)
        })
        .collect();
    records.join(RECORD_SEP).trim_end_matches(RECORD_SEP).to_string()
}

/// Build the three-region record label `{ { inputs } | { body } | { outputs } }`.
/// Every port field is tagged `<port name>` so edges can anchor to it; the
/// tag goes through [`sanitize_field`] like every other field.
pub fn build_record(process: &LabelRows, ports: &PortList) -> String {
    let region = |list: &[(String, LabelRows)]| {
        list.iter()
            .map(|(name, label)| format!("<{}>{}", sanitize_field(name), pretty_print(label)))
            .collect::<Vec<_>>()
            .join("|")
    };
    format!(
        "{{ {{ {} }} | {{ {} }} | {{ {} }} }}",
        region(&ports.in_ports),
        pretty_print(process),
        region(&ports.out_ports)
    )
}
