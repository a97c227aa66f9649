//! Evaluation of a [`LabelSpec`] against one model element.

use super::LabelRows;
use super::grammar::{LabelSpec, Template};
use super::query::{Query, Queryable};
use log::debug;

/// Evaluate `spec` against `node`, producing `rows[row][record][column]`.
///
/// Variable blocks are evaluated first; all their matches, in order, bind
/// `$1`, `$2`, ... in the row expressions. Within a row, the matches of each
/// column are zipped positionally and shorter columns are padded with empty
/// strings. A column that does not parse after substitution, or matches
/// nothing, contributes no values.
pub fn evaluate_label<N: Queryable>(node: N, spec: &LabelSpec) -> LabelRows {
    let vars: Vec<String> = spec
        .variables
        .iter()
        .flat_map(|t| run_template(node, t, &[]))
        .collect();
    spec.rows
        .iter()
        .map(|row| {
            let columns: Vec<Vec<String>> =
                row.iter().map(|t| run_template(node, t, &vars)).collect();
            zip_longest(columns)
        })
        .collect()
}

fn run_template<N: Queryable>(node: N, template: &Template, vars: &[String]) -> Vec<String> {
    let text = template.render(vars);
    match Query::parse(&text) {
        Ok(q) => q.evaluate(node),
        Err(e) => {
            debug!("Label query `{}` skipped: {}", text, e);
            Vec::new()
        }
    }
}

/// Transpose columns into records, padding short columns with `""`.
pub fn zip_longest(columns: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let len = columns.iter().map(Vec::len).max().unwrap_or(0);
    (0..len)
        .map(|i| {
            columns
                .iter()
                .map(|c| c.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}
