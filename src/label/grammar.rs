//! Parser for the user-authored label grammar.
//!
//! ```text
//! << var-query && var-query >>  { col && col } { col } ...
//! ```
//!
//! Variable blocks bind `$1`, `$2`, ... for the row queries; every `{ ... }`
//! block is one label row whose `&&`-separated columns are zipped
//! positionally when evaluated.

use super::query::Query;
use serde::Serialize;
use thiserror::Error;

const VAR_START: &str = "<<";
const VAR_STOP: &str = ">>";
const ROW_START: &str = "{";
const ROW_STOP: &str = "}";
const COLUMN_SEP: &str = "&&";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("unterminated `{open}` block starting at offset {offset}")]
    Unterminated { open: &'static str, offset: usize },

    #[error("unexpected text `{text}` at offset {offset}, expected `<<` or `{{`")]
    UnexpectedText { text: String, offset: usize },

    #[error("invalid query `{query}`: {reason}")]
    InvalidQuery { query: String, reason: String },
}

/// One piece of a column expression: literal query text or a `$n`
/// back-reference to a bound variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Segment {
    Text(String),
    Var(usize),
}

/// A column expression split at its variable references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '$' {
                let digits: String = text[i + 1..]
                    .chars()
                    .take_while(|d| d.is_ascii_digit())
                    .collect();
                if let Ok(index) = digits.parse::<usize>() {
                    if index > 0 {
                        if !literal.is_empty() {
                            segments.push(Segment::Text(std::mem::take(&mut literal)));
                        }
                        segments.push(Segment::Var(index));
                        for _ in 0..digits.len() {
                            chars.next();
                        }
                        continue;
                    }
                }
            }
            literal.push(c);
        }
        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }
        Self { segments }
    }

    pub fn has_variables(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Var(_)))
    }

    /// Substitute bound values; references past the end stay literal.
    pub fn render(&self, vars: &[String]) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Text(t) => out.push_str(t),
                Segment::Var(n) => match vars.get(n - 1) {
                    Some(v) => out.push_str(v),
                    None => {
                        out.push('$');
                        out.push_str(&n.to_string());
                    }
                },
            }
        }
        out
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(&[]))
    }
}

/// Parsed label specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelSpec {
    pub variables: Vec<Template>,
    pub rows: Vec<Vec<Template>>,
}

impl LabelSpec {
    /// Parse a label grammar string. Column expressions without variable
    /// references are checked here so that a typo fails the run up front.
    pub fn parse(input: &str) -> Result<Self, GrammarError> {
        let mut spec = LabelSpec::default();
        let mut pos = 0;
        loop {
            let rest = &input[pos..];
            let trimmed = rest.trim_start();
            pos += rest.len() - trimmed.len();
            if trimmed.is_empty() {
                break;
            }
            if let Some(body) = trimmed.strip_prefix(VAR_START) {
                let end = body.find(VAR_STOP).ok_or(GrammarError::Unterminated {
                    open: VAR_START,
                    offset: pos,
                })?;
                spec.variables.extend(split_columns(&body[..end])?);
                pos += VAR_START.len() + end + VAR_STOP.len();
            } else if let Some(body) = trimmed.strip_prefix(ROW_START) {
                let end = body.find(ROW_STOP).ok_or(GrammarError::Unterminated {
                    open: ROW_START,
                    offset: pos,
                })?;
                let row = split_columns(&body[..end])?;
                if !row.is_empty() {
                    spec.rows.push(row);
                }
                pos += ROW_START.len() + end + ROW_STOP.len();
            } else {
                let text: String = trimmed.chars().take_while(|c| !c.is_whitespace()).collect();
                return Err(GrammarError::UnexpectedText { text, offset: pos });
            }
        }
        Ok(spec)
    }
}

impl std::fmt::Display for LabelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |cols: &[Template]| {
            cols.iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" && ")
        };
        let mut parts = Vec::new();
        if !self.variables.is_empty() {
            parts.push(format!("<< {} >>", join(&self.variables)));
        }
        for row in &self.rows {
            parts.push(format!("{{ {} }}", join(row)));
        }
        f.write_str(&parts.join(" "))
    }
}

fn split_columns(body: &str) -> Result<Vec<Template>, GrammarError> {
    let mut columns = Vec::new();
    for col in body.split(COLUMN_SEP).map(str::trim).filter(|c| !c.is_empty()) {
        let template = Template::parse(col);
        if !template.has_variables() {
            Query::parse(col).map_err(|e| GrammarError::InvalidQuery {
                query: col.to_string(),
                reason: e.to_string(),
            })?;
        }
        columns.push(template);
    }
    Ok(columns)
}
