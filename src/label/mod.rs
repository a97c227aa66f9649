//! Label Query Engine.
//!
//! - [`grammar`] – parse `<< vars >> { col && col } ...` into a [`LabelSpec`]
//! - [`query`] – the path-query subset and the [`Queryable`] node view
//! - [`eval`] – evaluate a label spec against one element
//! - [`record`] – turn evaluated rows into display strings

pub mod eval;
pub mod grammar;
pub mod query;
pub mod record;

pub use eval::evaluate_label;
pub use grammar::{GrammarError, LabelSpec};
pub use query::{Query, Queryable};
pub use record::{build_record, pretty_print};

/// `rows[row][record][column]`
pub type LabelRows = Vec<Vec<Vec<String>>>;
