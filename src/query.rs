//! Querying extracted trees: templates and pattern combinators

pub mod patterns;
pub mod templates;

pub use patterns::{any_of, find, named, seq_of, Match, MatchValue, Pattern};
pub use templates::{Template, TemplateError};
