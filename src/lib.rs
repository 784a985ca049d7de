//! # parsource
//!
//! Delimiter-table driven parsing of source files into generic trees.
//!
//! Instead of a grammar per language, a language is described by a table of
//! delimiter literals: comment markers, quote pairs, block brackets,
//! statement and line terminators, keywords and operators. The pipeline is:
//!
//! 1. the scanner finds delimiter occurrences, escape-aware and bounded by a
//!    lookahead window ([`parsing::scanner`])
//! 2. a classifier turns them into typed parse events
//!    ([`parsing::classifiers`])
//! 3. the extractor folds the event stream into a generic tree
//!    ([`transform::extractor`])
//! 4. normalization passes decompose comments and regroup statements
//!    ([`transform::normalize`])
//!
//! Trees render to the tdoc display format, XML or JSON ([`formats`]), and
//! can be queried with templates and pattern combinators ([`query`]).

pub mod formats;
pub mod langs;
pub mod parsing;
pub mod query;
pub mod transform;
pub mod tree;
