//! Lexical scanning and event classification
//!
//! The parsing pipeline is: source text → delimiter scanner → event
//! classifier → event stream. The scanner only knows about delimiter
//! literals and the escape character; the classifiers assign semantics using
//! an immutable delimiter table built from a declarative language spec.

pub mod classifiers;
pub mod events;
pub mod language;
pub mod scanner;

pub use classifiers::{trim_span, BlockClassifier, ExpressionClassifier};
pub use events::ParseEvent;
pub use language::{
    load_block_spec, BlockLanguage, BlockSpec, EventKind, ExpressionLanguage, ExpressionSpec,
    LanguageError, DEFAULT_LOOKAHEAD,
};
pub use scanner::{scan, DelimiterScan};
