//! Event-stream transforms and tree normalization

pub mod extractor;
pub mod normalize;

pub use extractor::{extract_tree, leaf_name, ExtractError, StreamTransform, TreeExtractor};
pub use normalize::{comment_processor, expression_expander, normalizer};
