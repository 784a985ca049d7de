//! Tree data structure and the node-kind dispatch engine

pub mod node;
pub mod processor;

pub use node::{Node, NodeError, TreeWalk, Value, Walk};
pub use processor::{Catchall, Diagnostic, TreeError, TreeProcessor};
