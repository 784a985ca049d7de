//! Node-kind dispatch engine
//!
//! A `TreeProcessor` maps node kind names to handler closures. Handlers are
//! registered once at construction time; `process` dispatches on a node's
//! name and falls back to one of two catchall policies:
//!
//! - `Catchall::Report` produces a "no handler" diagnostic and does not
//!   descend (strict processors).
//! - `Catchall::Recurse` treats missing handlers as transparent recursion
//!   over the children (tree transforms). The next-sibling handle is
//!   captured *before* a child is processed, so handlers are free to detach,
//!   replace or re-parent nodes mid-walk: nodes removed before being reached
//!   are skipped, nodes inserted after the captured position are still
//!   visited.
//!
//! Handler failures never abort the walk; they are collected as `Diagnostic`
//! values and traversal continues with the remaining siblings.

use std::collections::HashMap;
use std::fmt;

use crate::tree::node::{Node, NodeError};

/// Error returned by a handler
#[derive(Debug, Clone, PartialEq)]
pub enum TreeError {
    Node(NodeError),
    Message(String),
}

impl From<NodeError> for TreeError {
    fn from(error: NodeError) -> Self {
        TreeError::Node(error)
    }
}

impl std::error::Error for TreeError {}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Node(error) => write!(f, "{}", error),
            TreeError::Message(message) => write!(f, "{}", message),
        }
    }
}

/// A recoverable condition reported while processing a tree
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub node_id: u64,
    pub node_kind: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(node: &Node, message: String) -> Diagnostic {
        Diagnostic {
            node_id: node.id(),
            node_kind: node.name(),
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}: {}", self.node_kind, self.node_id, self.message)
    }
}

/// Policy applied when a node's kind has no registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catchall {
    Report,
    Recurse,
}

type Handler = Box<dyn Fn(&TreeProcessor, &Node) -> Result<(), TreeError>>;

/// Kind-name dispatcher over trees
pub struct TreeProcessor {
    handlers: HashMap<String, Handler>,
    catchall: Catchall,
}

impl TreeProcessor {
    /// A strict processor: unknown kinds are reported, not descended into
    pub fn reporting() -> TreeProcessor {
        TreeProcessor {
            handlers: HashMap::new(),
            catchall: Catchall::Report,
        }
    }

    /// A transform: unknown kinds recurse transparently over their children
    pub fn recursive() -> TreeProcessor {
        TreeProcessor {
            handlers: HashMap::new(),
            catchall: Catchall::Recurse,
        }
    }

    /// Registers a handler for a node kind
    pub fn on<F>(mut self, kind: &str, handler: F) -> TreeProcessor
    where
        F: Fn(&TreeProcessor, &Node) -> Result<(), TreeError> + 'static,
    {
        self.handlers.insert(kind.to_string(), Box::new(handler));
        self
    }

    /// Dispatches `node`, returning the diagnostics produced along the way
    pub fn process(&self, node: &Node) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.feed(node, &mut diagnostics);
        diagnostics
    }

    /// Dispatches one node, appending diagnostics to `out`
    pub fn feed(&self, node: &Node, out: &mut Vec<Diagnostic>) {
        match self.handlers.get(&node.name()) {
            Some(handler) => {
                if let Err(error) = handler(self, node) {
                    out.push(Diagnostic::new(node, error.to_string()));
                }
            }
            None => match self.catchall {
                Catchall::Report => out.push(Diagnostic::new(
                    node,
                    format!("no handler for node kind '{}'", node.name()),
                )),
                Catchall::Recurse => {
                    let mut current = node.first_child();
                    while let Some(child) = current {
                        // captured before the handler runs, so the handler
                        // may rewrite the tree under us
                        current = child.next_sibling();
                        self.feed(&child, out);
                    }
                }
            },
        }
    }
}
