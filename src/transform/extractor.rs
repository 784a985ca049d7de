//! Tree extraction from event streams
//!
//! `TreeExtractor` is a stack machine driven once per event. Comments and
//! blocks open a scope (a stack frame holding the node and the event kind
//! that will close it); leaf events append to the current scope; a statement
//! terminator re-parents every sibling since the last `statement` child into
//! a fresh `statement` node.
//!
//! Closing a block never verifies that its delimiter pairs with the one that
//! opened the scope; mismatched pairs close the scope all the same. Popping
//! with only the root frame left means the input had more closing markers
//! than opening ones and is fatal. Frames still open when the stream ends are
//! not an error — the tree reflects whatever was attached.

use std::fmt;

use crate::parsing::classifiers::BlockClassifier;
use crate::parsing::events::ParseEvent;
use crate::parsing::language::{BlockLanguage, EventKind, LanguageError};
use crate::tree::node::{Node, NodeError};

/// Errors occurring while extracting a tree
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// A classifier error forwarded through the stream
    Language(LanguageError),
    /// A close event arrived with only the root scope open
    StackUnderflow { offset: usize },
    /// An event kind the extractor has no transition for
    UnsupportedEvent { kind: EventKind, offset: usize },
    /// A structural operation failed
    Node(NodeError),
}

impl From<LanguageError> for ExtractError {
    fn from(error: LanguageError) -> Self {
        ExtractError::Language(error)
    }
}

impl From<NodeError> for ExtractError {
    fn from(error: NodeError) -> Self {
        ExtractError::Node(error)
    }
}

impl std::error::Error for ExtractError {}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Language(error) => write!(f, "{}", error),
            ExtractError::StackUnderflow { offset } => {
                write!(f, "more closes than opens at offset {}", offset)
            }
            ExtractError::UnsupportedEvent { kind, offset } => {
                write!(f, "unsupported event {} at offset {}", kind, offset)
            }
            ExtractError::Node(error) => write!(f, "{}", error),
        }
    }
}

/// A stateful transform over an event stream, with hooks bracketing a pass.
///
/// `process` drives `feed` once per event and collects diagnostics; the
/// first fatal diagnostic stops the pass, but whatever was built so far
/// stays available.
pub trait StreamTransform {
    fn pre_process(&mut self) {}

    fn post_process(&mut self) {}

    fn feed(&mut self, event: &ParseEvent<'_>) -> Result<(), ExtractError>;

    fn process<'a, I>(&mut self, events: I) -> Vec<ExtractError>
    where
        I: IntoIterator<Item = Result<ParseEvent<'a>, LanguageError>>,
        Self: Sized,
    {
        self.pre_process();
        let mut diagnostics = Vec::new();
        for item in events {
            match item {
                Ok(event) => {
                    if let Err(error) = self.feed(&event) {
                        diagnostics.push(error);
                        break;
                    }
                }
                Err(error) => {
                    diagnostics.push(ExtractError::Language(error));
                    break;
                }
            }
        }
        self.post_process();
        diagnostics
    }
}

/// The node kind produced for a leaf event, if the event is a leaf
pub fn leaf_name(kind: EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Text => Some("text"),
        EventKind::Quote => Some("quote"),
        EventKind::Keyword => Some("keyword"),
        EventKind::OperatorInfix => Some("op-inf"),
        EventKind::OperatorPrefix => Some("op-pre"),
        EventKind::OperatorSuffix => Some("op-suf"),
        _ => None,
    }
}

/// Stack machine building a `Node` tree from parse events
pub struct TreeExtractor {
    root: Node,
    stack: Vec<(Node, Option<EventKind>)>,
    with_offsets: bool,
}

impl Default for TreeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeExtractor {
    pub fn new() -> TreeExtractor {
        Self::with_offsets(true)
    }

    /// `with_offsets` controls whether nodes record `start`/`end` attributes
    pub fn with_offsets(with_offsets: bool) -> TreeExtractor {
        let root = Node::new("root");
        TreeExtractor {
            root: root.clone(),
            stack: vec![(root, None)],
            with_offsets,
        }
    }

    /// The root node; also the result once the stream is exhausted
    pub fn root(&self) -> Node {
        self.root.clone()
    }

    /// Current stack depth, root frame included
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn current(&self) -> Node {
        match self.stack.last() {
            Some((node, _)) => node.clone(),
            None => self.root.clone(),
        }
    }

    fn make_node(&self, event: &ParseEvent<'_>, name: &str) -> Node {
        let node = Node::new(name);
        if self.with_offsets {
            node.set_attr("start", event.start as i64);
            node.set_attr("end", event.end as i64);
        }
        node
    }
}

impl StreamTransform for TreeExtractor {
    fn feed(&mut self, event: &ParseEvent<'_>) -> Result<(), ExtractError> {
        match event.kind {
            EventKind::Comment => {
                let node = self.make_node(event, "comment");
                self.current().append(&node)?;
                self.stack.push((node, Some(EventKind::LineEnd)));
            }
            EventKind::BlockStart => {
                let node = self.make_node(event, "block");
                if let Some(delimiter) = event.value {
                    node.set_attr("type", delimiter);
                }
                self.current().append(&node)?;
                self.stack.push((node, Some(EventKind::BlockEnd)));
            }
            EventKind::LineEnd => {
                if matches!(self.stack.last(), Some((_, Some(EventKind::LineEnd)))) {
                    self.stack.pop();
                }
            }
            EventKind::BlockEnd => {
                if self.stack.len() <= 1 {
                    return Err(ExtractError::StackUnderflow {
                        offset: event.start,
                    });
                }
                self.stack.pop();
            }
            EventKind::StatementEnd => {
                let scope = self.current();
                let children = scope.children();
                let from = children
                    .iter()
                    .rposition(|child| child.name() == "statement")
                    .map(|index| index + 1)
                    .unwrap_or(0);
                let statement = self.make_node(event, "statement");
                for child in &children[from..] {
                    statement.append(&child.detach())?;
                }
                scope.append(&statement)?;
            }
            kind => match leaf_name(kind) {
                Some(name) => {
                    let node = self.make_node(event, name);
                    node.set_attr("value", event.text());
                    self.current().append(&node)?;
                }
                None => {
                    return Err(ExtractError::UnsupportedEvent {
                        kind,
                        offset: event.start,
                    })
                }
            },
        }
        Ok(())
    }
}

/// Classifies `text` with the block table and extracts a tree in one go
pub fn extract_tree(text: &str, lang: &BlockLanguage) -> (Node, Vec<ExtractError>) {
    let mut extractor = TreeExtractor::new();
    let diagnostics = extractor.process(BlockClassifier::new(text, lang));
    (extractor.root(), diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, source: &str) -> ParseEvent<'_> {
        ParseEvent::new(kind, source, 0, source.len().min(1))
    }

    #[test]
    fn test_block_depth_grows_and_shrinks() {
        let source = "{";
        let mut extractor = TreeExtractor::with_offsets(false);
        for _ in 0..3 {
            extractor.feed(&event(EventKind::BlockStart, source)).unwrap();
        }
        assert_eq!(extractor.depth(), 4);

        extractor.feed(&event(EventKind::BlockEnd, "}")).unwrap();
        assert_eq!(extractor.depth(), 3);
    }

    #[test]
    fn test_block_end_underflow_is_fatal() {
        let mut extractor = TreeExtractor::with_offsets(false);
        let result = extractor.feed(&event(EventKind::BlockEnd, "}"));
        assert_eq!(result, Err(ExtractError::StackUnderflow { offset: 0 }));
    }

    #[test]
    fn test_line_end_only_pops_comment_frames() {
        let mut extractor = TreeExtractor::with_offsets(false);
        // ignored at the root
        extractor.feed(&event(EventKind::LineEnd, "\n")).unwrap();
        assert_eq!(extractor.depth(), 1);

        extractor.feed(&event(EventKind::Comment, "//")).unwrap();
        assert_eq!(extractor.depth(), 2);
        extractor.feed(&event(EventKind::LineEnd, "\n")).unwrap();
        assert_eq!(extractor.depth(), 1);

        // a line end does not close a block frame
        extractor.feed(&event(EventKind::BlockStart, "{")).unwrap();
        extractor.feed(&event(EventKind::LineEnd, "\n")).unwrap();
        assert_eq!(extractor.depth(), 2);
    }

    #[test]
    fn test_statement_end_takes_siblings_since_last_statement() {
        let source = "a; \"x\" y;";
        let mut extractor = TreeExtractor::with_offsets(false);
        extractor
            .feed(&ParseEvent::new(EventKind::Text, source, 0, 1))
            .unwrap();
        extractor
            .feed(&ParseEvent::with_value(EventKind::StatementEnd, source, 1, 2, ";"))
            .unwrap();
        extractor
            .feed(&ParseEvent::with_value(EventKind::Quote, source, 3, 6, "\""))
            .unwrap();
        extractor
            .feed(&ParseEvent::new(EventKind::Text, source, 7, 8))
            .unwrap();
        extractor
            .feed(&ParseEvent::with_value(EventKind::StatementEnd, source, 8, 9, ";"))
            .unwrap();

        let root = extractor.root();
        assert_eq!(root.child_count(), 2);
        let first = root.child(0).unwrap();
        let second = root.child(1).unwrap();
        assert_eq!(first.name(), "statement");
        assert_eq!(second.name(), "statement");
        // the second statement picked up both pending siblings, not just
        // the last one
        let names: Vec<String> = second.children().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["quote", "text"]);
    }

    #[test]
    fn test_statement_end_with_no_pending_siblings() {
        let source = ";";
        let mut extractor = TreeExtractor::with_offsets(false);
        extractor
            .feed(&ParseEvent::with_value(EventKind::StatementEnd, source, 0, 1, ";"))
            .unwrap();
        let root = extractor.root();
        assert_eq!(root.child_count(), 1);
        let statement = root.child(0).unwrap();
        assert_eq!(statement.name(), "statement");
        assert_eq!(statement.child_count(), 0);
    }

    #[test]
    fn test_separator_event_is_unsupported() {
        let mut extractor = TreeExtractor::with_offsets(false);
        let result = extractor.feed(&event(EventKind::Separator, " "));
        assert_eq!(
            result,
            Err(ExtractError::UnsupportedEvent {
                kind: EventKind::Separator,
                offset: 0,
            })
        );
    }

    #[test]
    fn test_offsets_are_recorded_when_enabled() {
        let source = "abc";
        let mut extractor = TreeExtractor::new();
        extractor
            .feed(&ParseEvent::new(EventKind::Text, source, 0, 3))
            .unwrap();
        let leaf = extractor.root().child(0).unwrap();
        assert_eq!(leaf.attr("start").and_then(|v| v.as_int()), Some(0));
        assert_eq!(leaf.attr("end").and_then(|v| v.as_int()), Some(3));
    }
}
