//! Tree normalization passes
//!
//! These are ordinary transforms registered against specific node kinds on
//! the dispatch engine:
//!
//! - comment decomposition splits a comment's raw text against a small
//!   ordered pattern set (an `@name` directive marker and a `--`/`―`
//!   separator marker); unmatched spans stay as plain text children, and a
//!   parenthesized block sibling becomes a comma-split `args` node attached
//!   to the preceding directive. Decomposed comments are renamed
//!   `parsed-comment`, which keeps re-runs from decomposing twice.
//! - statement normalization wraps stray text into `statement` wrappers,
//!   absorbs trailing text siblings into existing statements, drops empty
//!   statements, and stitches directive-less comments back into their
//!   preceding sibling (multi-line comments).
//! - expression expansion re-classifies `text` leaves with an expression
//!   table, layering keyword/operator structure into a block-classified
//!   tree.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parsing::classifiers::ExpressionClassifier;
use crate::parsing::language::ExpressionLanguage;
use crate::transform::extractor::leaf_name;
use crate::tree::node::{Node, Value};
use crate::tree::processor::{TreeError, TreeProcessor};

static DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(?P<value>[a-z][a-z0-9]+)").unwrap());
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"--\s+|―\s*").unwrap());

enum PieceKind {
    Directive(String),
    Separator,
    Text,
}

struct Piece {
    start: usize,
    end: usize,
    kind: PieceKind,
}

/// Splits comment text into directive/separator/text pieces. Overlapping
/// matches resolve greedily left to right.
fn split_comment(text: &str) -> Vec<Piece> {
    let mut matches: Vec<Piece> = Vec::new();
    for found in DIRECTIVE.captures_iter(text) {
        if let (Some(whole), Some(value)) = (found.get(0), found.name("value")) {
            matches.push(Piece {
                start: whole.start(),
                end: whole.end(),
                kind: PieceKind::Directive(value.as_str().to_string()),
            });
        }
    }
    for found in SEPARATOR.find_iter(text) {
        matches.push(Piece {
            start: found.start(),
            end: found.end(),
            kind: PieceKind::Separator,
        });
    }
    matches.sort_by_key(|piece| piece.start);

    let mut pieces = Vec::new();
    let mut cursor = 0;
    for piece in matches {
        if piece.start < cursor {
            continue;
        }
        if cursor < piece.start {
            pieces.push(Piece {
                start: cursor,
                end: piece.start,
                kind: PieceKind::Text,
            });
        }
        cursor = piece.end;
        pieces.push(piece);
    }
    if cursor < text.len() {
        pieces.push(Piece {
            start: cursor,
            end: text.len(),
            kind: PieceKind::Text,
        });
    }
    pieces
}

fn decompose_text(node: &Node) -> Result<(), TreeError> {
    let Some(Value::Str(text)) = node.attr("value") else {
        return Ok(());
    };
    let base = node.attr("start").and_then(|value| value.as_int());

    let mut replacements = Vec::new();
    for piece in split_comment(&text) {
        let child = match piece.kind {
            PieceKind::Directive(value) => Node::new("directive").with_attr("value", value),
            PieceKind::Separator => Node::new("separator"),
            PieceKind::Text => {
                Node::new("text").with_attr("value", &text[piece.start..piece.end])
            }
        };
        if let Some(base) = base {
            child.set_attr("start", base + piece.start as i64);
            child.set_attr("end", base + piece.end as i64);
        }
        replacements.push(child);
    }
    node.replace_with(replacements)?;
    Ok(())
}

/// Turns a parenthesized block inside a comment into an `args` node and
/// hangs it off the preceding directive
fn lift_args(node: &Node) -> Result<(), TreeError> {
    if node.attr("type").as_ref().and_then(Value::as_str) != Some("(") {
        return Ok(());
    }
    let joined: String = node
        .walk()
        .filter_map(|descendant| match descendant.attr("value") {
            Some(Value::Str(text)) => Some(text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");
    let args: Vec<Node> = joined
        .split(',')
        .map(|piece| Node::new("text").with_attr("value", piece.trim()))
        .collect();
    node.set_children(args)?;
    node.set_name("args");
    if let Some(previous) = node.previous_sibling() {
        if previous.name() == "directive" {
            previous.append(&node.detach())?;
        }
    }
    Ok(())
}

/// The transform run over a comment's subtree
pub fn comment_processor() -> TreeProcessor {
    TreeProcessor::recursive()
        .on("text", |_, node| decompose_text(node))
        .on("block", |_, node| lift_args(node))
}

/// The full normalization pass over an extracted tree
pub fn normalizer() -> TreeProcessor {
    let comments = comment_processor();
    TreeProcessor::recursive()
        .on("text", |_, node| {
            let Some(parent) = node.parent() else {
                return Ok(());
            };
            if matches!(parent.name().as_str(), "root" | "block") {
                node.wrap(&Node::new("statement"))?;
            }
            Ok(())
        })
        .on("statement", |_, node| {
            while let Some(next) = node.next_sibling() {
                if next.name() != "text" {
                    break;
                }
                node.append(&next.detach())?;
            }
            if node.child_count() == 0 {
                node.detach();
            }
            Ok(())
        })
        .on("comment", move |_, node| {
            if let Some(diagnostic) = comments.process(node).into_iter().next() {
                return Err(TreeError::Message(diagnostic.to_string()));
            }
            node.set_name("parsed-comment");
            let leading_directive = node
                .first_child()
                .map(|child| child.name() == "directive")
                .unwrap_or(false);
            if !leading_directive && node.first_child().is_some() {
                if let Some(previous) = node.previous_sibling() {
                    for child in node.children() {
                        previous.append(&child.detach())?;
                    }
                    node.detach();
                }
            }
            Ok(())
        })
        .on("parsed-comment", |_, _| Ok(()))
}

/// A pass that re-classifies `text` leaves with an expression table
pub fn expression_expander(lang: ExpressionLanguage) -> TreeProcessor {
    TreeProcessor::recursive()
        .on("text", move |_, node| expand_text(&lang, node))
        .on("comment", |_, _| Ok(()))
        .on("parsed-comment", |_, _| Ok(()))
}

fn expand_text(lang: &ExpressionLanguage, node: &Node) -> Result<(), TreeError> {
    let Some(Value::Str(text)) = node.attr("value") else {
        return Ok(());
    };
    let base = node.attr("start").and_then(|value| value.as_int());

    let mut leaves = Vec::new();
    for item in ExpressionClassifier::new(&text, lang) {
        let event = item.map_err(|error| TreeError::Message(error.to_string()))?;
        let Some(name) = leaf_name(event.kind) else {
            continue;
        };
        let leaf = Node::new(name).with_attr("value", event.text());
        if let Some(base) = base {
            leaf.set_attr("start", base + event.start as i64);
            leaf.set_attr("end", base + event.end as i64);
        }
        leaves.push(leaf);
    }
    // a single plain text span means no structure was found
    if leaves.is_empty() || (leaves.len() == 1 && leaves[0].name() == "text") {
        return Ok(());
    }
    node.replace_with(leaves)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Node {
        Node::new("text").with_attr("value", value)
    }

    #[test]
    fn test_split_comment_pieces() {
        let pieces = split_comment("@group Parsing -- details");
        let kinds: Vec<&str> = pieces
            .iter()
            .map(|piece| match piece.kind {
                PieceKind::Directive(_) => "directive",
                PieceKind::Separator => "separator",
                PieceKind::Text => "text",
            })
            .collect();
        assert_eq!(kinds, vec!["directive", "text", "separator", "text"]);
    }

    #[test]
    fn test_comment_decomposition_with_directive() {
        let root = Node::new("root");
        let comment = Node::new("comment");
        root.append(&comment).unwrap();
        comment.append(&text("@group Parsing")).unwrap();

        let diagnostics = normalizer().process(&root);
        assert!(diagnostics.is_empty());

        let parsed = root.child(0).unwrap();
        assert_eq!(parsed.name(), "parsed-comment");
        let names: Vec<String> = parsed.children().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["directive", "text"]);
        assert_eq!(
            parsed.child(0).unwrap().attr("value"),
            Some(Value::Str("group".to_string()))
        );
        assert_eq!(
            parsed.child(1).unwrap().attr("value"),
            Some(Value::Str(" Parsing".to_string()))
        );
    }

    #[test]
    fn test_decomposition_offsets_rebase_on_source() {
        let root = Node::new("root");
        let comment = Node::new("comment");
        root.append(&comment).unwrap();
        let inner = text("@group Parsing");
        inner.set_attr("start", 3i64);
        inner.set_attr("end", 17i64);
        comment.append(&inner).unwrap();

        normalizer().process(&root);

        let parsed = root.child(0).unwrap();
        let directive = parsed.child(0).unwrap();
        assert_eq!(directive.attr("start"), Some(Value::Int(3)));
        assert_eq!(directive.attr("end"), Some(Value::Int(9)));
    }

    #[test]
    fn test_args_lift_onto_directive() {
        // comment: @param(a, b)
        let root = Node::new("root");
        let comment = Node::new("comment");
        root.append(&comment).unwrap();
        comment.append(&text("@param")).unwrap();
        let block = Node::new("block").with_attr("type", "(");
        block.append(&text("a, b")).unwrap();
        comment.append(&block).unwrap();

        let diagnostics = normalizer().process(&root);
        assert!(diagnostics.is_empty());

        let parsed = root.child(0).unwrap();
        assert_eq!(parsed.name(), "parsed-comment");
        assert_eq!(parsed.child_count(), 1);
        let directive = parsed.child(0).unwrap();
        assert_eq!(directive.name(), "directive");
        let args = directive.child(0).unwrap();
        assert_eq!(args.name(), "args");
        let values: Vec<Option<Value>> =
            args.children().iter().map(|n| n.attr("value")).collect();
        assert_eq!(
            values,
            vec![
                Some(Value::Str("a".to_string())),
                Some(Value::Str("b".to_string())),
            ]
        );
    }

    #[test]
    fn test_directive_less_comment_stitches_into_previous() {
        let root = Node::new("root");
        let first = Node::new("comment");
        first.append(&text("@function Some function")).unwrap();
        let second = Node::new("comment");
        second.append(&text("with docs")).unwrap();
        root.append(&first).unwrap();
        root.append(&second).unwrap();

        let diagnostics = normalizer().process(&root);
        assert!(diagnostics.is_empty());

        assert_eq!(root.child_count(), 1);
        let parsed = root.child(0).unwrap();
        assert_eq!(parsed.name(), "parsed-comment");
        let values: Vec<Option<Value>> = parsed
            .children()
            .iter()
            .map(|n| n.attr("value"))
            .collect();
        assert_eq!(
            values,
            vec![
                Some(Value::Str("function".to_string())),
                Some(Value::Str(" Some function".to_string())),
                Some(Value::Str("with docs".to_string())),
            ]
        );
    }

    #[test]
    fn test_stray_text_is_wrapped_and_absorbed() {
        let root = Node::new("root");
        let statement = Node::new("statement");
        statement.append(&text("a = 10")).unwrap();
        root.append(&statement).unwrap();
        root.append(&text("b = 20")).unwrap();

        let diagnostics = normalizer().process(&root);
        assert!(diagnostics.is_empty());

        // the trailing text was absorbed into the statement
        assert_eq!(root.child_count(), 1);
        assert_eq!(statement.child_count(), 2);
    }

    #[test]
    fn test_lone_stray_text_gets_a_statement_wrapper() {
        let root = Node::new("root");
        root.append(&text("a = 10")).unwrap();

        normalizer().process(&root);

        assert_eq!(root.child_count(), 1);
        let wrapper = root.child(0).unwrap();
        assert_eq!(wrapper.name(), "statement");
        assert_eq!(wrapper.child_count(), 1);
    }

    #[test]
    fn test_empty_statements_are_dropped() {
        let root = Node::new("root");
        root.append(&Node::new("statement")).unwrap();
        root.append(&Node::new("statement")).unwrap();

        normalizer().process(&root);
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn test_normalizer_is_idempotent_on_shape() {
        let root = Node::new("root");
        let comment = Node::new("comment");
        comment.append(&text("@group Parsing")).unwrap();
        root.append(&comment).unwrap();
        root.append(&text("a = 10")).unwrap();

        let pass = normalizer();
        pass.process(&root);
        let rendered = crate::formats::tdoc::render(&root);
        pass.process(&root);
        assert_eq!(crate::formats::tdoc::render(&root), rendered);
    }

    #[test]
    fn test_expression_expansion() {
        let root = Node::new("root");
        let statement = Node::new("statement");
        root.append(&statement).unwrap();
        statement.append(&text("let a = 10")).unwrap();

        let pass = expression_expander(crate::langs::javascript::expressions().clone());
        let diagnostics = pass.process(&root);
        assert!(diagnostics.is_empty());

        let names: Vec<String> = statement.children().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["keyword", "text", "op-inf", "text"]);

        // a second run does not change the shape
        pass.process(&root);
        let names_again: Vec<String> =
            statement.children().iter().map(|n| n.name()).collect();
        assert_eq!(names_again, names);
    }
}
