//! The tdoc display format
//!
//! tdoc renders a tree one node per line: the kind name followed by
//! `key=value` attribute pairs, with children beneath, indented with
//! box-drawing connectors:
//!
//!   root
//!   ├─ statement
//!   │  └─ text value="let a = 10"
//!   └─ parsed-comment
//!      └─ directive value="group"
//!
//! The companion reader parses this exact format back into a tree, which is
//! how fixture trees are written in tests. Attribute values use a restricted
//! literal grammar — double-quoted escaped strings, integers, floats and
//! booleans — and are never evaluated; a line holding a malformed literal is
//! skipped.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tree::node::{Node, Value};

static NODE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>[│├└─\s]*)(?P<name>[A-Za-z][A-Za-z0-9_-]*)(?P<attrs>.*)$").unwrap()
});

static ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<key>[A-Za-z_][A-Za-z0-9_-]*)=(?P<value>"(?:[^"\\]|\\.)*"|\S+)"#).unwrap()
});

/// Error parsing a tdoc attribute literal
#[derive(Debug, Clone, PartialEq)]
pub struct BadLiteral(pub String);

impl std::error::Error for BadLiteral {}

impl fmt::Display for BadLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed literal {:?}", self.0)
    }
}

/// Renders a tree to the tdoc format
pub fn render(root: &Node) -> String {
    let mut out = String::new();
    out.push_str(&node_line(root));
    let children = root.children();
    for (index, child) in children.iter().enumerate() {
        append_node(&mut out, child, "", index == children.len() - 1);
    }
    out
}

fn node_line(node: &Node) -> String {
    let mut line = node.name();
    for (key, value) in node.attrs() {
        line.push(' ');
        line.push_str(&key);
        line.push('=');
        line.push_str(&value.to_string());
    }
    line
}

fn append_node(out: &mut String, node: &Node, prefix: &str, is_last: bool) {
    let connector = if is_last { "└─ " } else { "├─ " };
    out.push('\n');
    out.push_str(prefix);
    out.push_str(connector);
    out.push_str(&node_line(node));

    let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
    let children = node.children();
    for (index, child) in children.iter().enumerate() {
        append_node(out, child, &child_prefix, index == children.len() - 1);
    }
}

/// Parses a single attribute literal
pub fn parse_literal(text: &str) -> Result<Value, BadLiteral> {
    if let Some(inner) = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return unescape(inner).map(Value::Str).ok_or_else(|| BadLiteral(text.to_string()));
    }
    match text {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if text.contains(['.', 'e', 'E']) {
        if let Ok(float) = text.parse::<f64>() {
            return Ok(Value::Float(float));
        }
    } else if let Ok(int) = text.parse::<i64>() {
        return Ok(Value::Int(int));
    }
    Err(BadLiteral(text.to_string()))
}

fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            _ => return None,
        }
    }
    Some(out)
}

/// Parses tdoc text back into a tree. Lines that are not node lines, and
/// node lines holding a malformed attribute literal, are skipped.
pub fn parse(text: &str) -> Option<Node> {
    let mut stack: Vec<(usize, Node)> = Vec::new();
    for line in text.lines() {
        let Some(caps) = NODE_LINE.captures(line) else {
            continue;
        };
        let indent = caps
            .name("indent")
            .map(|m| m.as_str().chars().count())
            .unwrap_or(0);
        let Some(name) = caps.name("name") else {
            continue;
        };
        let attrs_text = caps.name("attrs").map(|m| m.as_str()).unwrap_or("");

        let mut attrs = Vec::new();
        let mut malformed = false;
        for attr in ATTR.captures_iter(attrs_text) {
            let (Some(key), Some(raw)) = (attr.name("key"), attr.name("value")) else {
                continue;
            };
            match parse_literal(raw.as_str()) {
                Ok(value) => attrs.push((key.as_str().to_string(), value)),
                Err(_) => {
                    malformed = true;
                    break;
                }
            }
        }
        if malformed {
            continue;
        }

        let node = Node::new(name.as_str());
        for (key, value) in attrs {
            node.set_attr(&key, value);
        }

        if stack.is_empty() {
            stack.push((indent, node));
            continue;
        }
        while stack.len() > 1 && stack.last().map(|(i, _)| *i >= indent).unwrap_or(false) {
            stack.pop();
        }
        if let Some((_, parent)) = stack.last() {
            if parent.append(&node).is_err() {
                continue;
            }
        }
        stack.push((indent, node));
    }
    stack.into_iter().next().map(|(_, node)| node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_connectors() {
        let root = Node::new("root");
        let statement = Node::new("statement");
        root.append(&statement).unwrap();
        statement
            .append(&Node::new("text").with_attr("value", "let a = 10"))
            .unwrap();
        let parsed = Node::new("parsed-comment");
        root.append(&parsed).unwrap();
        parsed
            .append(&Node::new("directive").with_attr("value", "group"))
            .unwrap();

        let expected = "root\n\
                        ├─ statement\n\
                        │  └─ text value=\"let a = 10\"\n\
                        └─ parsed-comment\n\
                        \u{20}  └─ directive value=\"group\"";
        assert_eq!(render(&root), expected);
    }

    #[test]
    fn test_parse_literal_types() {
        assert_eq!(parse_literal("\"a b\""), Ok(Value::Str("a b".to_string())));
        assert_eq!(
            parse_literal("\"a\\n\\\"b\\\"\""),
            Ok(Value::Str("a\n\"b\"".to_string()))
        );
        assert_eq!(parse_literal("42"), Ok(Value::Int(42)));
        assert_eq!(parse_literal("-7"), Ok(Value::Int(-7)));
        assert_eq!(parse_literal("2.5"), Ok(Value::Float(2.5)));
        assert_eq!(parse_literal("true"), Ok(Value::Bool(true)));
        assert_eq!(parse_literal("false"), Ok(Value::Bool(false)));
        assert!(parse_literal("beep").is_err());
        assert!(parse_literal("\"bad\\q\"").is_err());
    }

    #[test]
    fn test_parse_simple_tree() {
        let tree = parse(
            "root\n\
             ├─ keyword value=\"let\"\n\
             ├─ text value=\"a\"\n\
             ├─ op-inf value=\"=\"\n\
             └─ text value=\"10\"",
        )
        .unwrap();
        assert_eq!(tree.name(), "root");
        assert_eq!(tree.child_count(), 4);
        assert_eq!(
            tree.child(0).unwrap().attr("value"),
            Some(Value::Str("let".to_string()))
        );
        assert_eq!(tree.child(2).unwrap().name(), "op-inf");
    }

    #[test]
    fn test_parse_nested_and_dedent() {
        let tree = parse(
            "root\n\
             ├─ block type=\"{\"\n\
             │  └─ statement\n\
             │     └─ text value=\"a\"\n\
             └─ text value=\"tail\"",
        )
        .unwrap();
        assert_eq!(tree.child_count(), 2);
        let block = tree.child(0).unwrap();
        assert_eq!(block.name(), "block");
        let statement = block.child(0).unwrap();
        assert_eq!(statement.name(), "statement");
        assert_eq!(statement.child_count(), 1);
        assert_eq!(tree.child(1).unwrap().name(), "text");
    }

    #[test]
    fn test_malformed_literal_skips_line() {
        let tree = parse(
            "root\n\
             ├─ text value=@broken\n\
             └─ text value=\"kept\"",
        )
        .unwrap();
        assert_eq!(tree.child_count(), 1);
        assert_eq!(
            tree.child(0).unwrap().attr("value"),
            Some(Value::Str("kept".to_string()))
        );
    }

    #[test]
    fn test_round_trip() {
        let root = Node::new("root");
        let statement = Node::new("statement")
            .with_attr("start", 0i64)
            .with_attr("end", 11i64);
        root.append(&statement).unwrap();
        statement
            .append(
                &Node::new("text")
                    .with_attr("value", "a \"quoted\"\nline")
                    .with_attr("score", 2.5)
                    .with_attr("kept", true),
            )
            .unwrap();

        let rendered = render(&root);
        let reparsed = parse(&rendered).unwrap();
        assert!(root.structural_eq(&reparsed));
    }
}
