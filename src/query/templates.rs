//! Template-to-pattern compiler
//!
//! Templates are a small line-matching language used to cherry-pick regions
//! of a source file: `<export?> class <NAME>` matches `export class Foo` and
//! `class Foo`, binding the class name to the `NAME` capture group.
//!
//! A template parses into a pattern tree of `expr`, `tmpl`, `text` and `sep`
//! nodes (reusing the generic tree type), which compiles to an anchored
//! regular expression:
//!
//! - `<a|b|c>` is an alternative; a trailing `?` makes it optional
//! - `<NAME>` and `<NAME:symbol>` become named capture groups
//! - `<>` is an optional separator
//! - separator characters become mandatory whitespace

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::tree::node::{Node, Value};

static TEMPLATE_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z_]+)(:([a-z_]+))?$").unwrap());

/// Errors compiling a template to a regular expression
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    UnknownSymbol { symbol: String },
    UnsupportedNode { kind: String },
    Regex(String),
}

impl std::error::Error for TemplateError {}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnknownSymbol { symbol } => {
                write!(f, "unsupported template symbol '{}'", symbol)
            }
            TemplateError::UnsupportedNode { kind } => {
                write!(f, "node kind '{}' not supported in a template", kind)
            }
            TemplateError::Regex(message) => write!(f, "template regex error: {}", message),
        }
    }
}

/// The pattern a capture symbol expands to
fn symbol_pattern(symbol: &str) -> Option<&'static str> {
    match symbol {
        "name" => Some(r"[A-Za-z_][A-Za-z0-9_]*"),
        "rest" => Some(r".*"),
        _ => None,
    }
}

fn value_of(node: &Node) -> String {
    match node.attr("value") {
        Some(Value::Str(text)) => text,
        _ => String::new(),
    }
}

fn cardinality_of(node: &Node) -> String {
    match node.attr("cardinality") {
        Some(Value::Str(text)) => text,
        _ => String::new(),
    }
}

fn append_child(parent: &Node, kind: &str) -> Node {
    let node = Node::new(kind);
    match parent.append(&node) {
        Ok(attached) => attached,
        Err(_) => node,
    }
}

pub struct Template;

impl Template {
    /// Parses a template into its pattern tree
    pub fn parse(text: &str, separator: char) -> Node {
        let root = Node::new("expr");
        let mut stack: Vec<Node> = vec![root.clone()];
        let mut current = root.clone();
        let mut last = '\0';
        for c in text.chars() {
            if c == separator {
                if current.name() != "sep" {
                    current = append_child(&current, "sep");
                }
            } else if c == '<' && last != '\\' {
                let top = stack.last().cloned().unwrap_or_else(|| root.clone());
                current = append_child(&top, "tmpl");
                stack.push(current.clone());
            } else if c == '>' {
                if last == '<' {
                    // an empty `<>` is an optional separator
                    current.set_name("sep");
                    current.set_attr("cardinality", "?");
                } else if last == '?' {
                    let mut value = value_of(&current);
                    value.pop();
                    current.set_attr("value", value);
                    if let Some(top) = stack.last() {
                        top.set_attr("cardinality", "?");
                    }
                }
                current = stack.pop().unwrap_or_else(|| root.clone());
                if stack.is_empty() {
                    stack.push(root.clone());
                }
            } else if c == '|' {
                let top = stack.last().cloned().unwrap_or_else(|| root.clone());
                current = append_child(&top, "text");
            } else if current.name() == "text" {
                let mut value = value_of(&current);
                value.push(c);
                current.set_attr("value", value);
            } else {
                let top = stack.last().cloned().unwrap_or_else(|| root.clone());
                current = append_child(&top, "text");
                current.set_attr("value", c.to_string());
            }
            last = c;
        }
        root
    }

    /// Converts a pattern tree into a regular expression string
    pub fn to_regexp(node: &Node) -> Result<String, TemplateError> {
        match node.name().as_str() {
            "expr" => {
                let mut out = String::new();
                for child in node.children() {
                    out.push_str(&Self::to_regexp(&child)?);
                }
                Ok(out)
            }
            "tmpl" => {
                let mut groups = Vec::new();
                let mut separator = String::new();
                for child in node.children() {
                    match child.name().as_str() {
                        "text" => {
                            let text = value_of(&child);
                            if let Some(caps) = TEMPLATE_GROUP.captures(&text) {
                                let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                                let symbol = caps
                                    .get(3)
                                    .map(|m| m.as_str())
                                    .unwrap_or(name)
                                    .to_lowercase();
                                match symbol_pattern(&symbol) {
                                    Some(pattern) => {
                                        groups.push(format!("(?P<{}>{})", name, pattern))
                                    }
                                    None => {
                                        return Err(TemplateError::UnknownSymbol { symbol })
                                    }
                                }
                            } else {
                                groups.push(Self::to_regexp(&child)?);
                            }
                        }
                        "tmpl" => groups.push(Self::to_regexp(&child)?),
                        "sep" => separator = Self::to_regexp(&child)?,
                        other => {
                            return Err(TemplateError::UnsupportedNode {
                                kind: other.to_string(),
                            })
                        }
                    }
                }
                let mut out = groups.join("|");
                if !separator.is_empty() {
                    out = format!("({}){}", out, separator);
                }
                Ok(format!("({}){}", out, cardinality_of(node)))
            }
            "text" => {
                let value = value_of(node);
                let mut out = String::new();
                let mut in_space = false;
                for c in value.chars() {
                    if c == ' ' {
                        if !in_space {
                            out.push_str(r"\s+");
                            in_space = true;
                        }
                    } else {
                        in_space = false;
                        out.push_str(&regex::escape(&c.to_string()));
                    }
                }
                for child in node.children() {
                    out.push_str(&Self::to_regexp(&child)?);
                }
                Ok(out)
            }
            "sep" => Ok(if cardinality_of(node) == "?" {
                r"\s*".to_string()
            } else {
                r"\s+".to_string()
            }),
            other => Err(TemplateError::UnsupportedNode {
                kind: other.to_string(),
            }),
        }
    }

    /// Compiles a template into an anchored regular expression
    pub fn compile(text: &str, separator: char) -> Result<Regex, TemplateError> {
        let pattern = Self::to_regexp(&Self::parse(text, separator))?;
        Regex::new(&format!("^{}", pattern)).map_err(|e| TemplateError::Regex(e.to_string()))
    }

    /// S-expression rendering of a pattern tree, for fixtures and debugging
    pub fn to_sexpr(node: &Node) -> String {
        let mut out = format!("({}", node.name());
        let value = value_of(node);
        if !value.is_empty() {
            out.push(' ');
            out.push_str(&value);
        }
        for child in node.children() {
            out.push(' ');
            out.push_str(&Self::to_sexpr(&child));
        }
        out.push(')');
        out.push_str(&cardinality_of(node));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_alternative_and_groups() {
        let cases = [
            (
                "<export?> class <NAME>",
                "(expr (tmpl (text export) (sep))? (text class (sep)) (tmpl (text NAME)))",
            ),
            (
                "<var|const|let> <NAME>",
                "(expr (tmpl (text var) (text const) (text let) (sep)) (tmpl (text NAME)))",
            ),
            (
                "var <NAME><>=<>",
                "(expr (text var (sep)) (tmpl (text NAME)) (sep)? (text =) (sep)?)",
            ),
        ];
        for (template, expected) in cases {
            let tree = Template::parse(template, ' ');
            assert_eq!(Template::to_sexpr(&tree), expected, "template: {}", template);
        }
    }

    #[test]
    fn test_compiled_templates_match() {
        let cases: &[(&str, &[&str])] = &[
            ("<export?> class <NAME>", &["export class Foo", "class Foo"]),
            ("<var|const|let> <NAME>", &["var foo", "const foo", "let foo"]),
            ("var <NAME><>=<>", &["var foo=", "var foo =", "var foo = "]),
        ];
        for (template, lines) in cases {
            let regex = Template::compile(template, ' ').unwrap();
            for line in *lines {
                assert!(regex.is_match(line), "{} should match {}", template, line);
            }
        }
    }

    #[test]
    fn test_named_group_captures() {
        let regex = Template::compile("<var|const|let> <NAME>", ' ').unwrap();
        let caps = regex.captures("let total").unwrap();
        assert_eq!(caps.name("NAME").map(|m| m.as_str()), Some("total"));
    }

    #[test]
    fn test_unknown_symbol_is_an_error() {
        let error = Template::compile("<NAME:bogus>", ' ').unwrap_err();
        assert_eq!(
            error,
            TemplateError::UnknownSymbol {
                symbol: "bogus".to_string()
            }
        );
    }

    #[test]
    fn test_rest_symbol() {
        let regex = Template::compile("import <WHAT:rest>", ' ').unwrap();
        let caps = regex.captures("import { a, b } from 'mod'").unwrap();
        assert_eq!(
            caps.name("WHAT").map(|m| m.as_str()),
            Some("{ a, b } from 'mod'")
        );
    }
}
