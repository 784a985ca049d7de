//! XML rendering of trees
//!
//! A `text` node whose only attribute is `value` renders as raw character
//! data; everything else becomes an element named after the node kind with
//! its attributes, self-closing when it has no children.

use crate::tree::node::{Node, Value};

/// Renders a tree to an XML fragment
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    append_xml(&mut out, node);
    out
}

fn append_xml(out: &mut String, node: &Node) {
    let attrs = node.attrs();
    if node.name() == "text" && node.is_leaf() {
        if attrs.is_empty() {
            return;
        }
        if attrs.len() == 1 && attrs[0].0 == "value" {
            out.push_str(&escape_text(&raw_value(&attrs[0].1)));
            return;
        }
    }

    out.push('<');
    out.push_str(&node.name());
    for (key, value) in &attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(&raw_value(value)));
        out.push('"');
    }
    if node.is_leaf() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in node.children() {
        append_xml(out, &child);
    }
    out.push_str("</");
    out.push_str(&node.name());
    out.push('>');
}

fn raw_value(value: &Value) -> String {
    match value {
        Value::Str(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_leaf_renders_as_character_data() {
        let root = Node::new("root");
        let statement = Node::new("statement");
        root.append(&statement).unwrap();
        statement
            .append(&Node::new("text").with_attr("value", "let a = 10"))
            .unwrap();

        assert_eq!(
            render(&root),
            "<root><statement>let a = 10</statement></root>"
        );
    }

    #[test]
    fn test_attributes_and_self_closing() {
        let root = Node::new("root");
        root.append(&Node::new("block").with_attr("type", "{")).unwrap();
        assert_eq!(render(&root), "<root><block type=\"{\" /></root>");
    }

    #[test]
    fn test_escaping() {
        let root = Node::new("root");
        root.append(&Node::new("text").with_attr("value", "a < b & \"c\""))
            .unwrap();
        assert_eq!(render(&root), "<root>a &lt; b &amp; \"c\"</root>");
    }

    #[test]
    fn test_text_with_offsets_renders_as_element() {
        let root = Node::new("root");
        root.append(
            &Node::new("text")
                .with_attr("value", "a")
                .with_attr("start", 0i64),
        )
        .unwrap();
        assert_eq!(
            render(&root),
            "<root><text start=\"0\" value=\"a\" /></root>"
        );
    }
}
