//! JSON rendering of trees

use serde_json::{json, Map, Value as Json};

use crate::tree::node::{Node, Value};

fn json_value(value: &Value) -> Json {
    match value {
        Value::Str(text) => json!(text),
        Value::Int(int) => json!(int),
        Value::Float(float) => json!(float),
        Value::Bool(boolean) => json!(boolean),
    }
}

/// Builds the JSON value for a tree
pub fn to_json(node: &Node) -> Json {
    let mut object = Map::new();
    object.insert("id".to_string(), json!(node.id()));
    object.insert("name".to_string(), json!(node.name()));
    if node.has_attributes() {
        let mut attributes = Map::new();
        for (key, value) in node.attrs() {
            attributes.insert(key, json_value(&value));
        }
        object.insert("attributes".to_string(), Json::Object(attributes));
    }
    if !node.is_leaf() {
        let children: Vec<Json> = node.children().iter().map(to_json).collect();
        object.insert("children".to_string(), Json::Array(children));
    }
    Json::Object(object)
}

/// Renders a tree to pretty-printed JSON
pub fn render(node: &Node) -> String {
    serde_json::to_string_pretty(&to_json(node)).unwrap_or_default()
}
