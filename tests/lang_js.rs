//! Integration tests for the JavaScript delimiter tables
//!
//! These mirror the expected end-to-end behavior: block classification into
//! statements and blocks, quote swallowing, comment extraction, and layering
//! the expression classifier on top of a block-extracted tree.

use parsource::formats::tdoc;
use parsource::langs::javascript;
use parsource::parsing::classifiers::{BlockClassifier, ExpressionClassifier};
use parsource::transform::extractor::{StreamTransform, TreeExtractor};
use parsource::transform::normalize::{expression_expander, normalizer};
use parsource::tree::{Node, Value};

fn parse(text: &str) -> Node {
    let mut extractor = TreeExtractor::with_offsets(false);
    let diagnostics = extractor.process(BlockClassifier::new(text, javascript::blocks()));
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
    extractor.root()
}

#[test]
fn test_let_statement_wraps_into_one_statement() {
    let tree = parse("let a = 10;");

    assert_eq!(tree.child_count(), 1);
    let statement = tree.child(0).unwrap();
    assert_eq!(statement.name(), "statement");
    assert_eq!(
        statement.child(0).unwrap().attr("value"),
        Some(Value::Str("let a = 10".to_string()))
    );
}

#[test]
fn test_expression_layering_reveals_keywords_and_operators() {
    let tree = parse("let a = 10;");
    let expander = expression_expander(javascript::expressions().clone());
    let diagnostics = expander.process(&tree);
    assert!(diagnostics.is_empty());

    let statement = tree.child(0).unwrap();
    let kinds: Vec<String> = statement.children().iter().map(|n| n.name()).collect();
    assert_eq!(kinds, vec!["keyword", "text", "op-inf", "text"]);
    assert_eq!(
        statement.child(0).unwrap().attr("value"),
        Some(Value::Str("let".to_string()))
    );
    assert_eq!(
        statement.child(1).unwrap().attr("value"),
        Some(Value::Str("a".to_string()))
    );
    assert_eq!(
        statement.child(3).unwrap().attr("value"),
        Some(Value::Str("10".to_string()))
    );
}

#[test]
fn test_direct_expression_classification_into_the_extractor() {
    let mut extractor = TreeExtractor::with_offsets(false);
    let diagnostics = extractor.process(ExpressionClassifier::new(
        "let a = 10",
        javascript::expressions(),
    ));
    assert!(diagnostics.is_empty());

    let kinds: Vec<String> = extractor
        .root()
        .children()
        .iter()
        .map(|n| n.name())
        .collect();
    assert_eq!(kinds, vec!["keyword", "text", "op-inf", "text"]);
}

#[test]
fn test_prefix_and_suffix_operators() {
    let mut extractor = TreeExtractor::with_offsets(false);
    let diagnostics = extractor.process(ExpressionClassifier::new(
        "!done i++",
        javascript::expressions(),
    ));
    assert!(diagnostics.is_empty());

    let kinds: Vec<String> = extractor
        .root()
        .children()
        .iter()
        .map(|n| n.name())
        .collect();
    assert_eq!(kinds, vec!["op-pre", "text", "text", "op-suf"]);
}

#[test]
fn test_quotes_swallow_across_kinds() {
    let tree = parse(" 'single' \"double\" ```multiline\nstring``` ");
    let kinds: Vec<String> = tree.children().iter().map(|n| n.name()).collect();
    assert_eq!(kinds, vec!["quote", "quote", "quote"]);
    assert_eq!(
        tree.child(2).unwrap().attr("value"),
        Some(Value::Str("```multiline\nstring```".to_string()))
    );
}

#[test]
fn test_adjacent_block_comments() {
    let tree = parse("/* Comment 1 */ /* Comment 2 */");
    let kinds: Vec<String> = tree.children().iter().map(|n| n.name()).collect();
    assert_eq!(kinds, vec!["block", "block"]);
    assert_eq!(
        tree.child(0).unwrap().attr("type"),
        Some(Value::Str("/*".to_string()))
    );
    assert_eq!(
        tree.child(0).unwrap().child(0).unwrap().attr("value"),
        Some(Value::Str("Comment 1".to_string()))
    );
}

#[test]
fn test_two_statements_snapshot() {
    let tree = parse("let a = 10;const b = 20;");
    insta::assert_snapshot!(tdoc::render(&tree), @r#"
root
├─ statement
│  └─ text value="let a = 10"
└─ statement
   └─ text value="const b = 20"
"#);
}

#[test]
fn test_normalized_comment_snapshot() {
    let tree = parse("let a = 10;\n// @group Parsing\n");
    normalizer().process(&tree);
    insta::assert_snapshot!(tdoc::render(&tree), @r#"
root
├─ statement
│  └─ text value="let a = 10"
└─ parsed-comment
   ├─ directive value="group"
   └─ text value=" Parsing"
"#);
}
