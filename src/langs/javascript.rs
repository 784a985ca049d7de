//! JavaScript delimiter tables

use once_cell::sync::Lazy;

use crate::parsing::language::{BlockLanguage, BlockSpec, ExpressionLanguage, ExpressionSpec};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

static BLOCKS: Lazy<BlockLanguage> = Lazy::new(|| {
    BlockSpec {
        escape: '\\',
        trim: " \t\n".to_string(),
        comments: strings(&["//", "#"]),
        quotes: strings(&["\"", "'", "```"]),
        blocks: vec![
            ("{".to_string(), "}".to_string()),
            ("[".to_string(), "]".to_string()),
            ("(".to_string(), ")".to_string()),
            ("/*".to_string(), "*/".to_string()),
        ],
        line_end: strings(&["\n"]),
        statement_end: strings(&[";", ":"]),
    }
    .build()
    .expect("javascript block table is consistent")
});

static EXPRESSIONS: Lazy<ExpressionLanguage> = Lazy::new(|| {
    ExpressionSpec {
        escape: '\\',
        trim: " \t\n".to_string(),
        separators: strings(&[" ", "\t"]),
        keywords: strings(&["let", "const", "for", "else", "if", "then", "while"]),
        operator_infix: strings(&[
            "=", "!=", "!==", "+=", "*=", "/=", "+", "-", "/", "*", "^", "|", "&", "||", "&&",
            ">", "<", ">=", "<=", "<<", ">>",
        ]),
        // `-` is infix only; a literal cannot sit in two categories
        operator_prefix: strings(&["!"]),
        operator_suffix: strings(&["++", "--"]),
    }
    .build()
    .expect("javascript expression table is consistent")
});

/// The block-oriented table: comments, quotes, brackets, terminators
pub fn blocks() -> &'static BlockLanguage {
    &BLOCKS
}

/// The expression-oriented table: keywords, operators, separators
pub fn expressions() -> &'static ExpressionLanguage {
    &EXPRESSIONS
}
