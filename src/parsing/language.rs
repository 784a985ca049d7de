//! Delimiter tables
//!
//! A language variant is described declaratively by the categorized delimiter
//! lists of a `BlockSpec` (comments, quotes, block pairs, terminators) or an
//! `ExpressionSpec` (separators, keywords, operators). Building a spec
//! produces an immutable table holding the single flattened delimiter list
//! used by the scanner and the literal → event-kind lookup used by the
//! classifiers.
//!
//! A literal appearing under two categories is a configuration error and is
//! reported at build time, never at scan time. The escape character is not
//! part of the delimiter list; escaped delimiters are invisible to the
//! scanner instead.
//!
//! Specs derive serde traits so language definitions can also be loaded from
//! JSON or YAML files.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Scanner lookahead window used when none is given explicitly
pub const DEFAULT_LOOKAHEAD: usize = 320;

/// What a classified delimiter occurrence means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Text,
    Comment,
    Quote,
    LineEnd,
    StatementEnd,
    BlockStart,
    BlockEnd,
    Keyword,
    OperatorInfix,
    OperatorPrefix,
    OperatorSuffix,
    Separator,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Text => "text",
            EventKind::Comment => "comment",
            EventKind::Quote => "quote",
            EventKind::LineEnd => "line-end",
            EventKind::StatementEnd => "statement-end",
            EventKind::BlockStart => "block-start",
            EventKind::BlockEnd => "block-end",
            EventKind::Keyword => "keyword",
            EventKind::OperatorInfix => "op-inf",
            EventKind::OperatorPrefix => "op-pre",
            EventKind::OperatorSuffix => "op-suf",
            EventKind::Separator => "separator",
        };
        write!(f, "{}", label)
    }
}

/// Errors in the delimiter table configuration or its use
#[derive(Debug, Clone, PartialEq)]
pub enum LanguageError {
    /// A literal is listed under two categories
    DuplicateDelimiter {
        literal: String,
        first: EventKind,
        second: EventKind,
    },
    /// A category contains an empty literal
    EmptyDelimiter { kind: EventKind },
    /// The classifier hit a delimiter with no kind in the table
    UnknownDelimiter(String),
    /// A spec file could not be read
    Io { path: String, message: String },
    /// A spec file could not be deserialized
    Spec { path: String, message: String },
    /// A spec file has an extension other than json/yaml/yml
    UnsupportedExtension(String),
}

impl std::error::Error for LanguageError {}

impl fmt::Display for LanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageError::DuplicateDelimiter {
                literal,
                first,
                second,
            } => write!(
                f,
                "delimiter {:?} is listed as both {} and {}",
                literal, first, second
            ),
            LanguageError::EmptyDelimiter { kind } => {
                write!(f, "empty delimiter literal in {} list", kind)
            }
            LanguageError::UnknownDelimiter(literal) => {
                write!(f, "unknown delimiter {:?}", literal)
            }
            LanguageError::Io { path, message } => {
                write!(f, "cannot read language spec {}: {}", path, message)
            }
            LanguageError::Spec { path, message } => {
                write!(f, "invalid language spec {}: {}", path, message)
            }
            LanguageError::UnsupportedExtension(path) => {
                write!(f, "unsupported language spec extension: {}", path)
            }
        }
    }
}

fn default_escape() -> char {
    '\\'
}

fn default_trim() -> String {
    " \t\n".to_string()
}

fn default_line_end() -> Vec<String> {
    vec!["\n".to_string()]
}

/// Declarative description of a block-oriented language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSpec {
    #[serde(default = "default_escape")]
    pub escape: char,
    #[serde(default = "default_trim")]
    pub trim: String,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub quotes: Vec<String>,
    #[serde(default)]
    pub blocks: Vec<(String, String)>,
    #[serde(default = "default_line_end")]
    pub line_end: Vec<String>,
    #[serde(default)]
    pub statement_end: Vec<String>,
}

impl BlockSpec {
    /// Validates the spec and derives the immutable table
    pub fn build(self) -> Result<BlockLanguage, LanguageError> {
        let mut delimiters = Vec::new();
        let mut events = HashMap::new();

        let opens: Vec<String> = self.blocks.iter().map(|(open, _)| open.clone()).collect();
        let closes: Vec<String> = self.blocks.iter().map(|(_, close)| close.clone()).collect();

        register(&mut delimiters, &mut events, &self.comments, EventKind::Comment)?;
        register(&mut delimiters, &mut events, &opens, EventKind::BlockStart)?;
        register(&mut delimiters, &mut events, &closes, EventKind::BlockEnd)?;
        register(&mut delimiters, &mut events, &self.quotes, EventKind::Quote)?;
        register(&mut delimiters, &mut events, &self.line_end, EventKind::LineEnd)?;
        register(
            &mut delimiters,
            &mut events,
            &self.statement_end,
            EventKind::StatementEnd,
        )?;

        let mut block_match = HashMap::new();
        for (open, close) in &self.blocks {
            block_match.insert(open.clone(), close.clone());
            block_match.insert(close.clone(), open.clone());
        }

        Ok(BlockLanguage {
            escape: self.escape,
            trim: self.trim,
            delimiters,
            events,
            block_match,
        })
    }
}

/// Declarative description of an expression-oriented language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionSpec {
    #[serde(default = "default_escape")]
    pub escape: char,
    #[serde(default = "default_trim")]
    pub trim: String,
    #[serde(default)]
    pub separators: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub operator_infix: Vec<String>,
    #[serde(default)]
    pub operator_prefix: Vec<String>,
    #[serde(default)]
    pub operator_suffix: Vec<String>,
}

impl ExpressionSpec {
    /// Validates the spec and derives the immutable table
    pub fn build(self) -> Result<ExpressionLanguage, LanguageError> {
        let mut delimiters = Vec::new();
        let mut events = HashMap::new();

        register(
            &mut delimiters,
            &mut events,
            &self.separators,
            EventKind::Separator,
        )?;
        register(&mut delimiters, &mut events, &self.keywords, EventKind::Keyword)?;
        register(
            &mut delimiters,
            &mut events,
            &self.operator_infix,
            EventKind::OperatorInfix,
        )?;
        register(
            &mut delimiters,
            &mut events,
            &self.operator_prefix,
            EventKind::OperatorPrefix,
        )?;
        register(
            &mut delimiters,
            &mut events,
            &self.operator_suffix,
            EventKind::OperatorSuffix,
        )?;

        Ok(ExpressionLanguage {
            escape: self.escape,
            trim: self.trim,
            delimiters,
            events,
        })
    }
}

fn register(
    delimiters: &mut Vec<String>,
    events: &mut HashMap<String, EventKind>,
    literals: &[String],
    kind: EventKind,
) -> Result<(), LanguageError> {
    for literal in literals {
        if literal.is_empty() {
            return Err(LanguageError::EmptyDelimiter { kind });
        }
        if let Some(first) = events.get(literal) {
            return Err(LanguageError::DuplicateDelimiter {
                literal: literal.clone(),
                first: *first,
                second: kind,
            });
        }
        events.insert(literal.clone(), kind);
        delimiters.push(literal.clone());
    }
    Ok(())
}

/// Immutable delimiter table for the block classifier
#[derive(Debug, Clone)]
pub struct BlockLanguage {
    escape: char,
    trim: String,
    delimiters: Vec<String>,
    events: HashMap<String, EventKind>,
    block_match: HashMap<String, String>,
}

impl BlockLanguage {
    pub fn escape(&self) -> char {
        self.escape
    }

    pub fn trim(&self) -> &str {
        &self.trim
    }

    /// The flattened delimiter list, in category order
    pub fn delimiters(&self) -> &[String] {
        &self.delimiters
    }

    pub fn kind(&self, literal: &str) -> Option<EventKind> {
        self.events.get(literal).copied()
    }

    /// The opening delimiter for a close, and vice versa
    pub fn matching_block(&self, literal: &str) -> Option<&str> {
        self.block_match.get(literal).map(String::as_str)
    }
}

/// Immutable delimiter table for the expression classifier
#[derive(Debug, Clone)]
pub struct ExpressionLanguage {
    escape: char,
    trim: String,
    delimiters: Vec<String>,
    events: HashMap<String, EventKind>,
}

impl ExpressionLanguage {
    pub fn escape(&self) -> char {
        self.escape
    }

    pub fn trim(&self) -> &str {
        &self.trim
    }

    pub fn delimiters(&self) -> &[String] {
        &self.delimiters
    }

    pub fn kind(&self, literal: &str) -> Option<EventKind> {
        self.events.get(literal).copied()
    }
}

/// Loads a `BlockSpec` from a `.json`, `.yaml` or `.yml` file
pub fn load_block_spec<P: AsRef<Path>>(path: P) -> Result<BlockSpec, LanguageError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| LanguageError::Io {
        path: display.clone(),
        message: e.to_string(),
    })?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| LanguageError::Spec {
            path: display,
            message: e.to_string(),
        }),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| LanguageError::Spec {
            path: display,
            message: e.to_string(),
        }),
        _ => Err(LanguageError::UnsupportedExtension(display)),
    }
}
