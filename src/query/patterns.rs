//! Tree-query pattern combinators
//!
//! Patterns match subsets of a tree: a name pattern matches one node by a
//! glob over its kind name, a sequence pattern matches a run of siblings,
//! and an alternative pattern matches the first of its branches that does.
//! Any pattern can carry a capture slot; slot bindings surface on the
//! returned `Match`.
//!
//! A match value is either one node or a list of nodes, modeled as a tagged
//! variant and matched exhaustively.

use regex::Regex;

use crate::tree::node::Node;

/// What a pattern matched: a single node or a sibling run
#[derive(Debug, Clone)]
pub enum MatchValue {
    One(Node),
    Many(Vec<Node>),
}

impl MatchValue {
    pub fn nodes(&self) -> Vec<Node> {
        match self {
            MatchValue::One(node) => vec![node.clone()],
            MatchValue::Many(nodes) => nodes.clone(),
        }
    }
}

/// A successful pattern application
#[derive(Debug, Clone)]
pub struct Match {
    pub value: MatchValue,
    /// Slot bindings, innermost first
    pub slots: Vec<(String, MatchValue)>,
}

impl Match {
    pub fn slot(&self, name: &str) -> Option<&MatchValue> {
        self.slots
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, value)| value)
    }
}

enum Matcher {
    Name { regex: Regex },
    Seq(Vec<Pattern>),
    Any(Vec<Pattern>),
}

/// A composable tree-query pattern
pub struct Pattern {
    matcher: Matcher,
    slot: Option<String>,
}

/// A pattern matching one node whose kind name matches `glob`
/// (`*` and `?` wildcards)
pub fn named(glob: &str) -> Pattern {
    Pattern {
        matcher: Matcher::Name {
            regex: compile_glob(glob),
        },
        slot: None,
    }
}

/// A pattern matching a run of siblings, one sub-pattern each
pub fn seq_of(patterns: Vec<Pattern>) -> Pattern {
    Pattern {
        matcher: Matcher::Seq(patterns),
        slot: None,
    }
}

/// A pattern matching the first branch that matches
pub fn any_of(patterns: Vec<Pattern>) -> Pattern {
    Pattern {
        matcher: Matcher::Any(patterns),
        slot: None,
    }
}

fn compile_glob(glob: &str) -> Regex {
    let mut pattern = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    // every other character is escaped, so the pattern is valid by
    // construction
    Regex::new(&pattern).expect("escaped glob compiles")
}

impl Pattern {
    /// Names this pattern's capture slot
    pub fn slot(mut self, name: &str) -> Pattern {
        self.slot = Some(name.to_string());
        self
    }

    /// Chains `next` after this pattern as a sibling sequence
    pub fn then(self, next: Pattern) -> Pattern {
        match self {
            Pattern {
                matcher: Matcher::Seq(mut of),
                slot,
            } => {
                of.push(next);
                Pattern {
                    matcher: Matcher::Seq(of),
                    slot,
                }
            }
            first => seq_of(vec![first, next]),
        }
    }

    /// Applies the pattern at `node`
    pub fn matches(&self, node: &Node) -> Option<Match> {
        match &self.matcher {
            Matcher::Name { regex } => {
                if regex.is_match(&node.name()) {
                    Some(self.wrap(MatchValue::One(node.clone()), Vec::new()))
                } else {
                    None
                }
            }
            Matcher::Seq(of) => {
                let mut matched = Vec::new();
                let mut slots = Vec::new();
                let mut current = Some(node.clone());
                for pattern in of {
                    let candidate = current?;
                    let found = pattern.matches(&candidate)?;
                    slots.extend(found.slots);
                    current = candidate.next_sibling();
                    matched.push(candidate);
                }
                Some(self.wrap(MatchValue::Many(matched), slots))
            }
            Matcher::Any(of) => of
                .iter()
                .find_map(|pattern| pattern.matches(node))
                .map(|found| self.wrap(found.value, found.slots)),
        }
    }

    fn wrap(&self, value: MatchValue, mut slots: Vec<(String, MatchValue)>) -> Match {
        if let Some(name) = &self.slot {
            slots.push((name.clone(), value.clone()));
        }
        Match { value, slots }
    }
}

/// Applies `pattern` at every node of a depth-first walk
pub fn find(pattern: &Pattern, tree: &Node) -> Vec<(Node, Match)> {
    tree.walk()
        .filter_map(|node| pattern.matches(&node).map(|found| (node, found)))
        .collect()
}
