//! Parse events
//!
//! A `ParseEvent` is a classified, positioned occurrence of text or a
//! delimiter. Events borrow the source text and never copy it; the span text
//! is the `source[start..end]` slice. Events are produced once per
//! classification pass and consumed once by the extractor, surviving only as
//! `start`/`end` attribute metadata on the nodes it builds.

use std::fmt;

use crate::parsing::language::EventKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseEvent<'a> {
    pub kind: EventKind,
    pub source: &'a str,
    pub start: usize,
    pub end: usize,
    /// The delimiter literal that produced the event, when there is one
    pub value: Option<&'a str>,
}

impl<'a> ParseEvent<'a> {
    pub fn new(kind: EventKind, source: &'a str, start: usize, end: usize) -> ParseEvent<'a> {
        ParseEvent {
            kind,
            source,
            start,
            end,
            value: None,
        }
    }

    pub fn with_value(
        kind: EventKind,
        source: &'a str,
        start: usize,
        end: usize,
        value: &'a str,
    ) -> ParseEvent<'a> {
        ParseEvent {
            kind,
            source,
            start,
            end,
            value: Some(value),
        }
    }

    /// The text span covered by the event
    pub fn text(&self) -> &'a str {
        &self.source[self.start..self.end]
    }
}

impl fmt::Display for ParseEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(event {} {:?}", self.kind, self.text())?;
        if let Some(value) = self.value {
            write!(f, " {:?}", value)?;
        }
        write!(f, ")")
    }
}
