//! Event classifiers
//!
//! Two classifiers share the scanner but assign different semantics to the
//! delimiter hits.
//!
//! The block classifier carries one piece of state beyond the scanner:
//! whether it is inside a quote. While inside, every delimiter except the
//! matching closing quote literal is swallowed; the closing literal emits a
//! single `quote` event spanning the whole quoted text, marks included. On
//! any other delimiter it first emits a trimmed `text` event for the
//! preceding gap, then the event whose kind the table assigns.
//!
//! The expression classifier has no quote state; separators are consumed
//! silently, everything else (keywords, operators) becomes a leaf event.
//!
//! A delimiter without a kind in the table is a fatal configuration error:
//! it is yielded as an `Err` item and the iterator fuses.

use crate::parsing::events::ParseEvent;
use crate::parsing::language::{
    BlockLanguage, EventKind, ExpressionLanguage, LanguageError, DEFAULT_LOOKAHEAD,
};
use crate::parsing::scanner::{scan, DelimiterScan};

/// Narrows `[start, end)` past leading and trailing trim characters
pub fn trim_span(text: &str, trim: &str, start: usize, end: usize) -> (usize, usize) {
    let mut start = start;
    let mut end = end;
    while let Some(c) = text[start..end].chars().next() {
        if trim.contains(c) {
            start += c.len_utf8();
        } else {
            break;
        }
    }
    while let Some(c) = text[start..end].chars().next_back() {
        if trim.contains(c) {
            end -= c.len_utf8();
        } else {
            break;
        }
    }
    (start, end)
}

/// Classifier for block-oriented delimiter tables
pub struct BlockClassifier<'a> {
    text: &'a str,
    lang: &'a BlockLanguage,
    scan: DelimiterScan<'a>,
    quote: Option<(&'a str, usize)>,
    queued: Option<ParseEvent<'a>>,
    fused: bool,
}

impl<'a> BlockClassifier<'a> {
    pub fn new(text: &'a str, lang: &'a BlockLanguage) -> BlockClassifier<'a> {
        Self::with_lookahead(text, lang, DEFAULT_LOOKAHEAD)
    }

    pub fn with_lookahead(
        text: &'a str,
        lang: &'a BlockLanguage,
        lookahead: usize,
    ) -> BlockClassifier<'a> {
        BlockClassifier {
            text,
            lang,
            scan: scan(text, lang.delimiters(), lang.escape(), lookahead),
            quote: None,
            queued: None,
            fused: false,
        }
    }

    fn text_event(&self, start: usize, end: usize) -> Option<ParseEvent<'a>> {
        let (start, end) = trim_span(self.text, self.lang.trim(), start, end);
        if start < end {
            Some(ParseEvent::new(EventKind::Text, self.text, start, end))
        } else {
            None
        }
    }
}

impl<'a> Iterator for BlockClassifier<'a> {
    type Item = Result<ParseEvent<'a>, LanguageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        if let Some(event) = self.queued.take() {
            return Some(Ok(event));
        }
        loop {
            let (start, end, delimiter) = self.scan.next()?;
            let Some(delimiter) = delimiter else {
                // trailing fragment
                match self.text_event(start, end) {
                    Some(event) => return Some(Ok(event)),
                    None => continue,
                }
            };

            if let Some((quote_literal, quote_start)) = self.quote {
                if delimiter == quote_literal {
                    self.quote = None;
                    return Some(Ok(ParseEvent::with_value(
                        EventKind::Quote,
                        self.text,
                        quote_start,
                        end,
                        delimiter,
                    )));
                }
                // swallowed inside the quote
                continue;
            }

            let delimiter_start = end - delimiter.len();
            let text_event = if start < delimiter_start {
                self.text_event(start, delimiter_start)
            } else {
                None
            };

            let kind = match self.lang.kind(delimiter) {
                Some(kind) => kind,
                None => {
                    self.fused = true;
                    return Some(Err(LanguageError::UnknownDelimiter(delimiter.to_string())));
                }
            };

            if kind == EventKind::Quote {
                self.quote = Some((delimiter, delimiter_start));
                match text_event {
                    Some(event) => return Some(Ok(event)),
                    None => continue,
                }
            }

            let event =
                ParseEvent::with_value(kind, self.text, delimiter_start, end, delimiter);
            match text_event {
                Some(text) => {
                    self.queued = Some(event);
                    return Some(Ok(text));
                }
                None => return Some(Ok(event)),
            }
        }
    }
}

/// Classifier for expression-oriented delimiter tables
pub struct ExpressionClassifier<'a> {
    text: &'a str,
    lang: &'a ExpressionLanguage,
    scan: DelimiterScan<'a>,
    queued: Option<ParseEvent<'a>>,
    fused: bool,
}

impl<'a> ExpressionClassifier<'a> {
    pub fn new(text: &'a str, lang: &'a ExpressionLanguage) -> ExpressionClassifier<'a> {
        Self::with_lookahead(text, lang, DEFAULT_LOOKAHEAD)
    }

    pub fn with_lookahead(
        text: &'a str,
        lang: &'a ExpressionLanguage,
        lookahead: usize,
    ) -> ExpressionClassifier<'a> {
        ExpressionClassifier {
            text,
            lang,
            scan: scan(text, lang.delimiters(), lang.escape(), lookahead),
            queued: None,
            fused: false,
        }
    }

    fn text_event(&self, start: usize, end: usize) -> Option<ParseEvent<'a>> {
        let (start, end) = trim_span(self.text, self.lang.trim(), start, end);
        if start < end {
            Some(ParseEvent::new(EventKind::Text, self.text, start, end))
        } else {
            None
        }
    }
}

impl<'a> Iterator for ExpressionClassifier<'a> {
    type Item = Result<ParseEvent<'a>, LanguageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        if let Some(event) = self.queued.take() {
            return Some(Ok(event));
        }
        loop {
            let (start, end, delimiter) = self.scan.next()?;
            let Some(delimiter) = delimiter else {
                match self.text_event(start, end) {
                    Some(event) => return Some(Ok(event)),
                    None => continue,
                }
            };

            let delimiter_start = end - delimiter.len();
            let text_event = if start < delimiter_start {
                self.text_event(start, delimiter_start)
            } else {
                None
            };

            let kind = match self.lang.kind(delimiter) {
                Some(kind) => kind,
                None => {
                    self.fused = true;
                    return Some(Err(LanguageError::UnknownDelimiter(delimiter.to_string())));
                }
            };

            if kind == EventKind::Separator {
                match text_event {
                    Some(event) => return Some(Ok(event)),
                    None => continue,
                }
            }

            let event =
                ParseEvent::with_value(kind, self.text, delimiter_start, end, delimiter);
            match text_event {
                Some(text) => {
                    self.queued = Some(event);
                    return Some(Ok(text));
                }
                None => return Some(Ok(event)),
            }
        }
    }
}
