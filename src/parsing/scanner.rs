//! Escape-aware delimiter scanner
//!
//! `scan` walks the source text and yields `(start, end, delimiter)` triples
//! for every delimiter occurrence, where `start` is the beginning of the
//! still-unconsumed text and `end` is one past the delimiter. A final
//! `(start, len, None)` triple covers the trailing fragment.
//!
//! Each step searches every delimiter literal within a bounded lookahead
//! window and picks the candidate with the smallest start offset; at equal
//! offsets the longest literal wins. A candidate whose immediately preceding
//! character is the escape character is rejected — per candidate, so each
//! literal's first occurrence in the window is the only one considered that
//! round. When the window holds no candidate at all, the scanner advances by
//! the window size without emitting; the skipped gap becomes part of the next
//! emitted span (or of the trailing fragment).
//!
//! The bounded window keeps per-position cost proportional to
//! `delimiters × lookahead` instead of `delimiters × text length`. The price
//! is that a delimiter lying beyond the window, or straddling its edge, is
//! invisible to that scan step; this is a documented, tunable limitation.

/// Builds a fresh scan over `text`. The sequence is single-pass and finite.
pub fn scan<'a>(
    text: &'a str,
    delimiters: &'a [String],
    escape: char,
    lookahead: usize,
) -> DelimiterScan<'a> {
    DelimiterScan {
        text,
        delimiters,
        escape,
        lookahead: lookahead.max(1),
        start: 0,
        cursor: 0,
        done: false,
    }
}

/// Iterator over delimiter occurrences; see [`scan`]
pub struct DelimiterScan<'a> {
    text: &'a str,
    delimiters: &'a [String],
    escape: char,
    lookahead: usize,
    start: usize,
    cursor: usize,
    done: bool,
}

impl<'a> DelimiterScan<'a> {
    fn is_escaped(&self, position: usize) -> bool {
        position > 0 && self.text[..position].chars().next_back() == Some(self.escape)
    }

    /// End of the current window, clamped to a character boundary and
    /// guaranteed to make progress
    fn window_end(&self) -> usize {
        let len = self.text.len();
        let mut end = (self.cursor + self.lookahead).min(len);
        while end > self.cursor && !self.text.is_char_boundary(end) {
            end -= 1;
        }
        if end <= self.cursor {
            end = (self.cursor + 1).min(len);
            while end < len && !self.text.is_char_boundary(end) {
                end += 1;
            }
        }
        end
    }
}

impl<'a> Iterator for DelimiterScan<'a> {
    type Item = (usize, usize, Option<&'a str>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let len = self.text.len();
        while self.cursor < len {
            let window_end = self.window_end();
            let window = &self.text[self.cursor..window_end];

            let mut best: Option<(usize, &'a str)> = None;
            for delimiter in self.delimiters {
                if delimiter.is_empty() {
                    continue;
                }
                if let Some(offset) = window.find(delimiter.as_str()) {
                    let position = self.cursor + offset;
                    if self.is_escaped(position) {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((best_position, best_literal)) => {
                            position < best_position
                                || (position == best_position
                                    && delimiter.len() > best_literal.len())
                        }
                    };
                    if better {
                        best = Some((position, delimiter.as_str()));
                    }
                }
            }

            match best {
                Some((position, literal)) => {
                    let end = position + literal.len();
                    let span = (self.start, end, Some(literal));
                    self.cursor = end;
                    self.start = end;
                    return Some(span);
                }
                None => {
                    // no candidate in the window; the gap folds into the
                    // next emitted span
                    self.cursor = window_end;
                }
            }
        }
        self.done = true;
        if self.start < len {
            return Some((self.start, len, None));
        }
        None
    }
}
