// TermiBase
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Lexical pre-pass for the analyzer.
//!
//! SQL text is scanned twice: once in its original form and once "masked",
//! with string literal contents and comments blanked out. Both strings have
//! identical byte offsets, so keyword searches run on the masked text while
//! extracted fragments are sliced from the original.

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Literal,
    LineComment,
    BlockComment,
}

/// Blanks single-quoted literal contents and comments, keeping byte offsets.
///
/// Literal quotes themselves survive so `'...'` still reads as a value. An
/// unterminated literal or comment blanks everything up to the end.
pub(crate) fn mask(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut state = ScanState::Code;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            ScanState::Code => match c {
                '\'' => {
                    state = ScanState::Literal;
                    out.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = ScanState::LineComment;
                    out.push_str("  ");
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = ScanState::BlockComment;
                    out.push_str("  ");
                }
                _ => out.push(c),
            },
            ScanState::Literal => {
                if c == '\'' {
                    state = ScanState::Code;
                    out.push(c);
                } else {
                    blank(&mut out, c);
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Code;
                    out.push(c);
                } else {
                    blank(&mut out, c);
                }
            }
            ScanState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = ScanState::Code;
                    out.push_str("  ");
                } else {
                    blank(&mut out, c);
                }
            }
        }
    }

    out
}

fn blank(out: &mut String, c: char) {
    for _ in 0..c.len_utf8() {
        out.push(' ');
    }
}

/// Parenthesis depth at the end of `text`. Never negative.
pub(crate) fn depth_at_end(text: &str) -> usize {
    text.chars().fold(0usize, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth.saturating_sub(1),
        _ => depth,
    })
}

/// A span of the query, available in original and masked form.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Span<'a> {
    pub original: &'a str,
    pub masked: &'a str,
}

impl<'a> Span<'a> {
    /// Slices both forms at the same byte range. `None` if the range is not
    /// valid for either string.
    pub fn slice(original: &'a str, masked: &'a str, start: usize, end: usize) -> Option<Self> {
        Some(Self {
            original: original.get(start..end)?,
            masked: masked.get(start..end)?,
        })
    }

    pub fn is_blank(&self) -> bool {
        self.masked.trim().is_empty()
    }

    /// Splits on `separator` outside parentheses and literals.
    pub fn split_top_level(&self, separator: char) -> Vec<Span<'a>> {
        let mut parts = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;

        for (idx, c) in self.masked.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                c if c == separator && depth == 0 => {
                    if let Some(part) = Span::slice(self.original, self.masked, start, idx) {
                        parts.push(part);
                    }
                    start = idx + c.len_utf8();
                }
                _ => {}
            }
        }

        if let Some(part) = Span::slice(self.original, self.masked, start, self.masked.len()) {
            parts.push(part);
        }

        parts
    }

    /// Splits at every match of `pattern` in the masked text, regardless of
    /// nesting.
    pub fn split_on(&self, pattern: &Regex) -> Vec<Span<'a>> {
        let mut parts = Vec::new();
        let mut start = 0usize;

        for m in pattern.find_iter(self.masked) {
            if let Some(part) = Span::slice(self.original, self.masked, start, m.start()) {
                parts.push(part);
            }
            start = m.end();
        }

        if let Some(part) = Span::slice(self.original, self.masked, start, self.masked.len()) {
            parts.push(part);
        }

        parts
    }

    pub fn trim(&self) -> Span<'a> {
        let leading = self.masked.len() - self.masked.trim_start().len();
        let trailing = self.masked.len() - self.masked.trim_end().len();
        let end = self.masked.len() - trailing;
        if leading >= end {
            return Span {
                original: "",
                masked: "",
            };
        }
        Span::slice(self.original, self.masked, leading, end).unwrap_or(Span {
            original: "",
            masked: "",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_blanks_literals_and_keeps_length() {
        let sql = "SELECT * FROM t WHERE name = 'a AND b'";
        let masked = mask(sql);
        assert_eq!(masked.len(), sql.len());
        assert_eq!(masked, "SELECT * FROM t WHERE name = '       '");
    }

    #[test]
    fn test_mask_handles_escaped_quotes_and_multibyte() {
        let sql = "SELECT 'it''s ü' FROM t";
        let masked = mask(sql);
        assert_eq!(masked.len(), sql.len());
        assert!(masked.ends_with("FROM t"));
        assert!(!masked.contains('ü'));
    }

    #[test]
    fn test_mask_blanks_comments() {
        let sql = "-- WHERE x\nSELECT /* JOIN */ a FROM t";
        let masked = mask(sql);
        assert_eq!(masked.len(), sql.len());
        assert!(!masked.contains("WHERE"));
        assert!(!masked.contains("JOIN"));
        assert!(masked.contains("SELECT"));
    }

    #[test]
    fn test_split_top_level_respects_parentheses() {
        let sql = "COALESCE(a, b), c, 'x,y'";
        let masked = mask(sql);
        let span = Span::slice(sql, &masked, 0, sql.len()).unwrap();
        let parts: Vec<&str> = span.split_top_level(',').iter().map(|p| p.trim().original).collect();
        assert_eq!(parts, vec!["COALESCE(a, b)", "c", "'x,y'"]);
    }

    #[test]
    fn test_depth_at_end() {
        assert_eq!(depth_at_end("f(a, (b"), 2);
        assert_eq!(depth_at_end("x))"), 0);
    }

    #[test]
    fn test_trim_blank_span() {
        let sql = "   ";
        let span = Span::slice(sql, sql, 0, 3).unwrap();
        assert!(span.is_blank());
        assert_eq!(span.trim().original, "");
    }
}
