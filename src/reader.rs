use std::io::BufRead;
use std::str::FromStr;

use crate::error::{ParseError, ParseErrorKind, ParseResult};

/// Strip leading and trailing ASCII spaces and tabs.
pub(crate) fn trim_space(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\t')
}

fn trim_leading_space(s: &str) -> &str {
    s.trim_start_matches(|c| c == ' ' || c == '\t')
}

/// Slice off the column before the first `delim`, trimmed, and advance
/// `line` past the delimiter.
///
/// Only succeeds if a delimiter is present, so it cannot take the final
/// column; empty columns would be impossible to detect otherwise.
pub(crate) fn try_take_column<'a>(line: &mut &'a str, delim: char) -> Option<&'a str> {
    let idx = line.find(delim)?;
    let column = trim_space(&line[..idx]);
    *line = trim_leading_space(&line[idx + delim.len_utf8()..]);

    Some(column)
}

/// Advance `line` past `prefix` if it starts with it.
pub(crate) fn try_take_prefix(line: &mut &str, prefix: &str) -> bool {
    match line.strip_prefix(prefix) {
        Some(rest) => {
            *line = trim_leading_space(rest);

            true
        }
        None => false,
    }
}

/// Numbers parseable from a leading token of a column.
pub(crate) trait Num: FromStr {
    /// Whether the token may contain `.` and an exponent.
    const FLOAT: bool;
}

macro_rules! impl_num {
    ( FLOAT: $( $float:ty ),* ; INT: $( $int:ty ),* ) => {
        $( impl Num for $float { const FLOAT: bool = true; } )*
        $( impl Num for $int { const FLOAT: bool = false; } )*
    };
}

impl_num!(FLOAT: f32, f64; INT: i32, i64, u32, u64, usize);

/// Length of the longest numeric token at the start of `s`.
fn numeric_prefix(s: &str, float: bool) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }

    if float {
        if bytes.get(i) == Some(&b'.') {
            i += 1;

            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
        }

        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            let mut j = i + 1;

            if matches!(bytes.get(j), Some(b'+' | b'-')) {
                j += 1;
            }

            if bytes.get(j).is_some_and(u8::is_ascii_digit) {
                while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                    j += 1;
                }

                i = j;
            }
        }
    }

    i
}

/// Reads whitespace-trimmed logical lines from a byte stream and slices
/// them into columns and numbers, tracking the 1-based line number for
/// diagnostics.
pub(crate) struct LineParser<R> {
    inner: R,
    source_name: Box<str>,
    buf: String,
    line_number: usize,
}

impl<R: BufRead> LineParser<R> {
    pub(crate) fn new(inner: R, source_name: &str) -> Self {
        Self {
            inner,
            source_name: source_name.into(),
            buf: String::with_capacity(128),
            line_number: 0,
        }
    }

    /// Advance to the next non-empty logical line.
    ///
    /// Returns `Ok(false)` on end of input. The line itself is available
    /// through [`LineParser::line`] until the next call.
    pub(crate) fn read_line(&mut self) -> ParseResult<bool> {
        loop {
            self.buf.clear();

            if self.inner.read_line(&mut self.buf)? == 0 {
                return Ok(false);
            }

            self.line_number += 1;

            // Tolerate a UTF-8 BOM on the first line
            if self.line_number == 1 && self.buf.starts_with('\u{feff}') {
                self.buf.drain(..'\u{feff}'.len_utf8());
            }

            if !self.line().is_empty() {
                return Ok(true);
            }
        }
    }

    /// The most recently read line, trimmed.
    ///
    /// Lets the section dispatcher hand the section-header line to a
    /// section parser without consuming another line.
    pub(crate) fn line(&self) -> &str {
        let mut line = self.buf.as_str();
        line = line.strip_suffix('\n').unwrap_or(line);
        line = line.strip_suffix('\r').unwrap_or(line);

        trim_space(line)
    }

    /// Build a [`ParseError`] with a caret pointing at `at`, which must be
    /// a subslice of the current line.
    pub(crate) fn error(&self, kind: ParseErrorKind, at: &str) -> ParseError {
        let line = self.line();

        let column = (at.as_ptr() as usize)
            .checked_sub(line.as_ptr() as usize)
            .filter(|&idx| idx <= line.len())
            .unwrap_or(0);

        ParseError::with_context(kind, &self.source_name, self.line_number, line, column)
    }

    /// Like [`try_take_column`], but a missing delimiter is an error.
    pub(crate) fn take_column<'a>(
        &self,
        line: &mut &'a str,
        delim: char,
    ) -> ParseResult<&'a str> {
        match try_take_column(line, delim) {
            Some(column) => Ok(column),
            None => Err(self.error(ParseErrorKind::MissingColumn(delim), line)),
        }
    }

    /// Parse a leading numeric token and advance past it.
    pub(crate) fn take_number<T: Num>(&self, line: &mut &str) -> ParseResult<T> {
        let len = numeric_prefix(line, T::FLOAT);

        match line[..len].parse() {
            Ok(n) => {
                *line = trim_leading_space(&line[len..]);

                Ok(n)
            }
            Err(_) => Err(self.error(ParseErrorKind::ExpectedNumber, line)),
        }
    }

    /// Parse a numeric column and advance past the delimiter.
    ///
    /// Contrary to [`LineParser::take_column`] this also takes the final
    /// column; a final empty column would be invalid anyway.
    pub(crate) fn take_numeric_column<T: Num>(
        &self,
        line: &mut &str,
        delim: char,
    ) -> ParseResult<T> {
        let n = self.take_number(line)?;
        try_take_column(line, delim);

        Ok(n)
    }

    /// Like [`LineParser::take_numeric_column`] but an exhausted line
    /// yields `None` instead of an error.
    pub(crate) fn try_take_numeric_column<T: Num>(
        &self,
        line: &mut &str,
        delim: char,
    ) -> ParseResult<Option<T>> {
        if line.is_empty() {
            return Ok(None);
        }

        let n = self.take_number(line)?;
        try_take_column(line, delim);

        Ok(Some(n))
    }
}
