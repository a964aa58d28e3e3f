use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Why a parse failed, without location info.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("failed to read from the source")]
    Io(#[from] IoError),
    #[error("expected `osu file format v` at the start of the file")]
    IncorrectFileHeader,
    #[error("expected delimiter `{0}`")]
    MissingColumn(char),
    #[error("failed to read a number")]
    ExpectedNumber,
    #[error("expected a section header")]
    ExpectedSection,
    #[error("unknown slider path type")]
    InvalidPathType,
    #[error("invalid curve point")]
    InvalidCurvePoint,
    #[error("timing points accessed non-sequentially, probably an aspire map")]
    TimingPointRegression,
    #[error("hit object time regressed by more than 1000ms, probably an aspire map")]
    HitObjectRegression,
}

/// Failure while decoding a beatmap.
///
/// Carries the source name, the 1-based line number, and the offending
/// line with a caret marking the column, whenever the failure happened
/// inside a line.
#[derive(Debug)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Box<Context>>,
}

#[derive(Debug)]
struct Context {
    source_name: Box<str>,
    line_number: usize,
    line: Box<str>,
    column: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    pub(crate) fn with_context(
        kind: ParseErrorKind,
        source_name: &str,
        line_number: usize,
        line: &str,
        column: usize,
    ) -> Self {
        Self {
            kind,
            context: Some(Box::new(Context {
                source_name: source_name.into(),
                line_number,
                line: line.into(),
                column,
            })),
        }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// 1-based line number of the offending line, if the failure happened
    /// inside a line.
    pub fn line_number(&self) -> Option<usize> {
        self.context.as_ref().map(|ctx| ctx.line_number)
    }

    /// Byte offset of the caret within the offending line.
    pub fn column(&self) -> Option<usize> {
        self.context.as_ref().map(|ctx| ctx.column)
    }

    pub fn source_name(&self) -> Option<&str> {
        self.context.as_ref().map(|ctx| &*ctx.source_name)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context {
            Some(ref ctx) => write!(
                f,
                "parse error in {} line {}: {}\n\n    {}\n    {:caret$}^\n",
                ctx.source_name,
                ctx.line_number,
                self.kind,
                ctx.line,
                "",
                caret = ctx.column,
            ),
            None => write!(f, "parse error: {}", self.kind),
        }
    }
}

impl StdError for ParseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.kind)
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<IoError> for ParseError {
    fn from(err: IoError) -> Self {
        Self::new(ParseErrorKind::Io(err))
    }
}
