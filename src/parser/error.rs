//! Error types for DSL parsing.
//!
//! A file that fails to parse produces exactly one `SyntaxError`, positioned at
//! the point where the grammar could not continue.

use std::fmt;

/// What the parser expected or rejected at the failure point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Input did not match any alternative; holds a description of what would have.
    Expected(&'static str),

    /// A backslash escape other than `\"` or `\\` inside a string literal.
    InvalidEscape(char),

    /// A string literal ran into the end of its line.
    UnterminatedString,

    /// A processor body without closing backticks.
    UnterminatedProcessor,

    /// An upper-case word in request position that is not an HTTP method.
    UnknownMethod(String),

    /// An integer literal that does not fit in 64 bits.
    IntegerOutOfRange(String),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::Expected(what) => write!(f, "expected {}", what),
            SyntaxErrorKind::InvalidEscape(c) => {
                write!(f, "unsupported escape sequence \"\\{}\"", c)
            }
            SyntaxErrorKind::UnterminatedString => {
                write!(f, "unterminated string literal, expected a closing quote")
            }
            SyntaxErrorKind::UnterminatedProcessor => {
                write!(f, "unterminated processor body, expected \"```\"")
            }
            SyntaxErrorKind::UnknownMethod(method) => write!(
                f,
                "unknown HTTP method '{}', expected one of: GET, POST, PUT, DELETE, PATCH, OPTIONS, HEAD, TRACE, CONNECT",
                method
            ),
            SyntaxErrorKind::IntegerOutOfRange(literal) => {
                write!(f, "integer literal {} is out of range", literal)
            }
        }
    }
}

/// A parse failure with its 1-based location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Line in the source file (1-based)
    pub line: usize,
    /// Column in characters (1-based)
    pub column: usize,
    /// Byte offset of the failure point
    pub offset: usize,
}

impl SyntaxError {
    /// Grammar diagnostic without the location prefix.
    pub fn short_message(&self) -> String {
        self.kind.to_string()
    }

    /// Full message, `Line L, col C: <short message>`.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}, col {}: {}", self.line, self.column, self.kind)
    }
}

impl std::error::Error for SyntaxError {}
