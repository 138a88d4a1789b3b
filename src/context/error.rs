//! Errors raised while resolving a request from a parsed file.

use std::fmt;

/// A parsed file does not yield a usable request at the queried location.
///
/// These are recoverable by the caller: a CLI reports them and exits non-zero,
/// the lint driver turns them into error diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No request's line range contains the queried line.
    NoRequest { line: usize },

    /// The request path is relative and no `Host` header is in scope.
    NoHost,

    /// The request names a processor that is not defined in the file.
    MissingProcessor { name: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NoRequest { line } => write!(f, "No request found at line {}", line),
            ResolveError::NoHost => write!(f, "No host provided"),
            ResolveError::MissingProcessor { name } => {
                write!(f, "Request uses non-existent Processor {}", name)
            }
        }
    }
}

impl std::error::Error for ResolveError {}
