//! Diagnostic data model.

use crate::parser::error::SyntaxError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The file cannot be used as written
    Error,
    /// Suspicious but usable
    Warn,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
        }
    }
}

/// A problem found in a request file, positioned by 1-based line and column.
///
/// `end_column` is exclusive. Serializes with camelCase keys and the severity
/// under `"type"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    pub message: String,
    #[serde(rename = "type")]
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            end_line: None,
            end_column: None,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warn(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            ..Self::error(line, column, message)
        }
    }

    /// Spans the diagnostic to `end_column` on the same line.
    pub fn with_end(mut self, end_column: usize) -> Self {
        self.end_line = Some(self.line);
        self.end_column = Some(end_column);
        self
    }
}

impl From<&SyntaxError> for Diagnostic {
    fn from(err: &SyntaxError) -> Self {
        Diagnostic::error(err.line, err.column, err.short_message())
    }
}
