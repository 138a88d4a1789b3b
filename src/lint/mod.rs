//! Static checks over request files.
//!
//! [`detect_undefined_vars`] checks one resolved request and may report the same
//! problem more than once. [`find_lint`] drives it over every request of a file
//! and de-duplicates the combined results by `(line, message)`.

pub mod model;
pub mod undefined_vars;

pub use model::{Diagnostic, Severity};
pub use undefined_vars::detect_undefined_vars;

use crate::context::RequestContext;
use crate::lines::LineTracker;
use crate::parser::parse;
use std::collections::HashSet;

/// Lints a whole file.
///
/// A syntax error yields a single error diagnostic and nothing else. Otherwise
/// each request is resolved at its first line; resolution failures become error
/// diagnostics at that line.
///
/// # Arguments
///
/// * `source` - The full file content
///
/// # Returns
///
/// Diagnostics in file order, at most one per `(line, message)` pair.
///
/// # Examples
///
/// ```
/// use pie::lint::find_lint;
///
/// let diagnostics = find_lint("Host: h\nAuth: $auth\n\nGET /a\n\nGET /b");
/// assert_eq!(diagnostics.len(), 1);
/// assert_eq!(diagnostics[0].message, "Reference to undefined var $auth");
/// ```
pub fn find_lint(source: &str) -> Vec<Diagnostic> {
    let file = match parse(source) {
        Ok(file) => file,
        Err(err) => return vec![Diagnostic::from(&err)],
    };

    let lines = LineTracker::new(&file.source);
    let mut diagnostics = Vec::new();
    for request in file.requests() {
        let line = lines.line_of(request.interval.start);
        match RequestContext::create(&file, line) {
            Ok(context) => diagnostics.extend(detect_undefined_vars(&context)),
            Err(err) => diagnostics.push(Diagnostic::error(line, 1, err.to_string())),
        }
    }

    let total = diagnostics.len();
    let diagnostics = dedupe(diagnostics);
    log::debug!("lint: {} diagnostics ({} before de-duplication)", diagnostics.len(), total);
    diagnostics
}

/// Keeps the first diagnostic for each `(line, message)` pair.
pub fn dedupe(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    diagnostics
        .into_iter()
        .filter(|d| seen.insert((d.line, d.message.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_header_reported_once() {
        let diagnostics = find_lint("Host: h\nAuth: $auth\n\nGET /a\n\nGET /b");

        assert_eq!(
            diagnostics,
            vec![Diagnostic::warn(2, 7, "Reference to undefined var $auth").with_end(12)]
        );
    }

    #[test]
    fn test_syntax_error_becomes_single_diagnostic() {
        let diagnostics = find_lint("Auth: $auth\n\n$cargo = dolls\nGET /a/$x\n");

        assert_eq!(
            diagnostics,
            vec![Diagnostic::error(
                3,
                10,
                "expected a number or a string literal"
            )]
        );
    }

    #[test]
    fn test_missing_processor_is_an_error() {
        let diagnostics = find_lint("Host: h\n\nGET /a | nope\n");

        assert_eq!(
            diagnostics,
            vec![Diagnostic::error(
                3,
                1,
                "Request uses non-existent Processor nope"
            )]
        );
    }

    #[test]
    fn test_clean_file() {
        let diagnostics =
            find_lint("$ship = \"serenity\"\nHost: https://serenity.co\n\nGET /cargo/$ship\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence_order() {
        let diagnostics = dedupe(vec![
            Diagnostic::warn(3, 1, "b"),
            Diagnostic::warn(1, 1, "a"),
            Diagnostic::warn(3, 9, "b"),
            Diagnostic::error(3, 1, "c"),
        ]);

        let keys: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.line, d.message.as_str()))
            .collect();
        assert_eq!(keys, vec![(3, "b"), (1, "a"), (3, "c")]);
    }
}
