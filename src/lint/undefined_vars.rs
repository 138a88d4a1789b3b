//! Detection of `$name` references that resolve to no variable.

use super::model::Diagnostic;
use crate::context::RequestContext;
use crate::lines::LineTracker;
use crate::models::ast::is_name_byte;
use crate::models::Interval;
use once_cell::sync::Lazy;
use regex::Regex;

static VAR_REF_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z0-9_-]+)").expect("Failed to compile var reference regex"));

/// Yields a warning for every reference to an undefined variable in the
/// context's headers, request body and request path.
///
/// One diagnostic per occurrence; the same reference seen through two owners
/// is reported twice.
///
/// # Arguments
///
/// * `context` - The resolved scope of one request
///
/// # Returns
///
/// An iterator of `Warn` diagnostics positioned at each `$name` token.
pub fn detect_undefined_vars<'c>(
    context: &'c RequestContext<'c>,
) -> impl Iterator<Item = Diagnostic> + 'c {
    scanned_texts(context)
        .into_iter()
        .flat_map(|(text, owner)| {
            references(&text)
                .into_iter()
                .map(move |name| (name, owner))
        })
        .filter(move |(name, _)| !context.has_var(name))
        .map(move |(name, owner)| locate(context.lines(), &name, owner))
}

/// Texts that may reference variables, each with the interval of the construct
/// that owns it.
fn scanned_texts(context: &RequestContext<'_>) -> Vec<(String, Interval)> {
    let mut texts: Vec<(String, Interval)> = context
        .headers()
        .values()
        .map(|header| (header.string_value().into_owned(), header.interval))
        .collect();

    if let Ok(request) = context.request() {
        if let Some(body) = &request.body {
            texts.push((body.clone(), request.interval));
        }
        texts.push((request.path.clone(), request.interval));
    }
    texts
}

fn references(text: &str) -> Vec<String> {
    VAR_REF_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn locate(lines: &LineTracker<'_>, name: &str, owner: Interval) -> Diagnostic {
    let token = format!("${}", name);
    let message = format!("Reference to undefined var {}", token);
    let (first, last) = lines.line_range(owner);

    for line_nr in first..=last {
        let Some(text) = lines.get(line_nr) else {
            break;
        };
        if let Some(index) = find_token(text, &token) {
            let column = text[..index].chars().count() + 1;
            return Diagnostic::warn(line_nr, column, message)
                .with_end(column + token.chars().count());
        }
    }

    log::trace!("could not place {} within lines {}-{}", token, first, last);
    Diagnostic::warn(first, 1, message)
}

/// Byte index of `token` in `text` where it is not the prefix of a longer name.
fn find_token(text: &str, token: &str) -> Option<usize> {
    text.match_indices(token)
        .map(|(index, _)| index)
        .find(|&index| {
            text.as_bytes()
                .get(index + token.len())
                .map_or(true, |&b| !is_name_byte(b))
        })
}
