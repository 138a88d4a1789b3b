//! Turns a resolved [`RequestContext`] into a transport-ready [`RequestDescriptor`].
//!
//! Building a request:
//!
//! 1. start from the configured default headers, overlaid with every header in
//!    scope except `host`
//! 2. use the path verbatim when it is an absolute URL, otherwise prefix it with
//!    the `host` header
//! 3. replace `$name` tokens in the body, URL and every header value, defaults
//!    included (URL replacements are percent-encoded)
//! 4. infer `content-type: application/json` for JSON-looking bodies, or verify a
//!    body declared as JSON actually parses

pub mod error;

pub use error::{BuildError, ContentError};

use crate::config::{get_config, PieConfig};
use crate::context::{RequestContext, ResolveError};
use crate::models::ast::is_name_byte;
use crate::models::response::is_json_content_type;
use crate::models::{RequestDescriptor, Var};
use std::collections::BTreeMap;
use url::Url;

const HOST_HEADER: &str = "host";
const CONTENT_TYPE_HEADER: &str = "content-type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Builds the request at the context's line using the global configuration.
pub fn build_request(context: &RequestContext<'_>) -> Result<RequestDescriptor, BuildError> {
    build_request_with(context, &get_config())
}

/// Builds the request at the context's line with an explicit configuration.
///
/// # Arguments
///
/// * `context` - The resolved scope of one request
/// * `config` - Supplies the default headers
///
/// # Returns
///
/// The interpolated request, or a `BuildError` when there is no request at the
/// line, no host for a relative path, or a declared JSON body does not parse.
///
/// # Examples
///
/// ```
/// use pie::config::PieConfig;
/// use pie::context::RequestContext;
/// use pie::materializer::build_request_with;
/// use pie::parser::parse;
///
/// let file = parse("Host: https://serenity.co\n$ship = \"serenity\"\n\nGET /cargo/$ship\n").unwrap();
/// let context = RequestContext::create(&file, 4).unwrap();
/// let request = build_request_with(&context, &PieConfig::default()).unwrap();
/// assert_eq!(request.url, "https://serenity.co/cargo/serenity");
/// ```
pub fn build_request_with(
    context: &RequestContext<'_>,
    config: &PieConfig,
) -> Result<RequestDescriptor, BuildError> {
    let request = context.request()?;
    let vars = context.vars();

    let mut headers: BTreeMap<String, String> = config
        .default_headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
        .collect();
    for (name, var) in context.headers() {
        if name != HOST_HEADER {
            headers.insert(name.clone(), var.string_value().into_owned());
        }
    }
    for value in headers.values_mut() {
        *value = interpolate(value, vars, false);
    }

    let url = resolve_url(&request.path, context.header(HOST_HEADER))?;
    let url = interpolate(&url, vars, true);

    let body = request
        .body
        .as_deref()
        .map(|body| interpolate(body, vars, false));
    if let Some(body) = &body {
        apply_content_type(&mut headers, body)?;
    }

    Ok(RequestDescriptor {
        method: request.method,
        url,
        headers,
        body,
    })
}

/// Replaces `$name` tokens with the values of the given variables.
///
/// The text is scanned once, left to right. At each `$` the longest defined name
/// spelled out after it is replaced; values are inserted as-is and never scanned
/// again. A `$` that starts no defined name is kept verbatim.
pub fn interpolate(text: &str, vars: &BTreeMap<&str, &Var>, percent_encode: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let run = after.bytes().take_while(|b| is_name_byte(*b)).count();
        let matched = (1..=run)
            .rev()
            .find_map(|len| vars.get(&after[..len]).map(|var| (len, var)));

        match matched {
            Some((len, var)) => {
                let value = var.string_value();
                if percent_encode {
                    out.push_str(&urlencoding::encode(&value));
                } else {
                    out.push_str(&value);
                }
                rest = &after[len..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// True when `path` already names a scheme and host.
fn is_absolute_url(path: &str) -> bool {
    Url::parse(path).map(|url| url.has_host()).unwrap_or(false)
}

fn resolve_url(path: &str, host: Option<&Var>) -> Result<String, ResolveError> {
    if is_absolute_url(path) {
        return Ok(path.to_string());
    }

    let host = host.ok_or(ResolveError::NoHost)?.string_value();
    if host.ends_with('/') || path.starts_with('/') {
        Ok(format!("{}{}", host, path))
    } else {
        Ok(format!("{}/{}", host, path))
    }
}

fn apply_content_type(
    headers: &mut BTreeMap<String, String>,
    body: &str,
) -> Result<(), ContentError> {
    match headers.get(CONTENT_TYPE_HEADER) {
        Some(content_type) if is_json_content_type(content_type) => {
            serde_json::from_str::<serde_json::Value>(body).map_err(|err| ContentError {
                content_type: content_type.clone(),
                message: err.to_string(),
            })?;
        }
        Some(_) => {}
        None => {
            let trimmed = body.trim_start();
            let looks_like_json = trimmed.starts_with('{') || trimmed.starts_with('[');
            if looks_like_json && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
                log::debug!("inferred {} from request body", JSON_CONTENT_TYPE);
                headers.insert(
                    CONTENT_TYPE_HEADER.to_string(),
                    JSON_CONTENT_TYPE.to_string(),
                );
            }
        }
    }
    Ok(())
}
