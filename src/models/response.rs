//! HTTP response data model.
//!
//! Requests are sent by an external HTTP client; it reports back with an
//! `HttpResponse`, which is what a request's processor script gets to inspect.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents an HTTP response received from a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// HTTP status text (e.g., "OK", "Not Found").
    pub status_text: String,

    /// Protocol version reported by the server, such as "1.1" or "2".
    pub http_version: String,

    /// Response headers as key-value pairs.
    pub headers: BTreeMap<String, String>,

    /// Response body as raw bytes.
    ///
    /// `Vec<u8>` rather than `String` so binary responses survive intact.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HttpResponse with the given status code and text.
    pub fn new(status_code: u16, status_text: impl Into<String>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            http_version: "1.1".to_string(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// Adds a header to the response.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Sets the response body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Decodes the body as JSON when the server labelled it `application/json`.
    ///
    /// Returns `None` for any other content type or an undecodable body.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        let content_type = self.content_type()?;
        if !is_json_content_type(content_type) {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

/// True for `application/json`, optionally followed by parameters such as a charset.
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("application/json")
}
