//! Errors raised while turning a resolved context into a request descriptor.

use crate::context::ResolveError;
use std::fmt;

/// The body does not match the content type declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentError {
    /// Declared `content-type` header value
    pub content_type: String,
    /// Decoder message for the interpolated body
    pub message: String,
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Request body declared as {} failed to parse: {}",
            self.content_type, self.message
        )
    }
}

impl std::error::Error for ContentError {}

/// Errors that can occur while building a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No request, no host, or an unsatisfied processor binding.
    Resolve(ResolveError),

    /// The interpolated body contradicts its declared content type.
    Content(ContentError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Resolve(err) => write!(f, "{}", err),
            BuildError::Content(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Resolve(err) => Some(err),
            BuildError::Content(err) => Some(err),
        }
    }
}

impl From<ResolveError> for BuildError {
    fn from(err: ResolveError) -> Self {
        BuildError::Resolve(err)
    }
}

impl From<ContentError> for BuildError {
    fn from(err: ContentError) -> Self {
        BuildError::Content(err)
    }
}
