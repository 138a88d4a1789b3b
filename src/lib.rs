//! Language front end for pie HTTP request files.
//!
//! A pie file declares variables, headers, environments, requests and response
//! processors in a small line-oriented language. This crate parses such files,
//! resolves which definitions are visible to the request at a given line, builds
//! the transport-ready request, and lints files without touching the network.
//!
//! # Architecture
//!
//! - **models**: AST nodes, the materialized request and the response handed back by an HTTP client
//! - **parser**: source text to a positioned AST, or a single syntax error
//! - **lines**: byte offsets and intervals to line numbers and line text
//! - **context**: variable and header scope for the request at a line
//! - **materializer**: interpolation, URL resolution and content-type handling
//! - **lint**: undefined-variable detection and the file-level lint driver
//! - **processor**: the boundary to an external post-response script evaluator
//! - **config**: global settings (default headers, output options)
//! - **source**: reading files or stdin
//!
//! # Usage
//!
//! ```
//! use pie::config::PieConfig;
//! use pie::context::RequestContext;
//! use pie::materializer::build_request_with;
//! use pie::parser::parse;
//!
//! let source = r#"
//! $ENV = "prod"
//!
//! @prod:
//!     Host: https://serenity.co
//!
//! $ship = "serenity"
//!
//! GET /cargo/$ship
//! Accept: application/json
//! "#;
//!
//! let file = parse(source).unwrap();
//! let context = RequestContext::create(&file, 9).unwrap();
//! let request = build_request_with(&context, &PieConfig::default()).unwrap();
//!
//! assert_eq!(request.url, "https://serenity.co/cargo/serenity");
//! assert_eq!(request.header("accept"), Some("application/json"));
//! ```

pub mod config;
pub mod context;
pub mod lines;
pub mod lint;
pub mod materializer;
pub mod models;
pub mod parser;
pub mod processor;
pub mod source;

pub use context::RequestContext;
pub use lines::LineTracker;
pub use lint::{find_lint, Diagnostic};
pub use materializer::{build_request, build_request_with};
pub use models::{PieFile, RequestDescriptor};
pub use parser::parse;
