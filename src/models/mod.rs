//! Data models shared by every stage.
//!
//! `ast` is what the parser produces, `request` is what the materializer
//! produces, and `response` is what an external HTTP client hands back.

pub mod ast;
pub mod request;
pub mod response;

pub use ast::{EnvironmentDef, Entry, Interval, PieFile, ProcessorDef, RequestDef, Var, VarKind, VarValue};
pub use request::{HttpMethod, RequestDescriptor};
pub use response::HttpResponse;
