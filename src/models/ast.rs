//! Syntax tree produced by the parser.
//!
//! Every node carries the [`Interval`] of source text it was parsed from, so later
//! stages (line lookup, lint) can point back at the exact construct.

use super::request::HttpMethod;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Half-open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "interval start {} > end {}", start, end);
        Self { start, end }
    }

}

/// Characters allowed in a variable name after `$`.
pub fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Which namespace a [`Var`] lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    /// `Name: value`, matched case-insensitively
    Header,
    /// `$name = value`
    Variable,
}

/// Value of a definition: a string literal (or raw header text) or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Str(String),
    Num(i64),
}

impl VarValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VarValue::Str(s) => Some(s),
            VarValue::Num(_) => None,
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Str(s) => f.write_str(s),
            VarValue::Num(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        VarValue::Str(s.to_string())
    }
}

impl From<String> for VarValue {
    fn from(s: String) -> Self {
        VarValue::Str(s)
    }
}

impl From<i64> for VarValue {
    fn from(n: i64) -> Self {
        VarValue::Num(n)
    }
}

/// A header or variable definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Var {
    pub kind: VarKind,
    pub name: String,
    pub value: VarValue,
    pub interval: Interval,
}

impl Var {
    pub fn header(name: impl Into<String>, value: impl Into<String>, interval: Interval) -> Self {
        Self {
            kind: VarKind::Header,
            name: name.into(),
            value: VarValue::Str(value.into()),
            interval,
        }
    }

    pub fn variable(name: impl Into<String>, value: impl Into<VarValue>, interval: Interval) -> Self {
        Self {
            kind: VarKind::Variable,
            name: name.into(),
            value: value.into(),
            interval,
        }
    }

    pub fn is_header(&self) -> bool {
        self.kind == VarKind::Header
    }

    /// The value rendered as text; numbers use their decimal form.
    pub fn string_value(&self) -> Cow<'_, str> {
        match &self.value {
            VarValue::Str(s) => Cow::Borrowed(s),
            VarValue::Num(n) => Cow::Owned(n.to_string()),
        }
    }
}

/// `@id:` block of definitions that only apply when `id` is listed in `$ENV`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDef {
    pub id: String,
    pub vars: Vec<Var>,
    pub interval: Interval,
}

/// A request: method line, its own headers and an optional body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDef {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<String>,
    pub processor_name: Option<String>,
    pub headers: Vec<Var>,
    /// From the method token through the end of the body (or the last header)
    pub interval: Interval,
}

/// Named post-response script, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorDef {
    pub name: String,
    pub source: String,
    pub interval: Interval,
}

/// One top-level item of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Var(Var),
    Environment(EnvironmentDef),
    Request(RequestDef),
    Processor(ProcessorDef),
}

impl Entry {
    pub fn interval(&self) -> Interval {
        match self {
            Entry::Var(v) => v.interval,
            Entry::Environment(env) => env.interval,
            Entry::Request(req) => req.interval,
            Entry::Processor(p) => p.interval,
        }
    }
}

/// A parsed file: its source text and top-level entries in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieFile {
    pub source: String,
    pub entries: Vec<Entry>,
}

impl PieFile {
    pub fn new(source: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            source: source.into(),
            entries,
        }
    }

    /// All requests, in file order.
    pub fn requests(&self) -> impl Iterator<Item = &RequestDef> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Request(req) => Some(req),
            _ => None,
        })
    }

    /// First top-level definition of the given kind and exact name.
    pub fn top_level_var(&self, kind: VarKind, name: &str) -> Option<&Var> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Var(v) if v.kind == kind && v.name == name => Some(v),
            _ => None,
        })
    }

    /// Top-level processor with exactly this name.
    pub fn processor(&self, name: &str) -> Option<&ProcessorDef> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Processor(p) if p.name == name => Some(p),
            _ => None,
        })
    }
}
