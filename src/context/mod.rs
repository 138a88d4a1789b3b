//! Scope resolution for a single request.
//!
//! A [`RequestContext`] is built for one `(file, line)` query. It replays the
//! file's entries in order and records the last definition of every variable and
//! header that is visible to the request found at that line:
//!
//! 1. top-level definitions, in file order
//! 2. definitions of every environment listed in `$ENV`, in file order
//! 3. the matched request's own headers
//!
//! Variables and headers are separate namespaces. Header names are matched
//! case-insensitively, variable names exactly.

pub mod error;

pub use error::ResolveError;

use crate::lines::LineTracker;
use crate::models::{Entry, PieFile, ProcessorDef, RequestDef, Var, VarKind};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the top-level variable that selects active environments.
pub const ENV_VAR: &str = "ENV";

/// Resolved scope of the request at one line of a file.
///
/// Owns a [`LineTracker`] over the file's source, so a context belongs to a
/// single query and is not shared between threads.
#[derive(Debug)]
pub struct RequestContext<'a> {
    vars: BTreeMap<&'a str, &'a Var>,
    headers: BTreeMap<String, &'a Var>,
    environments: BTreeSet<String>,
    request: Option<&'a RequestDef>,
    processor: Option<&'a ProcessorDef>,
    lines: LineTracker<'a>,
    target_line: usize,
}

impl<'a> RequestContext<'a> {
    /// Resolves the scope of the request containing `target_line` (1-based).
    ///
    /// A line outside every request is not an error: the context is returned
    /// with [`has_request`](Self::has_request) false and the top-level scope
    /// seen up to the end of the file. The only failure is a request naming a
    /// processor the file does not define.
    ///
    /// # Arguments
    ///
    /// * `file` - The parsed file
    /// * `target_line` - 1-based line anywhere inside the wanted request
    ///
    /// # Returns
    ///
    /// The resolved context, or `ResolveError::MissingProcessor` when the selected
    /// request names an undefined processor.
    pub fn create(file: &'a PieFile, target_line: usize) -> Result<Self, ResolveError> {
        let lines = LineTracker::new(&file.source);
        let environments = active_environments(file);
        log::debug!("active environments: {:?}", environments);

        let mut context = Self {
            vars: BTreeMap::new(),
            headers: BTreeMap::new(),
            environments,
            request: None,
            processor: None,
            lines,
            target_line,
        };

        for entry in &file.entries {
            match entry {
                Entry::Var(var) => context.assign(var),
                Entry::Environment(env) if context.environments.contains(env.id.as_str()) => {
                    env.vars.iter().for_each(|var| context.assign(var));
                }
                Entry::Environment(_) | Entry::Processor(_) => {}
                Entry::Request(req) => {
                    let (first, last) = context.lines.line_range(req.interval);
                    if (first..=last).contains(&target_line) {
                        log::debug!(
                            "line {} selects {} {} (lines {}-{})",
                            target_line,
                            req.method,
                            req.path,
                            first,
                            last
                        );
                        req.headers.iter().for_each(|header| context.assign(header));
                        context.request = Some(req);
                        break;
                    }
                }
            }
        }

        if let Some(name) = context.request.and_then(|req| req.processor_name.as_deref()) {
            let processor = file.processor(name).ok_or_else(|| ResolveError::MissingProcessor {
                name: name.to_string(),
            })?;
            context.processor = Some(processor);
        }

        Ok(context)
    }

    fn assign(&mut self, var: &'a Var) {
        match var.kind {
            VarKind::Variable => {
                self.vars.insert(var.name.as_str(), var);
            }
            VarKind::Header => {
                self.headers.insert(var.name.to_ascii_lowercase(), var);
            }
        }
    }

    pub fn has_request(&self) -> bool {
        self.request.is_some()
    }

    /// The matched request, or [`ResolveError::NoRequest`] for the queried line.
    pub fn request(&self) -> Result<&'a RequestDef, ResolveError> {
        self.request.ok_or(ResolveError::NoRequest {
            line: self.target_line,
        })
    }

    /// Processor bound to the matched request, if it names one.
    pub fn processor(&self) -> Option<&'a ProcessorDef> {
        self.processor
    }

    /// Visible variables by exact name.
    pub fn vars(&self) -> &BTreeMap<&'a str, &'a Var> {
        &self.vars
    }

    /// Visible headers by lower-cased name.
    pub fn headers(&self) -> &BTreeMap<String, &'a Var> {
        &self.headers
    }

    pub fn var(&self, name: &str) -> Option<&'a Var> {
        self.vars.get(name).copied()
    }

    pub fn header(&self, name: &str) -> Option<&'a Var> {
        self.headers.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Environment ids listed in `$ENV`.
    pub fn environments(&self) -> &BTreeSet<String> {
        &self.environments
    }

    pub fn lines(&self) -> &LineTracker<'a> {
        &self.lines
    }

    pub fn target_line(&self) -> usize {
        self.target_line
    }
}

/// Ids named by the first top-level `$ENV`, split on commas.
///
/// Ids are trimmed and empty ids dropped, so `"e1, e2"` activates both.
fn active_environments(file: &PieFile) -> BTreeSet<String> {
    let Some(env) = file.top_level_var(VarKind::Variable, ENV_VAR) else {
        return BTreeSet::new();
    };

    env.string_value()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
