//! Boundary to the external response-processing step.
//!
//! A request may name a processor: a script run after the response arrives that
//! reads the response and updates variables. Evaluating the script is left to an
//! implementation of [`ScriptEvaluator`] (a sandboxed interpreter, typically).
//! [`ResponseProcessor`] prepares the snapshot the script sees and reports back
//! only the variables the script created or changed.

use crate::context::RequestContext;
use crate::models::{HttpResponse, VarValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Errors reported by a script evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    /// The script failed to compile or threw while running.
    Script(String),

    /// The script did not finish within the evaluator's time budget.
    Timeout,
}

impl fmt::Display for ProcessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorError::Script(msg) => write!(f, "Processor script failed: {}", msg),
            ProcessorError::Timeout => write!(f, "Processor script timed out"),
        }
    }
}

impl std::error::Error for ProcessorError {}

/// What a processor script can see and modify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorInput {
    /// Variables in scope; the script may change or add entries.
    pub vars: BTreeMap<String, Value>,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Decoded body of a JSON response
    pub json: Option<Value>,
}

impl ProcessorInput {
    /// Snapshot of the context's variables plus the response.
    pub fn new(context: &RequestContext<'_>, response: &HttpResponse) -> Self {
        let vars = context
            .vars()
            .iter()
            .map(|(name, var)| (name.to_string(), var_to_json(&var.value)))
            .collect();

        Self {
            vars,
            status: response.status_code,
            headers: response.headers.clone(),
            json: response.body_json(),
        }
    }
}

fn var_to_json(value: &VarValue) -> Value {
    match value {
        VarValue::Str(s) => Value::String(s.clone()),
        VarValue::Num(n) => Value::from(*n),
    }
}

/// Runs processor source against a snapshot.
pub trait ScriptEvaluator {
    fn evaluate(&self, source: &str, input: &mut ProcessorInput) -> Result<(), ProcessorError>;
}

impl<F> ScriptEvaluator for F
where
    F: Fn(&str, &mut ProcessorInput) -> Result<(), ProcessorError>,
{
    fn evaluate(&self, source: &str, input: &mut ProcessorInput) -> Result<(), ProcessorError> {
        self(source, input)
    }
}

/// Applies a request's processor to its response.
pub struct ResponseProcessor<E> {
    evaluator: E,
}

impl<E: ScriptEvaluator> ResponseProcessor<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    /// Runs the context's processor, if any, and returns the variables whose
    /// values are new or different afterwards.
    ///
    /// # Arguments
    ///
    /// * `context` - The scope the request was built from
    /// * `response` - What the HTTP client received
    ///
    /// # Returns
    ///
    /// Changed variables by name; empty when the request has no processor.
    pub fn process(
        &self,
        context: &RequestContext<'_>,
        response: &HttpResponse,
    ) -> Result<BTreeMap<String, Value>, ProcessorError> {
        let Some(processor) = context.processor() else {
            return Ok(BTreeMap::new());
        };

        let mut input = ProcessorInput::new(context, response);
        let before = input.vars.clone();
        self.evaluator.evaluate(&processor.source, &mut input)?;

        let changed: BTreeMap<String, Value> = input
            .vars
            .into_iter()
            .filter(|(name, value)| before.get(name) != Some(value))
            .collect();
        log::debug!(
            "processor {} changed {} variable(s)",
            processor.name,
            changed.len()
        );
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    const SOURCE: &str = "$auth = \"none\"\n$crew = 9\nHost: https://serenity.co\n\nGET /auth | authenticate\n\nPROCESSOR authenticate ```\nvars.auth = json.rank.captain;\n```\n";

    fn json_response() -> HttpResponse {
        let mut response = HttpResponse::new(200, "OK");
        response.add_header("content-type", "application/json");
        response.set_body(r#"{"rank": {"captain": "mreynolds"}}"#);
        response
    }

    // stands in for a script engine: copies json.rank.captain into vars.auth
    fn fake_engine(source: &str, input: &mut ProcessorInput) -> Result<(), ProcessorError> {
        if !source.contains("vars.auth") {
            return Err(ProcessorError::Script(format!("unexpected script {}", source)));
        }
        let captain = input
            .json
            .as_ref()
            .and_then(|json| json["rank"]["captain"].as_str())
            .ok_or_else(|| ProcessorError::Script("json.rank is undefined".to_string()))?
            .to_string();
        input.vars.insert("auth".to_string(), Value::String(captain));
        input.vars.insert("crew".to_string(), json!(9));
        Ok(())
    }

    #[test]
    fn test_snapshot_contents() {
        let file = parse(SOURCE).unwrap();
        let context = RequestContext::create(&file, 5).unwrap();
        let input = ProcessorInput::new(&context, &json_response());

        assert_eq!(input.vars["auth"], json!("none"));
        assert_eq!(input.vars["crew"], json!(9));
        assert_eq!(input.status, 200);
        assert_eq!(input.json, Some(json!({"rank": {"captain": "mreynolds"}})));
    }

    #[test]
    fn test_only_changed_vars_are_returned() {
        let file = parse(SOURCE).unwrap();
        let context = RequestContext::create(&file, 5).unwrap();
        let processor = ResponseProcessor::new(fake_engine);

        let changed = processor.process(&context, &json_response()).unwrap();

        assert_eq!(changed.len(), 1);
        assert_eq!(changed["auth"], json!("mreynolds"));
    }

    #[test]
    fn test_new_vars_are_returned() {
        let file = parse(SOURCE).unwrap();
        let context = RequestContext::create(&file, 5).unwrap();
        let processor = ResponseProcessor::new(
            |_: &str, input: &mut ProcessorInput| -> Result<(), ProcessorError> {
                input.vars.insert("token".to_string(), json!("abc"));
                Ok(())
            },
        );

        let changed = processor.process(&context, &json_response()).unwrap();
        assert_eq!(changed, BTreeMap::from([("token".to_string(), json!("abc"))]));
    }

    #[test]
    fn test_evaluator_errors_propagate() {
        let file = parse(SOURCE).unwrap();
        let context = RequestContext::create(&file, 5).unwrap();
        let processor = ResponseProcessor::new(fake_engine);

        let err = processor
            .process(&context, &HttpResponse::new(500, "Internal Server Error"))
            .unwrap_err();
        assert_eq!(err, ProcessorError::Script("json.rank is undefined".to_string()));
    }

    #[test]
    fn test_request_without_processor() {
        let file = parse("Host: h\nGET /crew\n").unwrap();
        let context = RequestContext::create(&file, 2).unwrap();
        let processor = ResponseProcessor::new(
            |_: &str, _: &mut ProcessorInput| -> Result<(), ProcessorError> {
                Err(ProcessorError::Timeout)
            },
        );

        assert!(processor
            .process(&context, &json_response())
            .unwrap()
            .is_empty());
    }
}
