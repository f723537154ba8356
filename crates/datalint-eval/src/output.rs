use datalint_types::{EvaluationOutcome, Finding, Level};
use serde_json::Value;

/// Decoded rule output.
///
/// Both decodes are kept: a rule that returns valid JSON of the wrong shape still has its value
/// reported.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleOutput {
    /// A JSON array of finding objects.
    Structured { value: Value, findings: Vec<Finding> },
    /// Valid JSON that is not a list of findings.
    Opaque { value: Value, shape_error: String },
    /// Not JSON at all.
    Malformed { error: String },
}

impl RuleOutput {
    pub fn decode(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                return RuleOutput::Malformed {
                    error: format!("rule output is not JSON: {err}"),
                };
            }
        };
        match serde_json::from_value::<Vec<Finding>>(value.clone()) {
            Ok(findings) => RuleOutput::Structured { value, findings },
            Err(err) => RuleOutput::Opaque {
                value,
                shape_error: format!("rule output is not a list of findings: {err}"),
            },
        }
    }

    pub fn into_outcome(
        self,
        rule_key: String,
        raw_output: String,
        default_level: Option<Level>,
    ) -> EvaluationOutcome {
        let mut outcome = EvaluationOutcome {
            rule_key,
            raw_output: Some(raw_output),
            default_level,
            ..EvaluationOutcome::default()
        };
        match self {
            RuleOutput::Structured { findings, .. } => outcome.findings = Some(findings),
            RuleOutput::Opaque { value, shape_error } => {
                outcome.opaque_value = Some(value);
                outcome.error = Some(shape_error);
            }
            RuleOutput::Malformed { error } => outcome.error = Some(error),
        }
        outcome
    }
}
