use crate::{Level, RepoPath};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One structured entry emitted by a rule.
///
/// Rules produce a JSON array of these objects. Only `message` is required; unknown keys are
/// ignored so rule authors can carry extra data without breaking decoding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub message: String,

    /// Raw level string as written by the rule. Classified later; unknown values count as
    /// `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form location payload (line/column, JSON pointer, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<JsonValue>,

    /// Rule-specific structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<JsonValue>,

    /// Excluded findings are reported but never counted against the threshold.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub excluded: bool,

    /// Stable identifier intended for dedup and trending, filled in when the report is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Finding {
    pub fn new(message: impl Into<String>) -> Self {
        Finding {
            message: message.into(),
            ..Finding::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

/// Result of evaluating one rule against one data file.
///
/// `opaque_value` may be present together with `error` when the rule produced valid JSON of
/// the wrong shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationOutcome {
    pub rule_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opaque_value: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<Vec<Finding>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Level applied to this rule's findings that carry no level of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_level: Option<Level>,
}

impl EvaluationOutcome {
    pub fn failed(rule_key: impl Into<String>, error: impl Into<String>) -> Self {
        EvaluationOutcome {
            rule_key: rule_key.into(),
            error: Some(error.into()),
            ..EvaluationOutcome::default()
        }
    }

    pub fn findings(&self) -> &[Finding] {
        self.findings.as_deref().unwrap_or_default()
    }
}

/// Aggregate for one data file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileResult {
    pub path: RepoPath,

    #[serde(default)]
    pub outcomes: Vec<EvaluationOutcome>,

    /// File-level failure, e.g. the data file could not be decoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn new(path: RepoPath) -> Self {
        FileResult {
            path,
            outcomes: Vec::new(),
            error: None,
        }
    }

    pub fn file_error(path: RepoPath, error: impl Into<String>) -> Self {
        FileResult {
            path,
            outcomes: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Append another result for the same path (a file can belong to several targets).
    pub fn merge(&mut self, other: FileResult) {
        self.outcomes.extend(other.outcomes);
        if self.error.is_none() {
            self.error = other.error;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error.is_some() || self.outcomes.iter().any(|o| o.error.is_some())
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.outcomes.iter().flat_map(|o| o.findings())
    }
}
