use datalint_types::json_map_from_toml;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `datalint.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatalintConfigV1 {
    /// Optional schema string for tooling (`datalint.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Threshold: findings at or above this level fail the run. `debug|info|warn|error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_level: Option<String>,

    /// Directory names never descended into. Defaults to `node_modules` and `.git`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_dirs: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineConfig>,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    /// Program and leading arguments of the rule evaluator, e.g. `["jsonnet"]`.
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TargetConfig {
    /// Data file globs relative to the config directory; `!` negates.
    #[serde(default)]
    pub data_files: Vec<String>,

    #[serde(default)]
    pub lint_files: Vec<LintFileConfig>,

    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LintFileConfig {
    pub path: String,

    /// Passed to the rule as `config`.
    #[serde(default, deserialize_with = "rule_config")]
    pub config: BTreeMap<String, Value>,

    /// Level for findings that carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModuleConfig {
    /// `[!]github.com/<owner>/<repo>/<path>@<commit>[:<tag>]`
    pub path: String,

    #[serde(default, deserialize_with = "rule_config")]
    pub config: BTreeMap<String, Value>,

    /// Level for findings that carry none, for every lint file of this module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Rule config tables go through `toml::Value` so datetimes arrive as RFC 3339 strings.
fn rule_config<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let table = toml::Table::deserialize(deserializer)?;
    Ok(json_map_from_toml(table).into_iter().collect())
}
