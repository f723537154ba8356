use crate::reference::ModuleReference;
use datalint_types::Level;
use serde_json::{Map, Value};

/// Directory names skipped during discovery unless configured otherwise.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &["node_modules", ".git"];

/// Engine command used when the configuration does not name one.
pub const DEFAULT_ENGINE_COMMAND: &[&str] = &["jsonnet"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid error level {0:?}: expected one of debug, info, warn, error")]
pub struct InvalidThreshold(pub String);

/// Parse the run threshold. Unset or blank means `error`.
pub fn parse_threshold(raw: Option<&str>) -> Result<Level, InvalidThreshold> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Level::default()),
        Some(s) => s.parse().map_err(|_| InvalidThreshold(s.to_string())),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeverityPolicy {
    /// Findings at or above this level fail the run.
    pub threshold: Level,
    /// Level of findings that carry none and whose rule sets no default.
    pub default_level: Level,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            threshold: Level::Error,
            default_level: Level::Error,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LintFileSpec {
    /// Glob (with optional `!` negation) relative to the config directory.
    pub pattern: String,
    pub config: Map<String, Value>,
    pub level: Option<Level>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModuleSpec {
    pub reference: ModuleReference,
    pub config: Map<String, Value>,
    pub level: Option<Level>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TargetSpec {
    pub data_files: Vec<String>,
    pub lint_files: Vec<LintFileSpec>,
    pub modules: Vec<ModuleSpec>,
}

/// Fully validated configuration for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveConfig {
    pub severity: SeverityPolicy,
    pub ignored_dirs: Vec<String>,
    pub engine_command: Vec<String>,
    pub targets: Vec<TargetSpec>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            severity: SeverityPolicy::default(),
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
            engine_command: DEFAULT_ENGINE_COMMAND.iter().map(|s| s.to_string()).collect(),
            targets: Vec::new(),
        }
    }
}

impl EffectiveConfig {
    pub fn module_references(&self) -> impl Iterator<Item = &ModuleReference> {
        self.targets
            .iter()
            .flat_map(|t| t.modules.iter().map(|m| &m.reference))
    }

    /// References that have to be present in the cache before discovery.
    pub fn installable_modules(&self) -> impl Iterator<Item = &ModuleReference> {
        self.module_references().filter(|r| !r.excluded)
    }
}
