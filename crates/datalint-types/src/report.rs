use crate::{FileResult, Level};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Counted findings per level, plus evaluation/decode errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LevelCounts {
    pub debug: u32,
    pub info: u32,
    pub warn: u32,
    pub error: u32,
    pub errors: u32,
}

impl LevelCounts {
    pub fn add(&mut self, level: Level) {
        match level {
            Level::Debug => self.debug += 1,
            Level::Info => self.info += 1,
            Level::Warn => self.warn += 1,
            Level::Error => self.error += 1,
        }
    }

    pub fn absorb(&mut self, other: &LevelCounts) {
        self.debug += other.debug;
        self.info += other.info;
        self.warn += other.warn;
        self.error += other.error;
        self.errors += other.errors;
    }
}

/// A classified [`FileResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileReport {
    pub verdict: Verdict,
    pub exceeds_threshold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<Level>,
    pub counts: LevelCounts,
    #[serde(flatten)]
    pub result: FileResult,
}

/// The emitted report envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LintReport {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub error_level: Level,
    /// Level of findings that carry none and whose rule sets no default.
    pub default_level: Level,
    pub verdict: Verdict,
    pub counts: LevelCounts,
    pub files: Vec<FileReport>,
}

impl LintReport {
    pub fn failed(&self) -> bool {
        self.verdict == Verdict::Fail
    }
}
