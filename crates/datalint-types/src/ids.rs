//! Stable identifiers: schema ids, tool name, and well-known file names.

pub const TOOL_NAME: &str = "datalint";

// Schemas
pub const SCHEMA_REPORT_V1: &str = "datalint.report.v1";
pub const SCHEMA_CONFIG_V1: &str = "datalint.config.v1";

/// Config file names searched in the working directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["datalint.toml", ".datalint.toml"];

/// Rule files whose stem ends with this suffix receive the whole target's data.
pub const COMBINE_SUFFIX: &str = "_combine";
