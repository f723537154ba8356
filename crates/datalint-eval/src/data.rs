use camino::Utf8Path;
use datalint_types::json_map_from_toml;
use serde_json::Value;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("decode {path} as JSON: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("decode {path} as TOML: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("decode {path} as YAML: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Read and decode a data file, choosing the format from its extension.
///
/// `.toml`, `.yaml` and `.yml` have dedicated decoders; everything else is JSON.
pub fn decode_data_file(path: &Utf8Path) -> Result<Value, DataError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Read {
        path: path.to_string(),
        source,
    })?;
    decode_str(path, &text)
}

pub(crate) fn decode_str(path: &Utf8Path, text: &str) -> Result<Value, DataError> {
    let display = || path.to_string();
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("toml") => toml::from_str::<toml::Table>(text)
            .map(|table| Value::Object(json_map_from_toml(table)))
            .map_err(|source| DataError::Toml {
                path: display(),
                source,
            }),
        Some("yaml" | "yml") => serde_yaml::from_str(text).map_err(|source| DataError::Yaml {
            path: display(),
            source,
        }),
        _ => serde_json::from_str(text).map_err(|source| DataError::Json {
            path: display(),
            source,
        }),
    }
}
