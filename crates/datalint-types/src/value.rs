use serde_json::{Map, Number, Value};

/// Convert a decoded TOML value into plain JSON.
///
/// Datetimes become their RFC 3339 text. Non-finite floats have no JSON form and become `null`.
pub fn json_from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(json_from_toml).collect()),
        toml::Value::Table(table) => Value::Object(json_map_from_toml(table)),
    }
}

pub fn json_map_from_toml(table: toml::Table) -> Map<String, Value> {
    table
        .into_iter()
        .map(|(key, value)| (key, json_from_toml(value)))
        .collect()
}
