//! Developer tasks (schema generation, fixture checks).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use datalint_test_util::normalize_nondeterministic;
use datalint_types::json_map_from_toml;
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    match manifest_dir.parent() {
        Some(parent) if manifest_dir.ends_with("xtask") => parent.to_path_buf(),
        _ => manifest_dir,
    }
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(datalint_types::LintReport)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(datalint_settings::DatalintConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "datalint.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "datalint.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Check that schemas/ matches what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {name}");
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {name}");
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

/// Report paths are relative, forward-slash, and never escape the config directory.
fn is_clean_path(path: &str) -> bool {
    !(path.starts_with('/')
        || path.starts_with('\\')
        || path.split('/').any(|c| c == "..")
        || path.contains('\\')
        || (path.len() >= 2 && path.as_bytes()[1] == b':'))
}

fn compile(schema: schemars::Schema) -> anyhow::Result<jsonschema::Validator> {
    let value = serde_json::to_value(schema).context("Failed to serialize schema")?;
    jsonschema::validator_for(&value).map_err(|e| anyhow::anyhow!("Failed to compile schema: {e}"))
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_toml_as_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let table: toml::Table =
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(serde_json::Value::Object(json_map_from_toml(table)))
}

/// Validate every fixture under tests/fixtures/.
///
/// 1. `datalint.toml` validates against the config schema and parses as `DatalintConfigV1`
/// 2. `expected.report.json` validates against the report schema
/// 3. expected reports are already normalized (timestamps and version are placeholders)
/// 4. report paths are clean
fn check_fixtures() -> anyhow::Result<()> {
    let config_schema = compile(generate_config_schema())?;
    let report_schema = compile(generate_report_schema())?;

    let mut dirs: Vec<PathBuf> = fs::read_dir(fixtures_dir())
        .context("Failed to read tests/fixtures/")?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let mut errors = Vec::new();
    for dir in &dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let config_path = dir.join("datalint.toml");
        let config = read_toml_as_json(&config_path)?;
        for err in config_schema.iter_errors(&config) {
            errors.push(format!("{name}/datalint.toml: schema validation: {err}"));
        }
        let text = fs::read_to_string(&config_path)?;
        if let Err(err) = datalint_settings::parse_config_toml(&text) {
            errors.push(format!("{name}/datalint.toml: {err:#}"));
        }

        let report_path = dir.join("expected.report.json");
        if !report_path.exists() {
            continue;
        }
        let report = read_json(&report_path)?;
        for err in report_schema.iter_errors(&report) {
            errors.push(format!("{name}/expected.report.json: schema validation: {err}"));
        }
        if normalize_nondeterministic(report.clone()) != report {
            errors.push(format!(
                "{name}/expected.report.json: timestamps and tool.version must be placeholders"
            ));
        }
        let files = report["files"].as_array().cloned().unwrap_or_default();
        for (i, file) in files.iter().enumerate() {
            let path = file["path"].as_str().unwrap_or_default();
            if !is_clean_path(path) {
                errors.push(format!(
                    "{name}/expected.report.json: files[{i}].path '{path}' is not clean"
                ));
            }
        }
    }

    if errors.is_empty() {
        println!("✓ {} fixtures checked", dirs.len());
        return Ok(());
    }
    for error in &errors {
        eprintln!("  - {error}");
    }
    bail!("Fixture validation failed with {} errors", errors.len())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  check-fixtures    Validate tests/fixtures/ configs and expected reports");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "check-fixtures" => check_fixtures(),
        "print-schema-ids" => {
            println!("{}", datalint_types::ids::SCHEMA_REPORT_V1);
            println!("{}", datalint_types::ids::SCHEMA_CONFIG_V1);
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
