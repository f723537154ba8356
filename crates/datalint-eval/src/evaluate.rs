use crate::data::decode_data_file;
use crate::engine::RuleEngine;
use crate::import::{ImportChain, ImportContext};
use crate::node::RuleNode;
use crate::output::RuleOutput;
use camino::Utf8Path;
use datalint_domain::{Cancelled, RunContext, Target};
use datalint_types::{EvaluationOutcome, FileResult, RepoPath};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The structured argument every rule is called with.
#[derive(Clone, Debug, Serialize)]
pub struct TopLevelArgument<'a> {
    pub data: &'a Value,
    /// Every decodable data file of the target, in target order. Combine rules only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_data: Option<&'a [Value]>,
    pub config: &'a Map<String, Value>,
}

/// Evaluate every target and merge the results per data file.
///
/// A file listed by several targets accumulates outcomes in target order. When the run is
/// cancelled, nothing is returned.
pub fn evaluate_targets<E>(
    targets: &[Target],
    config_dir: &Utf8Path,
    engine: &E,
    imports: &ImportChain,
    ctx: &RunContext,
) -> Result<BTreeMap<RepoPath, FileResult>, Cancelled>
where
    E: RuleEngine + ?Sized,
{
    let mut merged: BTreeMap<RepoPath, FileResult> = BTreeMap::new();
    for (index, target) in targets.iter().enumerate() {
        ctx.cancel.check()?;
        tracing::debug!(
            parent: &ctx.span,
            target = index,
            lint_files = target.lint_files.len(),
            data_files = target.data_files.len(),
            "evaluating target"
        );
        for result in evaluate_target(target, config_dir, engine, imports, ctx)? {
            match merged.get_mut(&result.path) {
                Some(existing) => existing.merge(result),
                None => {
                    merged.insert(result.path.clone(), result);
                }
            }
        }
    }
    Ok(merged)
}

fn evaluate_target<E>(
    target: &Target,
    config_dir: &Utf8Path,
    engine: &E,
    imports: &ImportChain,
    ctx: &RunContext,
) -> Result<Vec<FileResult>, Cancelled>
where
    E: RuleEngine + ?Sized,
{
    let nodes: Vec<RuleNode<E::Program>> = target
        .lint_files
        .par_iter()
        .map(|lint_file| RuleNode::load(engine, lint_file))
        .collect();

    let decoded: Vec<(RepoPath, Result<Value, String>)> = target
        .data_files
        .par_iter()
        .map(|path| {
            let value = decode_data_file(&path.under(config_dir)).map_err(|e| e.to_string());
            (path.clone(), value)
        })
        .collect();

    let combined: Option<Vec<Value>> = nodes.iter().any(|n| n.combine).then(|| {
        decoded
            .iter()
            .filter_map(|(_, value)| value.as_ref().ok().cloned())
            .collect()
    });

    let results: Vec<FileResult> = decoded
        .par_iter()
        .map(|(path, value)| match value {
            Err(error) => {
                tracing::warn!(parent: &ctx.span, path = %path, %error, "data file skipped");
                FileResult::file_error(path.clone(), error.clone())
            }
            Ok(data) => {
                let outcomes = nodes
                    .par_iter()
                    .map(|node| evaluate_pair(engine, node, data, combined.as_deref(), imports, ctx))
                    .collect();
                FileResult {
                    path: path.clone(),
                    outcomes,
                    error: None,
                }
            }
        })
        .collect();

    ctx.cancel.check()?;
    Ok(results)
}

fn evaluate_pair<E>(
    engine: &E,
    node: &RuleNode<E::Program>,
    data: &Value,
    combined: Option<&[Value]>,
    imports: &ImportChain,
    ctx: &RunContext,
) -> EvaluationOutcome
where
    E: RuleEngine + ?Sized,
{
    let failed = |error: String| EvaluationOutcome {
        default_level: node.level,
        ..EvaluationOutcome::failed(node.key.clone(), error)
    };

    if ctx.cancel.is_cancelled() {
        return failed(Cancelled.to_string());
    }
    let program = match &node.program {
        Ok(program) => program,
        Err(error) => return failed(error.clone()),
    };

    let tla = TopLevelArgument {
        data,
        combined_data: if node.combine { combined } else { None },
        config: &node.config,
    };
    let tla_json = match serde_json::to_string(&tla) {
        Ok(json) => json,
        Err(err) => return failed(format!("encode top-level argument: {err}")),
    };

    match engine.evaluate(program, &tla_json, &ImportContext::new(&node.path, imports)) {
        Ok(raw) => RuleOutput::decode(&raw).into_outcome(node.key.clone(), raw, node.level),
        Err(err) => {
            tracing::debug!(parent: &ctx.span, rule = %node.key, error = %err, "rule evaluation failed");
            failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use camino::Utf8PathBuf;
    use datalint_domain::LintFile;
    use datalint_test_util::{utf8_root, write_file};
    use serde_json::json;
    use tempfile::TempDir;

    const REF: &str = "0123456789abcdef0123456789abcdef01234567";

    /// Program is the rule source. `echo` returns the argument wrapped in a finding, `fail`
    /// errors, `import` reads the import named by `data.import` and reports its text, anything
    /// else is returned verbatim.
    struct ScriptEngine;

    impl RuleEngine for ScriptEngine {
        type Program = String;

        fn parse(&self, path: &Utf8Path, source: &str) -> Result<String, EngineError> {
            if source.trim() == "syntax error" {
                return Err(EngineError::Parse {
                    path: path.to_string(),
                    message: "unexpected token".to_string(),
                });
            }
            Ok(source.trim().to_string())
        }

        fn evaluate(
            &self,
            program: &String,
            tla: &str,
            imports: &ImportContext<'_>,
        ) -> Result<String, EngineError> {
            match program.as_str() {
                "echo" => Ok(json!([{"message": tla}]).to_string()),
                "fail" => Err(EngineError::Evaluate("runtime error".to_string())),
                "import" => {
                    let tla: Value = serde_json::from_str(tla)
                        .map_err(|e| EngineError::Evaluate(e.to_string()))?;
                    let spec = tla["data"]["import"].as_str().unwrap_or_default();
                    let (_, text) = imports.read(spec)?;
                    Ok(json!([{"message": text}]).to_string())
                }
                other => Ok(other.to_string()),
            }
        }
    }

    fn lint_file(root: &Utf8Path, rel: &str, source: &str) -> LintFile {
        let path: Utf8PathBuf = root.join(rel);
        write_file(&path, source);
        LintFile {
            key: rel.to_string(),
            path,
            config: Map::new(),
            level: None,
        }
    }

    fn echoed(outcome: &EvaluationOutcome) -> Value {
        let message = &outcome.findings()[0].message;
        serde_json::from_str(message).expect("echoed tla")
    }

    #[test]
    fn combine_rules_receive_all_data_in_order() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("a.json"), r#"{"n": 1}"#);
        write_file(&root.join("b.json"), r#"{"n": 2}"#);
        let target = Target {
            lint_files: vec![
                lint_file(&root, "all_combine.jsonnet", "echo"),
                lint_file(&root, "each.jsonnet", "echo"),
            ],
            data_files: vec![RepoPath::new("a.json"), RepoPath::new("b.json")],
        };

        let results = evaluate_targets(
            &[target],
            &root,
            &ScriptEngine,
            &ImportChain::new(),
            &RunContext::detached(),
        )
        .expect("evaluate");

        for (path, n) in [("a.json", 1), ("b.json", 2)] {
            let file = &results[&RepoPath::new(path)];
            let combine = echoed(&file.outcomes[0]);
            assert_eq!(combine["combined_data"], json!([{"n": 1}, {"n": 2}]));
            assert_eq!(combine["data"], json!({"n": n}));

            let single = echoed(&file.outcomes[1]);
            assert!(single.get("combined_data").is_none());
            assert_eq!(single["data"], json!({"n": n}));
            assert_eq!(single["config"], json!({}));
        }
    }

    #[test]
    fn failures_are_isolated_per_pair() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("x.json"), "{}");
        write_file(&root.join("y.json"), "{}");
        let target = Target {
            lint_files: vec![
                lint_file(&root, "a.jsonnet", "fail"),
                lint_file(&root, "b.jsonnet", "[]"),
                lint_file(&root, "c.jsonnet", "syntax error"),
            ],
            data_files: vec![RepoPath::new("x.json"), RepoPath::new("y.json")],
        };

        let results = evaluate_targets(
            &[target],
            &root,
            &ScriptEngine,
            &ImportChain::new(),
            &RunContext::detached(),
        )
        .expect("evaluate");

        for path in ["x.json", "y.json"] {
            let file = &results[&RepoPath::new(path)];
            assert_eq!(file.outcomes.len(), 3);
            assert!(file.outcomes[0].error.as_deref().unwrap_or("").contains("runtime error"));
            assert_eq!(file.outcomes[1].error, None);
            assert_eq!(file.outcomes[1].findings, Some(vec![]));
            assert!(file.outcomes[2].error.as_deref().unwrap_or("").contains("unexpected token"));
        }
    }

    #[test]
    fn undecodable_data_file_is_a_file_error() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("bad.json"), "{");
        write_file(&root.join("good.json"), "{}");
        let target = Target {
            lint_files: vec![lint_file(&root, "all_combine.jsonnet", "echo")],
            data_files: vec![RepoPath::new("bad.json"), RepoPath::new("good.json")],
        };

        let results = evaluate_targets(
            &[target],
            &root,
            &ScriptEngine,
            &ImportChain::new(),
            &RunContext::detached(),
        )
        .expect("evaluate");

        let bad = &results[&RepoPath::new("bad.json")];
        assert!(bad.error.is_some());
        assert!(bad.outcomes.is_empty());
        let good = &results[&RepoPath::new("good.json")];
        assert_eq!(echoed(&good.outcomes[0])["combined_data"], json!([{}]));
    }

    #[test]
    fn files_in_several_targets_accumulate_outcomes() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("a.json"), "{}");
        let first = Target {
            lint_files: vec![lint_file(&root, "one.jsonnet", "[]")],
            data_files: vec![RepoPath::new("a.json")],
        };
        let second = Target {
            lint_files: vec![lint_file(&root, "two.jsonnet", "[]")],
            data_files: vec![RepoPath::new("a.json")],
        };

        let results = evaluate_targets(
            &[first, second],
            &root,
            &ScriptEngine,
            &ImportChain::new(),
            &RunContext::detached(),
        )
        .expect("evaluate");
        let keys: Vec<&str> = results[&RepoPath::new("a.json")]
            .outcomes
            .iter()
            .map(|o| o.rule_key.as_str())
            .collect();
        assert_eq!(keys, vec!["one.jsonnet", "two.jsonnet"]);
    }

    #[test]
    fn imports_resolve_relative_then_module_cache_per_pair() {
        let work = TempDir::new().expect("work");
        let cache = TempDir::new().expect("cache");
        let root = utf8_root(&work);
        let base = utf8_root(&cache);
        let module_lib = format!("acme/rules/{REF}/lib/common.libsonnet");
        write_file(&root.join("rules/lib.libsonnet"), "local");
        write_file(&base.join("github.com").join(&module_lib), "module");
        write_file(&root.join("local.json"), r#"{"import": "lib.libsonnet"}"#);
        write_file(
            &root.join("module.json"),
            &json!({ "import": module_lib }).to_string(),
        );
        write_file(&root.join("missing.json"), r#"{"import": "nope.libsonnet"}"#);
        let target = Target {
            lint_files: vec![
                lint_file(&root, "rules/imports.jsonnet", "import"),
                lint_file(&root, "rules/plain.jsonnet", "[]"),
            ],
            data_files: vec![
                RepoPath::new("local.json"),
                RepoPath::new("missing.json"),
                RepoPath::new("module.json"),
            ],
        };

        let results = evaluate_targets(
            &[target],
            &root,
            &ScriptEngine,
            &ImportChain::standard(&base),
            &RunContext::detached(),
        )
        .expect("evaluate");

        let local = &results[&RepoPath::new("local.json")];
        assert_eq!(local.outcomes[0].findings()[0].message, "local");
        let module = &results[&RepoPath::new("module.json")];
        assert_eq!(module.outcomes[0].findings()[0].message, "module");

        let missing = &results[&RepoPath::new("missing.json")];
        assert_eq!(missing.error, None);
        let error = missing.outcomes[0].error.as_deref().unwrap_or_default();
        assert!(error.contains("\"nope.libsonnet\""), "{error}");
        assert!(error.contains("not found"), "{error}");
        assert!(error.contains(base.as_str()), "{error}");
        assert!(missing.outcomes[0].findings.is_none());
        assert_eq!(missing.outcomes[1].error, None);
        assert_eq!(missing.outcomes[1].findings, Some(vec![]));
    }

    #[test]
    fn cancelled_run_returns_no_results() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("a.json"), "{}");
        let target = Target {
            lint_files: vec![lint_file(&root, "one.jsonnet", "[]")],
            data_files: vec![RepoPath::new("a.json")],
        };
        let ctx = RunContext::detached();
        ctx.cancel.cancel();

        let result = evaluate_targets(&[target], &root, &ScriptEngine, &ImportChain::new(), &ctx);
        assert_eq!(result, Err(Cancelled));
    }
}
