use crate::engine::RuleEngine;
use camino::Utf8PathBuf;
use datalint_domain::LintFile;
use datalint_types::Level;
use serde_json::{Map, Value};

/// A lint file loaded for evaluation.
///
/// A parse failure is kept rather than raised: it becomes the error of every pair the rule
/// takes part in.
#[derive(Debug)]
pub struct RuleNode<P> {
    pub key: String,
    pub path: Utf8PathBuf,
    pub program: Result<P, String>,
    pub config: Map<String, Value>,
    pub combine: bool,
    pub level: Option<Level>,
}

impl<P> RuleNode<P> {
    pub fn load<E>(engine: &E, lint_file: &LintFile) -> Self
    where
        E: RuleEngine<Program = P> + ?Sized,
    {
        let program = std::fs::read_to_string(&lint_file.path)
            .map_err(|err| format!("read {}: {err}", lint_file.path))
            .and_then(|source| {
                engine
                    .parse(&lint_file.path, &source)
                    .map_err(|err| err.to_string())
            });

        RuleNode {
            key: lint_file.key.clone(),
            path: lint_file.path.clone(),
            program,
            config: lint_file.config.clone(),
            combine: lint_file.is_combine(),
            level: lint_file.level,
        }
    }
}
