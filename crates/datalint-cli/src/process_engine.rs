//! Rule engine backed by an external Jsonnet evaluator.

use camino::{Utf8Path, Utf8PathBuf};
use datalint_eval::{EngineError, ImportContext, RuleEngine};
use std::io::Write;
use std::process::Command;

/// Runs `<program> <args>... -J <root>... --tla-code-file param=<file> <rule>` per evaluation.
#[derive(Clone, Debug)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(command: &[String]) -> anyhow::Result<Self> {
        let Some((program, args)) = command.split_first() else {
            anyhow::bail!("engine command is empty");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl RuleEngine for ProcessEngine {
    /// The rule is read by the evaluator itself.
    type Program = Utf8PathBuf;

    fn parse(&self, path: &Utf8Path, _source: &str) -> Result<Utf8PathBuf, EngineError> {
        Ok(path.to_path_buf())
    }

    fn evaluate(
        &self,
        program: &Utf8PathBuf,
        tla: &str,
        imports: &ImportContext<'_>,
    ) -> Result<String, EngineError> {
        let mut tla_file = tempfile::Builder::new()
            .prefix("datalint-tla-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| EngineError::Evaluate(format!("create argument file: {e}")))?;
        tla_file
            .write_all(tla.as_bytes())
            .and_then(|()| tla_file.flush())
            .map_err(|e| EngineError::Evaluate(format!("write argument file: {e}")))?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for root in imports.search_roots() {
            cmd.arg("-J").arg(root.as_str());
        }
        cmd.arg("--tla-code-file")
            .arg(format!("param={}", tla_file.path().display()))
            .arg(program.as_str());

        let output = cmd
            .output()
            .map_err(|e| EngineError::Evaluate(format!("run {}: {e}", self.program)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Evaluate(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|_| EngineError::Evaluate(format!("{} printed non-UTF-8 output", self.program)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        assert!(ProcessEngine::new(&[]).is_err());
    }

    #[test]
    fn command_splits_program_and_args() {
        let engine =
            ProcessEngine::new(&["sh".to_string(), "engine.sh".to_string()]).expect("engine");
        assert_eq!(engine.program, "sh");
        assert_eq!(engine.args, vec!["engine.sh"]);
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use datalint_eval::ImportChain;
        use tempfile::TempDir;

        /// Echoes the argument file for `echo` rules, fails for `fail`, else prints the rule.
        const FAKE_ENGINE: &str = r#"
while [ $# -gt 1 ]; do
  case "$1" in
    --tla-code-file) tla="${2#param=}"; shift 2 ;;
    -J) printf '%s\n' "$2" >> "$(dirname "$0")/roots"; shift 2 ;;
    *) shift ;;
  esac
done
rule=$(cat "$1")
case "$rule" in
  echo) cat "$tla" ;;
  fail) echo "RUNTIME ERROR: boom" >&2; exit 1 ;;
  *) printf '%s' "$rule" ;;
esac
"#;

        fn setup() -> (TempDir, Utf8PathBuf, ProcessEngine) {
            let tmp = TempDir::new().expect("temp dir");
            let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8");
            let script = root.join("engine.sh");
            std::fs::write(&script, FAKE_ENGINE).expect("write script");
            let engine =
                ProcessEngine::new(&["sh".to_string(), script.to_string()]).expect("engine");
            (tmp, root, engine)
        }

        fn rule(root: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
            let path = root.join(name);
            std::fs::write(&path, body).expect("write rule");
            path
        }

        #[test]
        fn passes_argument_file_and_search_roots() {
            let (_tmp, root, engine) = setup();
            let path = rule(&root, "echo.jsonnet", "echo");
            let chain = ImportChain::standard(&root.join("cache"));

            let out = engine
                .evaluate(&path, r#"{"data":{"a":1}}"#, &ImportContext::new(&path, &chain))
                .expect("evaluate");
            assert_eq!(out, r#"{"data":{"a":1}}"#);

            let roots = std::fs::read_to_string(root.join("roots")).expect("roots");
            let roots: Vec<&str> = roots.lines().collect();
            assert_eq!(roots[0], root.as_str());
            assert!(roots.contains(&root.join("cache").as_str()));
        }

        #[test]
        fn stdout_is_the_rule_output() {
            let (_tmp, root, engine) = setup();
            let path = rule(&root, "static.jsonnet", r#"[{"message":"x"}]"#);
            let chain = ImportChain::new();

            let out = engine
                .evaluate(&path, "{}", &ImportContext::new(&path, &chain))
                .expect("evaluate");
            assert_eq!(out, r#"[{"message":"x"}]"#);
        }

        #[test]
        fn non_zero_exit_carries_stderr() {
            let (_tmp, root, engine) = setup();
            let path = rule(&root, "fail.jsonnet", "fail");
            let chain = ImportChain::new();

            let err = engine
                .evaluate(&path, "{}", &ImportContext::new(&path, &chain))
                .unwrap_err();
            assert!(err.to_string().contains("RUNTIME ERROR: boom"), "{err}");
        }

        #[test]
        fn missing_program_is_an_evaluation_error() {
            let (_tmp, root, _) = setup();
            let engine =
                ProcessEngine::new(&["datalint-no-such-engine".to_string()]).expect("engine");
            let path = rule(&root, "r.jsonnet", "[]");
            let chain = ImportChain::new();

            let err = engine
                .evaluate(&path, "{}", &ImportContext::new(&path, &chain))
                .unwrap_err();
            assert!(err.to_string().contains("datalint-no-such-engine"), "{err}");
        }
    }
}
