use datalint_domain::effective_level;
use datalint_types::{FileReport, Level, LintReport, Verdict};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => anyhow::bail!("unknown output format: {other} (expected text or json)"),
        }
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => "PASS",
        Verdict::Warn => "WARN",
        Verdict::Fail => "FAIL",
    }
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Debug => "DEBUG",
        Level::Info => "INFO",
        Level::Warn => "WARN",
        Level::Error => "ERROR",
    }
}

/// Human-readable report: one block per file with something to say, then a summary.
pub fn render_text(report: &LintReport) -> String {
    let mut out = String::new();

    for file in report.files.iter().filter(|f| f.verdict != Verdict::Pass) {
        render_file(&mut out, file, report.default_level);
    }

    let failed = report
        .files
        .iter()
        .filter(|f| f.verdict == Verdict::Fail)
        .count();
    let warned = report
        .files
        .iter()
        .filter(|f| f.verdict == Verdict::Warn)
        .count();
    let c = &report.counts;
    out.push_str(&format!(
        "Verdict: {} (error_level: {})\n",
        verdict_label(report.verdict),
        report.error_level
    ));
    out.push_str(&format!(
        "Files: {} ({} failed, {} warned)\n",
        report.files.len(),
        failed,
        warned
    ));
    out.push_str(&format!(
        "Findings: error={} warn={} info={} debug={}, errors={}\n",
        c.error, c.warn, c.info, c.debug, c.errors
    ));
    out
}

fn render_file(out: &mut String, file: &FileReport, run_default: Level) {
    out.push_str(&format!(
        "{}: {}\n",
        file.result.path,
        verdict_label(file.verdict)
    ));
    if let Some(error) = &file.result.error {
        out.push_str(&format!("  [ERROR] {error}\n"));
    }
    for outcome in &file.result.outcomes {
        if let Some(error) = &outcome.error {
            out.push_str(&format!("  [ERROR] {}: {}\n", outcome.rule_key, error));
        }
        for finding in outcome.findings().iter().filter(|f| !f.excluded) {
            let level = effective_level(finding, outcome.default_level, run_default);
            match &finding.name {
                Some(name) => out.push_str(&format!(
                    "  [{}] {} ({}): {}\n",
                    level_label(level),
                    outcome.rule_key,
                    name,
                    finding.message
                )),
                None => out.push_str(&format!(
                    "  [{}] {}: {}\n",
                    level_label(level),
                    outcome.rule_key,
                    finding.message
                )),
            }
        }
    }
}

pub fn render_json(report: &LintReport) -> anyhow::Result<String> {
    let mut text = serde_json::to_string_pretty(report)?;
    text.push('\n');
    Ok(text)
}

/// Render the report in every requested format, text when none is requested.
///
/// A passing run renders nothing unless `output_success` is set.
pub fn render_outputs(
    report: &LintReport,
    formats: &[OutputFormat],
    output_success: bool,
) -> anyhow::Result<Vec<(OutputFormat, String)>> {
    if report.verdict == Verdict::Pass && !output_success {
        return Ok(Vec::new());
    }
    let formats = if formats.is_empty() {
        &[OutputFormat::Text][..]
    } else {
        formats
    };
    formats
        .iter()
        .map(|format| -> anyhow::Result<(OutputFormat, String)> {
            let text = match format {
                OutputFormat::Text => render_text(report),
                OutputFormat::Json => render_json(report)?,
            };
            Ok((*format, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalint_domain::{SeverityPolicy, combine};
    use datalint_types::ids::{SCHEMA_REPORT_V1, TOOL_NAME};
    use datalint_types::{EvaluationOutcome, FileResult, Finding, RepoPath, ToolMeta};
    use time::OffsetDateTime;

    fn report(results: Vec<FileResult>, threshold: Level) -> LintReport {
        report_with(
            results,
            SeverityPolicy {
                threshold,
                ..SeverityPolicy::default()
            },
        )
    }

    fn report_with(results: Vec<FileResult>, policy: SeverityPolicy) -> LintReport {
        let combined = combine(results, &policy);
        LintReport {
            schema: SCHEMA_REPORT_V1.to_string(),
            tool: ToolMeta {
                name: TOOL_NAME.to_string(),
                version: "0.0.0".to_string(),
            },
            started_at: OffsetDateTime::UNIX_EPOCH,
            finished_at: OffsetDateTime::UNIX_EPOCH,
            error_level: policy.threshold,
            default_level: policy.default_level,
            verdict: combined.verdict,
            counts: combined.counts,
            files: combined.files,
        }
    }

    fn mixed() -> LintReport {
        let mut a = FileResult::new(RepoPath::new("a.json"));
        a.outcomes.push(EvaluationOutcome {
            rule_key: "rules/a.jsonnet".to_string(),
            findings: Some(vec![
                Finding::new("missing name").with_level("warn"),
                Finding {
                    excluded: true,
                    ..Finding::new("ignored")
                },
            ]),
            ..EvaluationOutcome::default()
        });
        a.outcomes
            .push(EvaluationOutcome::failed("rules/b.jsonnet", "boom"));
        let b = FileResult::new(RepoPath::new("b.json"));
        report(vec![b, a], Level::Warn)
    }

    #[test]
    fn renders_failing_files_and_summary() {
        insta::assert_snapshot!(render_text(&mixed()), @r"
        a.json: FAIL
          [WARN] rules/a.jsonnet: missing name
          [ERROR] rules/b.jsonnet: boom
        Verdict: FAIL (error_level: warn)
        Files: 2 (1 failed, 0 warned)
        Findings: error=0 warn=1 info=0 debug=0, errors=1
        ");
    }

    #[test]
    fn renders_named_findings_and_file_errors() {
        let mut a = FileResult::file_error(RepoPath::new("a.json"), "decode a.json: EOF");
        a.outcomes.push(EvaluationOutcome {
            rule_key: "r.jsonnet".to_string(),
            default_level: Some(Level::Info),
            findings: Some(vec![Finding {
                name: Some("naming".to_string()),
                ..Finding::new("bad key")
            }]),
            ..EvaluationOutcome::default()
        });
        let text = render_text(&report(vec![a], Level::Error));
        assert!(text.contains("  [ERROR] decode a.json: EOF\n"), "{text}");
        assert!(text.contains("  [INFO] r.jsonnet (naming): bad key\n"), "{text}");
    }

    #[test]
    fn unleveled_findings_use_the_run_default_level() {
        let mut a = FileResult::new(RepoPath::new("a.json"));
        a.outcomes.push(EvaluationOutcome {
            rule_key: "r.jsonnet".to_string(),
            findings: Some(vec![Finding::new("odd value")]),
            ..EvaluationOutcome::default()
        });
        let policy = SeverityPolicy {
            threshold: Level::Info,
            default_level: Level::Warn,
        };
        let report = report_with(vec![a], policy);

        assert_eq!(report.files[0].max_level, Some(Level::Warn));
        let text = render_text(&report);
        assert!(text.contains("  [WARN] r.jsonnet: odd value\n"), "{text}");
        assert!(text.contains("Findings: error=0 warn=1"), "{text}");
    }

    #[test]
    fn passing_run_renders_nothing_without_output_success() {
        let pass = report(vec![FileResult::new(RepoPath::new("a.json"))], Level::Error);
        assert!(
            render_outputs(&pass, &[OutputFormat::Text], false)
                .expect("render")
                .is_empty()
        );

        let rendered = render_outputs(&pass, &[], true).expect("render");
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, OutputFormat::Text);
        assert!(rendered[0].1.contains("Verdict: PASS"));
    }

    #[test]
    fn renders_every_requested_format() {
        let rendered = render_outputs(&mixed(), &[OutputFormat::Json, OutputFormat::Text], false)
            .expect("render");
        assert_eq!(rendered.len(), 2);

        let json: serde_json::Value = serde_json::from_str(&rendered[0].1).expect("json");
        assert_eq!(json["schema"], SCHEMA_REPORT_V1);
        assert_eq!(json["verdict"], "fail");
        assert_eq!(json["files"][0]["path"], "a.json");
        assert!(rendered[1].1.starts_with("a.json: FAIL\n"));
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("json".parse::<OutputFormat>().expect("json"), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }
}
