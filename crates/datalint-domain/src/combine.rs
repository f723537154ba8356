//! Severity classification and pass/fail decision.

use crate::fingerprint::fingerprint_for_finding;
use crate::policy::SeverityPolicy;
use datalint_types::{FileReport, FileResult, Finding, Level, LevelCounts, Verdict};

/// Classified results for a whole run, ordered by data file path.
#[derive(Clone, Debug, PartialEq)]
pub struct CombinedReport {
    pub verdict: Verdict,
    /// True when any file exceeds the threshold.
    pub failed: bool,
    pub counts: LevelCounts,
    pub files: Vec<FileReport>,
}

/// The level a finding counts at.
///
/// Its own level wins, then the rule's default, then the run default. Unknown level names
/// count as `error` so a typo can never hide a finding.
pub fn effective_level(finding: &Finding, rule_default: Option<Level>, run_default: Level) -> Level {
    match finding.level.as_deref().map(str::trim) {
        None | Some("") => rule_default.unwrap_or(run_default),
        Some(raw) => raw.parse().unwrap_or(Level::Error),
    }
}

/// Classify one file. Also stamps a fingerprint on every finding that lacks one.
pub fn classify_file(mut result: FileResult, policy: &SeverityPolicy) -> FileReport {
    let mut counts = LevelCounts::default();
    let mut max_level: Option<Level> = None;

    if result.error.is_some() {
        counts.errors += 1;
        max_level = Some(Level::Error);
    }

    let path = result.path.as_str().to_string();
    for outcome in &mut result.outcomes {
        if outcome.error.is_some() {
            counts.errors += 1;
            max_level = Some(Level::Error);
        }
        let rule_default = outcome.default_level;
        let rule_key = outcome.rule_key.as_str();
        for finding in outcome.findings.iter_mut().flatten() {
            if finding.fingerprint.is_none() {
                finding.fingerprint = Some(fingerprint_for_finding(
                    rule_key,
                    &path,
                    finding.name.as_deref(),
                    &finding.message,
                ));
            }
            if finding.excluded {
                continue;
            }
            let level = effective_level(finding, rule_default, policy.default_level);
            counts.add(level);
            max_level = max_level.max(Some(level));
        }
    }

    let exceeds_threshold = max_level.is_some_and(|level| level >= policy.threshold);
    let verdict = match max_level {
        None => Verdict::Pass,
        Some(_) if exceeds_threshold => Verdict::Fail,
        Some(_) => Verdict::Warn,
    };

    FileReport {
        verdict,
        exceeds_threshold,
        max_level,
        counts,
        result,
    }
}

/// Classify every file and roll the verdicts up into a run verdict.
pub fn combine<I>(results: I, policy: &SeverityPolicy) -> CombinedReport
where
    I: IntoIterator<Item = FileResult>,
{
    let mut files: Vec<FileReport> = results
        .into_iter()
        .map(|r| classify_file(r, policy))
        .collect();
    files.sort_by(|a, b| a.result.path.cmp(&b.result.path));

    let mut counts = LevelCounts::default();
    let mut verdict = Verdict::Pass;
    for file in &files {
        counts.absorb(&file.counts);
        verdict = match (verdict, file.verdict) {
            (Verdict::Fail, _) | (_, Verdict::Fail) => Verdict::Fail,
            (Verdict::Warn, _) | (_, Verdict::Warn) => Verdict::Warn,
            _ => Verdict::Pass,
        };
    }

    CombinedReport {
        verdict,
        failed: files.iter().any(|f| f.exceeds_threshold),
        counts,
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalint_types::{EvaluationOutcome, RepoPath};

    fn outcome(rule: &str, findings: Vec<Finding>) -> EvaluationOutcome {
        EvaluationOutcome {
            rule_key: rule.to_string(),
            findings: Some(findings),
            ..EvaluationOutcome::default()
        }
    }

    fn file(path: &str, outcomes: Vec<EvaluationOutcome>) -> FileResult {
        FileResult {
            path: RepoPath::new(path),
            outcomes,
            error: None,
        }
    }

    fn policy(threshold: Level) -> SeverityPolicy {
        SeverityPolicy {
            threshold,
            ..SeverityPolicy::default()
        }
    }

    #[test]
    fn mixed_levels_exceed_warn_threshold() {
        let result = file(
            "a.json",
            vec![
                outcome("r1", vec![Finding::new("i").with_level("info")]),
                outcome(
                    "r2",
                    vec![
                        Finding::new("w").with_level("warn"),
                        Finding::new("e").with_level("error"),
                    ],
                ),
            ],
        );
        let report = classify_file(result, &policy(Level::Warn));
        assert!(report.exceeds_threshold);
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.max_level, Some(Level::Error));
        assert_eq!(
            (report.counts.info, report.counts.warn, report.counts.error),
            (1, 1, 1)
        );
    }

    #[test]
    fn info_only_stays_below_warn_threshold() {
        let result = file(
            "a.json",
            vec![outcome("r1", vec![Finding::new("i").with_level("info")])],
        );
        let report = classify_file(result, &policy(Level::Warn));
        assert!(!report.exceeds_threshold);
        assert_eq!(report.verdict, Verdict::Warn);
    }

    #[test]
    fn empty_file_passes() {
        let report = classify_file(file("a.json", vec![outcome("r1", vec![])]), &policy(Level::Debug));
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.max_level, None);
    }

    #[test]
    fn unknown_level_counts_as_error() {
        let f = Finding::new("x").with_level("critical");
        assert_eq!(effective_level(&f, Some(Level::Info), Level::Debug), Level::Error);
    }

    #[test]
    fn unleveled_findings_use_rule_then_run_default() {
        let f = Finding::new("x");
        assert_eq!(effective_level(&f, Some(Level::Info), Level::Error), Level::Info);
        assert_eq!(effective_level(&f, None, Level::Warn), Level::Warn);
    }

    #[test]
    fn errors_classify_as_error() {
        let mut result = file("a.json", vec![EvaluationOutcome::failed("r1", "boom")]);
        let report = classify_file(result.clone(), &policy(Level::Error));
        assert!(report.exceeds_threshold);
        assert_eq!(report.counts.errors, 1);

        result.outcomes.clear();
        result.error = Some("decode".to_string());
        assert!(classify_file(result, &policy(Level::Error)).exceeds_threshold);
    }

    #[test]
    fn excluded_findings_are_reported_but_not_counted() {
        let mut excluded = Finding::new("ignored").with_level("error");
        excluded.excluded = true;
        let report = classify_file(
            file("a.json", vec![outcome("r1", vec![excluded])]),
            &policy(Level::Info),
        );
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.result.findings().count(), 1);
        assert!(report.result.findings().all(|f| f.fingerprint.is_some()));
    }

    #[test]
    fn run_fails_when_any_file_exceeds() {
        let combined = combine(
            vec![
                file("b.json", vec![outcome("r", vec![Finding::new("e")])]),
                file("a.json", vec![outcome("r", vec![])]),
            ],
            &policy(Level::Error),
        );
        assert!(combined.failed);
        assert_eq!(combined.verdict, Verdict::Fail);
        let paths: Vec<_> = combined.files.iter().map(|f| f.result.path.as_str()).collect();
        assert_eq!(paths, vec!["a.json", "b.json"]);
        assert_eq!(combined.counts.error, 1);
    }
}
