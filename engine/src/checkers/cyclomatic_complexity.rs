//! `cyclomatic-complexity` checker (spec §4.4) — runs every analyzer
//! applicable to the repository (spec §4.3's `supported_for`) and flags
//! functions whose complexity exceeds that language's configured
//! threshold (spec §4.2/§9 Open Question 2: the engine-level
//! `--max-complexity` override, applied upstream in
//! [`crate::config::Config::apply_max_complexity_override`], always wins
//! over a per-checker option).

use crate::checkers::{CheckContext, CheckOutcome, Checker};
use crate::types::{Issue, Severity};

const MAX_SCORE: u32 = 100;
const DEFAULT_THRESHOLD: u32 = 10;
const MAX_ISSUES_REPORTED: usize = 10;

pub struct CyclomaticComplexityChecker;

impl Checker for CyclomaticComplexityChecker {
    fn id(&self) -> &'static str {
        "cyclomatic-complexity"
    }

    fn name(&self) -> &'static str {
        "cyclomatic-complexity"
    }

    fn category(&self) -> &'static str {
        "quality"
    }

    fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        let analyzers = ctx.analyzers.supported_for(ctx.repository, ctx.repo_path, ctx.fs);
        if analyzers.is_empty() {
            return CheckOutcome::healthy(MAX_SCORE).with_warning(crate::types::Warning::new(
                "no_applicable_analyzer",
                "no recognized source language found for complexity analysis",
            ));
        }

        let mut total_functions = 0u32;
        let mut max_complexity = 0u32;
        let mut skipped_large_files = 0u32;
        let mut violations: Vec<(String, u32, u32)> = Vec::new();
        let mut analyzed_any = false;

        for analyzer in analyzers {
            let result = match analyzer.analyze_complexity(ctx.fs, ctx.repo_path) {
                Ok(r) => r,
                Err(_) => continue,
            };
            analyzed_any = true;
            total_functions += result.total_functions;
            max_complexity = max_complexity.max(result.max_complexity);
            skipped_large_files += result.skipped_large_files;

            let threshold = ctx
                .analyzer_thresholds
                .get(&analyzer.language().to_string())
                .copied()
                .unwrap_or_else(|| ctx.config.option_u64("max_complexity", u64::from(DEFAULT_THRESHOLD)) as u32);

            for function in &result.functions {
                if function.complexity > threshold {
                    violations.push((
                        format!("{}:{} `{}`", function.file, function.line, function.name),
                        function.complexity,
                        threshold,
                    ));
                }
            }
        }

        if !analyzed_any {
            return CheckOutcome::healthy(MAX_SCORE).with_warning(crate::types::Warning::new(
                "no_applicable_analyzer",
                "no source files found for any applicable analyzer",
            ));
        }

        // Score = percentage of functions at or below their language's
        // threshold (spec §4.4 table, §8 S2/S3): `within / total * 100`,
        // rounded to the nearest whole score point.
        let score = if total_functions == 0 {
            MAX_SCORE
        } else {
            let within = total_functions - violations.len() as u32;
            ((u64::from(within) * u64::from(MAX_SCORE) + u64::from(total_functions) / 2) / u64::from(total_functions)) as u32
        };

        let mut outcome = CheckOutcome::healthy(MAX_SCORE)
            .with_score(score)
            .with_metric("total_functions", serde_json::json!(total_functions))
            .with_metric("max_complexity", serde_json::json!(max_complexity))
            .with_metric("violations", serde_json::json!(violations.len()));
        if skipped_large_files > 0 {
            outcome = outcome.with_metric("skipped_large_files", serde_json::json!(skipped_large_files));
        }

        if violations.is_empty() {
            return outcome;
        }

        // Severity tiers per spec §4.4: > 2x threshold is critical, > 1.5x
        // is high, anything else above threshold is medium.
        for (location, complexity, threshold) in violations.iter().take(MAX_ISSUES_REPORTED) {
            let severity = if *complexity > threshold.saturating_mul(2) {
                Severity::Critical
            } else if u64::from(*complexity) * 2 > u64::from(*threshold) * 3 {
                Severity::High
            } else {
                Severity::Medium
            };
            outcome = outcome.with_issue(
                Issue::new(
                    "high_complexity",
                    severity,
                    format!("{location} has cyclomatic complexity {complexity} (threshold {threshold})"),
                )
                .with_suggestion("extract smaller functions or reduce branching"),
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer_registry::AnalyzerRegistry;
    use crate::config::Config;
    use crate::platform::{ExecContext, RealCommandExecutor, RealFileSystem};
    use crate::types::Repository;
    use std::fs;
    use tempfile::tempdir;

    fn repo() -> Repository {
        Repository {
            name: "r".into(),
            url: "u".into(),
            branch: None,
            path: None,
            tags: vec![],
            language: None,
        }
    }

    #[test]
    fn low_complexity_go_function_is_healthy() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("main.go"),
            "package main\n\nfunc run() {\n\tif true {\n\t}\n}\n",
        )
        .unwrap();

        let analyzers = AnalyzerRegistry::with_builtins();
        let config = Config::defaults();
        let repository = repo();
        let ctx = CheckContext {
            repository: &repository,
            repo_path: dir.path(),
            fs: &RealFileSystem,
            executor: &RealCommandExecutor,
            cache: None,
            exec: ExecContext::new(std::time::Duration::from_secs(5)),
            config: config.checker("cyclomatic-complexity").unwrap(),
            analyzers: &analyzers,
            analyzer_thresholds: &config.analyzer_thresholds,
            github_token: None,
        };

        let outcome = CyclomaticComplexityChecker.check(&ctx);
        assert_eq!(outcome.score, outcome.max_score);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn function_above_threshold_is_flagged() {
        let dir = tempdir().unwrap();
        let body: String = (0..15)
            .map(|i| format!("\tif x == {i} {{\n\t}}\n"))
            .collect();
        fs::write(dir.path().join("main.go"), format!("package main\n\nfunc run() {{\n{body}}}\n")).unwrap();

        let analyzers = AnalyzerRegistry::with_builtins();
        let mut config = Config::defaults();
        config.analyzer_thresholds.insert("go".to_owned(), 10);
        let repository = repo();
        let ctx = CheckContext {
            repository: &repository,
            repo_path: dir.path(),
            fs: &RealFileSystem,
            executor: &RealCommandExecutor,
            cache: None,
            exec: ExecContext::new(std::time::Duration::from_secs(5)),
            config: config.checker("cyclomatic-complexity").unwrap(),
            analyzers: &analyzers,
            analyzer_thresholds: &config.analyzer_thresholds,
            github_token: None,
        };

        let outcome = CyclomaticComplexityChecker.check(&ctx);
        assert!(!outcome.issues.is_empty());
        assert!(outcome.score < outcome.max_score);
    }

    #[test]
    fn one_of_two_functions_over_threshold_scores_fifty() {
        // spec §8 S3: a.go has 11 decision points (complexity 12 at
        // threshold 10), b.go is a single empty function (complexity 1).
        let dir = tempdir().unwrap();
        let body: String = (0..10).map(|i| format!("\tif x == {i} {{\n\t}}\n")).collect();
        fs::write(
            dir.path().join("a.go"),
            format!("package main\n\nfunc run() {{\n{body}\tfor i := 0; i < n; i++ {{\n\t}}\n}}\n"),
        )
        .unwrap();
        fs::write(dir.path().join("b.go"), "package main\n\nfunc empty() {\n}\n").unwrap();

        let analyzers = AnalyzerRegistry::with_builtins();
        let mut config = Config::defaults();
        config.analyzer_thresholds.insert("go".to_owned(), 10);
        let repository = repo();
        let ctx = CheckContext {
            repository: &repository,
            repo_path: dir.path(),
            fs: &RealFileSystem,
            executor: &RealCommandExecutor,
            cache: None,
            exec: ExecContext::new(std::time::Duration::from_secs(5)),
            config: config.checker("cyclomatic-complexity").unwrap(),
            analyzers: &analyzers,
            analyzer_thresholds: &config.analyzer_thresholds,
            github_token: None,
        };

        let outcome = CyclomaticComplexityChecker.check(&ctx);
        assert_eq!(outcome.metrics.get("total_functions").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(outcome.score, 50);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].severity, Severity::Medium);
    }

    #[test]
    fn no_recognized_source_files_is_healthy_with_warning() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "hello").unwrap();

        let analyzers = AnalyzerRegistry::with_builtins();
        let config = Config::defaults();
        let repository = repo();
        let ctx = CheckContext {
            repository: &repository,
            repo_path: dir.path(),
            fs: &RealFileSystem,
            executor: &RealCommandExecutor,
            cache: None,
            exec: ExecContext::new(std::time::Duration::from_secs(5)),
            config: config.checker("cyclomatic-complexity").unwrap(),
            analyzers: &analyzers,
            analyzer_thresholds: &config.analyzer_thresholds,
            github_token: None,
        };

        let outcome = CyclomaticComplexityChecker.check(&ctx);
        assert_eq!(outcome.score, outcome.max_score);
        assert!(!outcome.warnings.is_empty());
    }
}
