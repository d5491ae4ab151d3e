//! `dependencies-outdated` checker (spec §4.4) — shells out to the
//! package manager matching whichever manifest file is present and
//! counts packages with an available update.
//!
//! Grounded on the teacher's `discovery.rs` shell-out-and-tolerate-
//! absence pattern: a missing package manager binary degrades to a
//! warning, never a critical issue, the same way a missing `git` does
//! for the git-* checkers.

use crate::checkers::{scanner_not_available, CheckContext, CheckOutcome, Checker};
use crate::types::{Issue, Severity, Warning};

const MAX_SCORE: u32 = 100;
const DEFAULT_WARNING_THRESHOLD: u64 = 1;
const DEFAULT_CRITICAL_THRESHOLD: u64 = 20;

/// Which manifest file (and therefore which package manager) was
/// detected in the repository root.
enum Manifest {
    Go,
    Node,
    Python,
    Maven,
    Gradle,
}

pub struct DependenciesOutdatedChecker;

impl Checker for DependenciesOutdatedChecker {
    fn id(&self) -> &'static str {
        "dependencies-outdated"
    }

    fn name(&self) -> &'static str {
        "dependencies-outdated"
    }

    fn category(&self) -> &'static str {
        "dependencies"
    }

    fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(manifest) = detect_manifest(ctx) else {
            return CheckOutcome::healthy(MAX_SCORE).with_warning(Warning::new(
                "no_manifest_found",
                "no recognized dependency manifest found (go.mod, package.json, requirements.txt, pyproject.toml)",
            ));
        };

        let (tool, argv): (&str, &[&str]) = match manifest {
            Manifest::Go => ("go", &["go", "list", "-u", "-m", "all"]),
            Manifest::Node => ("npm", &["npm", "outdated", "--json"]),
            Manifest::Python => ("pip", &["pip", "list", "--outdated", "--format=json"]),
            Manifest::Maven => ("mvn", &["mvn", "-q", "versions:display-dependency-updates"]),
            Manifest::Gradle => ("gradle", &["gradle", "dependencyUpdates"]),
        };

        let outcome = ctx.executor.execute_in_dir(&ctx.exec, ctx.repo_path, argv);
        if let Some(reason) = outcome.error {
            return CheckOutcome::healthy(MAX_SCORE)
                .with_warning(scanner_not_available(tool, "dependencies"))
                .with_metadata("reason", serde_json::json!(reason));
        }

        let count = match manifest {
            Manifest::Go => outcome.stdout.lines().filter(|l| l.contains('[')).count() as u64,
            Manifest::Node => count_json_object(&outcome.stdout),
            Manifest::Python => count_json_array(&outcome.stdout),
            Manifest::Maven | Manifest::Gradle => count_arrow_lines(&outcome.stdout),
        };

        let warning_threshold = ctx.config.option_u64("warning_threshold", DEFAULT_WARNING_THRESHOLD);
        let critical_threshold = ctx.config.option_u64("critical_threshold", DEFAULT_CRITICAL_THRESHOLD);

        let mut result = CheckOutcome::healthy(MAX_SCORE).with_metric("outdated_count", serde_json::json!(count));

        if count >= critical_threshold {
            result = result.with_score(20).with_issue(
                Issue::new(
                    "dependencies_severely_outdated",
                    Severity::High,
                    format!("{count} dependencies have available updates (critical threshold {critical_threshold})"),
                )
                .with_suggestion("schedule a dependency upgrade pass"),
            );
        } else if count >= warning_threshold {
            result = result.with_score(70).with_warning(Warning::new(
                "dependencies_outdated",
                format!("{count} dependencies have available updates"),
            ));
        }

        result
    }
}

fn detect_manifest(ctx: &CheckContext) -> Option<Manifest> {
    if ctx.fs.exists(&ctx.repo_path.join("go.mod")) {
        return Some(Manifest::Go);
    }
    if ctx.fs.exists(&ctx.repo_path.join("package.json")) {
        return Some(Manifest::Node);
    }
    if ctx.fs.exists(&ctx.repo_path.join("requirements.txt"))
        || ctx.fs.exists(&ctx.repo_path.join("pyproject.toml"))
    {
        return Some(Manifest::Python);
    }
    if ctx.fs.exists(&ctx.repo_path.join("pom.xml")) {
        return Some(Manifest::Maven);
    }
    if ctx.fs.exists(&ctx.repo_path.join("build.gradle")) || ctx.fs.exists(&ctx.repo_path.join("build.gradle.kts")) {
        return Some(Manifest::Gradle);
    }
    None
}

/// Both `versions:display-dependency-updates` (Maven) and the
/// `dependencyUpdates` task (Gradle) print one `current -> available`
/// arrow per outdated dependency.
fn count_arrow_lines(stdout: &str) -> u64 {
    stdout.lines().filter(|l| l.contains("->")).count() as u64
}

fn count_json_object(stdout: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(stdout)
        .ok()
        .and_then(|v| v.as_object().map(|o| o.len() as u64))
        .unwrap_or(0)
}

fn count_json_array(stdout: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(stdout)
        .ok()
        .and_then(|v| v.as_array().map(|a| a.len() as u64))
        .unwrap_or(0)
}
