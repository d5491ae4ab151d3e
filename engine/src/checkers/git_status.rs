//! `git-status` checker (spec §4.4) — flags uncommitted/untracked
//! changes; critical only when the directory is not a git repository at
//! all.

use crate::checkers::{scanner_not_available, CheckContext, CheckOutcome, Checker};
use crate::types::{Issue, Severity};

const MAX_SCORE: u32 = 100;

pub struct GitStatusChecker;

impl Checker for GitStatusChecker {
    fn id(&self) -> &'static str {
        "git-status"
    }

    fn name(&self) -> &'static str {
        "git-status"
    }

    fn category(&self) -> &'static str {
        "git"
    }

    fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        let outcome = ctx
            .executor
            .execute_in_dir(&ctx.exec, ctx.repo_path, &["git", "status", "--porcelain"]);

        if let Some(reason) = outcome.error {
            return CheckOutcome::healthy(MAX_SCORE)
                .with_score(MAX_SCORE)
                .with_warning(scanner_not_available("git", "git-status"))
                .with_metadata("reason", serde_json::json!(reason));
        }

        if outcome.exit_code != Some(0) {
            return CheckOutcome::healthy(MAX_SCORE).with_score(0).with_issue(
                Issue::new(
                    "not_a_git_repository",
                    Severity::Critical,
                    format!("'{}' is not a git repository", ctx.repo_path.display()),
                )
                .with_suggestion("run `git init` or verify the configured path"),
            );
        }

        let dirty_lines: Vec<&str> = outcome.stdout.lines().filter(|l| !l.is_empty()).collect();
        if dirty_lines.is_empty() {
            return CheckOutcome::healthy(MAX_SCORE);
        }

        CheckOutcome::healthy(MAX_SCORE)
            .with_score(70)
            .with_warning(crate::types::Warning::new(
                "uncommitted_changes",
                format!("{} uncommitted/untracked file(s)", dirty_lines.len()),
            ))
            .with_metric("dirty_files", serde_json::json!(dirty_lines.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::test_support::*;
    use std::path::Path;

    #[test]
    fn clean_tree_is_healthy() {
        let fixture = Fixture::new("git-status", None, ok(""));
        let context = fixture.ctx("git-status", Path::new("/tmp/repo"));
        let outcome = GitStatusChecker.check(&context);
        assert_eq!(outcome.score, outcome.max_score);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn dirty_tree_is_a_warning() {
        let fixture = Fixture::new("git-status", None, ok(" M src/main.rs\n?? new.rs\n"));
        let context = fixture.ctx("git-status", Path::new("/tmp/repo"));
        let outcome = GitStatusChecker.check(&context);
        assert!(!outcome.warnings.is_empty());
        assert_eq!(outcome.metrics["dirty_files"], serde_json::json!(2));
    }

    #[test]
    fn non_repo_is_critical() {
        let fixture = Fixture::new("git-status", None, failed(128, "fatal: not a git repository"));
        let context = fixture.ctx("git-status", Path::new("/tmp/repo"));
        let outcome = GitStatusChecker.check(&context);
        assert_eq!(outcome.issues[0].severity, Severity::Critical);
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn missing_git_binary_is_a_warning_not_critical() {
        let fixture = Fixture::new("git-status", None, missing_tool("git"));
        let context = fixture.ctx("git-status", Path::new("/tmp/repo"));
        let outcome = GitStatusChecker.check(&context);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.warnings[0].warning_type, "scanner_not_available");
    }
}
