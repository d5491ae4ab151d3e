//! `git-last-commit` checker (spec §4.4) — flags a stale repository by
//! the age of its most recent commit.

use chrono::Utc;

use crate::checkers::{scanner_not_available, CheckContext, CheckOutcome, Checker};
use crate::types::{Issue, Severity, Warning};

const MAX_SCORE: u32 = 100;
const DEFAULT_WARNING_DAYS: u64 = 30;
const DEFAULT_CRITICAL_DAYS: u64 = 180;

pub struct GitLastCommitChecker;

impl Checker for GitLastCommitChecker {
    fn id(&self) -> &'static str {
        "git-last-commit"
    }

    fn name(&self) -> &'static str {
        "git-last-commit"
    }

    fn category(&self) -> &'static str {
        "git"
    }

    fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        let outcome = ctx.executor.execute_in_dir(
            &ctx.exec,
            ctx.repo_path,
            &["git", "log", "-1", "--format=%ct"],
        );

        if let Some(reason) = outcome.error {
            return CheckOutcome::healthy(MAX_SCORE)
                .with_warning(scanner_not_available("git", "git-last-commit"))
                .with_metadata("reason", serde_json::json!(reason));
        }

        let raw = outcome.stdout.trim();
        if outcome.exit_code != Some(0) || raw.is_empty() {
            return CheckOutcome::healthy(MAX_SCORE).with_score(0).with_issue(
                Issue::new(
                    "no_commits",
                    Severity::Critical,
                    "repository has no commit history",
                )
                .with_suggestion("make an initial commit"),
            );
        }

        let Ok(commit_epoch) = raw.parse::<i64>() else {
            return CheckOutcome::healthy(MAX_SCORE)
                .with_warning(Warning::new("tool_error", "could not parse git log timestamp"));
        };

        let warning_days = ctx.config.option_u64("warning_days", DEFAULT_WARNING_DAYS);
        let critical_days = ctx.config.option_u64("critical_days", DEFAULT_CRITICAL_DAYS);

        let now = Utc::now().timestamp();
        let age_days = ((now - commit_epoch).max(0) / 86_400) as u64;

        let mut result = CheckOutcome::healthy(MAX_SCORE).with_metric("age_days", serde_json::json!(age_days));

        if age_days > critical_days {
            result = result.with_score(0).with_issue(
                Issue::new(
                    "stale_repository",
                    Severity::High,
                    format!("last commit is {age_days} days old (critical threshold {critical_days})"),
                )
                .with_suggestion("review whether this repository is still maintained"),
            );
        } else if age_days > warning_days {
            result = result.with_score(60).with_warning(Warning::new(
                "stale_repository",
                format!("last commit is {age_days} days old (warning threshold {warning_days})"),
            ));
        }

        result
    }
}
