//! `readme-check` checker (spec §4.4) — scans the repository root for a
//! case-insensitive README (`.md`/`.txt`/`.rst`/bare) and grades its
//! content additively: 20 base + 10 length + 15 title + 15 description +
//! 15 install + 15 usage + 5 badges + 5 license, for a 100-point total.

use std::path::PathBuf;

use crate::checkers::{CheckContext, CheckOutcome, Checker};
use crate::types::{Issue, Severity};

const MAX_SCORE: u32 = 100;

const BASE_POINTS: u32 = 20;
const LENGTH_POINTS: u32 = 10;
const TITLE_POINTS: u32 = 15;
const DESCRIPTION_POINTS: u32 = 15;
const INSTALL_POINTS: u32 = 15;
const USAGE_POINTS: u32 = 15;
const BADGES_POINTS: u32 = 5;
const LICENSE_POINTS: u32 = 5;

const MIN_SUBSTANTIAL_LENGTH: usize = 500;
const INSTALL_MARKERS: &[&str] = &["installation", "install", "getting started", "setup"];
const USAGE_MARKERS: &[&str] = &["usage", "## example", "# example", "how to use"];
const LICENSE_MARKERS: &[&str] = &["license", "licence"];

/// Find the repository root's README: any case-insensitive `README*`
/// match, sorted for a deterministic pick among multiple candidates
/// (e.g. `README.md` and `README.rst` both present).
fn find_readme_file(ctx: &CheckContext) -> Option<PathBuf> {
    let mut matches = ctx.fs.list_files(ctx.repo_path, "README*");
    matches.sort();
    matches.into_iter().next()
}

pub struct ReadmeCheckChecker;

impl Checker for ReadmeCheckChecker {
    fn id(&self) -> &'static str {
        "readme-check"
    }

    fn name(&self) -> &'static str {
        "readme-check"
    }

    fn category(&self) -> &'static str {
        "documentation"
    }

    fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(path) = find_readme_file(ctx) else {
            return CheckOutcome::healthy(MAX_SCORE).with_score(0).with_issue(
                Issue::new("missing_readme", Severity::Medium, "no README file found at the repository root")
                    .with_suggestion("add a README describing the project, how to install it, and how to use it"),
            );
        };

        let contents = match ctx.fs.read_file(&path) {
            Ok(c) => c,
            Err(e) => {
                return CheckOutcome::healthy(MAX_SCORE).with_score(0).with_issue(Issue::new(
                    "readme_unreadable",
                    Severity::Medium,
                    format!("could not read README: {e}"),
                ))
            }
        };

        let trimmed = contents.trim();
        let lower = trimmed.to_lowercase();

        let mut score = BASE_POINTS;
        let mut missing = Vec::new();

        if trimmed.len() >= MIN_SUBSTANTIAL_LENGTH {
            score += LENGTH_POINTS;
        } else {
            missing.push("substantial length");
        }

        let has_title = trimmed
            .lines()
            .any(|line| line.trim_start().starts_with("# "));
        if has_title {
            score += TITLE_POINTS;
        } else {
            missing.push("a title heading");
        }

        let has_description = trimmed
            .lines()
            .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
            .any(|l| l.trim().len() > 20);
        if has_description {
            score += DESCRIPTION_POINTS;
        } else {
            missing.push("a descriptive paragraph");
        }

        if INSTALL_MARKERS.iter().any(|marker| lower.contains(marker)) {
            score += INSTALL_POINTS;
        } else {
            missing.push("installation instructions");
        }

        if USAGE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            score += USAGE_POINTS;
        } else {
            missing.push("usage instructions");
        }

        if trimmed.contains("![") || trimmed.contains("shields.io") || trimmed.contains("badge") {
            score += BADGES_POINTS;
        }

        if LICENSE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            score += LICENSE_POINTS;
        }

        let mut outcome = CheckOutcome::healthy(MAX_SCORE).with_score(score.min(MAX_SCORE));
        if !missing.is_empty() {
            outcome = outcome.with_issue(Issue::new(
                "incomplete_readme",
                Severity::Low,
                format!("README is missing: {}", missing.join(", ")),
            ).with_suggestion("cover a title, description, installation, and usage in the README"));
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::test_support::*;
    use tempfile::tempdir;

    #[test]
    fn missing_readme_scores_zero() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::new("readme-check", None, ok(""));
        let context = fixture.ctx("readme-check", dir.path());
        let outcome = ReadmeCheckChecker.check(&context);
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.issues[0].issue_type, "missing_readme");
    }

    #[test]
    fn thorough_readme_scores_full_marks() {
        let dir = tempdir().unwrap();
        let mut body = String::from("# Widgets\n\n![build](https://shields.io/badge)\n\n");
        body.push_str("A complete tool for making configurable widgets of many shapes and sizes.\n\n");
        body.push_str("## Installation\n\ncargo install widgets\n\n## Usage\n\nwidgets run --help\n\n");
        body.push_str("## License\n\nMIT\n\n");
        body.push_str(&"Extra documentation padding to cross the length bar. ".repeat(15));
        std::fs::write(dir.path().join("README.md"), body).unwrap();
        let fixture = Fixture::new("readme-check", None, ok(""));
        let context = fixture.ctx("readme-check", dir.path());
        let outcome = ReadmeCheckChecker.check(&context);
        assert_eq!(outcome.score, outcome.max_score);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn readme_is_found_regardless_of_casing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ReadMe.TXT"), "widgets").unwrap();
        let fixture = Fixture::new("readme-check", None, ok(""));
        let context = fixture.ctx("readme-check", dir.path());
        let outcome = ReadmeCheckChecker.check(&context);
        assert_eq!(outcome.score, BASE_POINTS);
    }

    #[test]
    fn bare_readme_scores_only_base_points() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "widgets").unwrap();
        let fixture = Fixture::new("readme-check", None, ok(""));
        let context = fixture.ctx("readme-check", dir.path());
        let outcome = ReadmeCheckChecker.check(&context);
        assert_eq!(outcome.score, BASE_POINTS);
        assert_eq!(outcome.issues[0].issue_type, "incomplete_readme");
    }
}
