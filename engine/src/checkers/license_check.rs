//! `license-check` checker (spec §4.4) — verifies a license file exists
//! at the repository root and attempts to identify its license family.
//!
//! File discovery is a case-insensitive `LICENSE*`/`COPYING*` glob via
//! [`crate::platform::FileSystem::list_files`] rather than an enumerated
//! list of casings, the same glob-matching precedent `ci_config.rs` uses
//! for workflow files.

use std::path::PathBuf;

use crate::checkers::{CheckContext, CheckOutcome, Checker};
use crate::types::{Issue, Severity, Warning};

const MAX_SCORE: u32 = 100;

/// Find the repository root's license file: every `LICENSE*` match,
/// falling back to `COPYING*`, sorted for a deterministic pick among
/// multiple candidates (e.g. `LICENSE` and `LICENSE-MIT` both present).
fn find_license_file(ctx: &CheckContext) -> Option<PathBuf> {
    let mut matches = ctx.fs.list_files(ctx.repo_path, "LICENSE*");
    if matches.is_empty() {
        matches = ctx.fs.list_files(ctx.repo_path, "COPYING*");
    }
    matches.sort();
    matches.into_iter().next()
}

pub struct LicenseCheckChecker;

impl Checker for LicenseCheckChecker {
    fn id(&self) -> &'static str {
        "license-check"
    }

    fn name(&self) -> &'static str {
        "license-check"
    }

    fn category(&self) -> &'static str {
        "documentation"
    }

    fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(path) = find_license_file(ctx) else {
            return CheckOutcome::healthy(MAX_SCORE).with_score(0).with_issue(
                Issue::new(
                    "missing_license",
                    Severity::High,
                    "no LICENSE file found at the repository root",
                )
                .with_suggestion("add a LICENSE file declaring the project's license"),
            );
        };

        let contents = match ctx.fs.read_file(&path) {
            Ok(c) => c,
            Err(e) => {
                return CheckOutcome::healthy(MAX_SCORE)
                    .with_warning(Warning::new("tool_error", format!("could not read license file: {e}")))
            }
        };

        if contents.trim().is_empty() {
            return CheckOutcome::healthy(MAX_SCORE).with_score(50).with_issue(Issue::new(
                "empty_license_file",
                Severity::Medium,
                "LICENSE file exists but is empty",
            ));
        }

        match detect_license_type(&contents) {
            Some(license_type) => {
                CheckOutcome::healthy(MAX_SCORE).with_metadata("license_type", serde_json::json!(license_type))
            }
            None => CheckOutcome::healthy(MAX_SCORE)
                .with_warning(Warning::new(
                    "unrecognized_license_type",
                    "LICENSE file present but its license family could not be identified",
                ))
                .with_metadata("license_type", serde_json::json!("unknown")),
        }
    }
}

/// Identify the license family from well-known boilerplate phrases.
/// Best-effort; an unmatched file is not an error, just unclassified.
fn detect_license_type(contents: &str) -> Option<&'static str> {
    let lower = contents.to_lowercase();
    if lower.contains("mit license") || lower.contains("permission is hereby granted, free of charge") {
        Some("MIT")
    } else if lower.contains("apache license") {
        Some("Apache-2.0")
    } else if lower.contains("gnu general public license") {
        Some("GPL")
    } else if lower.contains("gnu lesser general public license") {
        Some("LGPL")
    } else if lower.contains("mozilla public license") {
        Some("MPL-2.0")
    } else if lower.contains("bsd") {
        Some("BSD")
    } else {
        None
    }
}
