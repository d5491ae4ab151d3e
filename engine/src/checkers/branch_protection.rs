//! `branch-protection` checker (spec §4.4) — best-effort query of the
//! forge's REST API for branch protection rules. Network failure never
//! escalates to critical; it degrades to a `scanner_not_available`-style
//! warning instead (spec §4.4's failure semantics, "never critical solely
//! on network failure").
//!
//! The HTTP call itself (`probe`) is a thin, untested I/O edge; the
//! scoring decision (`evaluate`) is a pure function over a [`ProbeResult`]
//! so it can be unit-tested without a network round-trip, the same split
//! the teacher's `config.rs` uses between `CheckConfig::load_from_project`
//! (I/O) and `apply_toml_section` (pure merge).

use crate::checkers::{CheckContext, CheckOutcome, Checker};
use crate::types::{Issue, Severity, Warning};

const MAX_SCORE: u32 = 100;
const DEFAULT_BRANCH: &str = "main";

/// Outcome of probing the forge's branch-protection endpoint.
enum ProbeResult {
    Protected,
    Unprotected,
    Unauthorized,
    NetworkError(String),
    NoToken,
    UrlUnsupported,
}

pub struct BranchProtectionChecker;

impl Checker for BranchProtectionChecker {
    fn id(&self) -> &'static str {
        "branch-protection"
    }

    fn name(&self) -> &'static str {
        "branch-protection"
    }

    fn category(&self) -> &'static str {
        "security"
    }

    fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        let branch = ctx.repository.branch.as_deref().unwrap_or(DEFAULT_BRANCH);
        let result = probe(&ctx.repository.url, branch, ctx.github_token);
        evaluate(result)
    }
}

fn evaluate(result: ProbeResult) -> CheckOutcome {
    match result {
        ProbeResult::Protected => CheckOutcome::healthy(MAX_SCORE),
        ProbeResult::Unprotected => CheckOutcome::healthy(MAX_SCORE).with_score(40).with_issue(
            Issue::new(
                "branch_protection_missing",
                Severity::Medium,
                "default branch has no protection rules configured",
            )
            .with_suggestion("enable required reviews and status checks on the default branch"),
        ),
        ProbeResult::NoToken => CheckOutcome::healthy(MAX_SCORE).with_warning(Warning::new(
            "execution_error",
            "GITHUB_TOKEN not set; branch protection could not be queried",
        )),
        ProbeResult::UrlUnsupported => CheckOutcome::healthy(MAX_SCORE).with_warning(Warning::new(
            "execution_error",
            "repository URL is not a recognized forge host; branch protection skipped",
        )),
        ProbeResult::Unauthorized => CheckOutcome::healthy(MAX_SCORE).with_warning(Warning::new(
            "execution_error",
            "forge API rejected the credential (401/403); branch protection skipped",
        )),
        ProbeResult::NetworkError(reason) => CheckOutcome::healthy(MAX_SCORE)
            .with_warning(Warning::new("execution_error", format!("forge API call failed: {reason}"))),
    }
}

/// Query `GET /repos/{owner}/{repo}/branches/{branch}/protection`. Any
/// transport or auth failure becomes a [`ProbeResult`] variant rather
/// than propagating an error — this function never panics the caller.
fn probe(repo_url: &str, branch: &str, token: Option<&str>) -> ProbeResult {
    let Some((owner, name)) = parse_github_owner_repo(repo_url) else {
        return ProbeResult::UrlUnsupported;
    };
    let Some(token) = token else {
        return ProbeResult::NoToken;
    };

    let url = format!("https://api.github.com/repos/{owner}/{name}/branches/{branch}/protection");
    let client = match reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
    {
        Ok(c) => c,
        Err(e) => return ProbeResult::NetworkError(e.to_string()),
    };

    match client
        .get(&url)
        .bearer_auth(token)
        .header("User-Agent", "repohealth-engine")
        .send()
    {
        Ok(response) => match response.status().as_u16() {
            200 => ProbeResult::Protected,
            404 => ProbeResult::Unprotected,
            401 | 403 => ProbeResult::Unauthorized,
            other => ProbeResult::NetworkError(format!("unexpected status {other}")),
        },
        Err(e) => ProbeResult::NetworkError(e.to_string()),
    }
}

/// Parse `owner/repo` out of an SSH (`git@host:owner/repo.git`) or HTTPS
/// (`https://host/owner/repo[.git]`) clone URL. Returns `None` for hosts
/// or shapes this checker does not recognize.
fn parse_github_owner_repo(url: &str) -> Option<(String, String)> {
    let trimmed = url.trim_end_matches(".git");
    let path = if let Some(rest) = trimmed.strip_prefix("git@") {
        rest.split_once(':').map(|(_, p)| p)?
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        rest.split_once('/').map(|(_, p)| p)?
    } else {
        return None;
    };
    let mut parts = path.splitn(2, '/');
    let owner = parts.next()?;
    let name = parts.next()?;
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some((owner.to_owned(), name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ssh_url() {
        let (owner, name) = parse_github_owner_repo("git@github.com:acme/widgets.git").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(name, "widgets");
    }

    #[test]
    fn parses_https_url() {
        let (owner, name) = parse_github_owner_repo("https://github.com/acme/widgets").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(name, "widgets");
    }

    #[test]
    fn rejects_unsupported_url() {
        assert!(parse_github_owner_repo("ftp://example.com/x").is_none());
    }

    #[test]
    fn protected_is_healthy() {
        let outcome = evaluate(ProbeResult::Protected);
        assert_eq!(outcome.score, outcome.max_score);
    }

    #[test]
    fn unprotected_is_a_medium_issue_not_critical() {
        let outcome = evaluate(ProbeResult::Unprotected);
        assert_eq!(outcome.issues[0].severity, Severity::Medium);
    }

    #[test]
    fn network_error_is_a_warning_never_critical() {
        let outcome = evaluate(ProbeResult::NetworkError("timed out".to_owned()));
        assert!(outcome.issues.is_empty());
        assert!(!outcome.warnings.is_empty());
        assert_eq!(outcome.score, outcome.max_score);
    }

    #[test]
    fn missing_token_degrades_to_warning() {
        let outcome = evaluate(ProbeResult::NoToken);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.warnings[0].warning_type, "execution_error");
    }
}
