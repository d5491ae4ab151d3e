//! PR opener (§4.9, the `pr` subcommand) — in each repository with local
//! changes, creates a branch, commits, pushes, and opens a pull request
//! against the forge's REST API.
//!
//! Grounded on the teacher's `discovery::get_changed_files` shell-out
//! pattern for the git plumbing, and on `reqwest::blocking` (present in
//! the wider example pack, e.g. `5dlabs-cto/mcp`) for the forge POST —
//! kept blocking rather than async, consistent with §5's plain
//! OS-thread concurrency model.

use std::path::Path;
use std::process::Command;

use crate::types::Repository;

/// Outcome of attempting to open a pull request for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrOutcome {
    Opened { url: String },
    /// No local changes to commit — treated as a soft skip (spec §4.9).
    NoChanges,
}

#[derive(Debug, thiserror::Error)]
pub enum PrOpenError {
    #[error("repository '{0}' has no local path to open a PR from")]
    RepositoryMissing(String),
    #[error("git command failed: {0}")]
    GitFailed(String),
    #[error("repository URL is not a recognized forge host")]
    UrlUnsupported,
    #[error("no credential available: set GITHUB_TOKEN or pass --token")]
    NoCredential,
    #[error("forge API request failed: {0}")]
    ApiError(String),
}

/// Create `branch`, commit all changes with `commit_message`, push, and
/// open a pull request titled `title` against `base_branch` (or the
/// repository's configured branch, or `main`).
///
/// # Errors
///
/// See [`PrOpenError`] for every failure mode. "No local changes" is not
/// an error — it returns `Ok(PrOutcome::NoChanges)`.
pub fn open_pull_request(
    repository: &Repository,
    branch: &str,
    commit_message: &str,
    title: &str,
    token: Option<&str>,
) -> Result<PrOutcome, PrOpenError> {
    let resolved = repository.resolved_path();
    let repo_path = Path::new(&resolved);
    if !repo_path.is_dir() {
        return Err(PrOpenError::RepositoryMissing(repository.name.clone()));
    }

    if !has_local_changes(repo_path)? {
        return Ok(PrOutcome::NoChanges);
    }

    run_git(repo_path, &["checkout", "-b", branch])?;
    run_git(repo_path, &["add", "-A"])?;
    run_git(repo_path, &["commit", "-m", commit_message])?;
    run_git(repo_path, &["push", "-u", "origin", branch])?;

    let (owner, name) = parse_github_owner_repo(&repository.url).ok_or(PrOpenError::UrlUnsupported)?;
    let token = token.ok_or(PrOpenError::NoCredential)?;
    let base_branch = repository.branch.as_deref().unwrap_or("main");

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .map_err(|e| PrOpenError::ApiError(e.to_string()))?;

    let response = client
        .post(format!("https://api.github.com/repos/{owner}/{name}/pulls"))
        .bearer_auth(token)
        .header("User-Agent", "repohealth-engine")
        .json(&serde_json::json!({
            "title": title,
            "head": branch,
            "base": base_branch,
        }))
        .send()
        .map_err(|e| PrOpenError::ApiError(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PrOpenError::ApiError(format!("forge returned status {}", response.status())));
    }

    let body: serde_json::Value = response.json().map_err(|e| PrOpenError::ApiError(e.to_string()))?;
    let url = body
        .get("html_url")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned();

    Ok(PrOutcome::Opened { url })
}

fn has_local_changes(repo_path: &Path) -> Result<bool, PrOpenError> {
    let output = Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(repo_path)
        .output()
        .map_err(|e| PrOpenError::GitFailed(e.to_string()))?;
    Ok(!output.stdout.is_empty())
}

fn run_git(repo_path: &Path, args: &[&str]) -> Result<(), PrOpenError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .map_err(|e| PrOpenError::GitFailed(e.to_string()))?;
    if !output.status.success() {
        return Err(PrOpenError::GitFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
    }
    Ok(())
}

/// Parse `owner/repo` out of an SSH or HTTPS clone URL, same logic as
/// [`crate::checkers::branch_protection`]'s parser, duplicated here since
/// the two live in separate, independently-testable modules (checker
/// logic vs. collaborator logic) per §9's layering guidance.
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
