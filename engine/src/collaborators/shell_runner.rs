//! Shell command runner (§4.9, the `run` subcommand) — executes an
//! arbitrary shell expression in each repository's directory, streaming
//! output with a per-line `<repo-name> | ` prefix and tee'ing into a
//! per-repository log file.
//!
//! Grounded on the teacher's `discovery::get_changed_files` shell-out
//! pattern (`Command::new(...).output()`), generalized from a fixed `git`
//! invocation to an arbitrary command string run through the host shell.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::Repository;

/// Outcome of running a command in one repository's directory.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub repository: String,
    pub exit_code: Option<i32>,
    pub log_path: PathBuf,
}

/// Run `command` (a shell expression, e.g. `"git pull && make test"`) via
/// `sh -c` in each repository's resolved local path, prefixing every
/// stdout/stderr line with `<repo-name> | ` and writing the combined,
/// unprefixed output to `<log_dir>/<repo>_<timestamp>.log` (spec §6's
/// "Persisted state" contract). Repositories whose local path does not
/// exist are skipped with a `None` exit code rather than aborting the
/// batch.
#[must_use]
pub fn run_in_repositories(
    repositories: &[Repository],
    command: &str,
    log_dir: &Path,
    timestamp: &str,
) -> Vec<RunOutcome> {
    let mut outcomes = Vec::with_capacity(repositories.len());
    for repository in repositories {
        outcomes.push(run_in_one(repository, command, log_dir, timestamp));
    }
    outcomes
}

fn run_in_one(repository: &Repository, command: &str, log_dir: &Path, timestamp: &str) -> RunOutcome {
    let log_path = log_dir.join(format!("{}_{timestamp}.log", repository.name));
    let resolved = repository.resolved_path();
    let repo_path = Path::new(&resolved);

    if !repo_path.is_dir() {
        return RunOutcome {
            repository: repository.name.clone(),
            exit_code: None,
            log_path,
        };
    }

    let output = Command::new("sh").arg("-c").arg(command).current_dir(repo_path).output();

    let Ok(output) = output else {
        return RunOutcome {
            repository: repository.name.clone(),
            exit_code: None,
            log_path,
        };
    };

    print_prefixed(&repository.name, &output.stdout);
    print_prefixed(&repository.name, &output.stderr);

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(mut file) = std::fs::File::create(&log_path) {
        let _ = file.write_all(&output.stdout);
        let _ = file.write_all(&output.stderr);
    }

    RunOutcome {
        repository: repository.name.clone(),
        exit_code: output.status.code(),
        log_path,
    }
}

fn print_prefixed(repo_name: &str, bytes: &[u8]) {
    for line in String::from_utf8_lossy(bytes).lines() {
        println!("{repo_name} | {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn repo(name: &str, path: &Path) -> Repository {
        Repository {
            name: name.to_owned(),
            url: format!("https://example.com/{name}.git"),
            branch: None,
            path: Some(path.display().to_string()),
            tags: vec![],
            language: None,
        }
    }

    #[test]
    fn missing_repository_directory_is_skipped_not_an_error() {
        let log_dir = tempdir().unwrap();
        let repository = repo("r1", Path::new("/nonexistent/xyz"));
        let outcomes = run_in_repositories(&[repository], "echo hi", log_dir.path(), "20260101T000000Z");
        assert_eq!(outcomes[0].exit_code, None);
    }

    #[test]
    fn successful_command_writes_a_log_file() {
        let repo_dir = tempdir().unwrap();
        let log_dir = tempdir().unwrap();
        let repository = repo("r1", repo_dir.path());
        let outcomes = run_in_repositories(&[repository], "echo hello", log_dir.path(), "20260101T000000Z");
        assert_eq!(outcomes[0].exit_code, Some(0));
        assert!(outcomes[0].log_path.is_file());
        let contents = std::fs::read_to_string(&outcomes[0].log_path).unwrap();
        assert!(contents.contains("hello"));
    }

    #[test]
    fn nonzero_exit_is_captured() {
        let repo_dir = tempdir().unwrap();
        let log_dir = tempdir().unwrap();
        let repository = repo("r1", repo_dir.path());
        let outcomes = run_in_repositories(&[repository], "exit 3", log_dir.path(), "20260101T000000Z");
        assert_eq!(outcomes[0].exit_code, Some(3));
    }
}
