//! Orchestration engine (§4.7) — drives the checker/analyzer registries
//! across a repository set with bounded parallelism, per-checker
//! timeouts, cancellation, and deterministic aggregation.
//!
//! Grounded on the teacher's `engine::CheckEngine::check` pipeline
//! (discover → cache partition → `rayon::par_iter` fan-out → sequential
//! aggregation → sort → summarize), generalized from per-file/project
//! units to per-repository/per-checker units, and on its
//! `catch_unwind(AssertUnwindSafe(...))` recovery wrapper, generalized to
//! race against a timeout as well as a panic (the teacher had no
//! per-checker timeout). The outer repository pool and the optional inner
//! checker pool are both dedicated `rayon::ThreadPool`s, exactly the
//! primitive the teacher already depends on for its own file-level
//! fan-out.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, warn};

use crate::analyzer_registry::AnalyzerRegistry;
use crate::checker_registry::CheckerRegistry;
use crate::checkers::{CheckContext, CheckOutcome, Checker};
use crate::config::Config;
use crate::platform::{Cache, CommandExecutor, ExecContext, FileSystem, InMemoryCache, RealCommandExecutor, RealFileSystem};
use crate::types::{CheckResult, EngineReport, Issue, Repository, RepositoryReport, Severity, Status};

/// Run-scoped cancellation flag. Held by the caller; dropping/forgetting
/// it has no effect — cancellation is a one-way flip via [`RunHandle::cancel`].
#[derive(Clone, Default)]
pub struct RunHandle {
    canceled: Arc<AtomicBool>,
}

impl RunHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// The orchestration engine (spec §4.7). Owns the checker/analyzer
/// registries and the platform shims; holds no repository-specific
/// state between `execute` calls.
pub struct Engine {
    checkers: CheckerRegistry,
    analyzers: AnalyzerRegistry,
    fs: Arc<dyn FileSystem>,
    executor: Arc<dyn CommandExecutor>,
    cache: Option<Arc<dyn Cache>>,
    github_token: Option<String>,
}

impl Engine {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            checkers: CheckerRegistry::with_builtins(),
            analyzers: AnalyzerRegistry::with_builtins(),
            fs: Arc::new(RealFileSystem),
            executor: Arc::new(RealCommandExecutor),
            cache: if config.engine.cache_enabled {
                Some(Arc::new(InMemoryCache::new()))
            } else {
                None
            },
            github_token: std::env::var("GITHUB_TOKEN").ok(),
        }
    }

    /// Construct an engine over injected platform shims, for tests that
    /// need a fake [`FileSystem`]/[`CommandExecutor`].
    #[must_use]
    pub fn with_shims(
        config: &Config,
        fs: Arc<dyn FileSystem>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            checkers: CheckerRegistry::with_builtins(),
            analyzers: AnalyzerRegistry::with_builtins(),
            fs,
            executor,
            cache: if config.engine.cache_enabled {
                Some(Arc::new(InMemoryCache::new()))
            } else {
                None
            },
            github_token: std::env::var("GITHUB_TOKEN").ok(),
        }
    }

    #[must_use]
    pub fn checkers(&self) -> &CheckerRegistry {
        &self.checkers
    }

    #[must_use]
    pub fn analyzers(&self) -> &AnalyzerRegistry {
        &self.analyzers
    }

    /// Run every applicable, enabled checker over every repository (spec
    /// §4.7 `execute`). `category_filter` has already been folded into
    /// `config` by the caller (spec §4.6 stage 3) before this is called.
    #[must_use]
    pub fn execute(&self, config: &Config, repositories: &[Repository], handle: &RunHandle) -> EngineReport {
        let start = Instant::now();

        if handle.is_canceled() {
            return EngineReport {
                repository_reports: Vec::new(),
                total_duration: start.elapsed(),
                aggregate_counters: std::collections::HashMap::new(),
            };
        }

        let deadline = config.engine.timeout.map(|t| start + t);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.engine.max_concurrency.max(1))
            .build()
            .expect("repository thread pool");

        let mut reports: Vec<RepositoryReport> = pool.install(|| {
            use rayon::prelude::*;
            repositories
                .par_iter()
                .map(|repository| self.run_repository(config, repository, deadline, handle))
                .collect()
        });

        reports.sort_by(|a, b| a.repository.cmp(&b.repository));
        for report in &mut reports {
            report.checks.sort_by(|a, b| a.id.cmp(&b.id));
        }

        let mut aggregate_counters = std::collections::HashMap::new();
        aggregate_counters.insert("repositories".to_owned(), reports.len() as u64);
        aggregate_counters.insert(
            "healthy".to_owned(),
            reports.iter().filter(|r| r.overall_status == Status::Healthy).count() as u64,
        );
        aggregate_counters.insert(
            "warning".to_owned(),
            reports.iter().filter(|r| r.overall_status == Status::Warning).count() as u64,
        );
        aggregate_counters.insert(
            "critical".to_owned(),
            reports.iter().filter(|r| r.overall_status == Status::Critical).count() as u64,
        );
        let total_checks: u64 = reports.iter().map(|r| r.checks.len() as u64).sum();
        aggregate_counters.insert("total_checks".to_owned(), total_checks);

        EngineReport {
            repository_reports: reports,
            total_duration: start.elapsed(),
            aggregate_counters,
        }
    }

    fn run_repository(
        &self,
        config: &Config,
        repository: &Repository,
        deadline: Option<Instant>,
        handle: &RunHandle,
    ) -> RepositoryReport {
        let resolved = repository.resolved_path();
        let repo_path = Path::new(&resolved);

        if !self.fs.is_dir(repo_path) {
            let applicable: Vec<&dyn Checker> = self.checkers.enabled(config);
            let expected: Vec<(&str, &str, &str, u32)> = applicable
                .iter()
                .map(|c| (c.id(), c.name(), c.category(), DEFAULT_MAX_SCORE))
                .collect();
            return RepositoryReport::missing(&repository.name, &expected, Utc::now());
        }

        let applicable: Vec<&dyn Checker> = self
            .checkers
            .enabled(config)
            .into_iter()
            .filter(|c| c.supports_repository(repository))
            .collect();

        let inner_parallel = applicable.iter().any(|c| {
            config
                .checker(c.id())
                .map(|cfg| cfg.options.get("innerParallel").and_then(|v| v.as_bool()).unwrap_or(false))
                .unwrap_or(false)
        });

        let checks: Vec<CheckResult> = if inner_parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(applicable.len().max(1))
                .build()
                .expect("inner checker thread pool");
            pool.install(|| {
                use rayon::prelude::*;
                applicable
                    .par_iter()
                    .map(|checker| self.run_one_checker(config, repository, repo_path, *checker, deadline, handle))
                    .collect()
            })
        } else {
            applicable
                .iter()
                .map(|checker| self.run_one_checker(config, repository, repo_path, *checker, deadline, handle))
                .collect()
        };

        RepositoryReport::from_checks(repository.name.clone(), checks)
    }

    /// Run a single checker through the recovery boundary (spec §4.7 step
    /// 3): a panic or a timeout both synthesize a critical
    /// [`CheckResult`] instead of propagating, and the cache is consulted
    /// first when enabled.
    #[allow(clippy::too_many_arguments)]
    fn run_one_checker(
        &self,
        config: &Config,
        repository: &Repository,
        repo_path: &Path,
        checker: &dyn Checker,
        deadline: Option<Instant>,
        handle: &RunHandle,
    ) -> CheckResult {
        let started = Instant::now();
        let checker_config = config
            .checker(checker.id())
            .expect("enabled() only returns checkers with a config entry");

        let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
        let timeout = match remaining {
            Some(remaining) => remaining.min(checker_config.timeout),
            None => checker_config.timeout,
        };

        if handle.is_canceled() || timeout.is_zero() {
            return synthesize(checker, repository, Duration::ZERO, "canceled", Severity::Critical);
        }

        let cache_key = self
            .cache
            .as_ref()
            .map(|_| format!("{}:{}:{}", repo_path.display(), checker.id(), config.config_hash()));

        if let (Some(cache), Some(key)) = (self.cache.as_ref(), cache_key.as_deref()) {
            if let Some(cached) = cache.get(key) {
                if let Ok(mut result) = serde_json::from_str::<CheckResult>(&cached) {
                    result.duration = started.elapsed();
                    result.timestamp = Utc::now();
                    debug!("cache hit for {}:{}", repository.name, checker.id());
                    return result;
                }
            }
        }

        let outcome = run_with_timeout(self, config, repository, repo_path, checker, timeout, handle);

        let mut result = match outcome {
            Ok(outcome) => assemble(checker, repository, outcome, started.elapsed()),
            Err(Failure::Timeout) => synthesize(checker, repository, started.elapsed(), "checker-timeout", Severity::Critical),
            Err(Failure::Panic(reason)) => {
                warn!("checker {} panicked on {}: {reason}", checker.id(), repository.name);
                synthesize(checker, repository, started.elapsed(), &reason, Severity::Critical)
            }
        };
        result.finalize_status();

        if let (Some(cache), Some(key)) = (self.cache.as_ref(), cache_key.as_deref()) {
            if let Ok(serialized) = serde_json::to_string(&result) {
                cache.set(key, serialized, config.engine.cache_ttl);
            }
        }

        result
    }
}

enum Failure {
    Timeout,
    Panic(String),
}

/// Race a checker invocation against `timeout` on a detached worker
/// thread (spec §4.7's `[ADDED]` note: a bounded `mpsc` channel stands in
/// for cooperative preemption, since a running native thread cannot be
/// safely killed). An abandoned worker holds no repository-mutating
/// state (spec §5's shared-resource policy), so leaking it on timeout is
/// safe.
fn run_with_timeout(
    engine: &Engine,
    config: &Config,
    repository: &Repository,
    repo_path: &Path,
    checker: &dyn Checker,
    timeout: Duration,
    handle: &RunHandle,
) -> Result<CheckOutcome, Failure> {
    let (tx, rx) = mpsc::channel();

    let checker_config = config.checker(checker.id()).expect("checked by caller").clone();
    let analyzer_thresholds = config.analyzer_thresholds.clone();
    let fs = Arc::clone(&engine.fs);
    let executor = Arc::clone(&engine.executor);
    let repository = repository.clone();
    let repo_path = repo_path.to_path_buf();
    let github_token = engine.github_token.clone();
    let exec_ctx = ExecContext {
        timeout,
        canceled: Arc::clone(&handle.canceled),
    };

    // Checkers and analyzer registries are built fresh per thread here
    // because `Checker`/`Analyzer` trait objects are not `'static`-owned
    // by this function; re-registering the builtins is cheap (zero-sized
    // structs) and keeps this worker thread fully independent of the
    // calling thread's borrowed `CheckContext`.
    let checker_id = checker.id().to_owned();

    std::thread::spawn(move || {
        let analyzers = AnalyzerRegistry::with_builtins();
        let registry = CheckerRegistry::with_builtins();
        let Some(checker) = registry.get(&checker_id) else {
            let _ = tx.send(Err(Failure::Panic("unknown checker id".to_owned())));
            return;
        };
        let context = CheckContext {
            repository: &repository,
            repo_path: &repo_path,
            fs: fs.as_ref(),
            executor: executor.as_ref(),
            cache: None,
            exec: exec_ctx,
            config: &checker_config,
            analyzers: &analyzers,
            analyzer_thresholds: &analyzer_thresholds,
            github_token: github_token.as_deref(),
        };
        let result = catch_unwind(AssertUnwindSafe(|| checker.check(&context)));
        let message = match result {
            Ok(outcome) => Ok(outcome),
            Err(payload) => Err(Failure::Panic(panic_message(&payload))),
        };
        let _ = tx.send(message);
    });

    match rx.recv_timeout(timeout + Duration::from_millis(50)) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(Failure::Timeout),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(Failure::Panic("checker worker thread vanished".to_owned())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Wrap a checker's raw [`CheckOutcome`] into a full [`CheckResult`],
/// filling `id`/`name`/`category`/`repository`/`duration`/`timestamp` —
/// fields spec §4.4 item 2 says the framework, never the checker, owns.
fn assemble(checker: &dyn Checker, repository: &Repository, outcome: CheckOutcome, duration: Duration) -> CheckResult {
    CheckResult {
        id: checker.id().to_owned(),
        name: checker.name().to_owned(),
        category: checker.category().to_owned(),
        repository: repository.name.clone(),
        status: Status::Unknown,
        score: outcome.score,
        max_score: outcome.max_score,
        issues: outcome.issues,
        warnings: outcome.warnings,
        metrics: outcome.metrics,
        metadata: outcome.metadata,
        duration,
        timestamp: Utc::now(),
    }
}

/// Synthesize a critical [`CheckResult`] for timeout/panic/cancellation,
/// per spec invariant 3 and §7's error taxonomy.
fn synthesize(checker: &dyn Checker, repository: &Repository, duration: Duration, reason: &str, severity: Severity) -> CheckResult {
    let mut result = CheckResult {
        id: checker.id().to_owned(),
        name: checker.name().to_owned(),
        category: checker.category().to_owned(),
        repository: repository.name.clone(),
        status: Status::Unknown,
        score: 0,
        max_score: DEFAULT_MAX_SCORE,
        issues: vec![Issue::new("execution_error", severity, format!("checker failed: {reason}"))
            .with_context("kind", serde_json::json!(reason))],
        warnings: Vec::new(),
        metrics: std::collections::HashMap::new(),
        metadata: std::collections::HashMap::new(),
        duration,
        timestamp: Utc::now(),
    };
    result.finalize_status();
    result
}

/// Every built-in checker scores out of 100 (see each checker's
/// `MAX_SCORE` constant); used to build synthetic results for checkers
/// that never ran (missing repository, timeout, panic).
const DEFAULT_MAX_SCORE: u32 = 100;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;
    use std::fs;
    use tempfile::tempdir;

    fn repo(name: &str, path: Option<String>) -> Repository {
        Repository {
            name: name.to_owned(),
            url: format!("https://example.com/{name}.git"),
            branch: None,
            path,
            tags: vec![],
            language: Some(Language::Go),
        }
    }

    #[test]
    fn missing_repository_path_yields_all_critical_checks() {
        let config = Config::defaults();
        let engine = Engine::new(&config);
        let handle = RunHandle::new();
        let repository = repo("r1", Some("/nonexistent/path/xyz".to_owned()));
        let report = engine.execute(&config, std::slice::from_ref(&repository), &handle);
        assert_eq!(report.repository_reports.len(), 1);
        assert_eq!(report.repository_reports[0].overall_status, Status::Critical);
        assert!(report.repository_reports[0].checks.iter().all(|c| c.status == Status::Critical));
    }

    #[test]
    fn canceled_before_start_yields_empty_report() {
        let config = Config::defaults();
        let engine = Engine::new(&config);
        let handle = RunHandle::new();
        handle.cancel();
        let repository = repo("r1", Some("/tmp".to_owned()));
        let report = engine.execute(&config, std::slice::from_ref(&repository), &handle);
        assert!(report.repository_reports.is_empty());
    }

    #[test]
    fn valid_repository_produces_one_result_per_enabled_checker() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("LICENSE"), "MIT License").unwrap();
        fs::write(dir.path().join("README.md"), "# r\n\n## Installation\n\ngo get\n\n## Usage\n\nrun it\n").unwrap();

        let mut config = Config::defaults();
        config.apply_category_filter(&["documentation".to_owned()]);
        let engine = Engine::new(&config);
        let handle = RunHandle::new();
        let repository = repo("r1", Some(dir.path().display().to_string()));
        let report = engine.execute(&config, std::slice::from_ref(&repository), &handle);

        let enabled_count = CheckerRegistry::with_builtins().enabled(&config).len();
        assert_eq!(report.repository_reports[0].checks.len(), enabled_count);
    }

    #[test]
    fn reports_are_sorted_by_repository_then_checker_id() {
        let config = Config::defaults();
        let engine = Engine::new(&config);
        let handle = RunHandle::new();
        let repos = vec![repo("zeta", Some("/nonexistent/a".to_owned())), repo("alpha", Some("/nonexistent/b".to_owned()))];
        let report = engine.execute(&config, &repos, &handle);
        assert_eq!(report.repository_reports[0].repository, "alpha");
        assert_eq!(report.repository_reports[1].repository, "zeta");
        let ids: Vec<&str> = report.repository_reports[0].checks.iter().map(|c| c.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn zero_source_repository_complexity_check_is_healthy() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "readme").unwrap();
        let mut config = Config::defaults();
        config.apply_category_filter(&["quality".to_owned()]);
        let engine = Engine::new(&config);
        let handle = RunHandle::new();
        let repository = repo("r1", Some(dir.path().display().to_string()));
        let report = engine.execute(&config, std::slice::from_ref(&repository), &handle);
        let complexity = report.repository_reports[0]
            .checks
            .iter()
            .find(|c| c.id == "cyclomatic-complexity")
            .unwrap();
        assert_eq!(complexity.status, Status::Healthy);
        assert_eq!(complexity.score, complexity.max_score);
    }
}
