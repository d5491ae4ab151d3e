//! Core data model for the health orchestration engine.
//!
//! These types form the contract between every component in the engine:
//!
//! - [`Repository`] is the unit of work discovered from the inventory.
//! - [`Severity`] drives status escalation for a single [`Issue`].
//! - [`Status`] is the monotonic per-check and per-repository health state.
//! - [`CheckResult`] is the atomic unit of checker output.
//! - [`FunctionComplexity`]/[`ComplexityResult`] are analyzer output.
//! - [`RepositoryReport`]/[`EngineReport`] are the aggregate results.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered severity level. Ordering is ascending — `Low < Medium < High <
/// Critical` — so that `Iterator::max` over a result set's issues picks
/// the most severe one directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Monotonic health status. Ordering is ascending in the sense that
/// merging two statuses is `max()` — `Unknown` is the floor, `Critical`
/// and `Warning` are the two terminal states an aggregation can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Unknown,
    Healthy,
    Warning,
    Critical,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Healthy => write!(f, "healthy"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl Status {
    /// Escalate this status to account for one more observed issue severity.
    ///
    /// A `high`/`critical` issue forces `Critical`; a `medium` issue forces
    /// at least `Warning`; a `low` issue never escalates past `Healthy`.
    #[must_use]
    pub fn escalate_for_issue(self, severity: Severity) -> Self {
        let floor = match severity {
            Severity::Critical | Severity::High => Status::Critical,
            Severity::Medium => Status::Warning,
            Severity::Low => Status::Healthy,
        };
        self.max(floor)
    }

    /// Escalate this status to account for one more observed warning.
    ///
    /// Warnings (non-fatal, not tied to an issue severity) force at least
    /// `Warning`, matching spec invariant 2.
    #[must_use]
    pub fn escalate_for_warning(self) -> Self {
        self.max(Status::Warning)
    }
}

/// Language hint for a repository, or a result of auto-detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Python,
    Java,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Parse a free-form tag or marker-file hint into a [`Language`].
    ///
    /// Case-insensitive; recognizes common aliases (`js`, `ts`, `py`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "go" | "golang" => Some(Self::Go),
            "python" | "py" => Some(Self::Python),
            "java" => Some(Self::Java),
            "javascript" | "js" => Some(Self::JavaScript),
            "typescript" | "ts" => Some(Self::TypeScript),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Go => write!(f, "go"),
            Self::Python => write!(f, "python"),
            Self::Java => write!(f, "java"),
            Self::JavaScript => write!(f, "javascript"),
            Self::TypeScript => write!(f, "typescript"),
        }
    }
}

/// A single repository drawn from the inventory (§4.9/§6).
///
/// Constructed from YAML or autodiscovery; treated as immutable for the
/// duration of a run — no checker or analyzer may mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

impl Repository {
    /// Resolve the local clone path: the explicit `path`, or the URL's
    /// basename with a trailing `.git` stripped, per spec §6.
    #[must_use]
    pub fn resolved_path(&self) -> String {
        if let Some(ref p) = self.path {
            return p.clone();
        }
        let trimmed = self.url.trim_end_matches('/').trim_end_matches(".git");
        trimmed
            .rsplit(['/', ':'])
            .next()
            .unwrap_or(trimmed)
            .to_owned()
    }

    /// Whether this repository carries every tag in `required` (set
    /// membership, used by inventory tag filtering).
    #[must_use]
    pub fn has_all_tags(&self, required: &[String]) -> bool {
        required.iter().all(|t| self.tags.contains(t))
    }
}

/// A location within a file, attached to an [`Issue`] when applicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

/// Evidence of a defect found by a checker. Severity drives status
/// escalation per spec invariant 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

impl Issue {
    #[must_use]
    pub fn new(issue_type: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            issue_type: issue_type.into(),
            severity,
            message: message.into(),
            location: None,
            suggestion: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// A non-fatal observation. Does not carry a severity and never escalates
/// a result past `Warning` (spec invariant 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub warning_type: String,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn new(warning_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            warning_type: warning_type.into(),
            message: message.into(),
        }
    }
}

/// The atomic unit of checker output — one per `(repository, enabled
/// checker)` pair attempted, including on failure (spec invariant 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: String,
    pub name: String,
    pub category: String,
    pub repository: String,
    pub status: Status,
    pub score: u32,
    pub max_score: u32,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub warnings: Vec<Warning>,
    #[serde(default)]
    pub metrics: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
}

impl CheckResult {
    /// Recompute `status` and clamp `score` from the accumulated issues
    /// and warnings, per spec invariant 1/2. Call after mutating `issues`,
    /// `warnings`, or `score`.
    pub fn finalize_status(&mut self) {
        let mut status = Status::Healthy;
        for issue in &self.issues {
            status = status.escalate_for_issue(issue.severity);
        }
        if !self.warnings.is_empty() {
            status = status.escalate_for_warning();
        }
        self.status = status;
        self.score = self.score.min(self.max_score);
    }
}

/// Per-function complexity measurement produced by a [`crate::analyzers::Analyzer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionComplexity {
    pub name: String,
    pub file: String,
    pub line: u32,
    pub complexity: u32,
    pub length: u32,
}

/// Aggregate complexity analysis for one repository's files of one language.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComplexityResult {
    pub total_files: u32,
    pub total_functions: u32,
    pub average_complexity: f64,
    pub max_complexity: u32,
    /// Files over the 16 MiB analysis limit, skipped rather than read.
    pub skipped_large_files: u32,
    pub functions: Vec<FunctionComplexity>,
    pub file_metrics: HashMap<String, serde_json::Value>,
}

/// Aggregate of all [`CheckResult`]s for one repository, plus the
/// computed overall score and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryReport {
    pub repository: String,
    pub checks: Vec<CheckResult>,
    pub overall_score: f64,
    pub overall_status: Status,
}

impl RepositoryReport {
    /// Build a report from a repository name and its collected check
    /// results, computing overall score/status per spec §4.7 step 4:
    /// `Σ score / Σ maxScore × 100`, and `max()` of constituent statuses.
    #[must_use]
    pub fn from_checks(repository: String, checks: Vec<CheckResult>) -> Self {
        let (score_sum, max_sum) = checks
            .iter()
            .fold((0u64, 0u64), |(s, m), c| (s + u64::from(c.score), m + u64::from(c.max_score)));
        let overall_score = if max_sum == 0 {
            100.0
        } else {
            (score_sum as f64 / max_sum as f64) * 100.0
        };
        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(Status::Unknown);
        Self {
            repository,
            checks,
            overall_score,
            overall_status,
        }
    }

    /// Synthesize a critical report for a repository whose local path
    /// does not exist (spec invariant 4). `checker_ids` names every
    /// checker that would have been applicable, so each still produces
    /// exactly one `CheckResult` per spec invariant 3.
    #[must_use]
    pub fn missing(
        repository: &str,
        checker_ids: &[(&str, &str, &str, u32)],
        now: DateTime<Utc>,
    ) -> Self {
        let checks = checker_ids
            .iter()
            .map(|&(id, name, category, max_score)| {
                let mut result = CheckResult {
                    id: id.to_owned(),
                    name: name.to_owned(),
                    category: category.to_owned(),
                    repository: repository.to_owned(),
                    status: Status::Unknown,
                    score: 0,
                    max_score,
                    issues: vec![Issue::new(
                        "execution_error",
                        Severity::Critical,
                        format!("repository '{repository}' has no local path to check"),
                    )
                    .with_context("kind", serde_json::json!("repository-missing"))],
                    warnings: Vec::new(),
                    metrics: HashMap::new(),
                    metadata: HashMap::new(),
                    duration: Duration::ZERO,
                    timestamp: now,
                };
                result.finalize_status();
                result
            })
            .collect();
        Self::from_checks(repository.to_owned(), checks)
    }
}

/// The full engine run output (spec §3, `EngineReport`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReport {
    pub repository_reports: Vec<RepositoryReport>,
    #[serde(with = "duration_millis")]
    pub total_duration: Duration,
    pub aggregate_counters: HashMap<String, u64>,
}

/// (De)serialize a `Duration` as whole milliseconds, since the JSON report
/// format is consumed by tooling that expects a plain integer.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_escalation_from_low_issue_stays_healthy() {
        let status = Status::Healthy.escalate_for_issue(Severity::Low);
        assert_eq!(status, Status::Healthy);
    }

    #[test]
    fn status_escalation_from_medium_issue_is_warning() {
        let status = Status::Healthy.escalate_for_issue(Severity::Medium);
        assert_eq!(status, Status::Warning);
    }

    #[test]
    fn status_escalation_from_high_issue_is_critical() {
        let status = Status::Healthy.escalate_for_issue(Severity::High);
        assert_eq!(status, Status::Critical);
    }

    #[test]
    fn status_escalation_never_downgrades() {
        let status = Status::Critical.escalate_for_issue(Severity::Low);
        assert_eq!(status, Status::Critical);
    }

    #[test]
    fn warning_escalates_to_at_least_warning() {
        let status = Status::Healthy.escalate_for_warning();
        assert_eq!(status, Status::Warning);
    }

    #[test]
    fn repository_resolved_path_uses_explicit_path() {
        let repo = Repository {
            name: "r1".into(),
            url: "git@github.com:acme/r1.git".into(),
            branch: None,
            path: Some("/tmp/custom".into()),
            tags: vec![],
            language: None,
        };
        assert_eq!(repo.resolved_path(), "/tmp/custom");
    }

    #[test]
    fn repository_resolved_path_from_ssh_url() {
        let repo = Repository {
            name: "r1".into(),
            url: "git@github.com:acme/r1.git".into(),
            branch: None,
            path: None,
            tags: vec![],
            language: None,
        };
        assert_eq!(repo.resolved_path(), "r1");
    }

    #[test]
    fn repository_resolved_path_from_https_url() {
        let repo = Repository {
            name: "r1".into(),
            url: "https://github.com/acme/r1".into(),
            branch: None,
            path: None,
            tags: vec![],
            language: None,
        };
        assert_eq!(repo.resolved_path(), "r1");
    }

    #[test]
    fn repository_has_all_tags() {
        let repo = Repository {
            name: "r1".into(),
            url: "u".into(),
            branch: None,
            path: None,
            tags: vec!["x".into(), "y".into()],
            language: None,
        };
        assert!(repo.has_all_tags(&["x".into()]));
        assert!(!repo.has_all_tags(&["z".into()]));
    }

    #[test]
    fn check_result_finalize_clamps_score() {
        let mut result = CheckResult {
            id: "c1".into(),
            name: "c1".into(),
            category: "git".into(),
            repository: "r1".into(),
            status: Status::Unknown,
            score: 150,
            max_score: 100,
            issues: vec![],
            warnings: vec![],
            metrics: HashMap::new(),
            metadata: HashMap::new(),
            duration: Duration::ZERO,
            timestamp: Utc::now(),
        };
        result.finalize_status();
        assert_eq!(result.score, 100);
        assert_eq!(result.status, Status::Healthy);
    }

    #[test]
    fn language_parse_is_case_insensitive() {
        assert_eq!(Language::parse("GO"), Some(Language::Go));
        assert_eq!(Language::parse("py"), Some(Language::Python));
        assert_eq!(Language::parse("nonsense"), None);
    }

    #[test]
    fn repository_report_overall_score_is_weighted_average() {
        let now = Utc::now();
        let mut c1 = CheckResult {
            id: "a".into(),
            name: "a".into(),
            category: "git".into(),
            repository: "r1".into(),
            status: Status::Unknown,
            score: 50,
            max_score: 100,
            issues: vec![],
            warnings: vec![],
            metrics: HashMap::new(),
            metadata: HashMap::new(),
            duration: Duration::ZERO,
            timestamp: now,
        };
        c1.finalize_status();
        let mut c2 = c1.clone();
        c2.score = 100;
        c2.finalize_status();
        let report = RepositoryReport::from_checks("r1".into(), vec![c1, c2]);
        assert!((report.overall_score - 75.0).abs() < 1e-9);
    }

    #[test]
    fn repository_report_missing_emits_one_check_per_expected() {
        let now = Utc::now();
        let report = RepositoryReport::missing(
            "r1",
            &[("git-status", "git-status", "git", 100), ("license-check", "license-check", "docs", 100)],
            now,
        );
        assert_eq!(report.checks.len(), 2);
        assert_eq!(report.overall_status, Status::Critical);
        for check in &report.checks {
            assert_eq!(check.status, Status::Critical);
            assert_eq!(check.issues.len(), 1);
            assert_eq!(check.issues[0].issue_type, "execution_error");
        }
    }
}
