//! `ci-config` checker (spec §4.4) — scans for a recognized CI pipeline
//! definition (`.github/workflows/*.{yml,yaml}`, `.travis.yml`,
//! `.circleci/config.yml`, `.gitlab-ci.yml`, `Jenkinsfile`,
//! `azure-pipelines.yml`, `.buildkite/`) and grades it additively over
//! seven detected features: testing, build, deployment, matrix,
//! caching, PR triggers, main-branch triggers.

use crate::checkers::{CheckContext, CheckOutcome, Checker};
use crate::types::{Issue, Severity, Warning};

const MAX_SCORE: u32 = 100;
const BASE_POINTS: u32 = 30;
const FEATURE_POINTS: u32 = 10;

const FEATURES: &[(&str, &[&str])] = &[
    ("testing", &["test", "pytest", "go test", "npm test", "cargo test", "jest", "rspec"]),
    ("build", &["build", "compile", "make "]),
    ("deployment", &["deploy", "release", "publish"]),
    ("matrix", &["matrix:"]),
    ("caching", &["cache", "actions/cache"]),
    ("pr_triggers", &["pull_request", "merge_request"]),
    ("main_branch_triggers", &["main", "master"]),
];

/// A CI system and the file(s) that constitute its pipeline definition.
struct Detected {
    system: &'static str,
    yaml_files: Vec<std::path::PathBuf>,
    text_files: Vec<std::path::PathBuf>,
}

pub struct CiConfigChecker;

impl Checker for CiConfigChecker {
    fn id(&self) -> &'static str {
        "ci-config"
    }

    fn name(&self) -> &'static str {
        "ci-config"
    }

    fn category(&self) -> &'static str {
        "ci"
    }

    fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(detected) = detect_ci(ctx) else {
            return CheckOutcome::healthy(MAX_SCORE).with_score(0).with_issue(
                Issue::new(
                    "missing_ci_config",
                    Severity::Medium,
                    "no recognized CI pipeline configuration found",
                )
                .with_suggestion("add a CI workflow (e.g. GitHub Actions under .github/workflows)"),
            );
        };

        let mut invalid = Vec::new();
        let mut combined = String::new();
        for file in detected.yaml_files.iter().chain(detected.text_files.iter()) {
            let Ok(contents) = ctx.fs.read_file(file) else {
                continue;
            };
            if detected.yaml_files.contains(file) && serde_yaml::from_str::<serde_yaml::Value>(&contents).is_err() {
                invalid.push(file.display().to_string());
            }
            combined.push_str(&contents);
            combined.push('\n');
        }

        if !invalid.is_empty() {
            return CheckOutcome::healthy(MAX_SCORE)
                .with_score(50)
                .with_issue(Issue::new(
                    "invalid_ci_config",
                    Severity::Medium,
                    format!("{} CI configuration file(s) failed to parse as YAML: {}", invalid.len(), invalid.join(", ")),
                ))
                .with_metadata("ci_system", serde_json::json!(detected.system));
        }

        if detected.yaml_files.is_empty() && detected.text_files.is_empty() {
            return CheckOutcome::healthy(MAX_SCORE)
                .with_warning(Warning::new(
                    "ci_config_not_validated",
                    format!("detected {} but its configuration format is not validated", detected.system),
                ))
                .with_metadata("ci_system", serde_json::json!(detected.system));
        }

        let detected_features = detect_features(&combined);
        let score = BASE_POINTS + (detected_features.len() as u32) * FEATURE_POINTS;

        let mut outcome = CheckOutcome::healthy(MAX_SCORE)
            .with_score(score.min(MAX_SCORE))
            .with_metadata("ci_system", serde_json::json!(detected.system))
            .with_metric("detected_features", serde_json::json!(detected_features));

        let missing: Vec<&str> = FEATURES
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| !detected_features.contains(name))
            .collect();
        if !missing.is_empty() {
            outcome = outcome.with_warning(Warning::new(
                "ci_pipeline_incomplete",
                format!("pipeline does not appear to cover: {}", missing.join(", ")),
            ));
        }

        outcome
    }
}

fn detect_features(combined: &str) -> Vec<&'static str> {
    let lower = combined.to_lowercase();
    FEATURES
        .iter()
        .filter(|(_, markers)| markers.iter().any(|marker| lower.contains(marker)))
        .map(|(name, _)| *name)
        .collect()
}

fn detect_ci(ctx: &CheckContext) -> Option<Detected> {
    let workflows_dir = ctx.repo_path.join(".github/workflows");
    if ctx.fs.is_dir(&workflows_dir) {
        let mut files = ctx.fs.list_files(&workflows_dir, "*.yml");
        files.extend(ctx.fs.list_files(&workflows_dir, "*.yaml"));
        if !files.is_empty() {
            return Some(Detected { system: "github-actions", yaml_files: files, text_files: Vec::new() });
        }
    }

    if ctx.fs.exists(&ctx.repo_path.join(".gitlab-ci.yml")) {
        return Some(Detected {
            system: "gitlab-ci",
            yaml_files: vec![ctx.repo_path.join(".gitlab-ci.yml")],
            text_files: Vec::new(),
        });
    }

    if ctx.fs.exists(&ctx.repo_path.join(".circleci/config.yml")) {
        return Some(Detected {
            system: "circleci",
            yaml_files: vec![ctx.repo_path.join(".circleci/config.yml")],
            text_files: Vec::new(),
        });
    }

    if ctx.fs.exists(&ctx.repo_path.join("azure-pipelines.yml")) {
        return Some(Detected {
            system: "azure-pipelines",
            yaml_files: vec![ctx.repo_path.join("azure-pipelines.yml")],
            text_files: Vec::new(),
        });
    }

    if ctx.fs.exists(&ctx.repo_path.join(".travis.yml")) {
        return Some(Detected {
            system: "travis-ci",
            yaml_files: vec![ctx.repo_path.join(".travis.yml")],
            text_files: Vec::new(),
        });
    }

    if ctx.fs.is_dir(&ctx.repo_path.join(".buildkite")) {
        let files = ctx.fs.list_files(&ctx.repo_path.join(".buildkite"), "*.yml");
        return Some(Detected { system: "buildkite", yaml_files: files, text_files: Vec::new() });
    }

    if ctx.fs.exists(&ctx.repo_path.join("Jenkinsfile")) {
        return Some(Detected {
            system: "jenkins",
            yaml_files: Vec::new(),
            text_files: vec![ctx.repo_path.join("Jenkinsfile")],
        });
    }

    None
}
