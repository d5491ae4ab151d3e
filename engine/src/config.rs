//! Configuration layer (§4.6) — merges built-in defaults with an optional
//! YAML overlay, then a runtime category filter.
//!
//! Grounded on the teacher's `config.rs` multi-stage resolution and
//! `is_rule_enabled`/`effective_severity` pattern, renamed here to
//! checker IDs and YAML instead of rule IDs and TOML: three explicit
//! merge stages rather than a deep-map-union, so the precedence rules in
//! spec §4.6 stay auditable (spec §9 design note).

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Per-checker configuration (spec §3 `CheckerConfig`). Owned by the
/// configuration layer, read-only to the checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    pub enabled: bool,
    pub severity: Severity,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub categories: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
}

impl CheckerConfig {
    /// Open Question decision (spec §9, DESIGN.md): `timeout: 0` means the
    /// checker is disabled outright, not "use the global default". A
    /// configuration that explicitly zeroes a checker's timeout reads as
    /// "never let this run long enough to matter" — reinterpreting it as
    /// "use default" would silently let the checker run for the full
    /// global budget when the author's intent was to turn it off.
    #[must_use]
    pub fn is_effectively_enabled(&self) -> bool {
        self.enabled && !self.timeout.is_zero()
    }

    /// Read an integer option, falling back to `default` when absent or
    /// of the wrong type.
    #[must_use]
    pub fn option_u64(&self, key: &str, default: u64) -> u64 {
        self.options.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
    }

    /// Read a string option, falling back to `default` when absent.
    #[must_use]
    pub fn option_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }
}

/// Engine-level knobs (spec §4.7/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub max_concurrency: usize,
    #[serde(with = "duration_secs_opt")]
    pub timeout: Option<Duration>,
    pub cache_enabled: bool,
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            timeout: None,
            cache_enabled: true,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// The fully-resolved configuration handed to the orchestration engine:
/// engine settings plus one [`CheckerConfig`] per registered checker id.
#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineSettings,
    pub checkers: HashMap<String, CheckerConfig>,
    /// Per-language complexity threshold override (spec §4.2/§8 S2/S3).
    pub analyzer_thresholds: HashMap<String, u32>,
}

impl Config {
    /// Built-in defaults (stage 1 of §4.6's three-stage merge). Every
    /// checker id named in spec §4.4's table gets a default entry so the
    /// checker registry can be merged against it without missing keys.
    #[must_use]
    pub fn defaults() -> Self {
        let mut checkers = HashMap::new();
        let default_timeout = Duration::from_secs(30);

        let entries: &[(&str, Severity, &[&str])] = &[
            ("git-status", Severity::Medium, &["git"]),
            ("git-last-commit", Severity::Medium, &["git"]),
            ("branch-protection", Severity::Medium, &["security"]),
            ("vulnerability-scan", Severity::Critical, &["security"]),
            ("dependencies-outdated", Severity::Medium, &["dependencies"]),
            ("license-check", Severity::High, &["documentation", "legal"]),
            ("readme-check", Severity::Medium, &["documentation"]),
            ("ci-config", Severity::Medium, &["ci"]),
            ("cyclomatic-complexity", Severity::Medium, &["quality"]),
        ];

        for (id, severity, categories) in entries {
            checkers.insert(
                (*id).to_owned(),
                CheckerConfig {
                    enabled: true,
                    severity: *severity,
                    timeout: default_timeout,
                    categories: categories.iter().map(|s| (*s).to_string()).collect(),
                    exclusions: Vec::new(),
                    options: HashMap::new(),
                },
            );
        }

        let mut analyzer_thresholds = HashMap::new();
        analyzer_thresholds.insert("go".to_owned(), 10);
        analyzer_thresholds.insert("python".to_owned(), 10);
        analyzer_thresholds.insert("java".to_owned(), 10);
        analyzer_thresholds.insert("javascript".to_owned(), 10);
        analyzer_thresholds.insert("typescript".to_owned(), 10);

        Self {
            engine: EngineSettings::default(),
            checkers,
            analyzer_thresholds,
        }
    }

    /// Load the three-stage merge: built-in defaults, then an optional
    /// YAML overlay at `overlay_path` (stage 2), with no category filter
    /// applied yet (stage 3 is applied separately by the caller once the
    /// CLI flags are known — see [`Config::apply_category_filter`]).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `overlay_path` exists but is
    /// malformed YAML, or names an unrecognized top-level key.
    pub fn load(overlay_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::defaults();
        let Some(path) = overlay_path else {
            return Ok(config);
        };
        if !path.is_file() {
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        let overlay: OverlayFile = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))?;
        apply_overlay(&mut config, overlay);
        Ok(config)
    }

    /// Stage 3 of §4.6's merge: disable every checker whose `categories`
    /// is disjoint from `filter` (the `--category a,b,c` flag). A `None`
    /// or empty filter leaves every checker's enabled state untouched.
    pub fn apply_category_filter(&mut self, filter: &[String]) {
        if filter.is_empty() {
            return;
        }
        let wanted: std::collections::HashSet<&str> = filter.iter().map(String::as_str).collect();
        for checker in self.checkers.values_mut() {
            let overlaps = checker.categories.iter().any(|c| wanted.contains(c.as_str()));
            if !overlaps {
                checker.enabled = false;
            }
        }
    }

    /// Override every language's complexity threshold with a single
    /// engine-level value (`--max-complexity`, spec §9 Open Question 2:
    /// the engine-level flag is authoritative over the checker's own
    /// configured threshold when both are present).
    pub fn apply_max_complexity_override(&mut self, max_complexity: Option<u32>) {
        let Some(value) = max_complexity else { return };
        for threshold in self.analyzer_thresholds.values_mut() {
            *threshold = value;
        }
        if let Some(checker) = self.checkers.get_mut("cyclomatic-complexity") {
            checker
                .options
                .insert("max_complexity_override".to_owned(), serde_json::json!(value));
        }
    }

    #[must_use]
    pub fn checker(&self, id: &str) -> Option<&CheckerConfig> {
        self.checkers.get(id)
    }

    /// Compute a short hash of the effective configuration, used as part
    /// of the cache key (spec §4.7: `(repository.path, checker.id,
    /// config-hash)`), grounded on the teacher's `config_hash` canonical
    /// JSON approach so hash stability does not depend on `HashMap`
    /// iteration order.
    #[must_use]
    pub fn config_hash(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut ids: Vec<&String> = self.checkers.keys().collect();
        ids.sort();
        let mut buf = String::new();
        for id in ids {
            let checker = &self.checkers[id];
            buf.push_str(id);
            buf.push(':');
            buf.push_str(&checker.enabled.to_string());
            buf.push(':');
            buf.push_str(&checker.timeout.as_secs().to_string());
            buf.push(';');
        }
        let mut hasher = Sha256::new();
        hasher.update(buf.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Raw YAML overlay shape (spec §6). Unknown top-level keys are rejected
/// (`deny_unknown_fields`); unknown keys inside a checker's `options`
/// sub-map are accepted and ignored for forward compatibility.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverlayFile {
    engine: Option<OverlayEngine>,
    checkers: Option<HashMap<String, OverlayChecker>>,
    analyzers: Option<HashMap<String, OverlayAnalyzer>>,
    reporters: Option<serde_yaml::Value>,
    categories: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverlayEngine {
    max_concurrency: Option<usize>,
    timeout: Option<u64>,
    cache_enabled: Option<bool>,
    cache_ttl: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverlayChecker {
    enabled: Option<bool>,
    severity: Option<String>,
    timeout: Option<u64>,
    categories: Option<Vec<String>>,
    exclusions: Option<Vec<String>>,
    #[serde(default)]
    options: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverlayAnalyzer {
    max_complexity: Option<u32>,
}

fn parse_severity(s: &str) -> Option<Severity> {
    match s.to_lowercase().as_str() {
        "low" => Some(Severity::Low),
        "medium" => Some(Severity::Medium),
        "high" => Some(Severity::High),
        "critical" => Some(Severity::Critical),
        _ => None,
    }
}

fn apply_overlay(config: &mut Config, overlay: OverlayFile) {
    if let Some(engine) = overlay.engine {
        if let Some(v) = engine.max_concurrency {
            config.engine.max_concurrency = v.max(1);
        }
        if let Some(v) = engine.timeout {
            config.engine.timeout = Some(Duration::from_secs(v));
        }
        if let Some(v) = engine.cache_enabled {
            config.engine.cache_enabled = v;
        }
        if let Some(v) = engine.cache_ttl {
            config.engine.cache_ttl = Duration::from_secs(v);
        }
    }

    if let Some(checkers) = overlay.checkers {
        for (id, overlay_checker) in checkers {
            let entry = config.checkers.entry(id).or_insert_with(|| CheckerConfig {
                enabled: true,
                severity: Severity::Medium,
                timeout: Duration::from_secs(30),
                categories: Vec::new(),
                exclusions: Vec::new(),
                options: HashMap::new(),
            });
            if let Some(v) = overlay_checker.enabled {
                entry.enabled = v;
            }
            if let Some(ref v) = overlay_checker.severity {
                if let Some(sev) = parse_severity(v) {
                    entry.severity = sev;
                }
            }
            if let Some(v) = overlay_checker.timeout {
                entry.timeout = Duration::from_secs(v);
            }
            if let Some(v) = overlay_checker.categories {
                entry.categories = v;
            }
            if let Some(v) = overlay_checker.exclusions {
                entry.exclusions = v;
            }
            for (k, v) in overlay_checker.options {
                entry.options.insert(k, v);
            }
        }
    }

    if let Some(analyzers) = overlay.analyzers {
        for (lang, overlay_analyzer) in analyzers {
            if let Some(max_complexity) = overlay_analyzer.max_complexity {
                config.analyzer_thresholds.insert(lang.to_lowercase(), max_complexity);
            }
        }
    }
}

/// Errors surfaced while loading the configuration overlay. Any non-`Ok`
/// result here is the `configuration-invalid` error kind (spec §7):
/// surfaced before any checker runs, exit code 3.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    Read(String, String),
    #[error("failed to parse config file '{0}': {1}")]
    Parse(String, String),
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.map(|v| v.as_secs()).unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(if secs == 0 { None } else { Some(Duration::from_secs(secs)) })
    }
}
