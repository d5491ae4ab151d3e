//! Checker registry (§4.5) — keyed lookup, category filtering, and
//! config-aware enabling over the [`Checker`] set.
//!
//! The teacher has no registry *struct* of its own, only the flat
//! `checkers::build_checker_registry` free function returning a
//! `Vec<Box<dyn Checker>>`; this generalizes that into a proper type so
//! `unregister`/`get`/`forCategory`/`forRepository`/`enabled`/`stats` all
//! have somewhere to live, following §9's layering guidance: this
//! registry has no back-edge to the engine or to [`crate::config::Config`]
//! beyond borrowing it for a single `enabled` call.

use std::collections::HashMap;

use crate::checkers::Checker;
use crate::config::Config;
use crate::types::Repository;

/// Registers [`Checker`]s and answers capability/config queries for them.
///
/// Registration order is preserved (spec §5: "within one repository's
/// sequential checker sequence: registration order, stable"). Listing via
/// [`CheckerRegistry::all`] is a read-only snapshot over an already-built
/// `Vec`, so callers never observe a mid-registration state.
pub struct CheckerRegistry {
    entries: Vec<Box<dyn Checker>>,
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Build the registry with the nine checkers spec §4.4's table names,
    /// in the table's order.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::checkers::git_status::GitStatusChecker));
        registry.register(Box::new(crate::checkers::git_last_commit::GitLastCommitChecker));
        registry.register(Box::new(crate::checkers::branch_protection::BranchProtectionChecker));
        registry.register(Box::new(crate::checkers::vulnerability_scan::VulnerabilityScanChecker));
        registry.register(Box::new(crate::checkers::dependencies_outdated::DependenciesOutdatedChecker));
        registry.register(Box::new(crate::checkers::license_check::LicenseCheckChecker));
        registry.register(Box::new(crate::checkers::readme_check::ReadmeCheckChecker));
        registry.register(Box::new(crate::checkers::ci_config::CiConfigChecker));
        registry.register(Box::new(crate::checkers::cyclomatic_complexity::CyclomaticComplexityChecker));
        registry
    }

    pub fn register(&mut self, checker: Box<dyn Checker>) {
        self.entries.push(checker);
    }

    /// Remove the checker with this id, if any. Returns whether one was
    /// removed.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|c| c.id() != id);
        self.entries.len() != before
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn Checker> {
        self.entries.iter().find(|c| c.id() == id).map(|c| c.as_ref())
    }

    #[must_use]
    pub fn all(&self) -> Vec<&dyn Checker> {
        self.entries.iter().map(|c| c.as_ref()).collect()
    }

    #[must_use]
    pub fn for_category(&self, category: &str) -> Vec<&dyn Checker> {
        self.entries.iter().filter(|c| c.category() == category).map(|c| c.as_ref()).collect()
    }

    #[must_use]
    pub fn for_repository(&self, repository: &Repository) -> Vec<&dyn Checker> {
        self.entries
            .iter()
            .filter(|c| c.supports_repository(repository))
            .map(|c| c.as_ref())
            .collect()
    }

    /// Every checker that is both `is_effectively_enabled()` under
    /// `config` and named in `config.checkers` (an id with no config
    /// entry is treated as disabled — every built-in checker id has a
    /// default entry from [`Config::defaults`], so this only excludes
    /// ids the caller registered without also configuring).
    #[must_use]
    pub fn enabled<'a>(&'a self, config: &Config) -> Vec<&'a dyn Checker> {
        self.entries
            .iter()
            .filter(|c| {
                config
                    .checker(c.id())
                    .map(CheckerConfigEnabled::is_effectively_enabled)
                    .unwrap_or(false)
            })
            .map(|c| c.as_ref())
            .collect()
    }

    /// Read-only snapshot of registry composition, per spec §4.5.
    #[must_use]
    pub fn stats(&self, config: &Config) -> RegistryStats {
        let total_checkers = self.entries.len();
        let enabled_checkers = self.enabled(config).len();
        let mut category_counts = HashMap::new();
        for checker in &self.entries {
            *category_counts.entry(checker.category().to_owned()).or_insert(0usize) += 1;
        }
        RegistryStats {
            total_checkers,
            enabled_checkers,
            category_counts,
        }
    }
}

/// Local trait alias so [`CheckerRegistry::enabled`] can call
/// `is_effectively_enabled` without importing `CheckerConfig` directly in
/// the filter closure's type position.
trait CheckerConfigEnabled {
    fn is_effectively_enabled(&self) -> bool;
}

impl CheckerConfigEnabled for crate::config::CheckerConfig {
    fn is_effectively_enabled(&self) -> bool {
        crate::config::CheckerConfig::is_effectively_enabled(self)
    }
}

#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_checkers: usize,
    pub enabled_checkers: usize,
    pub category_counts: HashMap<String, usize>,
}
