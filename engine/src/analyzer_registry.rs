//! Analyzer registry (§4.3) — keyed lookup and language-capability
//! routing over the [`Analyzer`](crate::analyzers::Analyzer) set.
//!
//! Grounded on the teacher's `checkers::build_checker_registry` flat
//! registration function, generalized to a proper registry type since
//! §4.3 additionally requires case-insensitive lookup and a
//! capability-matching `supported_for`.

use std::path::Path;

use crate::analyzers::Analyzer;
use crate::platform::FileSystem;
use crate::types::{Language, Repository};

/// Registers [`Analyzer`]s and answers capability queries for them.
///
/// Registration order is preserved; lookup by language is
/// case-insensitive. Registering a second analyzer for an
/// already-registered language replaces the prior entry (last-writer-
/// wins) — a deliberate extensibility affordance, not an error.
pub struct AnalyzerRegistry {
    entries: Vec<Box<dyn Analyzer>>,
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Build the registry with the minimum language set spec §4.2
    /// requires: Go, Python, Java, JavaScript/TypeScript.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::analyzers::GoAnalyzer));
        registry.register(Box::new(crate::analyzers::PythonAnalyzer));
        registry.register(Box::new(crate::analyzers::JavaAnalyzer));
        registry.register(Box::new(crate::analyzers::JavaScriptAnalyzer));
        registry
    }

    /// Register `analyzer`, replacing any prior entry for the same
    /// language (last-writer-wins, spec §4.3).
    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        let language = analyzer.language();
        if let Some(existing) = self.entries.iter_mut().find(|a| a.language() == language) {
            *existing = analyzer;
        } else {
            self.entries.push(analyzer);
        }
    }

    /// Case-insensitive lookup by language name (e.g. `"Go"`, `"go"`,
    /// `"golang"` all resolve via [`Language::parse`]).
    #[must_use]
    pub fn get(&self, language_name: &str) -> Option<&dyn Analyzer> {
        let language = Language::parse(language_name)?;
        self.entries
            .iter()
            .find(|a| a.language() == language)
            .map(|a| a.as_ref())
    }

    #[must_use]
    pub fn all(&self) -> Vec<&dyn Analyzer> {
        self.entries.iter().map(|a| a.as_ref()).collect()
    }

    /// Every registered analyzer applicable to `repository`: either (a)
    /// the repository's language hint matches, or (b) a shallow walk
    /// (depth ≤ 2 directories) finds a file ending in one of the
    /// analyzer's `supportedExtensions` (spec §4.3).
    #[must_use]
    pub fn supported_for(
        &self,
        repository: &Repository,
        repo_path: &Path,
        fs: &dyn FileSystem,
    ) -> Vec<&dyn Analyzer> {
        if let Some(hint) = repository.language {
            if let Some(analyzer) = self.entries.iter().find(|a| a.language() == hint) {
                return vec![analyzer.as_ref()];
            }
        }

        let sampled = shallow_extensions(repo_path, fs, 2);
        self.entries
            .iter()
            .filter(|a| {
                a.supported_extensions()
                    .iter()
                    .any(|ext| sampled.contains(&ext.to_ascii_lowercase()))
            })
            .map(|a| a.as_ref())
            .collect()
    }
}

/// Collect the set of lowercase file extensions present within `max_depth`
/// directories of `root` (a "shallow walk"). [`FileSystem::walk`] has no
/// depth parameter, so this walks the full tree and discards files whose
/// path, relative to `root`, nests deeper than `max_depth` components.
fn shallow_extensions(root: &Path, fs: &dyn FileSystem, max_depth: usize) -> std::collections::HashSet<String> {
    let mut extensions = std::collections::HashSet::new();
    fs.walk(root, &mut |p| {
        let Ok(rel) = p.strip_prefix(root) else { return };
        let depth = rel.components().count();
        if depth == 0 || depth > max_depth + 1 {
            return;
        }
        if let Some(ext) = p.extension().and_then(|e| e.to_str()) {
            extensions.insert(ext.to_ascii_lowercase());
        }
    });
    extensions
}
