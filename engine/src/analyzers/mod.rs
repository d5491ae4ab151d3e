//! Language analyzers (§4.2) — per-language file discovery and
//! function-level cyclomatic-complexity extraction.
//!
//! Grounded on `sibyllinesoft-valknut`'s per-language `tree-sitter`
//! adapters (`src/lang/adapters/`) and its `ComplexityCalculator`
//! (`src/core/ast_service.rs`): each analyzer here parses with the real
//! grammar for its language (spec §4.2's "use the host's Go parser;
//! walk the AST", generalized to every language) rather than scanning
//! source text. Java's grammar is grounded on `ruizrica-drift` instead,
//! since valknut's own `tree-sitter` dependency set has no Java grammar.

mod complexity;
mod go;
mod java;
mod javascript;
mod python;

use std::path::{Path, PathBuf};

use crate::platform::FileSystem;
use crate::types::{ComplexityResult, FunctionComplexity, Language};

pub use go::GoAnalyzer;
pub use java::JavaAnalyzer;
pub use javascript::JavaScriptAnalyzer;
pub use python::PythonAnalyzer;

/// Error surfaced by an analyzer when complexity cannot be computed.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Fewer than one source file of the analyzer's language was found.
    /// The orchestrator treats this as "not applicable", never failure.
    #[error("no {0} source files found")]
    NoSourceFiles(Language),
}

/// Files larger than this are skipped rather than read into memory.
const MAX_ANALYZABLE_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// Plain file/function inventory produced by [`Analyzer::analyze`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub files: Vec<PathBuf>,
    pub functions: Vec<FunctionComplexity>,
    pub metrics: std::collections::HashMap<String, serde_json::Value>,
    pub skipped_large_files: u32,
}

/// A language-specific capability for file discovery and complexity
/// extraction (spec §4.2).
pub trait Analyzer: Send + Sync {
    fn language(&self) -> Language;
    fn supported_extensions(&self) -> &[&str];
    fn supports_complexity(&self) -> bool;
    fn supports_imports(&self) -> bool;

    /// Walk `repo_path` via the [`FileSystem`] capability, skipping
    /// excluded directories, and return every source file of this
    /// analyzer's language plus any functions found in them.
    fn analyze(&self, fs: &dyn FileSystem, repo_path: &Path) -> AnalysisResult {
        let found = source_files(fs, repo_path, self.supported_extensions());
        let mut files = Vec::with_capacity(found.len());
        let mut functions = Vec::new();
        let mut skipped_large_files = 0u32;
        for file in &found {
            if fs.file_size(file).is_some_and(|size| size > MAX_ANALYZABLE_FILE_BYTES) {
                skipped_large_files += 1;
                continue;
            }
            if let Ok(contents) = fs.read_file(file) {
                functions.extend(self.extract_functions(file, &contents));
            }
            files.push(file.clone());
        }
        AnalysisResult {
            files,
            functions,
            metrics: std::collections::HashMap::new(),
            skipped_large_files,
        }
    }

    /// Extract functions (with complexity/length already computed) from a
    /// single file's contents. Implemented per-language.
    fn extract_functions(&self, file: &Path, contents: &str) -> Vec<FunctionComplexity>;

    /// Aggregate complexity across every file of this analyzer's language
    /// in `repo_path`.
    fn analyze_complexity(
        &self,
        fs: &dyn FileSystem,
        repo_path: &Path,
    ) -> Result<ComplexityResult, AnalysisError> {
        let result = self.analyze(fs, repo_path);
        if result.files.is_empty() && result.skipped_large_files == 0 {
            return Err(AnalysisError::NoSourceFiles(self.language()));
        }
        Ok(summarize(result))
    }
}

/// True if `path`'s extension (case-insensitive) is one of `extensions`
/// and the path does not look like a test fixture.
fn is_source_file(path: &Path, extensions: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext_lower = ext.to_ascii_lowercase();
    if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext_lower)) {
        return false;
    }
    !looks_like_test_fixture(path)
}

/// Excludes common test-fixture naming conventions from complexity
/// scoring, per spec §4.2's "test-fixture patterns per analyzer config".
fn looks_like_test_fixture(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let in_test_dir = path.components().any(|c| {
        matches!(
            c.as_os_str().to_str(),
            Some("test") | Some("tests") | Some("__tests__") | Some("testdata") | Some("fixtures")
        )
    });
    in_test_dir
        || name.ends_with("_test.go")
        || name.ends_with(".test.js")
        || name.ends_with(".test.ts")
        || name.ends_with(".spec.js")
        || name.ends_with(".spec.ts")
        || name.starts_with("test_")
        || name.ends_with("_test.py")
        || name.ends_with("test.java")
}

fn source_files(fs: &dyn FileSystem, repo_path: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    fs.walk(repo_path, &mut |p| {
        if is_source_file(p, extensions) {
            found.push(p.to_path_buf());
        }
    });
    found.sort();
    found
}

/// Reduce a flat function list into the aggregate [`ComplexityResult`]
/// shape, per spec §3's `ComplexityResult` data model.
fn summarize(result: AnalysisResult) -> ComplexityResult {
    let total_files = result.files.len() as u32;
    let total_functions = result.functions.len() as u32;
    let max_complexity = result
        .functions
        .iter()
        .map(|f| f.complexity)
        .max()
        .unwrap_or(0);
    let average_complexity = if total_functions == 0 {
        0.0
    } else {
        result.functions.iter().map(|f| f.complexity as f64).sum::<f64>() / total_functions as f64
    };

    let mut file_metrics = std::collections::HashMap::new();
    for function in &result.functions {
        let entry = file_metrics
            .entry(function.file.clone())
            .or_insert_with(|| serde_json::json!({"functions": 0, "max_complexity": 0}));
        if let Some(obj) = entry.as_object_mut() {
            let count = obj.get("functions").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
            obj.insert("functions".to_owned(), serde_json::json!(count));
            let existing_max = obj
                .get("max_complexity")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            obj.insert(
                "max_complexity".to_owned(),
                serde_json::json!(existing_max.max(function.complexity as u64)),
            );
        }
    }

    ComplexityResult {
        total_files,
        total_functions,
        average_complexity,
        max_complexity,
        skipped_large_files: result.skipped_large_files,
        functions: result.functions,
        file_metrics,
    }
}
