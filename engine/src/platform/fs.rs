//! The [`FileSystem`] capability — directory walking, file reads/writes.
//!
//! `walk` is built on the `ignore` crate's `WalkBuilder`, the same
//! gitignore-aware walker the engine's teacher lineage uses for SQL model
//! discovery, generalized here to prune the fixed directory-name list
//! spec §4.1 requires regardless of `.gitignore` contents.

use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use ignore::WalkBuilder;

/// Directory names pruned from every walk, regardless of `.gitignore`.
pub const EXCLUDED_DIR_NAMES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    ".venv",
    "venv",
    "env",
    "__pycache__",
    ".gradle",
    ".next",
    ".nuxt",
];

/// Errors a [`FileSystem`] implementation surfaces to its caller.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("path '{0}' escapes the repository root")]
    PathEscape(String),
    #[error("io error on '{0}': {1}")]
    Io(String, std::io::Error),
}

/// Capability interface over the file system (spec §4.1).
pub trait FileSystem: Send + Sync {
    fn read_file(&self, path: &Path) -> Result<String, FsError>;
    fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn list_files(&self, path: &Path, glob: &str) -> Vec<PathBuf>;

    /// Size of the file at `path` in bytes, or `None` if it cannot be
    /// stat'd. Used to skip oversized files before reading them into
    /// memory (spec §4.2 analyzer edge case).
    fn file_size(&self, path: &Path) -> Option<u64>;

    /// Walk `path` depth-first, invoking `visitor` for every file found.
    /// Directories named in [`EXCLUDED_DIR_NAMES`] are never descended
    /// into.
    fn walk(&self, path: &Path, visitor: &mut dyn FnMut(&Path));
}

/// Reject paths containing `..` segments after normalization, per spec
/// §4.1's `readFile`/`writeFile` contract.
fn reject_parent_segments(path: &Path) -> Result<(), FsError> {
    for component in path.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err(FsError::PathEscape(path.display().to_string()));
        }
    }
    Ok(())
}

/// Real, on-disk [`FileSystem`] implementation.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        reject_parent_segments(path)?;
        std::fs::read_to_string(path).map_err(|e| FsError::Io(path.display().to_string(), e))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        reject_parent_segments(path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FsError::Io(parent.display().to_string(), e))?;
        }
        std::fs::write(path, contents).map_err(|e| FsError::Io(path.display().to_string(), e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    /// Matches `glob` case-insensitively (spec §4.4: "case-insensitive
    /// `LICENSE*`, `COPYING*`", "case-insensitive README"), so callers
    /// don't need to enumerate every casing of a candidate file name.
    fn list_files(&self, path: &Path, glob: &str) -> Vec<PathBuf> {
        let matcher = match GlobBuilder::new(glob).case_insensitive(true).build() {
            Ok(g) => g.compile_matcher(),
            Err(_) => return Vec::new(),
        };
        let mut out = Vec::new();
        self.walk(path, &mut |p| {
            if let Ok(rel) = p.strip_prefix(path) {
                if matcher.is_match(rel) {
                    out.push(p.to_path_buf());
                }
            }
        });
        out
    }

    fn walk(&self, path: &Path, visitor: &mut dyn FnMut(&Path)) {
        let walker = WalkBuilder::new(path)
            .filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| !EXCLUDED_DIR_NAMES.contains(&name))
                    .unwrap_or(true)
            })
            .build();

        for entry in walker.flatten() {
            let p = entry.path();
            if p.is_file() {
                visitor(p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn rejects_parent_segments() {
        let fs_impl = RealFileSystem;
        let result = fs_impl.read_file(Path::new("a/../b"));
        assert!(matches!(result, Err(FsError::PathEscape(_))));
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = tempdir().unwrap();
        let fs_impl = RealFileSystem;
        let path = dir.path().join("out.txt");
        fs_impl.write_file(&path, "hello").unwrap();
        assert_eq!(fs_impl.read_file(&path).unwrap(), "hello");
    }

    #[test]
    fn walk_prunes_excluded_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/pkg.js"), "x").unwrap();
        fs::write(dir.path().join("main.go"), "package main").unwrap();

        let fs_impl = RealFileSystem;
        let mut found = Vec::new();
        fs_impl.walk(dir.path(), &mut |p| {
            found.push(p.file_name().unwrap().to_string_lossy().to_string());
        });
        assert!(found.contains(&"main.go".to_owned()));
        assert!(!found.contains(&"pkg.js".to_owned()));
    }

    #[test]
    fn exists_and_is_dir() {
        let dir = tempdir().unwrap();
        let fs_impl = RealFileSystem;
        assert!(fs_impl.is_dir(dir.path()));
        assert!(fs_impl.exists(dir.path()));
        assert!(!fs_impl.exists(&dir.path().join("nope")));
    }

    #[test]
    fn list_files_matches_glob() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "x").unwrap();
        fs::write(dir.path().join("b.py"), "x").unwrap();
        let fs_impl = RealFileSystem;
        let matches = fs_impl.list_files(dir.path(), "*.go");
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn list_files_matches_glob_case_insensitively() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("LiCeNsE-MIT"), "x").unwrap();
        fs::write(dir.path().join("unrelated.txt"), "x").unwrap();
        let fs_impl = RealFileSystem;
        let matches = fs_impl.list_files(dir.path(), "LICENSE*");
        assert_eq!(matches.len(), 1);
    }
}
