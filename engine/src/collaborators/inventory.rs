//! Inventory loader (§4.9) — parses the `config.yaml` repository list and
//! applies tag filtering.
//!
//! Grounded on the teacher's `serde_yaml` usage (already in its
//! dependency set for `ironlayer.yaml`), generalized to the inventory
//! schema spec §6 defines.

use std::path::Path;

use serde::Deserialize;

use crate::types::Repository;

/// The parsed `config.yaml` repository inventory.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub repositories: Vec<Repository>,
}

impl Inventory {
    /// Load and parse `path` (spec §4.9: `{repositories: [{name, url,
    /// branch?, path?, tags?}]}`).
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Missing`] when the file does not exist,
    /// or [`InventoryError::Malformed`] when it fails to parse.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        if !path.is_file() {
            return Err(InventoryError::Missing(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| InventoryError::Malformed(path.display().to_string(), e.to_string()))?;
        let raw: RawInventory = serde_yaml::from_str(&content)
            .map_err(|e| InventoryError::Malformed(path.display().to_string(), e.to_string()))?;

        let repositories = raw
            .repositories
            .into_iter()
            .map(|r| Repository {
                name: r.name,
                url: r.url,
                branch: r.branch,
                path: r.path,
                tags: r.tags.unwrap_or_default(),
                language: None,
            })
            .collect();

        Ok(Self { repositories })
    }

    /// Filter to repositories carrying every tag in `required`. An empty
    /// filter is a no-op (every repository passes).
    #[must_use]
    pub fn filtered_by_tags(&self, required: &[String]) -> Vec<Repository> {
        if required.is_empty() {
            return self.repositories.clone();
        }
        self.repositories
            .iter()
            .filter(|r| r.has_all_tags(required))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawInventory {
    repositories: Vec<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    url: String,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Errors surfaced while loading the repository inventory (spec §7's
/// `configuration-invalid` kind, applied to `config.yaml` rather than the
/// health overlay).
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory file '{0}' does not exist")]
    Missing(String),
    #[error("failed to parse inventory '{0}': {1}")]
    Malformed(String, String),
}
