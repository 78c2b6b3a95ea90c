//! dbt project metadata accessor.
//!
//! Loads `dbt_project.yml` plus the compiled `catalog.json` and
//! `manifest.json` artifacts, normalizes column names for
//! case-insensitive lookups, and translates between model names and
//! `model.<project>.<model>` node identifiers.
//!
//! Column-name normalization happens exactly once, at construction:
//! both the catalog and the manifest column maps are re-keyed to
//! lowercase, so every downstream lookup can assume case-insensitive
//! uniqueness.

mod catalog;
mod manifest;

pub use catalog::{Catalog, CatalogColumn, CatalogNode, TableMetadata};
pub use manifest::{Manifest, ManifestColumn, ManifestNode, NodeConfig};

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for project metadata access.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    JsonError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    YamlError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Node not found in project metadata: {0}")]
    MissingNode(String),

    #[error("Node identifier is not of the form kind.project.model: {0}")]
    InvalidNodeId(String),
}

pub type ProjectResult<T> = Result<T, ProjectError>;

/// The subset of `dbt_project.yml` needed to locate compiled artifacts.
#[derive(Debug, Deserialize)]
struct ProjectFile {
    name: String,
    #[serde(rename = "target-path", default = "default_target_path")]
    target_path: String,
}

fn default_target_path() -> String {
    "target".to_string()
}

static EMPTY_META: Lazy<Map<String, Value>> = Lazy::new(Map::new);
static EMPTY_COLUMNS: Lazy<HashMap<String, ManifestColumn>> = Lazy::new(HashMap::new);

/// Normalized, read-only view over a dbt project's compiled metadata.
#[derive(Debug, Clone)]
pub struct DbtProject {
    project_name: String,
    catalog: Catalog,
    manifest: Manifest,
}

impl DbtProject {
    /// Load a project from its directory (must contain
    /// `dbt_project.yml` and the compiled target artifacts).
    pub fn load<P: AsRef<Path>>(dbt_dir: P) -> ProjectResult<Self> {
        let dir = dbt_dir.as_ref();
        let project: ProjectFile = read_yaml(&dir.join("dbt_project.yml"))?;
        let target = dir.join(&project.target_path);

        let catalog: Catalog = read_json(&target.join("catalog.json"))?;
        let manifest: Manifest = read_json(&target.join("manifest.json"))?;

        Ok(Self::from_parts(project.name, catalog, manifest))
    }

    /// Build a project from already-parsed artifacts.
    ///
    /// This is where the one-time lowercase pass over column keys
    /// happens, for both the catalog and the manifest.
    pub fn from_parts(
        project_name: impl Into<String>,
        mut catalog: Catalog,
        mut manifest: Manifest,
    ) -> Self {
        for node in catalog.nodes.values_mut() {
            node.columns = lowercase_keys(std::mem::take(&mut node.columns));
        }
        for node in manifest.nodes.values_mut() {
            node.columns = lowercase_keys(std::mem::take(&mut node.columns));
        }

        Self {
            project_name: project_name.into(),
            catalog,
            manifest,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Node identifier for a model name.
    pub fn node_id(&self, model: &str) -> String {
        format!("model.{}.{}", self.project_name, model)
    }

    /// Model name of a node identifier (the third `.`-segment).
    pub fn model_name(node_id: &str) -> ProjectResult<&str> {
        node_id
            .split('.')
            .nth(2)
            .ok_or_else(|| ProjectError::InvalidNodeId(node_id.to_string()))
    }

    /// All catalog node identifiers, sorted for deterministic iteration.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.catalog.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// All manifest node identifiers, sorted.
    pub fn manifest_node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.manifest.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn catalog_node(&self, node_id: &str) -> ProjectResult<&CatalogNode> {
        self.catalog
            .nodes
            .get(node_id)
            .ok_or_else(|| ProjectError::MissingNode(node_id.to_string()))
    }

    /// Physical schema/table/database metadata for a node.
    pub fn table_metadata(&self, node_id: &str) -> ProjectResult<&TableMetadata> {
        Ok(&self.catalog_node(node_id)?.metadata)
    }

    /// Catalog columns for a node, keyed by lowercase column name.
    pub fn catalog_columns(
        &self,
        node_id: &str,
    ) -> ProjectResult<&HashMap<String, CatalogColumn>> {
        Ok(&self.catalog_node(node_id)?.columns)
    }

    /// Manifest columns for a node, keyed by lowercase column name.
    /// A node absent from the manifest has no declared columns.
    pub fn manifest_columns(&self, node_id: &str) -> &HashMap<String, ManifestColumn> {
        self.manifest
            .nodes
            .get(node_id)
            .map(|node| &node.columns)
            .unwrap_or(&EMPTY_COLUMNS)
    }

    /// One declared column, if present in the manifest.
    pub fn manifest_column(&self, node_id: &str, column: &str) -> Option<&ManifestColumn> {
        self.manifest
            .nodes
            .get(node_id)
            .and_then(|node| node.columns.get(column))
    }

    /// Table-level meta mapping for a node; absent nodes or absent
    /// config yield an empty mapping, never an error.
    pub fn table_meta(&self, node_id: &str) -> &Map<String, Value> {
        self.manifest
            .nodes
            .get(node_id)
            .map(|node| &node.config.meta)
            .unwrap_or(&EMPTY_META)
    }

    /// Source file path of a model relative to the dbt models dir,
    /// when the manifest declares one.
    pub fn source_path(&self, node_id: &str) -> Option<&Path> {
        self.manifest
            .nodes
            .get(node_id)
            .and_then(|node| node.path.as_deref())
    }
}

fn lowercase_keys<V>(map: HashMap<String, V>) -> HashMap<String, V> {
    map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ProjectResult<T> {
    let content = fs::read_to_string(path).map_err(|source| ProjectError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ProjectError::JsonError {
        path: path.to_path_buf(),
        source,
    })
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> ProjectResult<T> {
    let content = fs::read_to_string(path).map_err(|source| ProjectError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ProjectError::YamlError {
        path: path.to_path_buf(),
        source,
    })
}
