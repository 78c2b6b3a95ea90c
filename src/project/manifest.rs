// src/project/manifest.rs
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// The declaration manifest artifact: descriptions and override
/// annotations per node, independent of physical execution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub nodes: HashMap<String, ManifestNode>,
}

/// One modeled table as declared in the dbt project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ManifestNode {
    pub database: Option<String>,
    pub schema: Option<String>,
    /// Source file path relative to the dbt models directory.
    pub path: Option<PathBuf>,
    pub config: NodeConfig,
    pub columns: HashMap<String, ManifestColumn>,
    pub description: String,
}

/// Node-level configuration; only the `meta` mapping matters here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub meta: Map<String, Value>,
}

/// One declared column: description plus its `meta` mapping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ManifestColumn {
    pub name: String,
    pub description: String,
    pub meta: Map<String, Value>,
}
