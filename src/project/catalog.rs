// src/project/catalog.rs
use serde::Deserialize;
use std::collections::HashMap;

/// The compiled catalog artifact: physical metadata per node, as
/// reported by the warehouse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub nodes: HashMap<String, CatalogNode>,
}

/// One table's physical metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogNode {
    pub metadata: TableMetadata,
    #[serde(default)]
    pub columns: HashMap<String, CatalogColumn>,
}

/// Physical identity of a table.
#[derive(Debug, Clone, Deserialize)]
pub struct TableMetadata {
    /// Relation kind (BASE TABLE, VIEW, ...).
    #[serde(rename = "type", default)]
    pub table_type: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One column as it exists in the warehouse.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogColumn {
    /// Physical type string, e.g. `NUMBER` or `TIMESTAMP_TZ`.
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub index: Option<u32>,
    /// Physical column name with the warehouse's original casing.
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}
