// src/model/view.rs
use crate::model::{Dimension, DimensionGroup, Measure};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The modeling-layer representation of one physical table.
///
/// Field collections are kept name-sorted so serialization is
/// byte-stable across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    /// Qualified physical reference, e.g. `"ANALYTICS"."ORDERS"`.
    pub sql_table_name: String,
    pub dimensions: Vec<Dimension>,
    pub dimension_groups: Vec<DimensionGroup>,
    pub measures: Vec<Measure>,
    /// Table-level override attributes (including the `view_label`
    /// default when none was declared).
    pub args: BTreeMap<String, Value>,
    /// Resolved destination of the view file.
    pub file_path: PathBuf,
}
