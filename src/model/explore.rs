// src/model/explore.rs
use crate::model::Named;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One join within an explore.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinConfig {
    pub name: String,
    pub args: BTreeMap<String, Value>,
    /// Output-root-relative path of the joined view, for `include:`
    /// lines in the explore file.
    pub relative_path: PathBuf,
}

impl JoinConfig {
    /// The view this join actually reads from: an explicit `from`
    /// override, or the join name itself.
    pub fn import_name(&self) -> &str {
        self.args
            .get("from")
            .and_then(Value::as_str)
            .unwrap_or(&self.name)
    }
}

/// A query surface: one base view plus zero or more joins.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreConfig {
    /// Explore identity; differs from the model name when aliased.
    pub name: String,
    pub joins: Vec<JoinConfig>,
    pub args: BTreeMap<String, Value>,
}

impl ExploreConfig {
    /// The underlying base view: the `from` attribute recorded when the
    /// explore is aliased, or the explore name itself.
    pub fn import_name(&self) -> &str {
        self.args
            .get("from")
            .and_then(Value::as_str)
            .unwrap_or(&self.name)
    }
}

/// The aggregate model export: connection name plus every explore
/// include path, sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelExport {
    pub connection: String,
    pub includes: Vec<String>,
}

impl Named for JoinConfig {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ExploreConfig {
    fn name(&self) -> &str {
        &self.name
    }
}
