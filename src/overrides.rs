//! The `lookgen` override namespace.
//!
//! Modeling intent lives under a single well-known key of a dbt `meta`
//! mapping: `meta.lookgen` on columns, `config.meta.lookgen` on nodes.
//! The namespace holds a handful of recognized directives plus
//! arbitrary passthrough attributes that are merged verbatim onto the
//! derived entity:
//!
//! ```yaml
//! columns:
//!   - name: status
//!     meta:
//!       lookgen:
//!         type: yesno            # passthrough, overrides the inferred type
//!         measures:
//!           - name: open_orders
//!             type: count_distinct
//! ```
//!
//! Directives are parsed once per node into the typed structures below;
//! a structurally malformed directive (a measure or join without a
//! `name`, a wrong-typed flag) is an [`OverrideError`], scoped to the
//! node that declared it.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Well-known key under a dbt `meta` mapping.
pub const META_KEY: &str = "lookgen";

const IGNORE_DIM: &str = "ignore-dim";
const MEASURES: &str = "measures";
const METADATA_ONLY: &str = "metadata-only";
const FIELD_KIND: &str = "field-kind";
const EXPLORE: &str = "explore";

/// Field kind accepted for metadata-only columns.
const FIELD_KIND_DIMENSION: &str = "dimension";

#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("`{META_KEY}` namespace is not a mapping")]
    NamespaceNotAMapping,

    #[error("directive `{key}` expects {expected}")]
    InvalidDirective {
        key: &'static str,
        expected: &'static str,
    },

    #[error("measure entry is missing a `name`")]
    MissingMeasureName,

    #[error("join entry is missing a `name`")]
    MissingJoinName,
}

/// Parsed column-level overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnOverrides {
    /// Exclude the column from dimension/dimension-group derivation.
    pub ignore_dim: bool,
    /// Declared measure specs for this column.
    pub measures: Vec<MeasureSpec>,
    /// Column exists only in the manifest, not the warehouse.
    pub metadata_only: bool,
    /// Field kind for metadata-only columns.
    pub field_kind: Option<String>,
    /// Passthrough attributes, merged verbatim onto the derived field.
    pub extra: BTreeMap<String, Value>,
}

/// One declared measure: its identity plus verbatim attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureSpec {
    pub name: String,
    pub args: BTreeMap<String, Value>,
}

/// Parsed table-level overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableOverrides {
    /// Explore declaration; absent means the model gets no explore.
    pub explore: Option<ExploreSpec>,
    /// Passthrough attributes, merged verbatim onto the view.
    pub extra: BTreeMap<String, Value>,
}

/// A declared explore: optional aliasing name, joins, and attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExploreSpec {
    pub name: Option<String>,
    pub joins: Vec<JoinSpec>,
    pub args: BTreeMap<String, Value>,
}

/// One declared join: target name plus verbatim attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub name: String,
    pub args: BTreeMap<String, Value>,
}

impl ColumnOverrides {
    /// Parse the `lookgen` section of a column's meta mapping.
    /// An absent section yields the empty default.
    pub fn parse(meta: &Map<String, Value>) -> Result<Self, OverrideError> {
        let Some(section) = meta.get(META_KEY) else {
            return Ok(Self::default());
        };
        let section = section
            .as_object()
            .ok_or(OverrideError::NamespaceNotAMapping)?;

        let mut out = Self::default();
        for (key, value) in section {
            match key.as_str() {
                IGNORE_DIM => out.ignore_dim = expect_bool(IGNORE_DIM, value)?,
                METADATA_ONLY => out.metadata_only = expect_bool(METADATA_ONLY, value)?,
                FIELD_KIND => {
                    out.field_kind = Some(expect_str(FIELD_KIND, value)?.to_string());
                }
                MEASURES => out.measures = parse_measures(value)?,
                _ => {
                    out.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(out)
    }

    /// True when the column is declared metadata-only with a field kind
    /// the generator knows how to project.
    pub fn declares_synthetic_dimension(&self) -> bool {
        self.metadata_only && self.field_kind.as_deref() == Some(FIELD_KIND_DIMENSION)
    }
}

impl TableOverrides {
    /// Parse the `lookgen` section of a node's config meta mapping.
    pub fn parse(meta: &Map<String, Value>) -> Result<Self, OverrideError> {
        let Some(section) = meta.get(META_KEY) else {
            return Ok(Self::default());
        };
        let section = section
            .as_object()
            .ok_or(OverrideError::NamespaceNotAMapping)?;

        let mut out = Self::default();
        for (key, value) in section {
            match key.as_str() {
                EXPLORE => out.explore = Some(ExploreSpec::parse(value)?),
                _ => {
                    out.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(out)
    }
}

impl ExploreSpec {
    fn parse(value: &Value) -> Result<Self, OverrideError> {
        let section = value.as_object().ok_or(OverrideError::InvalidDirective {
            key: EXPLORE,
            expected: "a mapping",
        })?;

        let mut out = Self::default();
        for (key, value) in section {
            match key.as_str() {
                "name" => out.name = Some(expect_str("name", value)?.to_string()),
                "joins" => out.joins = parse_joins(value)?,
                _ => {
                    out.args.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(out)
    }
}

fn parse_measures(value: &Value) -> Result<Vec<MeasureSpec>, OverrideError> {
    let entries = match value {
        // a declared-but-empty list is the same as no list
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        _ => {
            return Err(OverrideError::InvalidDirective {
                key: MEASURES,
                expected: "a list of measure mappings",
            })
        }
    };

    entries
        .iter()
        .map(|entry| {
            let spec = entry.as_object().ok_or(OverrideError::InvalidDirective {
                key: MEASURES,
                expected: "a list of measure mappings",
            })?;
            let name = spec
                .get("name")
                .and_then(Value::as_str)
                .ok_or(OverrideError::MissingMeasureName)?;
            let args = spec
                .iter()
                .filter(|(key, _)| key.as_str() != "name")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Ok(MeasureSpec {
                name: name.to_string(),
                args,
            })
        })
        .collect()
}

fn parse_joins(value: &Value) -> Result<Vec<JoinSpec>, OverrideError> {
    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        _ => {
            return Err(OverrideError::InvalidDirective {
                key: "joins",
                expected: "a list of join mappings",
            })
        }
    };

    entries
        .iter()
        .map(|entry| {
            let spec = entry.as_object().ok_or(OverrideError::InvalidDirective {
                key: "joins",
                expected: "a list of join mappings",
            })?;
            let name = spec
                .get("name")
                .and_then(Value::as_str)
                .ok_or(OverrideError::MissingJoinName)?;
            let args = spec
                .iter()
                .filter(|(key, _)| key.as_str() != "name")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Ok(JoinSpec {
                name: name.to_string(),
                args,
            })
        })
        .collect()
}

fn expect_bool(key: &'static str, value: &Value) -> Result<bool, OverrideError> {
    value.as_bool().ok_or(OverrideError::InvalidDirective {
        key,
        expected: "a boolean",
    })
}

fn expect_str<'a>(key: &'static str, value: &'a Value) -> Result<&'a str, OverrideError> {
    value.as_str().ok_or(OverrideError::InvalidDirective {
        key,
        expected: "a string",
    })
}
