//! Physical-to-LookML type mapping.
//!
//! Every physical column type must resolve to a LookML field type; an
//! unmapped type is a hard failure for the affected node, never a
//! silent default. The built-in table covers the Snowflake type
//! surface. A replacement table can be loaded from a TOML file and
//! fully shadows the built-in one:
//!
//! ```toml
//! [types.JSONB]
//! type = "string"
//!
//! [types.TIMESTAMPTZ]
//! type = "time"
//! sql = "CAST(${TABLE}.\"{name}\" AS TIMESTAMP)"
//! ```

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// LookML types rendered as dimension groups rather than dimensions.
const TIMEFRAME_TYPES: &[&str] = &["time", "duration"];

/// Error type for type-mapping resolution and loading.
#[derive(Debug, thiserror::Error)]
pub enum TypeMapError {
    #[error("no type mapping for physical type `{0}`")]
    Unmapped(String),

    #[error("Failed to read type mappings {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse type mappings {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// One mapping entry: the LookML field type plus an optional SQL
/// rewrite template. `{name}` in the template is replaced with the
/// physical column name; `${TABLE}` passes through for the modeling
/// layer to resolve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeMapping {
    #[serde(rename = "type")]
    pub looker_type: String,
    #[serde(default)]
    pub sql: Option<String>,
}

impl TypeMapping {
    /// Whether columns of this type become dimension groups.
    pub fn is_timeframe(&self) -> bool {
        TIMEFRAME_TYPES.contains(&self.looker_type.as_str())
    }

    /// SQL expression for a physical column: the rewrite template when
    /// one exists, otherwise a quoted column reference.
    pub fn render_sql(&self, physical_name: &str) -> String {
        match &self.sql {
            Some(template) => template.replace("{name}", physical_name),
            None => format!("${{TABLE}}.\"{}\"", physical_name),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TypeMapFile {
    types: BTreeMap<String, TypeMapping>,
}

/// Lookup table from physical type strings to [`TypeMapping`] entries.
#[derive(Debug, Clone)]
pub struct TypeMap {
    entries: BTreeMap<String, TypeMapping>,
}

impl TypeMap {
    /// The built-in Snowflake table.
    pub fn builtin() -> &'static TypeMap {
        &BUILTIN
    }

    /// Load a replacement table from a TOML file. The result replaces
    /// the built-in table entirely; it is not merged with it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TypeMap, TypeMapError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TypeMapError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| TypeMapError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a replacement table from TOML text.
    pub fn from_toml_str(content: &str) -> Result<TypeMap, toml::de::Error> {
        let file: TypeMapFile = toml::from_str(content)?;
        Ok(TypeMap {
            entries: file.types,
        })
    }

    /// Resolve a physical type. Missing entries are an error; callers
    /// must not fall back to a default type.
    pub fn resolve(&self, physical: &str) -> Result<&TypeMapping, TypeMapError> {
        self.entries
            .get(physical)
            .ok_or_else(|| TypeMapError::Unmapped(physical.to_string()))
    }
}

/// UTC normalization applied to timezone-carrying Snowflake timestamps.
const UTC_CAST: &str = "CAST(CONVERT_TIMEZONE('UTC', ${TABLE}.\"{name}\") AS TIMESTAMP_NTZ)";

static BUILTIN: Lazy<TypeMap> = Lazy::new(|| {
    let mut entries = BTreeMap::new();

    let mut insert = |types: &[&str], looker_type: &str, sql: Option<&str>| {
        for t in types {
            entries.insert(
                t.to_string(),
                TypeMapping {
                    looker_type: looker_type.to_string(),
                    sql: sql.map(str::to_string),
                },
            );
        }
    };

    insert(
        &[
            "NUMBER",
            "DECIMAL",
            "NUMERIC",
            "INT",
            "INTEGER",
            "BIGINT",
            "SMALLINT",
            "FLOAT",
            "FLOAT4",
            "FLOAT8",
            "DOUBLE",
            "DOUBLE PRECISION",
            "REAL",
        ],
        "number",
        None,
    );
    insert(
        &[
            "VARCHAR",
            "CHAR",
            "CHARACTER",
            "STRING",
            "TEXT",
            "BINARY",
            "VARBINARY",
            "TIME",
            "VARIANT",
            "OBJECT",
            "ARRAY",
            "GEOGRAPHY",
        ],
        "string",
        None,
    );
    insert(&["BOOLEAN"], "yesno", None);
    insert(&["DATE", "DATETIME", "TIMESTAMP", "TIMESTAMP_NTZ"], "time", None);
    insert(&["TIMESTAMP_TZ", "TIMESTAMP_LTZ"], "time", Some(UTC_CAST));

    TypeMap { entries }
});
