// src/model/dimension.rs
use crate::model::Named;
use serde_json::Value;
use std::collections::BTreeMap;

/// Timeframe granularities attached to every dimension group, in
/// rendering order.
pub const TIMEFRAMES: [&str; 8] = [
    "raw", "time", "hour", "date", "week", "month", "quarter", "year",
];

/// A non-temporal queryable view attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    /// Field parameters: `sql`, `type`, optional `description`, plus
    /// verbatim override attributes.
    pub args: BTreeMap<String, Value>,
}

/// A temporal or duration attribute exposed at the fixed timeframe
/// granularities.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionGroup {
    pub name: String,
    pub timeframes: Vec<String>,
    pub args: BTreeMap<String, Value>,
}

impl DimensionGroup {
    /// A dimension group derives exactly like a dimension and then
    /// picks up the fixed timeframe list.
    pub fn from_dimension(dim: Dimension) -> Self {
        Self {
            name: dim.name,
            timeframes: TIMEFRAMES.iter().map(|t| t.to_string()).collect(),
            args: dim.args,
        }
    }
}

impl Named for Dimension {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for DimensionGroup {
    fn name(&self) -> &str {
        &self.name
    }
}
