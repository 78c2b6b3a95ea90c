// src/model/measure.rs
use crate::model::Named;
use serde_json::Value;
use std::collections::BTreeMap;

/// An aggregate computation over a view's rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub name: String,
    /// `type`, `sql`, optional inherited `description`, plus verbatim
    /// declared attributes.
    pub args: BTreeMap<String, Value>,
}

impl Named for Measure {
    fn name(&self) -> &str {
        &self.name
    }
}
