//! LookML text emission.
//!
//! Renders derived entities into `.lkml` text with a fixed discipline:
//!
//! - two-space indentation;
//! - params whose key is `sql` or starts with `sql_` are emitted raw
//!   with a trailing ` ;;`;
//! - booleans become `yes` / `no`;
//! - string values are quoted, except for the identifier-valued keys
//!   in [`BARE_KEYS`];
//! - lists of identifiers are emitted bare (`[raw, time]`), anything
//!   else element-quoted;
//! - within a block, non-SQL params come first in sorted key order,
//!   then SQL params in sorted key order, then nested blocks.
//!
//! Ordering is total, so two runs over the same metadata emit
//! byte-identical files.

use crate::model::{
    Dimension, DimensionGroup, ExploreConfig, JoinConfig, Measure, ModelExport, View,
};
use serde_json::Value;
use std::collections::BTreeMap;

const INDENT: &str = "  ";

/// Keys whose string values are LookML identifiers or keywords, not
/// quoted text.
const BARE_KEYS: &[&str] = &[
    "type",
    "relationship",
    "datatype",
    "hidden",
    "value_format_name",
    "from",
];

/// Render a view file.
pub fn view(view: &View) -> String {
    let mut w = Writer::new();
    w.open(&format!("view: {}", view.name));
    w.sql_param("sql_table_name", &view.sql_table_name);
    w.args(&view.args);
    for dim in &view.dimensions {
        w.dimension(dim);
    }
    for group in &view.dimension_groups {
        w.dimension_group(group);
    }
    for measure in &view.measures {
        w.measure(measure);
    }
    w.close();
    w.finish()
}

/// Render an explore file: its include lines, then the explore block.
pub fn explore_file(includes: &[String], explore: &ExploreConfig) -> String {
    let mut w = Writer::new();
    for include in includes {
        w.line(&format!("include: {}", quote(include)));
    }
    if !includes.is_empty() {
        w.blank();
    }
    w.open(&format!("explore: {}", explore.name));
    w.args(&explore.args);
    for join in &explore.joins {
        w.join(join);
    }
    w.close();
    w.finish()
}

/// Render the aggregate model export.
pub fn model(export: &ModelExport) -> String {
    let mut w = Writer::new();
    w.line(&format!("connection: {}", quote(&export.connection)));
    for include in &export.includes {
        w.line(&format!("include: {}", quote(include)));
    }
    w.finish()
}

struct Writer {
    out: String,
    depth: usize,
}

impl Writer {
    fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, content: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(content);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth -= 1;
        self.line("}");
    }

    /// Emit a whole args map: non-SQL params sorted, then SQL params.
    fn args(&mut self, args: &BTreeMap<String, Value>) {
        for (key, value) in args.iter().filter(|(k, _)| !is_sql_key(k)) {
            self.param(key, value);
        }
        for (key, value) in args.iter().filter(|(k, _)| is_sql_key(k)) {
            self.sql_value(key, value);
        }
    }

    fn param(&mut self, key: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Bool(b) => self.line(&format!("{key}: {}", if *b { "yes" } else { "no" })),
            Value::Number(n) => self.line(&format!("{key}: {n}")),
            Value::String(s) => {
                if BARE_KEYS.contains(&key) {
                    self.line(&format!("{key}: {s}"));
                } else {
                    self.line(&format!("{key}: {}", quote(s)));
                }
            }
            Value::Array(items) => self.list(key, items),
            Value::Object(map) => {
                self.open(key);
                let nested: BTreeMap<String, Value> =
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                self.args(&nested);
                self.close();
            }
        }
    }

    fn list(&mut self, key: &str, items: &[Value]) {
        let all_identifiers = items
            .iter()
            .all(|item| matches!(item, Value::String(s) if is_identifier(s)));
        let rendered: Vec<String> = items
            .iter()
            .map(|item| match item {
                Value::String(s) if all_identifiers => s.clone(),
                Value::String(s) => quote(s),
                other => other.to_string(),
            })
            .collect();
        self.line(&format!("{key}: [{}]", rendered.join(", ")));
    }

    fn sql_value(&mut self, key: &str, value: &Value) {
        match value {
            Value::String(s) => self.sql_param(key, s),
            Value::Null => {}
            other => self.sql_param(key, &other.to_string()),
        }
    }

    fn sql_param(&mut self, key: &str, raw: &str) {
        self.line(&format!("{key}: {raw} ;;"));
    }

    fn dimension(&mut self, dim: &Dimension) {
        self.open(&format!("dimension: {}", dim.name));
        self.args(&dim.args);
        self.close();
    }

    fn dimension_group(&mut self, group: &DimensionGroup) {
        self.open(&format!("dimension_group: {}", group.name));
        for (key, value) in group.args.iter().filter(|(k, _)| !is_sql_key(k)) {
            self.param(key, value);
        }
        let timeframes: Vec<Value> = group
            .timeframes
            .iter()
            .map(|t| Value::String(t.clone()))
            .collect();
        self.list("timeframes", &timeframes);
        for (key, value) in group.args.iter().filter(|(k, _)| is_sql_key(k)) {
            self.sql_value(key, value);
        }
        self.close();
    }

    fn measure(&mut self, measure: &Measure) {
        self.open(&format!("measure: {}", measure.name));
        self.args(&measure.args);
        self.close();
    }

    fn join(&mut self, join: &JoinConfig) {
        self.open(&format!("join: {}", join.name));
        self.args(&join.args);
        self.close();
    }
}

fn is_sql_key(key: &str) -> bool {
    key == "sql" || key.starts_with("sql_")
}

/// Check if a string is a valid LookML identifier.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote a string literal with double quotes.
fn quote(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 2);
    escaped.push('"');
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}
