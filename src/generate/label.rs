// src/generate/label.rs
use inflector::Inflector;

/// Table-name prefixes stripped before titling.
const LABEL_PREFIXES: [&str; 3] = ["dim_", "fct_", "fact_"];

/// Derive a human label from a table or explore name.
///
/// Lower-cases the name; when it starts with a warehouse naming prefix
/// (`dim_`, `fct_`, `fact_`), removes every occurrence of each such
/// prefix token; then replaces underscores with spaces and title-cases
/// each word. `dim_customer_orders` becomes `Customer Orders`.
pub fn format_label(name: &str) -> String {
    let mut label = name.to_lowercase();
    if LABEL_PREFIXES.iter().any(|p| label.starts_with(p)) {
        for prefix in LABEL_PREFIXES {
            label = label.replace(prefix, "");
        }
    }
    label.replace('_', " ").to_title_case()
}

/// Field name for a column: one trailing `_at` is dropped, so
/// `created_at` surfaces as `created`.
pub fn field_name(column: &str) -> &str {
    column.strip_suffix("_at").unwrap_or(column)
}
