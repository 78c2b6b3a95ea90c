//! Field derivation and view/explore assembly.
//!
//! This is the pipeline from normalized dbt metadata to LookML
//! entities:
//!
//! ```text
//! catalog columns ──► classify ──► dimensions / dimension groups
//! manifest columns ─► overrides ─► synthetic dimensions + measures
//! table overrides ──► view args, explore + joins
//! ```
//!
//! Every physical column becomes exactly one of {dimension, dimension
//! group, excluded}. Declared override attributes always win over
//! inferred ones. Field collections are sorted by name before
//! serialization so repeated runs are byte-identical.

mod label;

pub use label::{field_name, format_label};

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::NodeErrorPolicy;
use crate::layout::{include_string, LayoutError, OutputLayout};
use crate::model::{
    by_name, Dimension, DimensionGroup, ExploreConfig, JoinConfig, Measure, ModelExport, View,
};
use crate::overrides::{ColumnOverrides, ExploreSpec, OverrideError, TableOverrides};
use crate::project::{CatalogColumn, DbtProject, ManifestColumn, ProjectError};
use crate::typemap::{TypeMap, TypeMapError};

/// Errors raised while deriving entities for a node. Each carries
/// enough context (node identifier, column name) to diagnose without
/// re-running under tracing.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("node {node}, column {column}: {source}")]
    ColumnType {
        node: String,
        column: String,
        #[source]
        source: TypeMapError,
    },

    #[error("node {node}: invalid table overrides: {source}")]
    TableOverrides {
        node: String,
        #[source]
        source: OverrideError,
    },

    #[error("node {node}, column {column}: invalid overrides: {source}")]
    ColumnOverrides {
        node: String,
        column: String,
        #[source]
        source: OverrideError,
    },

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type GenerateResult<T> = Result<T, GenerateError>;

/// How a physical column projects into the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Dimension,
    DimensionGroup,
    Excluded,
}

/// An explore ready for emission: its include lines plus the explore
/// itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreFile {
    pub includes: Vec<String>,
    pub explore: ExploreConfig,
}

/// Derives LookML entities from one project's metadata.
pub struct Generator<'a> {
    project: &'a DbtProject,
    types: &'a TypeMap,
}

impl<'a> Generator<'a> {
    pub fn new(project: &'a DbtProject, types: &'a TypeMap) -> Self {
        Self { project, types }
    }

    /// Classify a physical column. `ignore-dim` wins before type
    /// resolution, so an override can park a column whose type the
    /// active table does not cover.
    pub fn classify(
        &self,
        column: &CatalogColumn,
        overrides: &ColumnOverrides,
    ) -> Result<FieldClass, TypeMapError> {
        if overrides.ignore_dim {
            return Ok(FieldClass::Excluded);
        }
        let mapping = self.types.resolve(&column.column_type)?;
        Ok(if mapping.is_timeframe() {
            FieldClass::DimensionGroup
        } else {
            FieldClass::Dimension
        })
    }

    /// Derive a dimension from a physical column: inferred `sql` +
    /// `type`, manifest description when non-empty, declared override
    /// attributes merged on top.
    pub fn build_dimension(
        &self,
        column_name: &str,
        column: &CatalogColumn,
        manifest_col: Option<&ManifestColumn>,
        overrides: &ColumnOverrides,
    ) -> Result<Dimension, TypeMapError> {
        let mapping = self.types.resolve(&column.column_type)?;

        let mut args = BTreeMap::new();
        args.insert(
            "sql".to_string(),
            Value::String(mapping.render_sql(&column.name)),
        );
        args.insert(
            "type".to_string(),
            Value::String(mapping.looker_type.clone()),
        );
        if let Some(col) = manifest_col {
            if !col.description.is_empty() {
                args.insert(
                    "description".to_string(),
                    Value::String(col.description.clone()),
                );
            }
        }
        // declared attributes win over inferred ones
        for (key, value) in &overrides.extra {
            args.insert(key.clone(), value.clone());
        }

        Ok(Dimension {
            name: field_name(column_name).to_string(),
            args,
        })
    }

    /// Derive a dimension group: same derivation as a dimension plus
    /// the fixed timeframe list.
    pub fn build_dimension_group(
        &self,
        column_name: &str,
        column: &CatalogColumn,
        manifest_col: Option<&ManifestColumn>,
        overrides: &ColumnOverrides,
    ) -> Result<DimensionGroup, TypeMapError> {
        let dim = self.build_dimension(column_name, column, manifest_col, overrides)?;
        Ok(DimensionGroup::from_dimension(dim))
    }

    /// Derive a dimension for a manifest-only column. Nothing is
    /// inferred: the declared attributes plus the description are all
    /// it has, since there is no physical column to project to SQL.
    pub fn build_synthetic_dimension(
        &self,
        column_name: &str,
        manifest_col: &ManifestColumn,
        overrides: &ColumnOverrides,
    ) -> Dimension {
        let mut args = overrides.extra.clone();
        if !manifest_col.description.is_empty() {
            args.entry("description".to_string())
                .or_insert_with(|| Value::String(manifest_col.description.clone()));
        }
        Dimension {
            name: field_name(column_name).to_string(),
            args,
        }
    }

    /// Measures declared on one column. Each carries its declared
    /// attributes verbatim (minus `name`), the column's description
    /// when present, and a fixed reference to the owning column.
    pub fn build_measures(
        &self,
        column_name: &str,
        manifest_col: &ManifestColumn,
        overrides: &ColumnOverrides,
    ) -> Vec<Measure> {
        overrides
            .measures
            .iter()
            .map(|spec| {
                let mut args = spec.args.clone();
                if !manifest_col.description.is_empty() {
                    args.entry("description".to_string())
                        .or_insert_with(|| Value::String(manifest_col.description.clone()));
                }
                args.insert(
                    "sql".to_string(),
                    Value::String(format!("${{{column_name}}}")),
                );
                Measure {
                    name: spec.name.clone(),
                    args,
                }
            })
            .collect()
    }

    /// The implicit row-count measure every view receives.
    pub fn count_measure() -> Measure {
        let mut args = BTreeMap::new();
        args.insert("type".to_string(), Value::String("count".to_string()));
        Measure {
            name: "count".to_string(),
            args,
        }
    }

    /// Assemble the view for one node: classified physical columns,
    /// synthetic dimensions, declared + implicit measures, table-level
    /// attributes, and the resolved destination path.
    pub fn build_view(&self, node_id: &str, layout: &OutputLayout) -> GenerateResult<View> {
        let catalog_node = self.project.catalog_node(node_id)?;
        let table_overrides = TableOverrides::parse(self.project.table_meta(node_id))
            .map_err(|source| GenerateError::TableOverrides {
                node: node_id.to_string(),
                source,
            })?;

        let mut dimensions = Vec::new();
        let mut dimension_groups = Vec::new();

        let mut column_names: Vec<&String> = catalog_node.columns.keys().collect();
        column_names.sort_unstable();

        for column_name in column_names {
            let column = &catalog_node.columns[column_name];
            let manifest_col = self.project.manifest_column(node_id, column_name);
            let overrides = self.column_overrides(node_id, column_name, manifest_col)?;

            let class = self
                .classify(column, &overrides)
                .map_err(|source| GenerateError::ColumnType {
                    node: node_id.to_string(),
                    column: column_name.clone(),
                    source,
                })?;
            match class {
                FieldClass::Dimension => {
                    let dim = self
                        .build_dimension(column_name, column, manifest_col, &overrides)
                        .map_err(|source| GenerateError::ColumnType {
                            node: node_id.to_string(),
                            column: column_name.clone(),
                            source,
                        })?;
                    dimensions.push(dim);
                }
                FieldClass::DimensionGroup => {
                    let group = self
                        .build_dimension_group(column_name, column, manifest_col, &overrides)
                        .map_err(|source| GenerateError::ColumnType {
                            node: node_id.to_string(),
                            column: column_name.clone(),
                            source,
                        })?;
                    dimension_groups.push(group);
                }
                FieldClass::Excluded => {
                    debug!(node = node_id, column = %column_name, "column excluded by override");
                }
            }
        }

        // manifest-declared columns: measures, plus synthetic dimensions
        // for columns the warehouse does not know about
        let mut measures = vec![Self::count_measure()];
        let manifest_columns = self.project.manifest_columns(node_id);
        let mut declared_names: Vec<&String> = manifest_columns.keys().collect();
        declared_names.sort_unstable();

        for column_name in declared_names {
            let manifest_col = &manifest_columns[column_name];
            let overrides = self.column_overrides(node_id, column_name, Some(manifest_col))?;

            measures.extend(self.build_measures(column_name, manifest_col, &overrides));

            if !catalog_node.columns.contains_key(column_name) {
                if overrides.declares_synthetic_dimension() {
                    dimensions.push(self.build_synthetic_dimension(
                        column_name,
                        manifest_col,
                        &overrides,
                    ));
                } else {
                    // not projectable to SQL without a physical column
                    debug!(
                        node = node_id,
                        column = %column_name,
                        "manifest column absent from catalog, omitted"
                    );
                }
            }
        }

        dimensions.sort_by(by_name);
        dimension_groups.sort_by(by_name);
        measures.sort_by(by_name);

        let meta = &catalog_node.metadata;
        let mut args = table_overrides.extra;
        args.entry("view_label".to_string())
            .or_insert_with(|| Value::String(format_label(&meta.name)));

        let model = DbtProject::model_name(node_id)?;
        let file_path = layout.view_path(self.project, model)?;

        Ok(View {
            name: meta.name.to_lowercase(),
            sql_table_name: format!("\"{}\".\"{}\"", meta.schema, meta.name),
            dimensions,
            dimension_groups,
            measures,
            args,
            file_path,
        })
    }

    /// Build the explore for one model from its declared spec. Aliased
    /// explores record a `from:` back to the underlying view; a label
    /// is derived from the explore identity when none is declared.
    pub fn build_explore(
        &self,
        model: &str,
        spec: ExploreSpec,
        layout: &OutputLayout,
    ) -> GenerateResult<ExploreConfig> {
        let ExploreSpec {
            name,
            joins,
            mut args,
        } = spec;

        let explore_name = match name {
            Some(alias) => {
                args.insert("from".to_string(), Value::String(model.to_string()));
                alias
            }
            None => model.to_string(),
        };
        if !args.contains_key("label") {
            args.insert(
                "label".to_string(),
                Value::String(format_label(&explore_name)),
            );
        }

        let mut join_configs = Vec::with_capacity(joins.len());
        for join in joins {
            let target = join
                .args
                .get("from")
                .and_then(Value::as_str)
                .unwrap_or(&join.name)
                .to_string();
            let relative_path = layout.view_relative_path(self.project, &target)?;
            join_configs.push(JoinConfig {
                name: join.name,
                args: join.args,
                relative_path,
            });
        }
        join_configs.sort_by(by_name);

        Ok(ExploreConfig {
            name: explore_name,
            joins: join_configs,
            args,
        })
    }

    /// Wrap an explore with the include lines its file needs: the base
    /// view plus each joined view, sorted and deduplicated.
    pub fn build_explore_file(
        &self,
        explore: ExploreConfig,
        layout: &OutputLayout,
    ) -> GenerateResult<ExploreFile> {
        let mut includes = vec![layout.view_include(self.project, explore.import_name())?];
        for join in &explore.joins {
            includes.push(include_string(&join.relative_path));
        }
        includes.sort_unstable();
        includes.dedup();
        Ok(ExploreFile { includes, explore })
    }

    /// Every explore declared anywhere in the manifest, keyed by model
    /// name. The aggregate export indexes all of them, not only the
    /// models selected for this run.
    pub fn declared_explores(&self) -> BTreeMap<String, ExploreSpec> {
        let mut explores = BTreeMap::new();
        for node_id in self.project.manifest_node_ids() {
            let Ok(model) = DbtProject::model_name(node_id) else {
                continue;
            };
            match TableOverrides::parse(self.project.table_meta(node_id)) {
                Ok(overrides) => {
                    if let Some(spec) = overrides.explore {
                        explores.insert(model.to_string(), spec);
                    }
                }
                // surfaced with full context when the node is processed
                Err(err) => {
                    warn!(node = node_id, error = %err, "skipping explore with invalid overrides");
                }
            }
        }
        explores
    }

    /// The aggregate model export: connection plus sorted includes for
    /// every declared explore.
    pub fn build_model_export(
        &self,
        connection: &str,
        explores: &BTreeMap<String, ExploreSpec>,
        layout: &OutputLayout,
    ) -> ModelExport {
        let mut includes: Vec<String> = explores
            .iter()
            .map(|(model, spec)| {
                let name = spec.name.as_deref().unwrap_or(model);
                layout.explore_include(name)
            })
            .collect();
        includes.sort_unstable();
        ModelExport {
            connection: connection.to_string(),
            includes,
        }
    }

    fn column_overrides(
        &self,
        node_id: &str,
        column_name: &str,
        manifest_col: Option<&ManifestColumn>,
    ) -> GenerateResult<ColumnOverrides> {
        match manifest_col {
            Some(col) => ColumnOverrides::parse(&col.meta).map_err(|source| {
                GenerateError::ColumnOverrides {
                    node: node_id.to_string(),
                    column: column_name.to_string(),
                    source,
                }
            }),
            None => Ok(ColumnOverrides::default()),
        }
    }
}

/// Options for one generation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Only these models (lowercased names); `None` means every
    /// catalog node.
    pub models: Option<Vec<String>>,
    /// Only models in these schemas (lowercased); `None` means all.
    pub schemas: Option<Vec<String>>,
    /// Connection name written to the model export.
    pub connection: String,
    /// Per-node failure policy.
    pub on_node_error: NodeErrorPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            models: None,
            schemas: None,
            connection: "default".to_string(),
            on_node_error: NodeErrorPolicy::default(),
        }
    }
}

/// Outcome of one generation run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub views_written: usize,
    pub explores_written: usize,
    /// Nodes that failed under the `skip` policy, with their errors.
    pub failed_nodes: Vec<(String, GenerateError)>,
}

struct ProcessedNode {
    explore_written: bool,
}

/// Run the whole pipeline: derive and write a view (and explore, when
/// declared) per selected node, then the aggregate model export.
///
/// Failed runs leave previously written files in place; there is no
/// transactional cleanup and no retry.
pub fn run(
    project: &DbtProject,
    types: &TypeMap,
    layout: &OutputLayout,
    options: &RunOptions,
) -> GenerateResult<RunSummary> {
    layout.provision()?;

    let generator = Generator::new(project, types);
    let mut summary = RunSummary::default();

    let explore_specs = generator.declared_explores();

    let node_ids: Vec<String> = match &options.models {
        Some(models) => {
            let mut ids: Vec<String> = models.iter().map(|m| project.node_id(m)).collect();
            ids.sort_unstable();
            ids
        }
        None => project.node_ids().iter().map(|s| s.to_string()).collect(),
    };

    for node_id in &node_ids {
        match process_node(&generator, project, layout, options, node_id, &explore_specs) {
            Ok(Some(outcome)) => {
                summary.views_written += 1;
                if outcome.explore_written {
                    summary.explores_written += 1;
                }
            }
            Ok(None) => {}
            Err(err) => match options.on_node_error {
                NodeErrorPolicy::Abort => return Err(err),
                NodeErrorPolicy::Skip => {
                    error!(node = %node_id, error = %err, "node failed, skipping");
                    summary.failed_nodes.push((node_id.clone(), err));
                }
            },
        }
    }

    let export = generator.build_model_export(&options.connection, &explore_specs, layout);
    let export_path = layout.model_export_path();
    fs::write(&export_path, crate::lkml::model(&export)).map_err(|source| {
        GenerateError::WriteError {
            path: export_path,
            source,
        }
    })?;

    Ok(summary)
}

fn process_node(
    generator: &Generator<'_>,
    project: &DbtProject,
    layout: &OutputLayout,
    options: &RunOptions,
    node_id: &str,
    explore_specs: &BTreeMap<String, ExploreSpec>,
) -> GenerateResult<Option<ProcessedNode>> {
    if let Some(schemas) = &options.schemas {
        let schema = project.table_metadata(node_id)?.schema.to_lowercase();
        if !schemas.contains(&schema) {
            debug!(node = node_id, %schema, "schema does not match targets, skipping");
            return Ok(None);
        }
    }

    debug!(node = node_id, "deriving view");
    let view = generator.build_view(node_id, layout)?;
    fs::write(&view.file_path, crate::lkml::view(&view)).map_err(|source| {
        GenerateError::WriteError {
            path: view.file_path.clone(),
            source,
        }
    })?;

    let model = DbtProject::model_name(node_id)?;
    let mut explore_written = false;
    if let Some(spec) = explore_specs.get(model) {
        debug!(node = node_id, "deriving explore");
        let explore = generator.build_explore(model, spec.clone(), layout)?;
        let file = generator.build_explore_file(explore, layout)?;
        let path = layout.explore_path(&file.explore.name);
        fs::write(&path, crate::lkml::explore_file(&file.includes, &file.explore))
            .map_err(|source| GenerateError::WriteError { path, source })?;
        explore_written = true;
    }

    Ok(Some(ProcessedNode { explore_written }))
}
