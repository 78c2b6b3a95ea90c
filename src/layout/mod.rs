//! Output tree layout and per-model view paths.
//!
//! The output root always carries fixed `views/` and `explores/`
//! subtrees; the [`ViewLayout`] policy only controls the structure
//! within `views/`. Path computation is pure; directory provisioning
//! happens separately and is idempotent, so a run can be repeated (or
//! parallelized) without races on `mkdir`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ViewLayout;
use crate::project::{DbtProject, ProjectError};

pub const VIEWS_DIR: &str = "views";
pub const EXPLORES_DIR: &str = "explores";
/// File name of the aggregate model export.
pub const MODEL_EXPORT_FILE: &str = "lookgen.model.lkml";

/// Error type for destination resolution.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// Resolves destinations under one output root for one run.
///
/// The policy is selected once per run and threaded in as a value; it
/// never changes mid-run.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    output_dir: PathBuf,
    layout: ViewLayout,
}

impl OutputLayout {
    pub fn new(output_dir: impl Into<PathBuf>, layout: ViewLayout) -> Self {
        Self {
            output_dir: output_dir.into(),
            layout,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn views_dir(&self) -> PathBuf {
        self.output_dir.join(VIEWS_DIR)
    }

    pub fn explores_dir(&self) -> PathBuf {
        self.output_dir.join(EXPLORES_DIR)
    }

    /// Provision the fixed output subdirectories. Idempotent.
    pub fn provision(&self) -> LayoutResult<()> {
        for dir in [self.views_dir(), self.explores_dir()] {
            fs::create_dir_all(&dir).map_err(|source| LayoutError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Output-root-relative location of a model's view file, per the
    /// active policy. Pure; touches no directories.
    pub fn view_relative_path(
        &self,
        project: &DbtProject,
        model: &str,
    ) -> LayoutResult<PathBuf> {
        let node_id = project.node_id(model);
        let subdir = match self.layout {
            ViewLayout::Flat => PathBuf::new(),
            ViewLayout::Dbt => match project.source_path(&node_id) {
                Some(path) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
                None => {
                    debug!(model, "no source path in manifest, using flat location");
                    PathBuf::new()
                }
            },
            ViewLayout::Database => {
                let meta = project.table_metadata(&node_id)?;
                let subdir = match &meta.database {
                    Some(database) => format!("{}/{}", database, meta.schema),
                    None => meta.schema.clone(),
                };
                PathBuf::from(subdir.to_lowercase())
            }
        };

        Ok(Path::new(VIEWS_DIR)
            .join(subdir)
            .join(format!("{model}.view.lkml")))
    }

    /// Absolute destination of a model's view file; creates any missing
    /// parent directories.
    pub fn view_path(&self, project: &DbtProject, model: &str) -> LayoutResult<PathBuf> {
        let path = self.output_dir.join(self.view_relative_path(project, model)?);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| LayoutError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(path)
    }

    /// Root-anchored include string for a model's view file.
    pub fn view_include(&self, project: &DbtProject, model: &str) -> LayoutResult<String> {
        let rel = self.view_relative_path(project, model)?;
        Ok(include_string(&rel))
    }

    /// Absolute destination of an explore file.
    pub fn explore_path(&self, explore_name: &str) -> PathBuf {
        self.explores_dir()
            .join(format!("{explore_name}.explore.lkml"))
    }

    /// Root-anchored include string for an explore file.
    pub fn explore_include(&self, explore_name: &str) -> String {
        format!("/{EXPLORES_DIR}/{explore_name}.explore.lkml")
    }

    /// Absolute destination of the aggregate model export.
    pub fn model_export_path(&self) -> PathBuf {
        self.explores_dir().join(MODEL_EXPORT_FILE)
    }
}

/// Render a root-anchored include path with forward slashes.
pub fn include_string(relative: &Path) -> String {
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}
