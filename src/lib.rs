//! # lookgen
//!
//! Generate LookML views and explores from a dbt project's compiled
//! metadata.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │       dbt artifacts (catalog.json, manifest.json)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [project]
//! ┌─────────────────────────────────────────────────────────┐
//! │    DbtProject (normalized catalog + manifest access)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [overrides + typemap + generate]
//! ┌─────────────────────────────────────────────────────────┐
//! │  Views / Explores (dimensions, groups, measures, joins)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [layout + lkml]
//! ┌─────────────────────────────────────────────────────────┐
//! │       .view.lkml / .explore.lkml / model include file    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Modeling intent is declared once, in the dbt project's `meta`
//! mappings, under the `lookgen` namespace. The generator reads the
//! physical catalog for column names and types, the manifest for
//! descriptions and override annotations, and emits one view per model
//! plus one explore per model that declares one, along with an
//! aggregate model file listing every explore include.

pub mod config;
pub mod generate;
pub mod layout;
pub mod lkml;
pub mod model;
pub mod overrides;
pub mod project;
pub mod typemap;

pub use generate::{GenerateError, Generator, RunOptions, RunSummary};
pub use project::DbtProject;
pub use typemap::TypeMap;
