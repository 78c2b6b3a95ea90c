//! TOML-based configuration for lookgen.
//!
//! Supports a config file (lookgen.toml) with environment variable
//! expansion.
//!
//! Example configuration:
//! ```toml
//! view_layout = "database"
//! connection = "warehouse"
//! type_mappings = "${HOME}/.config/lookgen/types.toml"
//! on_node_error = "skip"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unrecognized view layout: {0} (expected flat, dbt, or database)")]
    InvalidViewLayout(String),
}

/// Directory structure for generated views.
///
/// The output tree always has fixed `explores/` and `views/` roots;
/// this setting controls the structure within `views/`:
///
/// ```text
/// LookMLRepo/
/// ├─ explores/
/// │  ├─ lookgen.model.lkml
/// │  ├─ <model>.explore.lkml
/// ├─ views/
/// │  ├─ <model>.view.lkml
/// ```
///
/// `flat`: no subdirectories within `views/` (default).
/// `dbt`: mirror the directory structure of the dbt models dir.
/// `database`: mirror the `database/schema` layout of the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewLayout {
    #[default]
    Flat,
    Dbt,
    Database,
}

impl FromStr for ViewLayout {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(ViewLayout::Flat),
            "dbt" => Ok(ViewLayout::Dbt),
            "database" => Ok(ViewLayout::Database),
            other => Err(SettingsError::InvalidViewLayout(other.to_string())),
        }
    }
}

impl fmt::Display for ViewLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewLayout::Flat => write!(f, "flat"),
            ViewLayout::Dbt => write!(f, "dbt"),
            ViewLayout::Database => write!(f, "database"),
        }
    }
}

/// What to do when a single node fails to derive.
///
/// `abort` stops the run at the first bad node; `skip` reports the
/// failure with node/column context and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeErrorPolicy {
    #[default]
    Abort,
    Skip,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Directory structure for generated views.
    pub view_layout: ViewLayout,

    /// Connection name written to the model file.
    pub connection: String,

    /// Path to a replacement type-mapping table (supports `${ENV_VAR}`
    /// expansion). Replaces the built-in table entirely.
    pub type_mappings: Option<String>,

    /// Per-node failure policy.
    pub on_node_error: NodeErrorPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_layout: ViewLayout::default(),
            connection: "default".to_string(),
            type_mappings: None,
            on_node_error: NodeErrorPolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut settings: Settings = toml::from_str(&content)?;
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `LOOKGEN_CONFIG`
    /// 2. `./lookgen.toml`
    /// 3. `~/.config/lookgen/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("LOOKGEN_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("lookgen.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lookgen").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // No config file: defaults, still honoring env overrides
        let mut settings = Settings::default();
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// Apply environment-variable overrides on top of file values.
    ///
    /// A present-but-invalid `LOOKGEN_VIEW_LAYOUT` fails the run; an
    /// absent one leaves the configured (or default) policy in place.
    fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        if let Ok(value) = env::var("LOOKGEN_VIEW_LAYOUT") {
            self.view_layout = value.parse()?;
        }
        Ok(())
    }

    /// Get the replacement type-mapping path with environment variables
    /// expanded, if one is configured.
    pub fn resolved_type_mappings(&self) -> Result<Option<PathBuf>, SettingsError> {
        match &self.type_mappings {
            Some(raw) => Ok(Some(PathBuf::from(expand_env_vars(raw)?))),
            None => Ok(None),
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            // Check for ${VAR} or $VAR
            if chars.peek() == Some(&'{') {
                chars.next(); // consume '{'
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            } else {
                // $VAR (ends at non-alphanumeric/underscore)
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        var_name.push(chars.next().unwrap());
                    } else {
                        break;
                    }
                }
                if var_name.is_empty() {
                    // Just a lone $, keep it
                    result.push('$');
                } else {
                    let value = env::var(&var_name)
                        .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                    result.push_str(&value);
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
