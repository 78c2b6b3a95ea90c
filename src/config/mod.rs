//! Configuration module for lookgen.
//!
//! Handles the settings file, environment variables, and the output
//! layout policy selection.

mod settings;

pub use settings::{
    expand_env_vars, NodeErrorPolicy, Settings, SettingsError, ViewLayout,
};
