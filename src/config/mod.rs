// src/config/mod.rs

//! Configuration loading and validation for assetflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate references, pipeline acyclicity and globs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{
    CleanConfig, ConfigFile, ConfigSection, FileTaskConfig, PipelineNode, RawConfigFile,
    ServeConfig, TaskConfig, WatchRuleConfig,
};
