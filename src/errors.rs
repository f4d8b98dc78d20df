// src/errors.rs

//! Crate-wide error types.
//!
//! Startup problems (config, registry, graph) are [`AssetflowError`]s. A task
//! that fails while a graph runs is a [`TaskFailure`], the only runtime error
//! kind.

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task registered twice: {0}")]
    DuplicateTask(String),

    #[error("Cycle detected in pipelines: {0}")]
    PipelineCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Failed(#[from] TaskFailure),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A leaf task could not read its input, write its output, or its
/// transformation reported an error.
#[derive(Error, Debug)]
#[error("task '{task}' failed: {error:#}")]
pub struct TaskFailure {
    pub task: TaskName,
    pub error: anyhow::Error,
}

impl TaskFailure {
    pub fn new(task: impl Into<TaskName>, error: anyhow::Error) -> Self {
        Self {
            task: task.into(),
            error,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
