// src/tasks/clean.rs

use anyhow::Context;
use tracing::{debug, info};

use crate::engine::TaskContext;

use super::{Task, TaskFuture};

/// Removes a directory tree. Running it when the directory is already gone
/// succeeds.
#[derive(Debug, Clone)]
pub struct CleanTask {
    path: String,
}

impl CleanTask {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Task for CleanTask {
    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            let target = ctx.resolve(&self.path);
            if !ctx.fs().exists(&target) {
                debug!(path = %target.display(), "nothing to clean");
                return Ok(());
            }
            ctx.fs()
                .remove_dir_all(&target)
                .with_context(|| format!("cleaning {}", self.path))?;
            info!(path = %target.display(), "cleaned");
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("clean {}", self.path)
    }
}
