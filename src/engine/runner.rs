// src/engine/runner.rs

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use futures::future::{BoxFuture, join_all};
use tracing::{error, info};

use crate::errors::TaskFailure;
use crate::graph::Node;

use super::{TaskContext, TaskRegistry};

/// Interprets a [`Node`] tree against a [`TaskRegistry`].
///
/// - `Series`: children run in order; the first failure stops the series.
/// - `Parallel`: children are polled concurrently and all of them run to
///   completion. If any failed, the first failure in declaration order is
///   returned and every failure is logged.
#[derive(Clone)]
pub struct Runner {
    registry: Arc<TaskRegistry>,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("registry", &self.registry)
            .finish()
    }
}

impl Runner {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn run<'a>(
        &'a self,
        node: &'a Node,
        ctx: &'a TaskContext,
    ) -> BoxFuture<'a, Result<(), TaskFailure>> {
        Box::pin(async move {
            match node {
                Node::Task(name) => self.run_leaf(name, ctx).await,
                Node::Series(children) => {
                    for child in children {
                        self.run(child, ctx).await?;
                    }
                    Ok(())
                }
                Node::Parallel(children) => {
                    let results = join_all(children.iter().map(|c| self.run(c, ctx))).await;
                    let mut first = None;
                    for failure in results.into_iter().filter_map(Result::err) {
                        error!(task = %failure.task, "parallel branch failed: {:#}", failure.error);
                        if first.is_none() {
                            first = Some(failure);
                        }
                    }
                    match first {
                        Some(failure) => Err(failure),
                        None => Ok(()),
                    }
                }
            }
        })
    }

    async fn run_leaf(&self, name: &str, ctx: &TaskContext) -> Result<(), TaskFailure> {
        let Some(task) = self.registry.get(name) else {
            return Err(TaskFailure::new(name, anyhow!("task is not registered")));
        };

        info!(task = %name, "starting");
        let started = Instant::now();

        match task.run(ctx).await {
            Ok(()) => {
                info!(
                    task = %name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "finished"
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    task = %name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "failed: {:#}",
                    err
                );
                Err(TaskFailure::new(name, err))
            }
        }
    }
}
