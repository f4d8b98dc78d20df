// src/engine/context.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::TaskFailure;
use crate::fs::FileSystem;
use crate::graph::Node;

use super::{Notifier, Runner, Services, TaskRegistry};

/// Everything a task may use while it runs.
///
/// Cheap to clone: watch re-runs get their own copy.
#[derive(Clone)]
pub struct TaskContext {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    notifier: Notifier,
    services: Services,
    runner: Runner,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("root", &self.root)
            .field("fs", &self.fs)
            .field("services", &self.services.len())
            .finish_non_exhaustive()
    }
}

impl TaskContext {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, registry: TaskRegistry) -> Self {
        Self {
            root: root.into(),
            fs,
            notifier: Notifier::new(),
            services: Services::new(),
            runner: Runner::new(Arc::new(registry)),
        }
    }

    /// Replace the notifier, e.g. with one a test subscribed to.
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Project root; every relative path in the config resolves against it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn fs_arc(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    /// Run `graph` with this context.
    pub async fn run_graph(&self, graph: &Node) -> Result<(), TaskFailure> {
        self.runner.run(graph, self).await
    }
}
