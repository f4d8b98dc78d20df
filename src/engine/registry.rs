// src/engine/registry.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::{AssetflowError, Result};
use crate::graph::Node;
use crate::tasks::{Task, build_task};

use super::TaskName;

/// All tasks known to a run, by name.
///
/// Built once at startup; the runner only ever reads it.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Arc<dyn Task>>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one task per `[task.<name>]` section.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut registry = Self::new();
        for (name, task_cfg) in cfg.tasks() {
            let task = build_task(cfg, name, task_cfg)?;
            debug!(task = %name, kind = task_cfg.kind(), "registered task");
            registry.register(name.clone(), task)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<TaskName>, task: Arc<dyn Task>) -> Result<()> {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(AssetflowError::DuplicateTask(name));
        }
        self.tasks.insert(name, task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Task>)> {
        self.tasks.iter().map(|(name, task)| (name.as_str(), task))
    }

    /// Fail with `TaskNotFound` if any leaf of `graph` is not registered.
    pub fn check_graph(&self, graph: &Node) -> Result<()> {
        for leaf in graph.leaves() {
            if !self.contains(leaf) {
                return Err(AssetflowError::TaskNotFound(leaf.to_string()));
            }
        }
        Ok(())
    }
}
