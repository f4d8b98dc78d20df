use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use assetflow::engine::{TaskContext, TaskRegistry};
use assetflow::fs::MockFileSystem;
use assetflow::tasks::{Task, TaskFuture};

/// Shared record of task invocations, in the order they started.
#[derive(Debug, Clone, Default)]
pub struct InvocationLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl InvocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.entries.lock().unwrap().push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries.lock().unwrap().iter().filter(|n| *n == name).count()
    }
}

/// A task that records its invocation, optionally sleeps, then succeeds.
pub struct RecordingTask {
    name: String,
    log: InvocationLog,
    delay: Option<Duration>,
}

impl RecordingTask {
    pub fn new(name: &str, log: &InvocationLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Task for RecordingTask {
    fn run<'a>(&'a self, _ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            self.log.record(&self.name);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("recording {}", self.name)
    }
}

/// A task that records its invocation, optionally sleeps, then fails.
pub struct FailingTask {
    name: String,
    log: InvocationLog,
    delay: Option<Duration>,
}

impl FailingTask {
    pub fn new(name: &str, log: &InvocationLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Task for FailingTask {
    fn run<'a>(&'a self, _ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            self.log.record(&self.name);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Err(anyhow!("{} failed on purpose", self.name))
        })
    }

    fn describe(&self) -> String {
        format!("failing {}", self.name)
    }
}

/// Registry with one `RecordingTask` per name, sharing `log`.
pub fn recording_registry(names: &[&str], log: &InvocationLog) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    for name in names {
        registry
            .register(*name, Arc::new(RecordingTask::new(name, log)))
            .expect("unique task names");
    }
    registry
}

/// Context over an empty in-memory filesystem rooted at `"."`.
pub fn mock_context(registry: TaskRegistry) -> (TaskContext, MockFileSystem) {
    let fs = MockFileSystem::new();
    let ctx = TaskContext::new(".", Arc::new(fs.clone()), registry);
    (ctx, fs)
}
