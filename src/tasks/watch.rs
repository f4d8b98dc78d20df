// src/tasks/watch.rs

use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::engine::TaskContext;
use crate::errors::Result;
use crate::watch::{WatchRule, build_watch_rules, rerun_rule, spawn_watcher};

use super::{Task, TaskFuture};

/// Registers every watch rule and re-runs their graphs on change until
/// shutdown. Each re-run is spawned on its own tokio task, independent of
/// any build still in progress.
#[derive(Debug, Clone)]
pub struct WatchTask {
    rules: Arc<Vec<WatchRule>>,
}

impl WatchTask {
    pub fn new(rules: Vec<WatchRule>) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Ok(Self::new(build_watch_rules(cfg)?))
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Watch until `shutdown` resolves, then stop the context's background
    /// services.
    pub async fn watch_until<F>(&self, ctx: &TaskContext, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _watcher = spawn_watcher(ctx.root(), Arc::clone(&self.rules), ctx.fs_arc(), tx)?;
        info!(rules = self.rules.len(), "watching for changes");

        tokio::pin!(shutdown);
        let outcome = loop {
            tokio::select! {
                trigger = rx.recv() => {
                    let Some(trigger) = trigger else {
                        break Err(anyhow!("file watcher stopped unexpectedly"));
                    };
                    let ctx = ctx.clone();
                    let rules = Arc::clone(&self.rules);
                    tokio::spawn(async move {
                        // Failures are logged by `rerun_rule`; keep watching.
                        let _ = rerun_rule(&ctx, &rules[trigger.rule]).await;
                    });
                }
                _ = &mut shutdown => {
                    info!("shutdown requested; stopping watcher");
                    break Ok(());
                }
            }
        };

        ctx.services().shutdown();
        outcome
    }
}

impl Task for WatchTask {
    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(self.watch_until(ctx, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {err}");
                std::future::pending::<()>().await;
            }
        }))
    }

    fn describe(&self) -> String {
        format!("watch {} rule(s)", self.rules.len())
    }
}
