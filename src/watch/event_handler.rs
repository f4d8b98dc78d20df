// src/watch/event_handler.rs

//! Helpers for turning filesystem events into watch rule re-runs.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, error, info};

use crate::engine::{Notifier, TaskContext, TaskFailure};
use crate::fs::FileSystem;
use crate::types::ReloadKind;
use crate::watch::hash::{HashStore, compute_aggregate_hash, compute_file_hash};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{WatchRule, collect_matching_files};

/// Rules fired by one event touching `paths`, in rule order.
///
/// Each rule appears at most once, paired with the first matching path
/// (relative to `root`).
pub fn triggered_rules(root: &Path, paths: &[PathBuf], rules: &[WatchRule]) -> Vec<(usize, String)> {
    let relative: Vec<String> = paths
        .iter()
        .filter_map(|path| {
            let rel = relative_str(root, path);
            if rel.is_none() {
                debug!(?path, "ignoring change outside the project root");
            }
            rel
        })
        .collect();

    rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            relative
                .iter()
                .find(|rel| rule.matches(rel))
                .map(|rel| (index, rel.clone()))
        })
        .collect()
}

/// Aggregate content hash of everything `rule` watches.
pub fn rule_hash(fs: &dyn FileSystem, root: &Path, rule: &WatchRule) -> Result<String> {
    let files = collect_matching_files(fs, root, rule)?;
    let hashes = files
        .iter()
        .map(|path| compute_file_hash(fs, path))
        .collect::<Result<Vec<_>>>()?;
    Ok(compute_aggregate_hash(&hashes))
}

/// For `use_hash` rules: whether the watched content differs from the last
/// time this was asked. Rules without `use_hash` always count as changed.
pub fn content_changed(
    fs: &dyn FileSystem,
    root: &Path,
    index: usize,
    rule: &WatchRule,
    store: &mut HashStore,
) -> Result<bool> {
    if !rule.use_hash() {
        return Ok(true);
    }
    let hash = rule_hash(fs, root, rule)?;
    Ok(store.update(index, hash))
}

/// Re-run the graph bound to `rule`, then send at most one reload
/// notification.
///
/// Notifications of the tasks inside the re-run are held back. On success
/// the rule's own `reload` is sent if it has one, otherwise the strongest
/// notification the tasks asked for. Failures are logged and returned;
/// nothing is sent.
pub async fn rerun_rule(ctx: &TaskContext, rule: &WatchRule) -> Result<(), TaskFailure> {
    info!(rule = %rule.label(), target = %rule.target(), "change detected; re-running");

    let held = Notifier::new();
    let mut requested = held.subscribe();
    let rerun_ctx = ctx.clone().with_notifier(held);

    match rerun_ctx.run_graph(rule.target()).await {
        Ok(()) => {
            let reload = match rule.reload() {
                ReloadKind::None => drain(&mut requested),
                kind => kind,
            };
            ctx.notifier().notify(reload);
            info!(rule = %rule.label(), %reload, "re-run finished; watching for changes");
            Ok(())
        }
        Err(failure) => {
            error!(rule = %rule.label(), "re-run failed: {failure}");
            Err(failure)
        }
    }
}

/// Merge every notification queued on `rx`.
fn drain(rx: &mut broadcast::Receiver<ReloadKind>) -> ReloadKind {
    let mut merged = ReloadKind::None;
    loop {
        match rx.try_recv() {
            Ok(kind) => merged = merged.merge(kind),
            // Some were dropped; a full reload covers whatever they were.
            Err(TryRecvError::Lagged(_)) => merged = ReloadKind::Reload,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return merged,
        }
    }
}
