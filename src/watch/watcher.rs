// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::watch::event_handler::{content_changed, rule_hash, triggered_rules};
use crate::watch::hash::HashStore;
use crate::watch::patterns::WatchRule;

/// A watch rule fired by a filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTrigger {
    /// Index into the rule list given to [`spawn_watcher`].
    pub rule: usize,
    /// First changed path (relative to the root) that matched the rule.
    pub path: String,
}

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends a
/// [`WatchTrigger`] for every rule a change fires.
///
/// - Access (read) events are ignored.
/// - A rule fires at most once per notify event.
/// - `use_hash` rules only fire when their aggregated content changed.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    rules: Arc<Vec<WatchRule>>,
    fs: Arc<dyn FileSystem>,
    trigger_tx: mpsc::UnboundedSender<WatchTrigger>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // The receiver only goes away when the watcher is shutting down.
                let _ = event_tx.send(event);
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    // Seed hashes so the first unchanged save of a `use_hash` rule is skipped.
    let mut store = HashStore::new();
    for (index, rule) in rules.iter().enumerate().filter(|(_, r)| r.use_hash()) {
        match rule_hash(fs.as_ref(), &root, rule) {
            Ok(hash) => {
                store.update(index, hash);
            }
            Err(err) => warn!(rule = %rule.label(), "failed to compute initial hash: {err:#}"),
        }
    }
    let store = Arc::new(Mutex::new(store));

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if event.kind.is_access() {
                continue;
            }
            debug!(?event, "received notify event");

            for (index, path) in triggered_rules(&root, &event.paths, &rules) {
                let rule = &rules[index];

                if rule.use_hash() {
                    let fs = Arc::clone(&fs);
                    let root = root.clone();
                    let owned_rule = rule.clone();
                    let store = Arc::clone(&store);
                    let changed = tokio::task::spawn_blocking(move || {
                        let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
                        content_changed(fs.as_ref(), &root, index, &owned_rule, &mut store)
                    })
                    .await;

                    match changed {
                        Ok(Ok(true)) => {}
                        Ok(Ok(false)) => {
                            debug!(rule = %rule.label(), %path, "content unchanged; skipping");
                            continue;
                        }
                        Ok(Err(err)) => {
                            warn!(rule = %rule.label(), "hashing failed, firing anyway: {err:#}");
                        }
                        Err(err) => {
                            warn!(rule = %rule.label(), "hash worker failed: {err}");
                        }
                    }
                }

                debug!(rule = %rule.label(), %path, "watch rule fired");
                if trigger_tx.send(WatchTrigger { rule: index, path }).is_err() {
                    debug!("trigger receiver dropped; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
