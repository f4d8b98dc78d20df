// src/engine/notifier.rs

use tokio::sync::broadcast;
use tracing::debug;

use crate::types::ReloadKind;

const CHANNEL_CAPACITY: usize = 16;

/// Sends live-reload notifications to whoever listens (the reload server,
/// or a test).
///
/// Clones share one channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<ReloadKind>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Send `kind` to every subscriber. `ReloadKind::None` and a channel
    /// without subscribers are both no-ops.
    pub fn notify(&self, kind: ReloadKind) {
        if kind == ReloadKind::None {
            return;
        }
        match self.tx.send(kind) {
            Ok(receivers) => debug!(%kind, receivers, "sent reload notification"),
            Err(_) => debug!(%kind, "no reload listener; notification dropped"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadKind> {
        self.tx.subscribe()
    }
}
