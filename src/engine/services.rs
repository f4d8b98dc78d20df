// src/engine/services.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{info, warn};

type ServiceHandle = (String, JoinHandle<anyhow::Result<()>>);

/// Background services (HTTP server, ...) started by tasks that complete
/// before the service stops.
///
/// Clones share one list.
#[derive(Debug, Clone, Default)]
pub struct Services {
    handles: Arc<Mutex<Vec<ServiceHandle>>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ServiceHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn track(&self, name: impl Into<String>, handle: JoinHandle<anyhow::Result<()>>) {
        let name = name.into();
        info!(service = %name, "background service started");
        self.lock().push((name, handle));
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Stop every tracked service.
    pub fn shutdown(&self) {
        let handles: Vec<ServiceHandle> = self.lock().drain(..).collect();
        for (name, handle) in handles {
            if handle.is_finished() {
                warn!(service = %name, "service had already stopped");
            }
            handle.abort();
            info!(service = %name, "service stopped");
        }
    }

    /// Block until Ctrl+C, then stop every service.
    pub async fn wait_for_shutdown(&self) {
        info!("serving; press Ctrl+C to stop");
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {err}");
        }
        self.shutdown();
    }
}
