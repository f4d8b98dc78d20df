// src/tasks/serve.rs

use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServeConfig;
use crate::engine::TaskContext;
use crate::server::{self, ReloadServer};

use super::{Task, TaskFuture};

/// Addresses a running serve task is reachable on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeAddrs {
    pub http: SocketAddr,
    pub reload_port: u16,
}

/// Starts the static server and the live-reload socket, then completes.
///
/// The HTTP server keeps running as a tracked service of the context.
#[derive(Debug)]
pub struct ServeTask {
    name: String,
    cfg: ServeConfig,
    running: Mutex<Option<(ServeAddrs, ReloadServer)>>,
}

impl ServeTask {
    pub fn new(name: impl Into<String>, cfg: ServeConfig) -> Self {
        Self {
            name: name.into(),
            cfg,
            running: Mutex::new(None),
        }
    }

    /// Where the last run bound its sockets.
    pub fn addrs(&self) -> Option<ServeAddrs> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(addrs, _)| *addrs)
    }

    async fn start(&self, ctx: &TaskContext) -> anyhow::Result<()> {
        let root = ctx.resolve(&self.cfg.root);

        let (reload_listener, _) = server::reserve_port(self.cfg.reload_port)
            .context("binding live-reload socket")?;
        let reload = server::reload::start(reload_listener, ctx.notifier())?;

        let host: IpAddr = self
            .cfg
            .host
            .parse()
            .with_context(|| format!("invalid host '{}'", self.cfg.host))?;
        let listener = TcpListener::bind((host, self.cfg.port))
            .await
            .with_context(|| format!("binding {}:{}", self.cfg.host, self.cfg.port))?;
        let http = listener.local_addr()?;

        let app = server::router(
            &root,
            &self.cfg.index,
            self.cfg.cors,
            server::snippet(reload.port),
        );

        info!(
            url = %format!("http://{http}/"),
            root = %root.display(),
            reload_port = reload.port,
            "serving"
        );

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .context("http server stopped")
        });
        ctx.services().track(self.name.clone(), handle);

        let addrs = ServeAddrs {
            http,
            reload_port: reload.port,
        };
        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = Some((addrs, reload));
        Ok(())
    }
}

impl Task for ServeTask {
    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(self.start(ctx))
    }

    fn describe(&self) -> String {
        format!(
            "serve {} on {}:{} (index {})",
            self.cfg.root, self.cfg.host, self.cfg.port, self.cfg.index
        )
    }
}
