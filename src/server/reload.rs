// src/server/reload.rs

//! Live-reload channel.
//!
//! A plain websocket server on its own threads: one accepts browsers, one
//! forwards every `ReloadKind` sent through the [`Notifier`] to all of
//! them as a text message (`"reload"` or `"inject"`).

use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tungstenite::WebSocket;

use crate::engine::Notifier;

const DEFAULT_RELOAD_PORT: u16 = 1337;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

fn lock(clients: &Clients) -> MutexGuard<'_, Vec<WebSocket<TcpStream>>> {
    clients.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bind the reload socket.
///
/// An explicit port must be free. Without one, 1337 is tried first and an
/// ephemeral port is used when it is taken.
pub fn reserve_port(preferred: Option<u16>) -> io::Result<(TcpListener, u16)> {
    let listener = match preferred {
        Some(port) => TcpListener::bind(("127.0.0.1", port))?,
        None => match TcpListener::bind(("127.0.0.1", DEFAULT_RELOAD_PORT)) {
            Ok(sock) => sock,
            Err(_) => TcpListener::bind("127.0.0.1:0")?,
        },
    };

    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

/// Threads serving one reload socket.
#[derive(Debug)]
pub struct ReloadServer {
    pub port: u16,
    _incoming: JoinHandle<()>,
    _broadcast: JoinHandle<()>,
}

/// Start accepting browsers on `listener` and forward `notifier` messages.
pub fn start(listener: TcpListener, notifier: &Notifier) -> io::Result<ReloadServer> {
    let port = listener.local_addr()?.port();
    let clients: Clients = Arc::new(Mutex::new(Vec::new()));

    let incoming = spawn_incoming(listener, Arc::clone(&clients));
    let broadcast = spawn_broadcast(notifier, clients);

    info!(port, "live-reload socket listening");
    Ok(ReloadServer {
        port,
        _incoming: incoming,
        _broadcast: broadcast,
    })
}

fn spawn_incoming(server: TcpListener, clients: Clients) -> JoinHandle<()> {
    thread::spawn(move || {
        for stream in server.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    warn!("live-reload accept failed: {err}");
                    continue;
                }
            };
            match tungstenite::accept(stream) {
                Ok(socket) => {
                    debug!("live-reload client connected");
                    lock(&clients).push(socket);
                }
                Err(err) => debug!("live-reload handshake failed: {err}"),
            }
        }
    })
}

fn spawn_broadcast(notifier: &Notifier, clients: Clients) -> JoinHandle<()> {
    let mut rx = notifier.subscribe();

    thread::spawn(move || {
        loop {
            let kind = match rx.blocking_recv() {
                Ok(kind) => kind,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "live-reload listener lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let Some(message) = kind.message() else {
                continue;
            };

            let mut clients = lock(&clients);
            let before = clients.len();
            clients.retain_mut(|socket| match socket.send(message.into()) {
                Ok(()) => true,
                Err(err) => {
                    debug!("dropping live-reload client: {err}");
                    false
                }
            });
            info!(
                msg = message,
                clients = clients.len(),
                dropped = before - clients.len(),
                "sent live-reload message"
            );
        }
    })
}

/// Browser side of the channel, injected into every served HTML page.
///
/// `inject` re-requests stylesheets in place; any other message reloads the
/// page.
pub fn snippet(port: u16) -> String {
    format!(
        r#"(() => {{
  const socket = new WebSocket(`ws://${{location.hostname || "localhost"}}:{port}`);
  socket.addEventListener("message", event => {{
    if (event.data === "inject") {{
      for (const link of document.querySelectorAll('link[rel="stylesheet"]')) {{
        const url = new URL(link.href);
        url.searchParams.set("livereload", Date.now());
        link.href = url.toString();
      }}
    }} else {{
      window.location.reload();
    }}
  }});
}})();"#
    )
}
