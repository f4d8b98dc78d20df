// src/server/mod.rs

//! Development server: static files over HTTP plus a live-reload websocket.

pub mod http;
pub mod reload;

pub use http::{inject_snippet, router};
pub use reload::{ReloadServer, reserve_port, snippet};
