use std::fmt;

use serde::Deserialize;

/// What connected browsers should do once a task or watch rule finishes.
///
/// - `None`: nothing is sent (default).
/// - `Reload`: full page reload.
/// - `Inject`: refresh stylesheets in place, without reloading the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    #[default]
    None,
    Reload,
    Inject,
}

impl ReloadKind {
    /// The stronger of two notifications: a full reload covers a
    /// stylesheet refresh, and either covers nothing.
    pub fn merge(self, other: ReloadKind) -> ReloadKind {
        match (self, other) {
            (ReloadKind::Reload, _) | (_, ReloadKind::Reload) => ReloadKind::Reload,
            (ReloadKind::Inject, _) | (_, ReloadKind::Inject) => ReloadKind::Inject,
            _ => ReloadKind::None,
        }
    }

    /// Message sent over the live-reload socket, if any.
    pub fn message(self) -> Option<&'static str> {
        match self {
            ReloadKind::None => None,
            ReloadKind::Reload => Some("reload"),
            ReloadKind::Inject => Some("inject"),
        }
    }
}

impl fmt::Display for ReloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("none"))
    }
}
