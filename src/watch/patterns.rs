// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::config::ConfigFile;
use crate::errors::AssetflowError;
use crate::fs::{FileSet, FileSystem, files::build_globset};
use crate::graph::{Node, resolve_targets};
use crate::types::ReloadKind;

/// One compiled `[[watch]]` entry: which changes fire it and what it re-runs.
///
/// Globs are relative to the project root; the watcher passes paths like
/// `"source/sass/style.scss"` into [`WatchRule::matches`].
#[derive(Clone)]
pub struct WatchRule {
    label: String,
    globs: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    target: Node,
    reload: ReloadKind,
    use_hash: bool,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("label", &self.label)
            .field("target", &self.target)
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    pub fn new(
        label: impl Into<String>,
        globs: &[String],
        exclude: &[String],
        target: Node,
        reload: ReloadKind,
        use_hash: bool,
    ) -> Result<Self> {
        let label = label.into();
        let watch_set = build_globset(globs)
            .with_context(|| format!("building watch globset for {label}"))?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(exclude)
                    .with_context(|| format!("building exclude globset for {label}"))?,
            )
        };

        Ok(Self {
            label,
            globs: globs.to_vec(),
            watch_set,
            exclude_set,
            target,
            reload,
            use_hash,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    /// The graph re-run when this rule fires.
    pub fn target(&self) -> &Node {
        &self.target
    }

    pub fn reload(&self) -> ReloadKind {
        self.reload
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Whether a change to `rel_path` (relative to the project root) fires
    /// this rule.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compile every `[[watch]]` entry, resolving its `run` list into a graph.
pub fn build_watch_rules(cfg: &ConfigFile) -> crate::errors::Result<Vec<WatchRule>> {
    let default_use_hash = cfg.config().use_hash;

    cfg.watch_rules()
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let target = resolve_targets(cfg, &rule.run)?;
            WatchRule::new(
                format!("watch #{} {:?}", index + 1, rule.glob),
                &rule.glob,
                &rule.exclude,
                target,
                rule.reload,
                rule.effective_use_hash(default_use_hash),
            )
            .map_err(AssetflowError::Other)
        })
        .collect()
}

/// Every file under `root` this rule watches, sorted by path.
///
/// Used for `use_hash` rules to compute the aggregate content hash.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    rule: &WatchRule,
) -> Result<Vec<PathBuf>> {
    let files = FileSet::new(rule.globs())?.collect(fs, root)?;
    Ok(files
        .into_iter()
        .map(|file| file.path)
        .filter(|path| {
            path.strip_prefix(root)
                .map(|rel| rule.matches(&rel.to_string_lossy().replace('\\', "/")))
                .unwrap_or(false)
        })
        .collect())
}
