// src/watch/hash.rs

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs
        .read(path)
        .with_context(|| format!("reading file for hashing: {:?}", path))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Compute aggregate hash from a list of file hashes.
///
/// `hashes` must be sorted by the corresponding file path to ensure stability.
pub fn compute_aggregate_hash(hashes: &[String]) -> String {
    let mut hasher = Hasher::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Last seen aggregate hash per watch rule, kept for the lifetime of the
/// watcher only.
#[derive(Debug, Default)]
pub struct HashStore {
    map: HashMap<usize, String>,
}

impl HashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, rule: usize) -> Option<&str> {
        self.map.get(&rule).map(String::as_str)
    }

    /// Record `hash` for `rule` and report whether it differs from the
    /// previous one. A rule without a previous hash counts as changed.
    pub fn update(&mut self, rule: usize, hash: String) -> bool {
        let changed = self.load(rule) != Some(hash.as_str());
        debug!(rule, hash = %hash, changed, "stored rule hash");
        self.map.insert(rule, hash);
        changed
    }
}
