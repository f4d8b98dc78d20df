// src/watch/path_utils.rs

use std::path::Path;

/// `path` relative to `root` with forward slashes, the form watch globs are
/// matched against.
///
/// Watch backends may report canonical paths (e.g. `/private/var/...` on
/// macOS) for a root given in another form, so a failed `strip_prefix` is
/// retried on canonicalized paths. `None` if `path` is outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let to_str = |rel: &Path| rel.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_str(rel));
    }

    let root = root.canonicalize().ok()?;
    // Removed files cannot be canonicalized; canonicalize the parent instead.
    let path = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => path.parent()?.canonicalize().ok()?.join(path.file_name()?),
    };
    path.strip_prefix(&root).ok().map(to_str)
}
