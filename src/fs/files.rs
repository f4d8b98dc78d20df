// src/fs/files.rs

//! Glob-based input file sets.
//!
//! Patterns are relative to the project root and use `/` separators. `*`
//! never crosses a separator, `**` does. A pattern starting with `!`
//! removes matches from the set.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use super::FileSystem;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Compile one pattern with the separator rules used everywhere in assetflow.
pub fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(normalize(pattern))
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))
}

/// Build a `GlobSet` from several patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern)?);
    }
    Ok(builder.build()?)
}

fn normalize(pattern: &str) -> &str {
    pattern.strip_prefix("./").unwrap_or(pattern)
}

/// The directory a pattern is anchored at: every leading component that
/// contains no glob metacharacter. A pattern without metacharacters is a
/// single file, so its base is its parent directory.
///
/// - `source/img/**/*.png` -> `source/img`
/// - `source/favicon.ico` -> `source`
/// - `*.html` -> `` (the root itself)
pub fn glob_base(pattern: &str) -> String {
    let components: Vec<&str> = normalize(pattern)
        .split('/')
        .filter(|c| !c.is_empty())
        .collect();

    let literal = components
        .iter()
        .take_while(|c| !c.contains(GLOB_META))
        .count();

    let take = if literal == components.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };
    components[..take].join("/")
}

/// One input file of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as seen by the [`FileSystem`] (root joined with the relative path).
    pub path: PathBuf,
    /// Path relative to the glob base that matched it; output files are
    /// written at `dest.join(relative)`.
    pub relative: PathBuf,
}

#[derive(Clone)]
struct Include {
    pattern: String,
    base: String,
    matcher: GlobMatcher,
}

/// A compiled list of include / exclude patterns.
#[derive(Clone)]
pub struct FileSet {
    includes: Vec<Include>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for FileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSet")
            .field(
                "includes",
                &self.includes.iter().map(|i| &i.pattern).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl FileSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();

        for pattern in patterns {
            match pattern.strip_prefix('!') {
                Some(excluded) => excludes.push(excluded.to_string()),
                None => {
                    let matcher = compile_glob(pattern)?.compile_matcher();
                    includes.push(Include {
                        pattern: pattern.clone(),
                        base: glob_base(pattern),
                        matcher,
                    });
                }
            }
        }

        if includes.is_empty() {
            bail!("no include pattern in {:?}", patterns);
        }

        let exclude = if excludes.is_empty() {
            None
        } else {
            Some(build_globset(&excludes)?)
        };

        Ok(Self { includes, exclude })
    }

    /// The include patterns, in declaration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.includes.iter().map(|i| i.pattern.as_str())
    }

    /// Whether a root-relative path (with `/` separators) is part of this set.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.includes.iter().any(|i| i.matcher.is_match(rel_path)) && !self.is_excluded(rel_path)
    }

    fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }

    /// Every file under `root` matched by this set, sorted by path.
    ///
    /// A file matched by several include patterns is reported once, relative
    /// to the base of the first pattern that matched it. Missing base
    /// directories contribute nothing.
    pub fn collect(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<SourceFile>> {
        let mut found: BTreeMap<PathBuf, SourceFile> = BTreeMap::new();

        for include in &self.includes {
            let base_dir = if include.base.is_empty() {
                root.to_path_buf()
            } else {
                root.join(&include.base)
            };
            if !fs.is_dir(&base_dir) {
                continue;
            }

            for path in walk_files(fs, &base_dir)? {
                if found.contains_key(&path) {
                    continue;
                }
                let Some(rel) = relative_to(root, &path) else {
                    continue;
                };
                if !include.matcher.is_match(&rel) || self.is_excluded(&rel) {
                    continue;
                }
                let relative = path
                    .strip_prefix(&base_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(&rel));
                found.insert(path.clone(), SourceFile { path, relative });
            }
        }

        Ok(found.into_values().collect())
    }
}

fn walk_files(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

