// src/tasks/mod.rs

//! Built-in task kinds.
//!
//! A [`Task`] is opaque to the runner: it receives a [`TaskContext`] and
//! either completes or fails. File kinds share [`FileTask`], which collects
//! the inputs of a [`FileSet`], hands them to a [`Transform`] on the
//! blocking pool and sends the configured reload notification afterwards.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::config::{ConfigFile, FileTaskConfig, TaskConfig};
use crate::engine::TaskContext;
use crate::errors::{AssetflowError, Result};
use crate::fs::{FileSet, FileSystem, SourceFile};
use crate::types::ReloadKind;

pub mod clean;
pub mod copy;
pub mod html;
pub mod images;
pub mod serve;
pub mod sprite;
pub mod styles;
pub mod watch;
pub mod webp;

pub use clean::CleanTask;
pub use copy::CopyFiles;
pub use html::Html;
pub use images::Images;
pub use serve::ServeTask;
pub use sprite::Sprite;
pub use styles::Styles;
pub use watch::WatchTask;
pub use webp::Webp;

pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// A named unit of work.
///
/// Implementations must be re-runnable: watch mode calls `run` again for
/// every matching change.
pub trait Task: Send + Sync {
    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a>;

    /// One-line description for `--dry-run` and logs.
    fn describe(&self) -> String;
}

/// A synchronous mapping from input files to files under `dest`.
pub trait Transform: Send + Sync + 'static {
    fn kind(&self) -> &'static str;

    /// Process `files`, writing results under `dest`. Returns the number of
    /// files written.
    fn apply(&self, fs: &dyn FileSystem, files: &[SourceFile], dest: &Path)
    -> anyhow::Result<usize>;
}

/// Output path of `file` under `dest`, with its extension replaced when
/// `extension` is given.
pub(crate) fn output_path(dest: &Path, file: &SourceFile, extension: Option<&str>) -> PathBuf {
    let out = dest.join(&file.relative);
    match extension {
        Some(ext) => out.with_extension(ext),
        None => out,
    }
}

/// Any file-to-file task: `src` globs, a destination and a transform.
pub struct FileTask<T> {
    files: Arc<FileSet>,
    dest: String,
    reload: ReloadKind,
    transform: Arc<T>,
}

impl<T: Transform> FileTask<T> {
    pub fn new(files: FileSet, dest: impl Into<String>, transform: T) -> Self {
        Self {
            files: Arc::new(files),
            dest: dest.into(),
            reload: ReloadKind::None,
            transform: Arc::new(transform),
        }
    }

    pub fn with_reload(mut self, reload: ReloadKind) -> Self {
        self.reload = reload;
        self
    }

    fn from_config(cfg: &FileTaskConfig, transform: T) -> Result<Self> {
        let files = FileSet::new(&cfg.src).map_err(AssetflowError::Other)?;
        Ok(Self::new(files, cfg.dest.clone(), transform).with_reload(cfg.reload))
    }
}

impl<T: Transform> Task for FileTask<T> {
    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            let fs = ctx.fs_arc();
            let root = ctx.root().to_path_buf();
            let dest = ctx.resolve(&self.dest);
            let files = Arc::clone(&self.files);
            let transform = Arc::clone(&self.transform);

            let written = tokio::task::spawn_blocking(move || {
                let inputs = files.collect(fs.as_ref(), &root)?;
                debug!(kind = transform.kind(), inputs = inputs.len(), "collected inputs");
                transform.apply(fs.as_ref(), &inputs, &dest)
            })
            .await
            .context("transform worker panicked")??;

            debug!(kind = self.transform.kind(), written, "transform done");
            if written > 0 {
                ctx.notifier().notify(self.reload);
            }
            Ok(())
        })
    }

    fn describe(&self) -> String {
        let patterns: Vec<&str> = self.files.patterns().collect();
        format!(
            "{} {:?} -> {}",
            self.transform.kind(),
            patterns,
            self.dest
        )
    }
}

/// Build the task declared as `[task.<name>]`.
pub fn build_task(cfg: &ConfigFile, name: &str, task: &TaskConfig) -> Result<Arc<dyn Task>> {
    let built: Arc<dyn Task> = match task {
        TaskConfig::Clean(clean) => Arc::new(CleanTask::new(&clean.path)),
        TaskConfig::Copy(files) => Arc::new(FileTask::from_config(files, CopyFiles)?),
        TaskConfig::Styles(files) => {
            Arc::new(FileTask::from_config(files, Styles::new(files.rename.clone()))?)
        }
        TaskConfig::Html(files) => Arc::new(FileTask::from_config(files, Html)?),
        TaskConfig::Images(files) => {
            Arc::new(FileTask::from_config(files, Images::new(files.quality))?)
        }
        TaskConfig::Webp(files) => Arc::new(FileTask::from_config(files, Webp)?),
        TaskConfig::Sprite(files) => {
            Arc::new(FileTask::from_config(files, Sprite::new(files.rename.clone()))?)
        }
        TaskConfig::Serve(serve) => Arc::new(ServeTask::new(name, serve.clone())),
        TaskConfig::Watch => Arc::new(WatchTask::from_config(cfg)?),
    };
    Ok(built)
}
