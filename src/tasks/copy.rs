// src/tasks/copy.rs

use std::path::Path;

use crate::fs::{FileSystem, SourceFile};

use super::{Transform, output_path};

/// Copies every input verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFiles;

impl Transform for CopyFiles {
    fn kind(&self) -> &'static str {
        "copy"
    }

    fn apply(&self, fs: &dyn FileSystem, files: &[SourceFile], dest: &Path) -> anyhow::Result<usize> {
        for file in files {
            let bytes = fs.read(&file.path)?;
            fs.write(&output_path(dest, file, None), &bytes)?;
        }
        Ok(files.len())
    }
}
