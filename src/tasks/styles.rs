// src/tasks/styles.rs

use std::io;
use std::path::Path;

use anyhow::{Context, anyhow, bail};
use grass::{InputSyntax, Options, OutputStyle};
use tracing::debug;

use crate::fs::{FileSystem, SourceFile};

use super::{Transform, output_path};

/// Compiles SCSS / Sass entry points into compressed CSS.
///
/// Files whose name starts with `_` are partials: they can be imported but
/// are never compiled on their own. Imports are looked up through the
/// task's [`FileSystem`], next to the importing file.
///
/// `rename` names the single output file, so it is rejected when more than
/// one entry point is selected.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    rename: Option<String>,
}

impl Styles {
    pub fn new(rename: Option<String>) -> Self {
        Self { rename }
    }

    fn compile(&self, fs: &dyn FileSystem, file: &SourceFile) -> anyhow::Result<String> {
        let source = fs.read_to_string(&file.path)?;
        let syntax = match file.path.extension().and_then(|e| e.to_str()) {
            Some("sass") => InputSyntax::Sass,
            Some("css") => InputSyntax::Css,
            _ => InputSyntax::Scss,
        };

        let imports = ImportFs(fs);
        let mut options = Options::default()
            .fs(&imports)
            .style(OutputStyle::Compressed)
            .input_syntax(syntax);
        if let Some(dir) = file.path.parent() {
            options = options.load_path(dir);
        }

        grass::from_string(source, &options).map_err(|err| anyhow!("{err}"))
    }
}

/// Lets the compiler resolve `@import` through a [`FileSystem`].
#[derive(Debug)]
struct ImportFs<'a>(&'a dyn FileSystem);

impl grass::Fs for ImportFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0
            .read(path)
            .map_err(|err| io::Error::new(io::ErrorKind::NotFound, format!("{err:#}")))
    }
}

fn is_partial(file: &SourceFile) -> bool {
    file.path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

impl Transform for Styles {
    fn kind(&self) -> &'static str {
        "styles"
    }

    fn apply(&self, fs: &dyn FileSystem, files: &[SourceFile], dest: &Path) -> anyhow::Result<usize> {
        let entries: Vec<&SourceFile> = files.iter().filter(|f| !is_partial(f)).collect();
        if let (Some(name), true) = (&self.rename, entries.len() > 1) {
            let paths: Vec<String> = entries.iter().map(|f| f.path.display().to_string()).collect();
            bail!(
                "`rename = \"{name}\"` needs a single entry stylesheet, found {}: {}",
                entries.len(),
                paths.join(", ")
            );
        }

        let mut written = 0;
        for file in entries {
            let css = self
                .compile(fs, file)
                .with_context(|| format!("compiling {}", file.path.display()))?;

            let out = match &self.rename {
                Some(name) => output_path(dest, file, None).with_file_name(name),
                None => output_path(dest, file, Some("css")),
            };
            debug!(input = %file.path.display(), output = %out.display(), "compiled stylesheet");
            fs.write(&out, css.as_bytes())?;
            written += 1;
        }
        Ok(written)
    }
}
