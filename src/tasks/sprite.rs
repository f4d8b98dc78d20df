// src/tasks/sprite.rs

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, anyhow, bail};
use regex::Regex;

use crate::fs::{FileSystem, SourceFile};

use super::Transform;
use super::images::minify_svg;

const DEFAULT_SPRITE_NAME: &str = "sprite.svg";

static SVG_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<svg\b([^>]*)>(.*)</svg>").expect("valid svg regex"));

static VIEW_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bviewBox\s*=\s*["']([^"']*)["']"#).expect("valid viewBox regex")
});

/// Combines SVG files into one sheet of `<symbol>`s, addressable as
/// `sprite.svg#<file stem>`.
#[derive(Debug, Clone, Default)]
pub struct Sprite {
    rename: Option<String>,
}

impl Sprite {
    pub fn new(rename: Option<String>) -> Self {
        Self { rename }
    }

    fn file_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(DEFAULT_SPRITE_NAME)
    }
}

/// Turn one SVG document into a `<symbol>` with the given id.
pub fn symbol_from_svg(id: &str, svg: &str) -> anyhow::Result<String> {
    let caps = SVG_ROOT
        .captures(svg)
        .ok_or_else(|| anyhow!("no <svg> root element"))?;
    let attributes = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    let mut symbol = format!(r#"<symbol id="{id}""#);
    if let Some(view_box) = VIEW_BOX.captures(attributes).and_then(|c| c.get(1)) {
        symbol.push_str(&format!(r#" viewBox="{}""#, view_box.as_str()));
    }
    symbol.push('>');
    symbol.push_str(&minify_svg(body));
    symbol.push_str("</symbol>");
    Ok(symbol)
}

impl Transform for Sprite {
    fn kind(&self) -> &'static str {
        "sprite"
    }

    fn apply(&self, fs: &dyn FileSystem, files: &[SourceFile], dest: &Path) -> anyhow::Result<usize> {
        if files.is_empty() {
            return Ok(0);
        }

        let mut ids = HashSet::new();
        let mut sheet = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg">"#);

        for file in files {
            let id = file
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| anyhow!("invalid file name {}", file.path.display()))?;
            if !ids.insert(id.to_string()) {
                bail!("duplicate symbol id '{id}' ({})", file.path.display());
            }

            let svg = fs.read_to_string(&file.path)?;
            let symbol = symbol_from_svg(id, &svg)
                .with_context(|| format!("reading {}", file.path.display()))?;
            sheet.push_str(&symbol);
        }

        sheet.push_str("</svg>");
        fs.write(&dest.join(self.file_name()), sheet.as_bytes())?;
        Ok(1)
    }
}
