// src/tasks/webp.rs

use std::path::Path;

use anyhow::Context;
use image::ExtendedColorType;
use image::codecs::webp::WebPEncoder;

use crate::fs::{FileSystem, SourceFile};

use super::images::extension_of;
use super::{Transform, output_path};

const RASTER: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Writes a lossless `.webp` next to every raster input. Non-raster files
/// are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Webp;

fn encode_webp(buffer: &[u8]) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory(buffer)?;
    let (w, h) = (img.width(), img.height());

    let mut out = Vec::new();
    let encoder = WebPEncoder::new_lossless(&mut out);
    encoder.encode(&img.to_rgba8(), w, h, ExtendedColorType::Rgba8)?;
    Ok(out)
}

impl Transform for Webp {
    fn kind(&self) -> &'static str {
        "webp"
    }

    fn apply(&self, fs: &dyn FileSystem, files: &[SourceFile], dest: &Path) -> anyhow::Result<usize> {
        let mut written = 0;
        for file in files {
            if !RASTER.contains(&extension_of(file).as_str()) {
                continue;
            }
            let bytes = fs.read(&file.path)?;
            let webp = encode_webp(&bytes)
                .with_context(|| format!("converting {} to webp", file.path.display()))?;
            fs.write(&output_path(dest, file, Some("webp")), &webp)?;
            written += 1;
        }
        Ok(written)
    }
}
