// src/tasks/images.rs

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use regex::Regex;
use tracing::debug;

use crate::fs::{FileSystem, SourceFile};

use super::{Transform, output_path};

const DEFAULT_JPEG_QUALITY: u8 = 80;

static SVG_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

static SVG_BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid inter-tag regex"));

/// Losslessly shrinks PNG, re-encodes JPEG and strips SVG. Other files are
/// copied.
#[derive(Debug, Clone, Copy)]
pub struct Images {
    quality: u8,
}

impl Default for Images {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Images {
    pub fn new(quality: Option<u8>) -> Self {
        Self {
            quality: quality.unwrap_or(DEFAULT_JPEG_QUALITY),
        }
    }

    fn optimise(&self, ext: &str, bytes: Vec<u8>) -> anyhow::Result<Vec<u8>> {
        let candidate = match ext {
            "png" => encode_png(&image::load_from_memory(&bytes)?)?,
            "jpg" | "jpeg" => encode_jpeg(&image::load_from_memory(&bytes)?, self.quality)?,
            "svg" => minify_svg(std::str::from_utf8(&bytes)?).into_bytes(),
            _ => return Ok(bytes),
        };
        Ok(if candidate.len() < bytes.len() {
            candidate
        } else {
            bytes
        })
    }
}

fn encode_png(img: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)?;
    Ok(out)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
    Ok(out)
}

/// Drop comments and whitespace between tags.
pub fn minify_svg(input: &str) -> String {
    let without_comments = SVG_COMMENT.replace_all(input, "");
    SVG_BETWEEN_TAGS
        .replace_all(&without_comments, "><")
        .trim()
        .to_string()
}

pub(crate) fn extension_of(file: &SourceFile) -> String {
    file.path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

impl Transform for Images {
    fn kind(&self) -> &'static str {
        "images"
    }

    fn apply(&self, fs: &dyn FileSystem, files: &[SourceFile], dest: &Path) -> anyhow::Result<usize> {
        for file in files {
            let original = fs.read(&file.path)?;
            let before = original.len();
            let optimised = self
                .optimise(&extension_of(file), original)
                .with_context(|| format!("optimising {}", file.path.display()))?;
            debug!(
                input = %file.path.display(),
                before,
                after = optimised.len(),
                "optimised image"
            );
            fs.write(&output_path(dest, file, None), &optimised)?;
        }
        Ok(files.len())
    }
}
