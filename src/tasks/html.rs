// src/tasks/html.rs

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::fs::{FileSystem, SourceFile};

use super::{Transform, output_path};

/// Elements whose content is whitespace-sensitive.
static PROTECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b.*?</pre>|<textarea\b.*?</textarea>|<script\b.*?</script>|<style\b.*?</style>")
        .expect("valid protected-block regex")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Elements that start a new line box; whitespace next to them never renders.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "base", "blockquote", "body", "dd", "details", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hgroup", "hr", "html", "legend", "li", "link", "main", "meta", "nav",
    "noscript", "ol", "option", "p", "pre", "script", "section", "style", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "title", "tr", "ul",
];

/// Collapses markup whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html;

/// Minify `input`:
/// - whitespace between two tags is removed unless both are inline
///   (`</a> <a>` keeps its single space),
/// - any other whitespace run becomes a single space,
/// - leading and trailing whitespace is dropped,
/// - `<pre>`, `<textarea>`, `<script>` and `<style>` are copied untouched.
pub fn minify_html(input: &str) -> String {
    let protected: Vec<_> = PROTECTED.find_iter(input).map(|m| m.range()).collect();
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for run in WHITESPACE.find_iter(input) {
        if protected.iter().any(|r| r.contains(&run.start())) {
            continue;
        }
        out.push_str(&input[last..run.start()]);
        out.push_str(gap(&input[..run.start()], &input[run.end()..]));
        last = run.end();
    }
    out.push_str(&input[last..]);
    out
}

/// Replacement for a whitespace run sitting between `before` and `after`.
fn gap(before: &str, after: &str) -> &'static str {
    if before.is_empty() || after.is_empty() {
        return "";
    }
    if !(before.ends_with('>') && after.starts_with('<')) {
        return " ";
    }
    let previous = before.rfind('<').map(|at| tag_name(&before[at + 1..]));
    let next = tag_name(&after[1..]);
    match previous {
        Some(previous) if is_inline(&previous) && is_inline(&next) => " ",
        _ => "",
    }
}

/// Lowercased element name of a tag body such as `/a>` or `span class="x">`.
/// Comments and doctypes yield an empty name.
fn tag_name(tag: &str) -> String {
    tag.strip_prefix('/')
        .unwrap_or(tag)
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_inline(name: &str) -> bool {
    !name.is_empty() && !BLOCK_TAGS.contains(&name)
}

impl Transform for Html {
    fn kind(&self) -> &'static str {
        "html"
    }

    fn apply(&self, fs: &dyn FileSystem, files: &[SourceFile], dest: &Path) -> anyhow::Result<usize> {
        for file in files {
            let markup = fs.read_to_string(&file.path)?;
            fs.write(&output_path(dest, file, None), minify_html(&markup).as_bytes())?;
        }
        Ok(files.len())
    }
}
