// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::types::ReloadKind;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// default_target = "default"
///
/// [task.clean]
/// kind = "clean"
/// path = "build"
///
/// [task.styles]
/// kind = "styles"
/// src = ["source/sass/style.scss"]
/// dest = "build/css"
///
/// [pipeline.default]
/// series = ["clean", { parallel = ["styles"] }]
///
/// [[watch]]
/// glob = "source/sass/**/*.scss"
/// run = "styles"
/// reload = "inject"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Named compositions from `[pipeline.<name>]`.
    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineNode>,

    /// Watch rules from `[[watch]]`, in declaration order.
    #[serde(default)]
    pub watch: Vec<WatchRuleConfig>,
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on:
/// - every pipeline / watch reference resolving to a task or pipeline,
/// - pipelines being acyclic,
/// - every glob compiling.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    task: BTreeMap<String, TaskConfig>,
    pipeline: BTreeMap<String, PipelineNode>,
    watch: Vec<WatchRuleConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            task: raw.task,
            pipeline: raw.pipeline,
            watch: raw.watch,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn pipelines(&self) -> &BTreeMap<String, PipelineNode> {
        &self.pipeline
    }

    pub fn watch_rules(&self) -> &[WatchRuleConfig] {
        &self.watch
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Target run when no target is given on the command line.
    #[serde(default = "default_target")]
    pub default_target: String,

    /// Default `use_hash` for watch rules that don't set it.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_target() -> String {
    "default".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            default_target: default_target(),
            use_hash: false,
        }
    }
}

/// `[task.<name>]` section, discriminated by its `kind` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskConfig {
    /// Delete a directory tree.
    Clean(CleanConfig),
    /// Copy files verbatim.
    Copy(FileTaskConfig),
    /// Compile SCSS / Sass into compressed CSS.
    Styles(FileTaskConfig),
    /// Minify markup.
    Html(FileTaskConfig),
    /// Optimise raster and vector images.
    Images(FileTaskConfig),
    /// Convert raster images to WebP.
    Webp(FileTaskConfig),
    /// Bundle SVG files into a symbol sprite sheet.
    Sprite(FileTaskConfig),
    /// Start the development server and live-reload channel.
    Serve(ServeConfig),
    /// Register every `[[watch]]` rule and wait for changes.
    Watch,
}

impl TaskConfig {
    /// The `kind = "..."` value this task was declared with.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskConfig::Clean(_) => "clean",
            TaskConfig::Copy(_) => "copy",
            TaskConfig::Styles(_) => "styles",
            TaskConfig::Html(_) => "html",
            TaskConfig::Images(_) => "images",
            TaskConfig::Webp(_) => "webp",
            TaskConfig::Sprite(_) => "sprite",
            TaskConfig::Serve(_) => "serve",
            TaskConfig::Watch => "watch",
        }
    }

    /// File-set settings, for kinds that read `src` globs.
    pub fn files(&self) -> Option<&FileTaskConfig> {
        match self {
            TaskConfig::Copy(f)
            | TaskConfig::Styles(f)
            | TaskConfig::Html(f)
            | TaskConfig::Images(f)
            | TaskConfig::Webp(f)
            | TaskConfig::Sprite(f) => Some(f),
            TaskConfig::Clean(_) | TaskConfig::Serve(_) | TaskConfig::Watch => None,
        }
    }

    /// Whether this task runs for the lifetime of the process (or starts
    /// something that does). Watch rules may not re-run these.
    pub fn is_service(&self) -> bool {
        matches!(self, TaskConfig::Serve(_) | TaskConfig::Watch)
    }
}

/// `kind = "clean"`.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanConfig {
    /// Directory to delete, relative to the project root.
    pub path: String,
}

/// Settings shared by every kind that maps input files to output files.
#[derive(Debug, Clone, Deserialize)]
pub struct FileTaskConfig {
    /// Input globs. Patterns starting with `!` exclude matches.
    #[serde(deserialize_with = "one_or_many")]
    pub src: Vec<String>,

    /// Output directory, relative to the project root.
    pub dest: String,

    /// Output file name (`styles`, `sprite`).
    #[serde(default)]
    pub rename: Option<String>,

    /// Notification sent to browsers after the task wrote something.
    #[serde(default)]
    pub reload: ReloadKind,

    /// Encoder quality, 1..=100 (`images`: JPEG quality).
    #[serde(default)]
    pub quality: Option<u8>,
}

/// `kind = "serve"`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfig {
    /// Directory to serve, relative to the project root.
    pub root: String,

    /// File served for `/`.
    #[serde(default = "default_index")]
    pub index: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Port of the live-reload websocket. If unset, 1337 is tried first and
    /// an ephemeral port is used when it is taken.
    #[serde(default)]
    pub reload_port: Option<u16>,

    /// Answer every request with permissive CORS headers.
    #[serde(default = "default_cors")]
    pub cors: bool,
}

fn default_index() -> String {
    "index.html".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors() -> bool {
    true
}

/// A composition node in `[pipeline.<name>]`.
///
/// ```toml
/// [pipeline.build]
/// series = ["clean", { parallel = ["styles", "html"] }]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PipelineNode {
    /// Reference to a task or another pipeline by name.
    Ref(String),
    Series { series: Vec<PipelineNode> },
    Parallel { parallel: Vec<PipelineNode> },
}

impl PipelineNode {
    /// Every name referenced by this node, depth-first.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            PipelineNode::Ref(name) => out.push(name.as_str()),
            PipelineNode::Series { series: children }
            | PipelineNode::Parallel { parallel: children } => {
                for child in children {
                    child.collect_references(out);
                }
            }
        }
    }
}

/// One `[[watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchRuleConfig {
    /// Globs (relative to the project root) whose changes fire this rule.
    #[serde(deserialize_with = "one_or_many")]
    pub glob: Vec<String>,

    /// Globs that never fire this rule even when `glob` matches.
    #[serde(default, deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,

    /// Tasks / pipelines to re-run, in sequence.
    #[serde(deserialize_with = "one_or_many")]
    pub run: Vec<String>,

    /// Notification sent to browsers after a successful re-run.
    #[serde(default)]
    pub reload: ReloadKind,

    /// Only fire when the content of the watched files changed.
    ///
    /// Falls back to `[config].use_hash`.
    #[serde(default)]
    pub use_hash: Option<bool>,
}

impl WatchRuleConfig {
    pub fn effective_use_hash(&self, default_use_hash: bool) -> bool {
        self.use_hash.unwrap_or(default_use_hash)
    }
}

/// Accept either `key = "x"` or `key = ["x", "y"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
