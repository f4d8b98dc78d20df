#![allow(dead_code)]

use std::collections::BTreeMap;

use assetflow::config::{
    CleanConfig, ConfigFile, ConfigSection, FileTaskConfig, PipelineNode, RawConfigFile,
    ServeConfig, TaskConfig, WatchRuleConfig,
};
use assetflow::types::ReloadKind;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
                pipeline: BTreeMap::new(),
                watch: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_pipeline(mut self, name: &str, node: PipelineNode) -> Self {
        self.config.pipeline.insert(name.to_string(), node);
        self
    }

    pub fn with_watch(mut self, rule: WatchRuleConfig) -> Self {
        self.config.watch.push(rule);
        self
    }

    pub fn default_target(mut self, name: &str) -> Self {
        self.config.config.default_target = name.to_string();
        self
    }

    pub fn with_default_use_hash(mut self, val: bool) -> Self {
        self.config.config.use_hash = val;
        self
    }

    /// The raw config, for exercising validation.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the settings shared by file task kinds.
pub struct FileTaskBuilder {
    files: FileTaskConfig,
}

impl FileTaskBuilder {
    pub fn new(src: &str, dest: &str) -> Self {
        Self {
            files: FileTaskConfig {
                src: vec![src.to_string()],
                dest: dest.to_string(),
                rename: None,
                reload: ReloadKind::None,
                quality: None,
            },
        }
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.files.src.push(pattern.to_string());
        self
    }

    pub fn rename(mut self, name: &str) -> Self {
        self.files.rename = Some(name.to_string());
        self
    }

    pub fn reload(mut self, reload: ReloadKind) -> Self {
        self.files.reload = reload;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.files.quality = Some(quality);
        self
    }

    pub fn build(self) -> FileTaskConfig {
        self.files
    }
}

pub fn clean(path: &str) -> TaskConfig {
    TaskConfig::Clean(CleanConfig {
        path: path.to_string(),
    })
}

pub fn copy(src: &str, dest: &str) -> TaskConfig {
    TaskConfig::Copy(FileTaskBuilder::new(src, dest).build())
}

pub fn serve(root: &str) -> TaskConfig {
    TaskConfig::Serve(ServeConfig {
        root: root.to_string(),
        index: "index.html".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        reload_port: Some(0),
        cors: true,
    })
}

pub fn task_ref(name: &str) -> PipelineNode {
    PipelineNode::Ref(name.to_string())
}

pub fn series(names: &[&str]) -> PipelineNode {
    PipelineNode::Series {
        series: names.iter().map(|n| task_ref(n)).collect(),
    }
}

pub fn parallel(names: &[&str]) -> PipelineNode {
    PipelineNode::Parallel {
        parallel: names.iter().map(|n| task_ref(n)).collect(),
    }
}

/// Builder for one `[[watch]]` entry.
pub struct WatchRuleBuilder {
    rule: WatchRuleConfig,
}

impl WatchRuleBuilder {
    pub fn new(glob: &str, run: &str) -> Self {
        Self {
            rule: WatchRuleConfig {
                glob: vec![glob.to_string()],
                exclude: Vec::new(),
                run: vec![run.to_string()],
                reload: ReloadKind::None,
                use_hash: None,
            },
        }
    }

    pub fn glob(mut self, pattern: &str) -> Self {
        self.rule.glob.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.rule.exclude.push(pattern.to_string());
        self
    }

    pub fn then_run(mut self, name: &str) -> Self {
        self.rule.run.push(name.to_string());
        self
    }

    pub fn reload(mut self, reload: ReloadKind) -> Self {
        self.rule.reload = reload;
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.rule.use_hash = Some(val);
        self
    }

    pub fn build(self) -> WatchRuleConfig {
        self.rule
    }
}
