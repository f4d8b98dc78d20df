// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::errors::{AssetflowError, Result};
use crate::fs::{FileSet, compile_glob};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_names(cfg)?;
    validate_tasks(cfg)?;
    validate_pipeline_references(cfg)?;
    validate_pipeline_dag(cfg)?;
    validate_default_target(cfg)?;
    validate_watch_rules(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(AssetflowError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

/// Tasks and pipelines share one namespace.
fn validate_names(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.pipeline.keys() {
        if cfg.task.contains_key(name) {
            return Err(AssetflowError::ConfigError(format!(
                "'{}' is declared both as a task and as a pipeline",
                name
            )));
        }
    }
    for name in cfg.task.keys().chain(cfg.pipeline.keys()) {
        if name.trim().is_empty() {
            return Err(AssetflowError::ConfigError(
                "task and pipeline names must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if let TaskConfig::Clean(clean) = task {
            if clean.path.trim().is_empty() {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{}' (clean) must have a non-empty `path`",
                    name
                )));
            }
        }

        if let TaskConfig::Serve(serve) = task {
            if serve.root.trim().is_empty() {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{}' (serve) must have a non-empty `root`",
                    name
                )));
            }
            if serve.host.parse::<std::net::IpAddr>().is_err() {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{}' (serve) has invalid `host` '{}'",
                    name, serve.host
                )));
            }
        }

        let Some(files) = task.files() else {
            continue;
        };

        FileSet::new(&files.src).map_err(|err| {
            AssetflowError::ConfigError(format!("task '{}' has invalid `src`: {:#}", name, err))
        })?;

        if files.rename.is_some() && !matches!(task, TaskConfig::Styles(_) | TaskConfig::Sprite(_))
        {
            return Err(AssetflowError::ConfigError(format!(
                "task '{}' ({}) does not support `rename`",
                name,
                task.kind()
            )));
        }

        if let Some(rename) = &files.rename {
            if rename.is_empty() || rename.contains(['/', '\\']) {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{}' has invalid `rename` '{}' (expected a bare file name)",
                    name, rename
                )));
            }
        }

        if let Some(quality) = files.quality {
            if !(1..=100).contains(&quality) {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{}' has `quality` {} (expected 1..=100)",
                    name, quality
                )));
            }
        }
    }
    Ok(())
}

fn ensure_known(cfg: &RawConfigFile, owner: &str, reference: &str) -> Result<()> {
    if cfg.task.contains_key(reference) || cfg.pipeline.contains_key(reference) {
        Ok(())
    } else {
        Err(AssetflowError::ConfigError(format!(
            "{} references unknown task or pipeline '{}'",
            owner, reference
        )))
    }
}

fn validate_pipeline_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, node) in cfg.pipeline.iter() {
        for reference in node.references() {
            if reference == name {
                return Err(AssetflowError::ConfigError(format!(
                    "pipeline '{}' cannot reference itself",
                    name
                )));
            }
            ensure_known(cfg, &format!("pipeline '{}'", name), reference)?;
        }
    }
    Ok(())
}

fn validate_pipeline_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: pipeline -> referenced pipeline. Task references are
    // leaves and cannot close a cycle.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.pipeline.keys() {
        graph.add_node(name.as_str());
    }

    for (name, node) in cfg.pipeline.iter() {
        for reference in node.references() {
            if cfg.pipeline.contains_key(reference) {
                graph.add_edge(name.as_str(), reference, ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(AssetflowError::PipelineCycle(format!(
            "cycle detected in pipelines involving '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_default_target(cfg: &RawConfigFile) -> Result<()> {
    let target = cfg.config.default_target.as_str();
    // Resolved lazily: configs always invoked with explicit targets may
    // leave it undefined.
    if target.trim().is_empty() {
        return Err(AssetflowError::ConfigError(
            "[config].default_target must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    for (index, rule) in cfg.watch.iter().enumerate() {
        let owner = format!("watch rule #{}", index + 1);

        if rule.glob.is_empty() {
            return Err(AssetflowError::ConfigError(format!(
                "{} must have at least one `glob`",
                owner
            )));
        }
        if rule.run.is_empty() {
            return Err(AssetflowError::ConfigError(format!(
                "{} must have at least one `run` target",
                owner
            )));
        }

        for pattern in rule.glob.iter().chain(rule.exclude.iter()) {
            compile_glob(pattern).map_err(|err| {
                AssetflowError::ConfigError(format!("{} has invalid glob: {:#}", owner, err))
            })?;
        }

        for target in rule.run.iter() {
            ensure_known(cfg, &owner, target)?;
            if let Some(service) = find_service(cfg, target, &mut HashSet::new()) {
                return Err(AssetflowError::ConfigError(format!(
                    "{} would re-run '{}' ({}), which never finishes",
                    owner,
                    service,
                    cfg.task[service].kind()
                )));
            }
        }
    }
    Ok(())
}

/// Return the first `serve` / `watch` task reachable from `name`.
///
/// Runs after the pipeline DAG check, so recursion terminates; `seen` only
/// avoids re-walking shared sub-pipelines.
fn find_service<'a>(
    cfg: &'a RawConfigFile,
    name: &'a str,
    seen: &mut HashSet<&'a str>,
) -> Option<&'a str> {
    if !seen.insert(name) {
        return None;
    }
    if let Some((task_name, task)) = cfg.task.get_key_value(name) {
        return task.is_service().then_some(task_name.as_str());
    }
    let node = cfg.pipeline.get(name)?;
    node.references()
        .into_iter()
        .find_map(|reference| find_service(cfg, reference, seen))
}
