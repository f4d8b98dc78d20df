// src/graph/resolve.rs

use crate::config::{ConfigFile, PipelineNode};
use crate::errors::{AssetflowError, Result};
use crate::graph::Node;

/// Resolve a task or pipeline name into a graph of task leaves, inlining
/// every referenced pipeline.
///
/// Pipelines are acyclic once the config is validated, so this terminates.
pub fn resolve_target(cfg: &ConfigFile, name: &str) -> Result<Node> {
    if cfg.tasks().contains_key(name) {
        return Ok(Node::task(name));
    }
    match cfg.pipelines().get(name) {
        Some(pipeline) => resolve_pipeline(cfg, pipeline),
        None => Err(AssetflowError::TaskNotFound(name.to_string())),
    }
}

fn resolve_pipeline(cfg: &ConfigFile, node: &PipelineNode) -> Result<Node> {
    Ok(match node {
        PipelineNode::Ref(name) => resolve_target(cfg, name)?,
        PipelineNode::Series { series } => Node::Series(
            series
                .iter()
                .map(|child| resolve_pipeline(cfg, child))
                .collect::<Result<_>>()?,
        ),
        PipelineNode::Parallel { parallel } => Node::Parallel(
            parallel
                .iter()
                .map(|child| resolve_pipeline(cfg, child))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Resolve several targets, run one after the other.
///
/// A single target resolves to itself rather than a one-element series.
pub fn resolve_targets(cfg: &ConfigFile, names: &[String]) -> Result<Node> {
    let mut nodes = names
        .iter()
        .map(|name| resolve_target(cfg, name))
        .collect::<Result<Vec<_>>>()?;

    match nodes.len() {
        0 => Err(AssetflowError::ConfigError("no target to run".to_string())),
        1 => Ok(nodes.remove(0)),
        _ => Ok(Node::Series(nodes)),
    }
}
