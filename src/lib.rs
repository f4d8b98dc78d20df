// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod graph;
pub mod logging;
pub mod server;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::{TaskContext, TaskRegistry};
use crate::fs::RealFileSystem;
use crate::graph::{Node, resolve_targets};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - target resolution into a task graph
/// - the task registry, checked against the graph before anything runs
/// - the run itself, then waiting on background services (if any)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let targets = if args.targets.is_empty() {
        vec![cfg.config().default_target.clone()]
    } else {
        args.targets.clone()
    };
    let graph = resolve_targets(&cfg, &targets)?;

    let registry = TaskRegistry::from_config(&cfg)?;
    registry.check_graph(&graph)?;

    if args.dry_run {
        print_dry_run(&cfg, &registry, &graph);
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    info!(root = %root.display(), graph = %graph, "running");

    let ctx = TaskContext::new(root, Arc::new(RealFileSystem), registry);
    ctx.run_graph(&graph).await?;

    if !ctx.services().is_empty() {
        ctx.services().wait_for_shutdown().await;
    }

    info!("done");
    Ok(())
}

/// Figure out the project root all config paths are relative to.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetflow.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetflow.toml" (parent = ""),
///   we fall back to the current working directory "."
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output: tasks, pipelines, watch rules and the graph that would run.
fn print_dry_run(cfg: &ConfigFile, registry: &TaskRegistry, graph: &Node) {
    println!("assetflow dry-run");
    println!("  config.default_target = {}", cfg.config().default_target);
    println!("  config.use_hash = {}", cfg.config().use_hash);
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in registry.iter() {
        println!("  - {name}: {}", task.describe());
    }

    if !cfg.pipelines().is_empty() {
        println!();
        println!("pipelines ({}):", cfg.pipelines().len());
        for name in cfg.pipelines().keys() {
            match graph::resolve_target(cfg, name) {
                Ok(node) => println!("  - {name} = {node}"),
                Err(err) => println!("  - {name}: {err}"),
            }
        }
    }

    if !cfg.watch_rules().is_empty() {
        println!();
        println!("watch rules ({}):", cfg.watch_rules().len());
        for rule in cfg.watch_rules() {
            println!("  - {:?} -> {:?}", rule.glob, rule.run);
            if !rule.exclude.is_empty() {
                println!("      exclude: {:?}", rule.exclude);
            }
            println!("      reload: {}", rule.reload);
            println!(
                "      use_hash: {}",
                rule.effective_use_hash(cfg.config().use_hash)
            );
        }
    }

    println!();
    println!("graph: {graph}");

    debug!("dry-run complete (no execution)");
}
