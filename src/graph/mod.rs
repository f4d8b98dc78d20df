// src/graph/mod.rs

//! The task graph: an explicit tree of `Series` / `Parallel` nodes over
//! named tasks, resolved from `[pipeline.*]` sections.

pub mod node;
pub mod resolve;

pub use node::Node;
pub use resolve::{resolve_target, resolve_targets};
