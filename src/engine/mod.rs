// src/engine/mod.rs

//! Task graph execution for assetflow.
//!
//! This module ties together:
//! - the registry of named tasks, validated against a graph before the
//!   first run ([`registry`])
//! - the generic runner interpreting `Series` / `Parallel` nodes ([`runner`])
//! - the capability bundle handed to every task ([`context`]), including the
//!   live-reload [`notifier`] and the handles of background [`services`].

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

pub mod context;
pub mod notifier;
pub mod registry;
pub mod runner;
pub mod services;

pub use crate::errors::TaskFailure;
pub use context::TaskContext;
pub use notifier::Notifier;
pub use registry::TaskRegistry;
pub use runner::Runner;
pub use services::Services;
