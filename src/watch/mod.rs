// src/watch/mod.rs

//! File watching for `[[watch]]` rules.
//!
//! Responsibilities:
//! - Compile watch / exclude globs per rule (`patterns.rs`).
//! - Observe the project root with `notify` (`watcher.rs`).
//! - Map events to fired rules and re-run their graphs (`event_handler.rs`).
//! - Skip rules whose watched content did not change (`hash.rs`).

pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{content_changed, rerun_rule, triggered_rules};
pub use hash::HashStore;
pub use patterns::{WatchRule, build_watch_rules, collect_matching_files};
pub use watcher::{WatchTrigger, WatcherHandle, spawn_watcher};
