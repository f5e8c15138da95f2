//! path-labeler: automatic session labels from working-directory path rules.
//!
//! A scope (e.g. a workspace) keeps a small rule set mapping paths to labels.
//! When a session starts in, or moves to, a directory, the rules covering that
//! directory propose label entries, and those entries are merged into the
//! session's labels. The merge is additive only: nothing the session already
//! carries is removed, reordered, or given a second value.
//!
//! # Architecture
//!
//! - **[`rules`]**: Rule types and the per-entry decode of persisted documents.
//! - **[`store`]**: Load/save of `<scope>/labels/path-rules.json`.
//! - **[`matcher`]**: Path normalization and exact/prefix comparison.
//! - **[`eval`]**: Ordered, deduplicated rule evaluation for a directory.
//! - **[`merge`]**: Additive merge of evaluated entries into session labels.
//! - **[`labels`]**: Label entry encoding and the read-only label tree.
//! - **[`session`]**: Session trait and the create/move triggers.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay.
//! - **[`logging`]**: Logger setup and the applied-labels record.

/// Configuration types, loading, and overlay logic.
pub mod config;
/// Rule evaluation: ordering, label validation, entry dedup.
pub mod eval;
/// Label entries and label-definition tree lookup.
pub mod labels;
/// Logger initialization and best-effort applied-label records.
pub mod logging;
/// Path normalization and matching.
pub mod matcher;
/// Additive merge into existing session labels.
pub mod merge;
/// Rule set types and document decoding.
pub mod rules;
/// Session adapter and lifecycle triggers.
pub mod session;
/// File-backed rule storage per scope.
pub mod store;

use std::path::Path;

use merge::ApplyOutcome;

/// Evaluate the rules of `scope_root` for `working_directory` and merge the
/// result into `existing`, using the default configuration.
///
/// This is the main entry point for tests and simple usage.
/// For user config or session objects, build a [`session::AutoLabeler`] directly.
pub fn label_session(scope_root: &Path, working_directory: &str, existing: &[String]) -> ApplyOutcome {
    let config = config::Config::default_config();
    session::AutoLabeler::from_config(scope_root, &config).evaluate_labels(working_directory, existing)
}
