//! Label entries and the read-only label-definition tree.
//!
//! A label entry is either a bare label id (`bug`) or a valued label
//! (`priority::2`). The tree lives in `<scope-root>/labels/config.json` and is
//! owned by another component; this crate only reads it to check that a rule's
//! label still exists.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Separator between a label id and its value in an entry.
pub const VALUE_SEPARATOR: &str = "::";

/// Directory under the scope root holding label documents.
pub const LABELS_DIR: &str = "labels";

/// Label-definition document name inside [`LABELS_DIR`].
pub const LABEL_CONFIG_FILE: &str = "config.json";

/// Encode an entry from a label id and optional value.
pub fn label_entry(label_id: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{label_id}{VALUE_SEPARATOR}{value}"),
        None => label_id.to_string(),
    }
}

/// The label id portion of an entry.
pub fn bare_id(entry: &str) -> &str {
    entry
        .split_once(VALUE_SEPARATOR)
        .map_or(entry, |(id, _)| id)
}

/// The value portion of an entry, if it has one.
pub fn entry_value(entry: &str) -> Option<&str> {
    entry.split_once(VALUE_SEPARATOR).map(|(_, value)| value)
}

/// A node in the label-definition forest.
///
/// Only `id` and `children` matter here; display fields are read for
/// diagnostics. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelNode {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub children: Vec<LabelNode>,
}

impl LabelNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            color: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<LabelNode>) -> Self {
        self.children = children;
        self
    }
}

/// Find a label anywhere in the forest. Pre-order, first match wins.
///
/// Iterative so that deep trees cannot exhaust the call stack.
pub fn find_label<'a>(tree: &'a [LabelNode], id: &str) -> Option<&'a LabelNode> {
    let mut stack: Vec<&LabelNode> = tree.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if node.id == id {
            return Some(node);
        }
        stack.extend(node.children.iter().rev());
    }
    None
}

pub fn contains_label(tree: &[LabelNode], id: &str) -> bool {
    find_label(tree, id).is_some()
}

#[derive(Debug, Deserialize)]
struct LabelConfig {
    #[serde(default)]
    labels: Vec<LabelNode>,
}

/// Path of the label-definition document for a scope.
pub fn label_config_path(scope_root: &Path) -> PathBuf {
    scope_root.join(LABELS_DIR).join(LABEL_CONFIG_FILE)
}

/// Read the label tree for a scope.
///
/// `None` when the document is missing or unreadable; callers then evaluate
/// without label validation.
pub fn load_label_tree(scope_root: &Path) -> Option<Vec<LabelNode>> {
    let path = label_config_path(scope_root);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no label config at {}", path.display());
            return None;
        }
        Err(e) => {
            log::warn!("cannot read label config {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str::<LabelConfig>(&content) {
        Ok(config) => Some(config.labels),
        Err(e) => {
            log::warn!("label config {} is malformed: {e}", path.display());
            None
        }
    }
}
