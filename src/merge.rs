//! Fold evaluated matches into a session's existing labels.
//!
//! Additive only: existing entries are never removed, renamed, or reordered,
//! and a label the session already carries (under any value) is left alone.

use std::collections::HashSet;

use crate::eval::LabelMatch;
use crate::labels;

/// What [`apply`] did to the label list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing to add. The caller can skip writing the session back.
    Unchanged,
    Updated {
        /// Existing labels followed by `added`, in match order.
        labels: Vec<String>,
        added: Vec<String>,
    },
}

impl ApplyOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, ApplyOutcome::Updated { .. })
    }

    /// Entries appended by this apply.
    pub fn added(&self) -> &[String] {
        match self {
            ApplyOutcome::Unchanged => &[],
            ApplyOutcome::Updated { added, .. } => added,
        }
    }

    /// The resulting label list, given the input that produced this outcome.
    pub fn into_labels(self, existing: &[String]) -> Vec<String> {
        match self {
            ApplyOutcome::Unchanged => existing.to_vec(),
            ApplyOutcome::Updated { labels, .. } => labels,
        }
    }
}

/// Merge `matches` into `existing`.
///
/// A match is staged only if its exact entry is absent and no existing entry
/// shares its bare id, so a value the user picked for a valued label is never
/// joined by a second one. The bare-id check looks at `existing` only, not at
/// entries staged earlier in the same call.
pub fn apply(existing: &[String], matches: &[LabelMatch]) -> ApplyOutcome {
    if matches.is_empty() {
        return ApplyOutcome::Unchanged;
    }

    let present: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let present_ids: HashSet<&str> = existing.iter().map(|e| labels::bare_id(e)).collect();

    let mut added: Vec<String> = Vec::new();
    for m in matches {
        let entry = m.label_entry.as_str();
        if present.contains(entry) {
            continue;
        }
        let id = labels::bare_id(entry);
        if present_ids.contains(id) {
            log::debug!("label `{id}` already set on session; `{entry}` not added");
            continue;
        }
        added.push(entry.to_string());
    }

    if added.is_empty() {
        return ApplyOutcome::Unchanged;
    }

    let mut labels = Vec::with_capacity(existing.len() + added.len());
    labels.extend_from_slice(existing);
    labels.extend(added.iter().cloned());
    ApplyOutcome::Updated { labels, added }
}
