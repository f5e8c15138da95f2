//! Glue between the engine and the host's session objects.
//!
//! The host owns sessions and decides when to persist them; this module only
//! reads a session's working directory and labels, and hands back new labels
//! when a rule adds something. The host calls in at two points: session
//! creation, and working-directory change.

use std::path::Path;

use crate::config::Config;
use crate::eval::RuleEvaluator;
use crate::labels;
use crate::logging;
use crate::merge::{self, ApplyOutcome};
use crate::store::RuleStore;

/// The parts of a host session the labeler touches.
pub trait LabeledSession {
    fn working_directory(&self) -> Option<&str>;
    fn set_working_directory(&mut self, dir: String);
    fn labels(&self) -> &[String];
    fn set_labels(&mut self, labels: Vec<String>);
}

/// Plain session record, used by the CLI and handy for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLabels {
    pub working_directory: Option<String>,
    pub labels: Vec<String>,
}

impl SessionLabels {
    pub fn new(working_directory: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            working_directory: Some(working_directory.into()),
            labels,
        }
    }
}

impl LabeledSession for SessionLabels {
    fn working_directory(&self) -> Option<&str> {
        self.working_directory.as_deref()
    }

    fn set_working_directory(&mut self, dir: String) {
        self.working_directory = Some(dir);
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }
}

/// Load → evaluate → apply, for one scope.
#[derive(Debug)]
pub struct AutoLabeler {
    store: RuleStore,
    evaluator: RuleEvaluator,
    record_applied: bool,
}

impl AutoLabeler {
    pub fn new(store: RuleStore, evaluator: RuleEvaluator) -> Self {
        Self {
            store,
            evaluator,
            record_applied: false,
        }
    }

    /// Build a labeler for `scope_root` from configuration.
    pub fn from_config(scope_root: impl AsRef<Path>, config: &Config) -> Self {
        Self {
            store: RuleStore::new(scope_root.as_ref()),
            evaluator: RuleEvaluator::from_config(config),
            record_applied: config.logging.record_applied,
        }
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RuleStore {
        &mut self.store
    }

    /// Compute what labelling `existing` at `working_directory` would do,
    /// without touching any session.
    pub fn evaluate_labels(&self, working_directory: &str, existing: &[String]) -> ApplyOutcome {
        if working_directory.trim().is_empty() {
            return ApplyOutcome::Unchanged;
        }
        let rule_set = self.store.load();
        if rule_set.is_empty() {
            return ApplyOutcome::Unchanged;
        }
        let tree = if self.evaluator.validates_labels() {
            labels::load_label_tree(self.store.scope_root())
        } else {
            None
        };
        let matches = self
            .evaluator
            .evaluate(working_directory, &rule_set, tree.as_deref());
        merge::apply(existing, &matches)
    }

    /// Label `session` from its current working directory.
    ///
    /// Labels are written back only when something was added. Returns the
    /// added entries; the caller persists the session if this is non-empty.
    pub fn label_session<S: LabeledSession + ?Sized>(&self, session: &mut S) -> Vec<String> {
        let Some(dir) = session.working_directory().map(str::to_string) else {
            return Vec::new();
        };
        match self.evaluate_labels(&dir, session.labels()) {
            ApplyOutcome::Unchanged => Vec::new(),
            ApplyOutcome::Updated { labels, added } => {
                log::info!("labelled session at {dir}: {}", added.join(", "));
                if self.record_applied {
                    logging::record_applied(&dir, &added);
                }
                session.set_labels(labels);
                added
            }
        }
    }

    /// Trigger: a session was created.
    pub fn on_session_created<S: LabeledSession + ?Sized>(&self, session: &mut S) -> Vec<String> {
        self.label_session(session)
    }

    /// Trigger: a session moved to `new_dir`. Labels from the old directory stay.
    pub fn on_working_directory_changed<S: LabeledSession + ?Sized>(
        &self,
        session: &mut S,
        new_dir: impl Into<String>,
    ) -> Vec<String> {
        session.set_working_directory(new_dir.into());
        self.label_session(session)
    }
}
