//! Durable storage for a scope's rule set.
//!
//! The document lives at `<scope-root>/labels/path-rules.json`. Loading never
//! fails: a missing document is an empty set, and a damaged one degrades to
//! whatever can be recovered. Saving reports every failure, because a lost
//! save means user-authored rules silently vanish.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use ulid::Ulid;

use crate::labels::LABELS_DIR;
use crate::rules::{DocumentDecode, RuleSet, RuleSetError, decode_document};

/// Rule document name inside the scope's labels directory.
pub const RULES_FILE: &str = "path-rules.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Rules(#[from] RuleSetError),
}

/// Called with the saved rule set after each successful save.
pub type Listener = Box<dyn Fn(&RuleSet) + Send + Sync>;

/// Rule storage for one scope.
///
/// Nothing is cached: every [`load`](Self::load) re-reads the document.
/// Writers to the same scope must be serialized by the caller; two
/// interleaved [`modify`](Self::modify) calls can lose one side's edit.
pub struct RuleStore {
    scope_root: PathBuf,
    listeners: Vec<Listener>,
}

impl fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleStore")
            .field("scope_root", &self.scope_root)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl RuleStore {
    pub fn new(scope_root: impl Into<PathBuf>) -> Self {
        Self {
            scope_root: scope_root.into(),
            listeners: Vec::new(),
        }
    }

    pub fn scope_root(&self) -> &Path {
        &self.scope_root
    }

    pub fn rules_path(&self) -> PathBuf {
        self.scope_root.join(LABELS_DIR).join(RULES_FILE)
    }

    /// Load the rule set.
    ///
    /// Missing document: empty set. Unreadable or malformed document: warning
    /// and empty set. Invalid entries: each dropped with a warning, the rest kept.
    pub fn load(&self) -> RuleSet {
        let path = self.rules_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return RuleSet::default(),
            Err(e) => {
                log::warn!("cannot read path rules {}: {e}", path.display());
                return RuleSet::default();
            }
        };

        match decode_document(&content) {
            DocumentDecode::Decoded {
                rule_set,
                rejected,
                foreign_version,
            } => {
                if let Some(version) = foreign_version {
                    log::warn!(
                        "path rules {} have version {version}; reading as version {}",
                        path.display(),
                        rule_set.version
                    );
                }
                for r in &rejected {
                    log::warn!(
                        "path rules {}: dropping rule #{}: {}",
                        path.display(),
                        r.index,
                        r.reason
                    );
                }
                rule_set
            }
            DocumentDecode::Malformed(reason) => {
                log::warn!(
                    "path rules {} are malformed ({reason}); using empty rule set",
                    path.display()
                );
                RuleSet::default()
            }
        }
    }

    /// Replace the document with `rule_set`.
    ///
    /// Writes a temporary sibling file and renames it into place, so readers
    /// see either the old document or the new one.
    pub fn save(&self, rule_set: &RuleSet) -> Result<(), StoreError> {
        let path = self.rules_path();
        let dir = self.scope_root.join(LABELS_DIR);
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(rule_set)?;
        let tmp = dir.join(format!(".{RULES_FILE}.{}.tmp", std::process::id()));
        if let Err(e) = fs::write(&tmp, json.as_bytes()).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        log::debug!("saved {} path rules to {}", rule_set.len(), path.display());

        for listener in &self.listeners {
            listener(rule_set);
        }
        Ok(())
    }

    /// Load, edit, save. Returns the set as saved.
    ///
    /// Nothing is written if `edit` fails.
    pub fn modify<F, E>(&self, edit: F) -> Result<RuleSet, StoreError>
    where
        F: FnOnce(&mut RuleSet) -> Result<(), E>,
        StoreError: From<E>,
    {
        let mut rule_set = self.load();
        edit(&mut rule_set)?;
        self.save(&rule_set)?;
        Ok(rule_set)
    }

    /// Register a change listener, run after every successful save through
    /// this handle.
    pub fn subscribe(&mut self, listener: impl Fn(&RuleSet) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// A fresh rule id: time-ordered prefix, random suffix.
    pub fn generate_id() -> String {
        Ulid::new().to_string()
    }
}
