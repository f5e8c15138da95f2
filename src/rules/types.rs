//! Types for the persisted rule set.

use serde::Serialize;
use thiserror::Error;

use crate::labels;

/// Schema version written by this crate.
pub const RULE_SET_VERSION: u32 = 1;

/// An in-memory edit of a [`RuleSet`] that would break id uniqueness or
/// names a rule that is not there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleSetError {
    #[error("rule id already exists: {0}")]
    DuplicateId(String),

    #[error("no rule with id: {0}")]
    UnknownRule(String),
}

/// How a rule's path is compared against a working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The working directory must be the same location as the rule path.
    Exact,
    /// The working directory must be the rule path or any descendant of it.
    Prefix,
}

impl MatchMode {
    /// Wire name, as stored in the `match` field.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::Prefix => "prefix",
        }
    }

    /// Parse a wire name. Only the two lowercase names are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(MatchMode::Exact),
            "prefix" => Some(MatchMode::Prefix),
            _ => None,
        }
    }
}

/// One path → label mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Stable identifier, unique within a rule set.
    pub id: String,
    /// Absolute path as written by the user; normalized only when matching.
    pub path: String,
    #[serde(rename = "match")]
    pub match_mode: MatchMode,
    /// Label id in the external label tree. May dangle.
    pub label_id: String,
    /// When set, the applied entry is `<label_id>::<value>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Absent means enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        match_mode: MatchMode,
        label_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            match_mode,
            label_id: label_id.into(),
            value: None,
            enabled: None,
            description: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Disabled rules stay persisted but never contribute a match.
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    /// The encoded tag this rule applies (`label_id` or `label_id::value`).
    pub fn label_entry(&self) -> String {
        labels::label_entry(&self.label_id, self.value.as_deref())
    }
}

/// Versioned container of rules for one scope.
///
/// Mutation happens on an owned copy between a store load and a store save;
/// the helpers below keep rule ids unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    pub version: u32,
    pub rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            version: RULE_SET_VERSION,
            rules: Vec::new(),
        }
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            version: RULE_SET_VERSION,
            rules,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Append a rule. Fails if the id is already taken.
    pub fn add(&mut self, rule: Rule) -> Result<(), RuleSetError> {
        if self.get(&rule.id).is_some() {
            return Err(RuleSetError::DuplicateId(rule.id));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Remove a rule by id and return it.
    pub fn remove(&mut self, id: &str) -> Result<Rule, RuleSetError> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RuleSetError::UnknownRule(id.to_string()))?;
        Ok(self.rules.remove(pos))
    }

    /// Edit a rule in place. The rule keeps its id whatever `edit` does.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut Rule)) -> Result<(), RuleSetError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RuleSetError::UnknownRule(id.to_string()))?;
        edit(rule);
        rule.id = id.to_string();
        Ok(())
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), RuleSetError> {
        self.update(id, |rule| rule.enabled = Some(enabled))
    }
}
