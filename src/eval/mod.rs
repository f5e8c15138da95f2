pub mod label_match;

pub use label_match::LabelMatch;

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::config::Config;
use crate::labels::{self, LabelNode};
use crate::matcher::PathMatcher;
use crate::rules::{Rule, RuleSet};

/// Turns a working directory and a rule set into the label entries to apply.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    matcher: PathMatcher,
    validate_labels: bool,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new(PathMatcher::host())
    }
}

impl RuleEvaluator {
    /// Evaluator that validates against a label tree whenever one is supplied.
    pub fn new(matcher: PathMatcher) -> Self {
        Self {
            matcher,
            validate_labels: true,
        }
    }

    /// Build the evaluator from configuration.
    pub fn from_config(config: &Config) -> Self {
        let matcher = PathMatcher::host()
            .with_case(config.matching.case_insensitive.resolve())
            .with_home_expansion(config.matching.expand_home);
        Self {
            matcher,
            validate_labels: config.evaluation.validate_labels,
        }
    }

    /// Turn label validation off (or back on). When off, supplied trees are ignored.
    pub fn set_validate_labels(&mut self, validate: bool) {
        self.validate_labels = validate;
    }

    pub fn validates_labels(&self) -> bool {
        self.validate_labels
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    /// Evaluate `rule_set` for `working_directory`.
    ///
    /// Enabled rules are tried longest path first (stable for equal lengths).
    /// Rules whose label is missing from `label_tree` are skipped, and each
    /// distinct entry is produced at most once, by the first rule to reach it.
    /// The same inputs always give the same output in the same order.
    pub fn evaluate<'r>(
        &self,
        working_directory: &str,
        rule_set: &'r RuleSet,
        label_tree: Option<&[LabelNode]>,
    ) -> Vec<LabelMatch<'r>> {
        if working_directory.trim().is_empty() {
            return Vec::new();
        }
        let label_tree = label_tree.filter(|_| self.validate_labels);

        let mut candidates: Vec<&Rule> = rule_set.rules.iter().filter(|r| r.is_enabled()).collect();
        candidates.sort_by_cached_key(|r| Reverse(r.path.chars().count()));

        let mut produced = HashSet::new();
        let mut matches = Vec::new();

        for rule in candidates {
            if !self
                .matcher
                .matches(&rule.path, working_directory, rule.match_mode)
            {
                continue;
            }
            if let Some(tree) = label_tree
                && !labels::contains_label(tree, &rule.label_id)
            {
                log::warn!(
                    "rule {} references unknown label `{}`; skipped",
                    rule.id,
                    rule.label_id
                );
                continue;
            }
            let found = LabelMatch::new(rule);
            if !produced.insert(found.label_entry.clone()) {
                log::debug!(
                    "rule {} duplicates entry `{}`; skipped",
                    rule.id,
                    found.label_entry
                );
                continue;
            }
            log::debug!(
                "rule {} ({} {}) matched {working_directory} -> {}",
                rule.id,
                rule.match_mode.as_str(),
                rule.path,
                found.label_entry
            );
            matches.push(found);
        }

        matches
    }
}

/// Evaluate with the host matcher and label validation on.
pub fn evaluate<'r>(
    working_directory: &str,
    rule_set: &'r RuleSet,
    label_tree: Option<&[LabelNode]>,
) -> Vec<LabelMatch<'r>> {
    RuleEvaluator::new(PathMatcher::host()).evaluate(working_directory, rule_set, label_tree)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::matcher::PathCase;
    use crate::rules::MatchMode;

    fn evaluator() -> RuleEvaluator {
        RuleEvaluator::new(
            PathMatcher::host()
                .with_case(PathCase::Sensitive)
                .with_base("/"),
        )
    }

    fn prefix(id: &str, path: &str, label: &str) -> Rule {
        Rule::new(id, path, MatchMode::Prefix, label)
    }

    fn entries(matches: &[LabelMatch]) -> Vec<String> {
        matches.iter().map(|m| m.label_entry.clone()).collect()
    }

    #[test]
    fn empty_working_directory_is_noop() {
        let set = RuleSet::new(vec![prefix("r", "/", "x")]);
        assert!(evaluator().evaluate("", &set, None).is_empty());
        assert!(evaluator().evaluate("   ", &set, None).is_empty());
    }

    #[test]
    fn more_specific_rule_first() {
        let set = RuleSet::new(vec![prefix("a", "/a", "X"), prefix("ab", "/a/b", "Y")]);
        let matches = evaluator().evaluate("/a/b/c", &set, None);
        assert_eq!(entries(&matches), vec!["Y", "X"]);
        assert_eq!(matches[0].rule.id, "ab");
    }

    #[test]
    fn equal_length_keeps_declaration_order() {
        let set = RuleSet::new(vec![
            prefix("1", "/p/q", "first"),
            prefix("2", "/p/r", "other"),
            prefix("3", "/p/q", "second"),
        ]);
        let matches = evaluator().evaluate("/p/q", &set, None);
        assert_eq!(entries(&matches), vec!["first", "second"]);
    }

    #[test]
    fn disabled_rules_never_match() {
        let set = RuleSet::new(vec![
            prefix("off", "/a", "X").with_enabled(false),
            prefix("on", "/a", "Y").with_enabled(true),
        ]);
        let matches = evaluator().evaluate("/a", &set, None);
        assert_eq!(entries(&matches), vec!["Y"]);
    }

    #[test]
    fn duplicate_entry_first_wins() {
        let set = RuleSet::new(vec![
            prefix("short", "/a", "X"),
            prefix("long", "/a/b", "X"),
        ]);
        let matches = evaluator().evaluate("/a/b", &set, None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].rule.id, "long");
    }

    #[test]
    fn different_values_both_survive() {
        let set = RuleSet::new(vec![
            prefix("two", "/a", "priority").with_value("2"),
            prefix("three", "/b", "priority").with_value("3"),
            prefix("three-again", "/a", "priority").with_value("3"),
        ]);
        let matches = evaluator().evaluate("/a", &set, None);
        assert_eq!(entries(&matches), vec!["priority::2", "priority::3"]);
    }

    #[test]
    fn dangling_label_is_skipped() {
        let tree = vec![LabelNode::new("known")];
        let set = RuleSet::new(vec![
            prefix("bad", "/a/b", "gone"),
            prefix("good", "/a", "known"),
        ]);
        let matches = evaluator().evaluate("/a/b", &set, Some(&tree));
        assert_eq!(entries(&matches), vec!["known"]);
    }

    #[test]
    fn validation_can_be_disabled() {
        let tree = vec![LabelNode::new("known")];
        let set = RuleSet::new(vec![prefix("bad", "/a", "gone")]);
        let mut ev = evaluator();
        ev.set_validate_labels(false);
        assert_eq!(entries(&ev.evaluate("/a", &set, Some(&tree))), vec!["gone"]);
    }

    #[test]
    fn exact_rules() {
        let set = RuleSet::new(vec![Rule::new("e", "/a/b", MatchMode::Exact, "E")]);
        let ev = evaluator();
        assert_eq!(ev.evaluate("/a/b", &set, None).len(), 1);
        assert!(ev.evaluate("/a/b/c", &set, None).is_empty());
        assert!(ev.evaluate("/a", &set, None).is_empty());
    }

    #[test]
    fn deterministic() {
        let set = RuleSet::new(vec![
            prefix("1", "/a", "X"),
            prefix("2", "/a/b", "Y"),
            prefix("3", "/a/b", "Z").with_value("v"),
        ]);
        let ev = evaluator();
        let first = entries(&ev.evaluate("/a/b/c", &set, None));
        for _ in 0..5 {
            assert_eq!(entries(&ev.evaluate("/a/b/c", &set, None)), first);
        }
    }

    #[test]
    fn case_policy_comes_from_config() {
        let set = RuleSet::new(vec![Rule::new("u", "/Users/Alice/Proj", MatchMode::Exact, "proj")]);

        let mut config = Config::default_config();
        config.apply_overlay_str("[matching]\ncase_insensitive = \"always\"\n");
        let folding = RuleEvaluator::from_config(&config);
        assert_eq!(folding.matcher().case(), PathCase::Insensitive);
        assert_eq!(entries(&folding.evaluate("/users/alice/proj", &set, None)), vec!["proj"]);

        config.apply_overlay_str("[matching]\ncase_insensitive = \"never\"\n");
        let strict = RuleEvaluator::from_config(&config);
        assert!(strict.evaluate("/users/alice/proj", &set, None).is_empty());
    }

    #[test]
    fn label_validation_comes_from_config() {
        let tree = vec![LabelNode::new("known")];
        let set = RuleSet::new(vec![prefix("bad", "/a", "gone")]);

        let config = Config::default_config();
        assert!(RuleEvaluator::from_config(&config).evaluate("/a", &set, Some(&tree)).is_empty());

        let mut config = Config::default_config();
        config.apply_overlay_str("[evaluation]\nvalidate_labels = false\n");
        let ev = RuleEvaluator::from_config(&config);
        assert!(!ev.validates_labels());
        assert_eq!(entries(&ev.evaluate("/a", &set, Some(&tree))), vec!["gone"]);
    }
}
