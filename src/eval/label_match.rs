use crate::rules::Rule;

/// A rule that matched a working directory, with the entry it contributes.
///
/// Borrowed from the rule set it was evaluated against and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch<'a> {
    pub rule: &'a Rule,
    /// `label_id` or `label_id::value`.
    pub label_entry: String,
}

impl<'a> LabelMatch<'a> {
    pub fn new(rule: &'a Rule) -> Self {
        Self {
            rule,
            label_entry: rule.label_entry(),
        }
    }
}
