//! Path rules: domain types and the decode step for persisted rule documents.

pub mod decode;
pub mod types;

pub use decode::{DocumentDecode, InvalidRule, RejectedRule, decode_document, decode_rule};
pub use types::{MatchMode, RULE_SET_VERSION, Rule, RuleSet, RuleSetError};
