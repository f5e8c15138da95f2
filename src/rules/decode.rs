//! Decode a persisted rule document into typed rules.
//!
//! The document is read as loose JSON first. Each rule entry is then classified
//! as valid or invalid on its own, so one junk entry never costs the rest of
//! the set. Only a broken top-level shape rejects the whole document.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{MatchMode, RULE_SET_VERSION, Rule, RuleSet};

/// Why a single rule entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRule {
    #[error("entry is not an object")]
    NotAnObject,

    /// A required field is absent or not a string.
    #[error("missing or non-string field `{0}`")]
    MissingField(&'static str),

    /// `match` is a string, but not `exact` or `prefix`.
    #[error("unknown match mode `{0}`")]
    UnknownMatchMode(String),

    /// An earlier entry already claimed this id.
    #[error("duplicate rule id `{0}`")]
    DuplicateId(String),
}

/// A dropped entry and its position in the document's `rules` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRule {
    pub index: usize,
    pub reason: InvalidRule,
}

/// Result of decoding a whole document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentDecode {
    /// Top-level shape was usable. Invalid entries are listed in `rejected`.
    Decoded {
        rule_set: RuleSet,
        rejected: Vec<RejectedRule>,
        /// Version found in the document, if it differs from the one we write.
        foreign_version: Option<u64>,
    },
    /// Not JSON, or not an object with a `rules` array.
    Malformed(String),
}

/// Decode document text.
pub fn decode_document(text: &str) -> DocumentDecode {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return DocumentDecode::Malformed(format!("invalid JSON: {e}")),
    };
    let Some(object) = value.as_object() else {
        return DocumentDecode::Malformed("top level is not an object".into());
    };
    let Some(entries) = object.get("rules").and_then(Value::as_array) else {
        return DocumentDecode::Malformed("missing `rules` array".into());
    };

    let foreign_version = object
        .get("version")
        .and_then(Value::as_u64)
        .filter(|v| *v != u64::from(RULE_SET_VERSION));

    let mut rules = Vec::with_capacity(entries.len());
    let mut rejected = Vec::new();
    let mut seen_ids = HashSet::new();

    for (index, raw) in entries.iter().enumerate() {
        match decode_rule(raw) {
            Ok(rule) if !seen_ids.insert(rule.id.clone()) => rejected.push(RejectedRule {
                index,
                reason: InvalidRule::DuplicateId(rule.id),
            }),
            Ok(rule) => rules.push(rule),
            Err(reason) => rejected.push(RejectedRule { index, reason }),
        }
    }

    DocumentDecode::Decoded {
        rule_set: RuleSet::new(rules),
        rejected,
        foreign_version,
    }
}

/// Classify one raw rule entry.
///
/// Required: string `id`, string `path`, `match` of `exact`/`prefix`, string
/// `labelId`. Optional fields of the wrong type are treated as absent.
pub fn decode_rule(raw: &Value) -> Result<Rule, InvalidRule> {
    let object = raw.as_object().ok_or(InvalidRule::NotAnObject)?;

    let id = required_str(object, "id")?;
    let path = required_str(object, "path")?;
    let mode = required_str(object, "match")?;
    let match_mode =
        MatchMode::parse(mode).ok_or_else(|| InvalidRule::UnknownMatchMode(mode.to_string()))?;
    let label_id = required_str(object, "labelId")?;

    Ok(Rule {
        id: id.to_string(),
        path: path.to_string(),
        match_mode,
        label_id: label_id.to_string(),
        value: optional_str(object, "value"),
        enabled: object.get("enabled").and_then(Value::as_bool),
        description: optional_str(object, "description"),
    })
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, InvalidRule> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or(InvalidRule::MissingField(field))
}

fn optional_str(object: &Map<String, Value>, field: &str) -> Option<String> {
    object.get(field).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decoded(text: &str) -> (RuleSet, Vec<RejectedRule>) {
        match decode_document(text) {
            DocumentDecode::Decoded {
                rule_set, rejected, ..
            } => (rule_set, rejected),
            DocumentDecode::Malformed(reason) => panic!("unexpected malformed: {reason}"),
        }
    }

    #[test]
    fn full_entry() {
        let rule = decode_rule(&json!({
            "id": "r1",
            "path": "/src/app",
            "match": "prefix",
            "labelId": "area",
            "value": "app",
            "enabled": false,
            "description": "app sessions"
        }))
        .unwrap();
        assert_eq!(rule.id, "r1");
        assert_eq!(rule.match_mode, MatchMode::Prefix);
        assert_eq!(rule.value.as_deref(), Some("app"));
        assert_eq!(rule.enabled, Some(false));
        assert_eq!(rule.description.as_deref(), Some("app sessions"));
    }

    #[test]
    fn missing_required_fields() {
        let base = json!({"id": "r", "path": "/p", "match": "exact", "labelId": "l"});
        for field in ["id", "path", "match", "labelId"] {
            let mut entry = base.clone();
            entry.as_object_mut().unwrap().remove(field);
            assert_eq!(
                decode_rule(&entry),
                Err(InvalidRule::MissingField(field)),
                "field {field}"
            );
        }
    }

    #[test]
    fn non_string_required_field() {
        let entry = json!({"id": 7, "path": "/p", "match": "exact", "labelId": "l"});
        assert_eq!(decode_rule(&entry), Err(InvalidRule::MissingField("id")));
    }

    #[test]
    fn unknown_match_mode() {
        let entry = json!({"id": "r", "path": "/p", "match": "glob", "labelId": "l"});
        assert_eq!(
            decode_rule(&entry),
            Err(InvalidRule::UnknownMatchMode("glob".into()))
        );
    }

    #[test]
    fn wrong_typed_optionals_are_ignored() {
        let entry = json!({
            "id": "r", "path": "/p", "match": "exact", "labelId": "l",
            "value": 3, "enabled": "no", "description": null
        });
        let rule = decode_rule(&entry).unwrap();
        assert_eq!(rule.value, None);
        assert_eq!(rule.enabled, None);
        assert_eq!(rule.description, None);
    }

    #[test]
    fn not_an_object_entry() {
        assert_eq!(decode_rule(&json!("rule")), Err(InvalidRule::NotAnObject));
    }

    #[test]
    fn keeps_valid_entries_around_invalid_one() {
        let (set, rejected) = decoded(
            r#"{"version": 1, "rules": [
                {"id": "a", "path": "/a", "match": "prefix", "labelId": "x"},
                {"id": "b", "match": "prefix", "labelId": "y"},
                {"id": "c", "path": "/c", "match": "exact", "labelId": "z"}
            ]}"#,
        );
        let ids: Vec<&str> = set.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(
            rejected,
            vec![RejectedRule {
                index: 1,
                reason: InvalidRule::MissingField("path")
            }]
        );
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let (set, rejected) = decoded(
            r#"{"rules": [
                {"id": "a", "path": "/one", "match": "prefix", "labelId": "x"},
                {"id": "a", "path": "/two", "match": "prefix", "labelId": "y"}
            ]}"#,
        );
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules[0].path, "/one");
        assert_eq!(rejected[0].reason, InvalidRule::DuplicateId("a".into()));
    }

    #[test]
    fn rejection_reasons_read_as_messages() {
        assert_eq!(
            InvalidRule::MissingField("labelId").to_string(),
            "missing or non-string field `labelId`"
        );
        assert_eq!(
            InvalidRule::UnknownMatchMode("glob".into()).to_string(),
            "unknown match mode `glob`"
        );
        let as_error: &dyn std::error::Error = &InvalidRule::NotAnObject;
        assert_eq!(as_error.to_string(), "entry is not an object");
    }

    #[test]
    fn malformed_top_level() {
        for text in ["not json", "[]", r#"{"version": 1}"#, r#"{"rules": {}}"#] {
            assert!(
                matches!(decode_document(text), DocumentDecode::Malformed(_)),
                "text: {text}"
            );
        }
    }

    #[test]
    fn reports_foreign_version() {
        match decode_document(r#"{"version": 2, "rules": []}"#) {
            DocumentDecode::Decoded {
                foreign_version, ..
            } => assert_eq!(foreign_version, Some(2)),
            other => panic!("unexpected: {other:?}"),
        }
        match decode_document(r#"{"version": 1, "rules": []}"#) {
            DocumentDecode::Decoded {
                foreign_version, ..
            } => assert_eq!(foreign_version, None),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
