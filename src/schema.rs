//! Declarative schema for the consumer-group label configuration.
//!
//! The schema is a small tree of [`SchemaNode`]s built once per process. The
//! validator walks a parsed JSON document against that tree and collects every
//! violation it finds instead of stopping at the first one, so operators get the
//! full list when a configuration is rejected.
//!
//! Accepted shape:
//!
//! ```json
//! {
//!   "consumer_notifiers": [
//!     { "when": { "starts_with": ["string1"] }, "set": { "tags": ["owner:fotocasa"] } }
//!   ]
//! }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::LabelError;
use crate::models::{ConfigDocument, NotifierSpec};

/// Character class allowed in consumer-group prefixes.
pub const PREFIX_PATTERN: &str = r"^[a-zA-Z0-9_\-]+$";

/// Only owner tags are accepted.
pub const TAG_PATTERN: &str = r"^owner:[a-zA-Z0-9_\-]+$";

const ROOT_PATH: &str = "(root)";

/// A node of the declarative schema.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Object {
        required: Vec<&'static str>,
        properties: Vec<(&'static str, SchemaNode)>,
    },
    Array {
        min_items: usize,
        items: Box<SchemaNode>,
    },
    String {
        pattern: Option<Regex>,
    },
}

/// One schema violation, located by a dotted path into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.path, self.message)
    }
}

static CONFIG_SCHEMA: Lazy<SchemaNode> = Lazy::new(|| {
    // Both patterns are constants; a failure here is a programming error.
    let prefix = Regex::new(PREFIX_PATTERN).expect("prefix pattern is a valid regex");
    let tag = Regex::new(TAG_PATTERN).expect("tag pattern is a valid regex");

    let notifier = SchemaNode::object(vec![
        (
            "when",
            SchemaNode::object(vec![(
                "starts_with",
                SchemaNode::non_empty_array(SchemaNode::pattern(prefix)),
            )]),
        ),
        (
            "set",
            SchemaNode::object(vec![(
                "tags",
                SchemaNode::non_empty_array(SchemaNode::pattern(tag)),
            )]),
        ),
    ]);

    SchemaNode::object(vec![(
        "consumer_notifiers",
        SchemaNode::Array {
            min_items: 0,
            items: Box::new(notifier),
        },
    )])
});

/// The process-wide configuration schema.
pub fn config_schema() -> &'static SchemaNode {
    &CONFIG_SCHEMA
}

impl SchemaNode {
    /// An object whose listed properties are all required.
    fn object(properties: Vec<(&'static str, SchemaNode)>) -> Self {
        SchemaNode::Object {
            required: properties.iter().map(|(name, _)| *name).collect(),
            properties,
        }
    }

    fn non_empty_array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            min_items: 1,
            items: Box::new(items),
        }
    }

    fn pattern(pattern: Regex) -> Self {
        SchemaNode::String {
            pattern: Some(pattern),
        }
    }

    /// Validate `value` against this node, returning every violation found.
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut path = Vec::new();
        self.check(value, &mut path, &mut violations);
        violations
    }

    fn check(&self, value: &Value, path: &mut Vec<String>, out: &mut Vec<Violation>) {
        match self {
            SchemaNode::Object {
                required,
                properties,
            } => {
                let Some(map) = value.as_object() else {
                    out.push(type_violation(path, "object", value));
                    return;
                };
                for name in required {
                    if !map.contains_key(*name) {
                        out.push(violation(path, format!("{name} is required")));
                    }
                }
                for (name, node) in properties {
                    if let Some(child) = map.get(*name) {
                        path.push((*name).to_string());
                        node.check(child, path, out);
                        path.pop();
                    }
                }
            }
            SchemaNode::Array { min_items, items } => {
                let Some(elements) = value.as_array() else {
                    out.push(type_violation(path, "array", value));
                    return;
                };
                if elements.len() < *min_items {
                    out.push(violation(
                        path,
                        format!("Array must have at least {min_items} items"),
                    ));
                }
                for (index, element) in elements.iter().enumerate() {
                    path.push(index.to_string());
                    items.check(element, path, out);
                    path.pop();
                }
            }
            SchemaNode::String { pattern } => {
                let Some(text) = value.as_str() else {
                    out.push(type_violation(path, "string", value));
                    return;
                };
                if let Some(re) = pattern {
                    if !re.is_match(text) {
                        out.push(violation(
                            path,
                            format!("Does not match pattern '{}'", re.as_str()),
                        ));
                    }
                }
            }
        }
    }
}

fn violation(path: &[String], message: String) -> Violation {
    let path = if path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        path.join(".")
    };
    Violation { path, message }
}

fn type_violation(path: &[String], expected: &str, given: &Value) -> Violation {
    violation(
        path,
        format!(
            "Invalid type. Expected: {expected}, given: {}",
            json_type_name(given)
        ),
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse and validate a raw configuration document.
///
/// Returns `LabelError::ConfigParse` if `raw` is not JSON at all, and
/// `LabelError::ConfigValidation` with one entry per violation if it is JSON
/// but does not satisfy the schema.
pub fn validate_config(raw: &str) -> Result<Vec<NotifierSpec>, LabelError> {
    let document: Value = serde_json::from_str(raw).map_err(|e| {
        debug!(event = "ConfigValidation", phase = "Parse", error = %e);
        LabelError::ConfigParse(e.to_string())
    })?;

    let violations = config_schema().validate(&document);
    if !violations.is_empty() {
        debug!(
            event = "ConfigValidation",
            phase = "Schema",
            violations = violations.len()
        );
        return Err(LabelError::ConfigValidation(
            violations.iter().map(ToString::to_string).collect(),
        ));
    }

    let document: ConfigDocument = serde_json::from_value(document)?;
    Ok(document.into_notifiers())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    const VALID: &str = r#"{
        "consumer_notifiers": [
            {"when": {"starts_with": ["string1", "string2"]}, "set": {"tags": ["owner:fotocasa"]}},
            {"when": {"starts_with": ["string3"]}, "set": {"tags": ["owner:mads"]}}
        ]
    }"#;

    fn violations_of(raw: &str) -> Vec<String> {
        match validate_config(raw) {
            Err(LabelError::ConfigValidation(v)) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_config_normalizes_notifiers() {
        let notifiers = validate_config(VALID).unwrap();
        assert_eq!(notifiers.len(), 2);
        assert_eq!(notifiers[0].match_prefixes, vec!["string1", "string2"]);
        assert_eq!(notifiers[0].tags, vec!["owner:fotocasa"]);
        assert_eq!(notifiers[1].match_prefixes, vec!["string3"]);
    }

    #[test]
    fn test_empty_notifier_list_is_valid() {
        let notifiers = validate_config(r#"{"consumer_notifiers": []}"#).unwrap();
        assert!(notifiers.is_empty());
    }

    #[parameterized(
        empty = { "" },
        truncated = { r#"{"consumer_notifiers": ["# },
        not_json = { "consumer_notifiers: []" },
    )]
    fn test_unparseable_config(raw: &str) {
        assert!(matches!(
            validate_config(raw),
            Err(LabelError::ConfigParse(_))
        ));
    }

    #[parameterized(
        missing_root_key = { r#"{}"#, "(root): consumer_notifiers is required" },
        root_not_object = { r#"[]"#, "(root): Invalid type. Expected: object, given: array" },
        nested_array = {
            r#"{"consumer_notifiers": [[{"when": {"starts_with": ["string1"]}, "set": {"tags": ["owner:fotocasa"]}}]]}"#,
            "consumer_notifiers.0: Invalid type. Expected: object, given: array"
        },
        missing_set = {
            r#"{"consumer_notifiers": [{"when": {"starts_with": ["a"]}}]}"#,
            "consumer_notifiers.0: set is required"
        },
        empty_prefixes = {
            r#"{"consumer_notifiers": [{"when": {"starts_with": []}, "set": {"tags": ["owner:a"]}}]}"#,
            "consumer_notifiers.0.when.starts_with: Array must have at least 1 items"
        },
        bad_prefix = {
            r#"{"consumer_notifiers": [{"when": {"starts_with": ["has space"]}, "set": {"tags": ["owner:a"]}}]}"#,
            r"consumer_notifiers.0.when.starts_with.0: Does not match pattern '^[a-zA-Z0-9_\-]+$'"
        },
        non_owner_tag = {
            r#"{"consumer_notifiers": [{"when": {"starts_with": ["a"]}, "set": {"tags": ["team:a"]}}]}"#,
            r"consumer_notifiers.0.set.tags.0: Does not match pattern '^owner:[a-zA-Z0-9_\-]+$'"
        },
        numeric_tag = {
            r#"{"consumer_notifiers": [{"when": {"starts_with": ["a"]}, "set": {"tags": [7]}}]}"#,
            "consumer_notifiers.0.set.tags.0: Invalid type. Expected: string, given: integer"
        },
    )]
    fn test_schema_violation(raw: &str, expected: &str) {
        let violations = violations_of(raw);
        assert!(
            violations.iter().any(|v| v == expected),
            "expected {expected:?} in {violations:?}"
        );
    }

    #[test]
    fn test_all_violations_are_collected() {
        let raw = r#"{"consumer_notifiers": [
            {"when": {"starts_with": ["ok", "not ok"]}, "set": {"tags": []}},
            {"set": {"tags": ["owner:x", "nope"]}}
        ]}"#;
        let violations = violations_of(raw);
        assert_eq!(
            violations,
            vec![
                r"consumer_notifiers.0.when.starts_with.1: Does not match pattern '^[a-zA-Z0-9_\-]+$'",
                "consumer_notifiers.0.set.tags: Array must have at least 1 items",
                "consumer_notifiers.1: when is required",
                r"consumer_notifiers.1.set.tags.1: Does not match pattern '^owner:[a-zA-Z0-9_\-]+$'",
            ]
        );
    }

    #[test]
    fn test_schema_is_shared() {
        assert!(std::ptr::eq(config_schema(), config_schema()));
    }
}
