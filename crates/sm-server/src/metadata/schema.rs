//! Metadata schema compilation, trimming and validation
//!
//! The schema is a JSON-schema subset: `type`, `properties`, `required`,
//! `enum`, `minLength`, `maxLength`, `pattern`, `minimum`, `maximum`,
//! `items`, `minItems` and `additionalProperties: false`. Other keywords
//! (titles, descriptions, UI hints) are accepted and ignored.
//!
//! Validation always runs on a trimmed copy of the document and reports
//! every violation, never just the first one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::error::{MutationError, MutationResult};

const BUNDLED_SCHEMA: &str = include_str!("metadata_schema.json");

/// Errors raised while compiling a schema definition
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid pattern '{pattern}' in schema: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer to the offending value
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JsonType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl JsonType {
    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::Object => value.is_object(),
            JsonType::Array => value.is_array(),
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|n| n.fract() == 0.0)
            },
            JsonType::Boolean => value.is_boolean(),
            JsonType::Null => value.is_null(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TypeSet {
    One(JsonType),
    Many(Vec<JsonType>),
}

impl TypeSet {
    fn as_slice(&self) -> &[JsonType] {
        match self {
            TypeSet::One(t) => std::slice::from_ref(t),
            TypeSet::Many(ts) => ts,
        }
    }
}

/// One node of the schema tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "type", default)]
    types: Option<TypeSet>,
    #[serde(default)]
    properties: BTreeMap<String, SchemaNode>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(rename = "enum", default)]
    allowed_values: Option<Vec<Value>>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    items: Option<Box<SchemaNode>>,
    min_items: Option<usize>,
    additional_properties: Option<Value>,
    #[serde(skip)]
    compiled_pattern: Option<Regex>,
}

impl SchemaNode {
    fn compile(&mut self) -> Result<(), SchemaError> {
        if let Some(ref pattern) = self.pattern {
            let regex = Regex::new(pattern).map_err(|source| SchemaError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            self.compiled_pattern = Some(regex);
        }
        for child in self.properties.values_mut() {
            child.compile()?;
        }
        if let Some(ref mut items) = self.items {
            items.compile()?;
        }
        Ok(())
    }

    fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    fn rejects_additional_properties(&self) -> bool {
        matches!(self.additional_properties, Some(Value::Bool(false)))
    }

    fn trim(&self, value: &Value) -> Value {
        let Value::Object(map) = value else {
            return value.clone();
        };
        let mut obj = map.clone();
        for (name, prop) in &self.properties {
            let empty = obj.get(name).is_none_or(is_empty);
            if empty && !self.is_required(name) {
                obj.remove(name);
            } else if let Some(child) = obj.get_mut(name) {
                let trimmed = prop.trim(child);
                *child = trimmed;
            }
        }
        Value::Object(obj)
    }

    fn check(&self, value: &Value, path: &str, out: &mut Vec<Violation>) {
        if let Some(ref types) = self.types {
            let types = types.as_slice();
            if !types.iter().any(|t| t.matches(value)) {
                let names: Vec<_> = types.iter().map(|t| t.name()).collect();
                out.push(Violation::new(path, format!("must be {}", names.join(" or "))));
                return;
            }
        }

        if let Some(ref allowed) = self.allowed_values {
            if !allowed.contains(value) {
                out.push(Violation::new(path, "must be equal to one of the allowed values"));
            }
        }

        match value {
            Value::String(s) => self.check_string(s, path, out),
            Value::Number(n) => {
                if let Some(n) = n.as_f64() {
                    self.check_number(n, path, out);
                }
            },
            Value::Object(map) => {
                for name in &self.required {
                    if !map.contains_key(name) {
                        out.push(Violation::new(child_path(path, name), "is a required property"));
                    }
                }
                for (name, prop) in &self.properties {
                    if let Some(child) = map.get(name) {
                        prop.check(child, &child_path(path, name), out);
                    }
                }
                if self.rejects_additional_properties() {
                    for name in map.keys().filter(|k| !self.properties.contains_key(*k)) {
                        out.push(Violation::new(child_path(path, name), "is not an allowed property"));
                    }
                }
            },
            Value::Array(items) => {
                if let Some(min) = self.min_items {
                    if items.len() < min {
                        out.push(Violation::new(
                            path,
                            format!("must contain at least {} item(s)", min),
                        ));
                    }
                }
                if let Some(ref item_schema) = self.items {
                    for (idx, item) in items.iter().enumerate() {
                        item_schema.check(item, &child_path(path, &idx.to_string()), out);
                    }
                }
            },
            _ => {},
        }
    }

    fn check_string(&self, s: &str, path: &str, out: &mut Vec<Violation>) {
        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                out.push(Violation::new(
                    path,
                    format!("must not be shorter than {} character(s)", min),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                out.push(Violation::new(
                    path,
                    format!("must not be longer than {} character(s)", max),
                ));
            }
        }
        if let Some(ref regex) = self.compiled_pattern {
            if !regex.is_match(s) {
                out.push(Violation::new(
                    path,
                    format!("must match pattern \"{}\"", regex.as_str()),
                ));
            }
        }
    }

    fn check_number(&self, n: f64, path: &str, out: &mut Vec<Violation>) {
        if let Some(min) = self.minimum {
            if n < min {
                out.push(Violation::new(path, format!("must be >= {}", min)));
            }
        }
        if let Some(max) = self.maximum {
            if n > max {
                out.push(Violation::new(path, format!("must be <= {}", max)));
            }
        }
    }
}

/// Null, empty strings, and containers holding only empty values
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.values().all(is_empty),
        Value::Array(items) => items.iter().all(is_empty),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn child_path(parent: &str, token: &str) -> String {
    format!("{}/{}", parent, token.replace('~', "~0").replace('/', "~1"))
}

/// A compiled metadata schema
///
/// Compile once at startup and share it; it holds no external resources.
#[derive(Debug, Clone)]
pub struct MetadataSchema {
    root: SchemaNode,
}

impl MetadataSchema {
    /// The imaging-MS metadata schema shipped with this crate
    pub fn bundled() -> Result<Self, SchemaError> {
        Self::from_json(BUNDLED_SCHEMA)
    }

    pub fn from_json(definition: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(definition)?;
        Self::from_value(value)
    }

    pub fn from_value(definition: Value) -> Result<Self, SchemaError> {
        let mut root: SchemaNode = serde_json::from_value(definition)?;
        root.compile()?;
        Ok(Self { root })
    }

    /// Drop optional fields whose value is empty
    ///
    /// Required fields are kept even when empty so that validation reports
    /// them. Arrays are left untouched.
    pub fn trim(&self, metadata: &Value) -> Value {
        self.root.trim(metadata)
    }

    /// Every violation of `metadata` against the schema, without trimming
    pub fn violations(&self, metadata: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        self.root.check(metadata, "", &mut out);
        out
    }

    /// Trim, then validate, failing with the complete list of violations
    pub fn validate(&self, metadata: &Value) -> MutationResult<()> {
        let violations = self.violations(&self.trim(metadata));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(MutationError::ValidationFailed { violations })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn small_schema() -> MetadataSchema {
        MetadataSchema::from_value(json!({
            "type": "object",
            "required": ["Name", "Contact"],
            "properties": {
                "Name": {"type": "string", "minLength": 1},
                "Contact": {
                    "type": "object",
                    "required": ["Email"],
                    "properties": {
                        "Email": {"type": "string", "pattern": "^[^@]+@[^@]+$"},
                        "Phone": {"type": "string"}
                    }
                },
                "Optional_Block": {
                    "type": "object",
                    "required": ["Field"],
                    "properties": {"Field": {"type": "string", "minLength": 1}}
                },
                "Tags": {"type": "array", "items": {"type": "string"}},
                "Score": {"type": "number", "minimum": 0, "maximum": 10}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_bundled_schema_compiles() {
        assert!(MetadataSchema::bundled().is_ok());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = MetadataSchema::from_value(json!({"type": "string", "pattern": "("})).unwrap_err();
        assert!(matches!(err, SchemaError::Pattern { .. }));
    }

    #[test]
    fn test_trim_drops_empty_optional_fields() {
        let schema = small_schema();
        let trimmed = schema.trim(&json!({
            "Name": "x",
            "Contact": {"Email": "a@b", "Phone": ""},
            "Optional_Block": {"Field": ""},
            "Score": null
        }));
        assert_eq!(trimmed, json!({"Name": "x", "Contact": {"Email": "a@b"}}));
    }

    #[test]
    fn test_trim_keeps_empty_required_fields() {
        let schema = small_schema();
        let trimmed = schema.trim(&json!({"Name": "", "Contact": {"Email": null}}));
        assert_eq!(trimmed, json!({"Name": "", "Contact": {"Email": null}}));

        let Err(MutationError::ValidationFailed { violations }) =
            schema.validate(&json!({"Name": "", "Contact": {"Email": null}}))
        else {
            panic!("expected validation failure");
        };
        let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["/Contact/Email", "/Name"]);
    }

    #[test]
    fn test_trim_leaves_arrays_alone() {
        let schema = small_schema();
        let doc = json!({"Name": "x", "Contact": {"Email": "a@b"}, "Tags": ["", "t"]});
        assert_eq!(schema.trim(&doc), doc);
    }

    #[test]
    fn test_validate_reports_all_violations() {
        let schema = small_schema();
        let Err(MutationError::ValidationFailed { violations }) = schema.validate(&json!({
            "Contact": {"Email": "not-an-email"},
            "Tags": ["ok", 3],
            "Score": 11
        })) else {
            panic!("expected validation failure");
        };

        assert_eq!(
            violations,
            vec![
                Violation::new("/Name", "is a required property"),
                Violation::new("/Contact/Email", "must match pattern \"^[^@]+@[^@]+$\""),
                Violation::new("/Score", "must be <= 10"),
                Violation::new("/Tags/1", "must be string"),
            ]
        );
    }

    #[test]
    fn test_valid_document_passes() {
        let schema = small_schema();
        assert!(schema
            .validate(&json!({"Name": "n", "Contact": {"Email": "a@b"}, "Score": 3}))
            .is_ok());
    }

    #[test]
    fn test_additional_properties_false() {
        let schema = MetadataSchema::from_value(json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {"a": {"type": ["integer", "null"]}}
        }))
        .unwrap();
        assert!(schema.violations(&json!({"a": null})).is_empty());
        assert_eq!(
            schema.violations(&json!({"a": 1.5, "b": 1})),
            vec![
                Violation::new("/a", "must be integer or null"),
                Violation::new("/b", "is not an allowed property"),
            ]
        );
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            Just(json!("")),
            "[a-z@.]{0,6}".prop_map(Value::from),
            (0i64..20).prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(Value::from),
                prop::collection::btree_map(
                    prop_oneof![
                        Just("Name".to_string()),
                        Just("Contact".to_string()),
                        Just("Email".to_string()),
                        Just("Phone".to_string()),
                        Just("Optional_Block".to_string()),
                        Just("Field".to_string()),
                        Just("Score".to_string()),
                    ],
                    inner,
                    0..4
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_trim_is_idempotent(doc in arb_json()) {
            let schema = small_schema();
            let once = schema.trim(&doc);
            prop_assert_eq!(schema.trim(&once), once);
        }
    }
}
