// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural view of Avro record schemas.
//!
//! Only what compatibility analysis needs is extracted: the record name and
//! each field's name, type and whether it declares a default. Binary
//! encoding is out of scope.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

/// One field of an Avro record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub name: String,
    /// Compact JSON of the field's `type` attribute.
    pub type_repr: String,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvroError {
    #[error("Invalid JSON in schema: {0}")]
    Json(String),
    #[error("schema must be a JSON object")]
    NotAnObject,
    #[error("schema type must be \"record\", got {0}")]
    NotARecord(String),
    #[error("record is missing a string \"name\"")]
    MissingName,
    #[error("record is missing a \"fields\" array")]
    MissingFields,
    #[error("field #{index} {reason}")]
    InvalidField { index: usize, reason: String },
    #[error("duplicate field '{0}'")]
    DuplicateField(String),
}

/// Parse a definition as JSON without any Avro checks.
pub fn parse_json(definition: &str) -> Result<Value, AvroError> {
    serde_json::from_str(definition).map_err(|e| AvroError::Json(e.to_string()))
}

/// Full name of a record (`namespace.name` when a namespace is declared).
pub fn record_name(schema: &Value) -> Option<String> {
    let name = schema.get("name")?.as_str()?;
    match schema.get("namespace").and_then(Value::as_str) {
        Some(ns) if !ns.is_empty() && !name.contains('.') => Some(format!("{}.{}", ns, name)),
        _ => Some(name.to_string()),
    }
}

/// Extract the fields of a record schema, in declaration order.
pub fn record_fields(schema: &Value) -> Result<Vec<RecordField>, AvroError> {
    let object = schema.as_object().ok_or(AvroError::NotAnObject)?;

    match object.get("type") {
        Some(Value::String(t)) if t == "record" => {}
        Some(other) => return Err(AvroError::NotARecord(other.to_string())),
        None => return Err(AvroError::NotARecord("nothing".to_string())),
    }

    if !matches!(object.get("name"), Some(Value::String(n)) if !n.is_empty()) {
        return Err(AvroError::MissingName);
    }

    let raw_fields = object
        .get("fields")
        .and_then(Value::as_array)
        .ok_or(AvroError::MissingFields)?;

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(raw_fields.len());
    for (index, raw) in raw_fields.iter().enumerate() {
        let field = raw.as_object().ok_or_else(|| AvroError::InvalidField {
            index,
            reason: "is not an object".to_string(),
        })?;

        let name = match field.get("name") {
            Some(Value::String(n)) if !n.is_empty() => n.clone(),
            _ => {
                return Err(AvroError::InvalidField {
                    index,
                    reason: "has no name".to_string(),
                })
            }
        };
        let field_type = field.get("type").ok_or_else(|| AvroError::InvalidField {
            index,
            reason: format!("'{}' has no type", name),
        })?;

        if !seen.insert(name.clone()) {
            return Err(AvroError::DuplicateField(name));
        }

        fields.push(RecordField {
            type_repr: field_type.to_string(),
            has_default: field.contains_key("default"),
            name,
        });
    }

    Ok(fields)
}

/// Check that `definition` is a well-formed Avro record.
pub fn validate(definition: &str) -> Result<(), AvroError> {
    let schema = parse_json(definition)?;
    record_fields(&schema).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: &str = r#"{
        "type": "record",
        "name": "Order",
        "namespace": "shop",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "note", "type": ["null", "string"], "default": null}
        ]
    }"#;

    #[test]
    fn extracts_fields_in_order() {
        let schema = parse_json(ORDER).unwrap();
        let fields = record_fields(&schema).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].type_repr, "\"long\"");
        assert!(!fields[0].has_default);
        assert_eq!(fields[1].type_repr, r#"["null","string"]"#);
        assert!(fields[1].has_default, "null default still counts");
    }

    #[test]
    fn full_name_uses_namespace() {
        let schema = parse_json(ORDER).unwrap();
        assert_eq!(record_name(&schema).as_deref(), Some("shop.Order"));
    }

    #[test]
    fn rejects_non_records() {
        assert!(matches!(validate("not json"), Err(AvroError::Json(_))));
        assert_eq!(validate("\"string\""), Err(AvroError::NotAnObject));
        assert!(matches!(
            validate(r#"{"type": "enum", "name": "E", "symbols": ["A"]}"#),
            Err(AvroError::NotARecord(_))
        ));
        assert_eq!(
            validate(r#"{"type": "record", "fields": []}"#),
            Err(AvroError::MissingName)
        );
        assert_eq!(
            validate(r#"{"type": "record", "name": "R"}"#),
            Err(AvroError::MissingFields)
        );
    }

    #[test]
    fn rejects_bad_fields() {
        let untyped = r#"{"type": "record", "name": "R", "fields": [{"name": "a"}]}"#;
        assert!(matches!(
            validate(untyped),
            Err(AvroError::InvalidField { index: 0, .. })
        ));

        let duplicate = r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int"}, {"name": "a", "type": "long"}]}"#;
        assert_eq!(validate(duplicate), Err(AvroError::DuplicateField("a".into())));
    }

    #[test]
    fn empty_record_is_valid() {
        assert!(validate(r#"{"type": "record", "name": "Empty", "fields": []}"#).is_ok());
    }
}
