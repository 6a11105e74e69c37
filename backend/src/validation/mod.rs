//! JSON Schema validation for mapping documents.
//!
//! A mapping document is the serialized form of a
//! [`MappingTable`](crate::transform::mapping::MappingTable). Documents
//! written by hand (or by an older version) are checked against JSON Schema
//! Draft 7 before they are loaded.
//!
//! # Embedded Schema
//!
//! Embedded at compile time from `schemas/mapping-document.json`.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use sheetmap::validation::is_valid_mapping_document;
//!
//! let document = json!({
//!     "version": "1.0",
//!     "sheets": [{
//!         "source": "People",
//!         "target": "Staff",
//!         "columns": [{ "source": "Name", "target": "FullName", "rule": "Copy" }]
//!     }]
//! });
//! assert!(is_valid_mapping_document(&document));
//! ```

use serde_json::Value;

use crate::error::ValidationError;

const MAPPING_DOCUMENT_SCHEMA: &str = include_str!("../../schemas/mapping-document.json");

/// Validate a JSON value against a JSON schema.
///
/// Returns every validation error, or a single error if the schema itself
/// is invalid.
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use sheetmap::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": {
///         "name": { "type": "string" }
///     }
/// });
///
/// assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
/// assert!(validate(&schema, &json!({ "age": 42 })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Same as [`validate`], true/false only.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

fn mapping_document_schema() -> Result<Value, ValidationError> {
    Ok(serde_json::from_str(MAPPING_DOCUMENT_SCHEMA)?)
}

/// Validate a mapping document.
pub fn validate_mapping_document(data: &Value) -> Result<(), ValidationError> {
    let schema = mapping_document_schema()?;
    validate(&schema, data).map_err(|errors| ValidationError::SchemaError { errors })
}

/// Quick check of a mapping document.
pub fn is_valid_mapping_document(data: &Value) -> bool {
    mapping_document_schema().is_ok_and(|schema| is_valid(&schema, data))
}

/// Parse and validate a mapping document from JSON text.
pub fn validate_mapping_json(json: &str) -> Result<Value, ValidationError> {
    let value: Value = serde_json::from_str(json)?;
    validate_mapping_document(&value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_document() {
        let document = json!({
            "version": "1.0",
            "sheets": [{
                "source": "People",
                "target": "Staff",
                "columns": [
                    { "source": "Name", "target": "FullName", "rule": "Copy", "elements": [] },
                    {
                        "source": "Gender",
                        "target": "Sex",
                        "rule": "Translate",
                        "elements": [{ "source": "M", "target": "Male" }]
                    }
                ]
            }]
        });
        assert!(is_valid_mapping_document(&document));
        assert!(validate_mapping_document(&document).is_ok());
    }

    #[test]
    fn test_unknown_rule_names_are_valid() {
        // Unknown rules only fail when a column using them is transformed.
        let document = json!({
            "version": "1.0",
            "sheets": [{
                "source": "A",
                "target": "B",
                "columns": [{ "source": "x", "target": "y", "rule": "Split" }]
            }]
        });
        assert!(is_valid_mapping_document(&document));
    }

    #[test]
    fn test_missing_target() {
        let document = json!({
            "version": "1.0",
            "sheets": [{ "source": "A", "columns": [] }]
        });
        assert!(!is_valid_mapping_document(&document));
    }

    #[test]
    fn test_wrong_version() {
        let document = json!({ "version": "2.0", "sheets": [] });
        assert!(!is_valid_mapping_document(&document));
    }

    #[test]
    fn test_errors_are_reported() {
        let document = json!({
            "version": "1.0",
            "sheets": [{ "source": "", "target": "B", "columns": [{ "source": "x" }] }]
        });
        match validate_mapping_document(&document) {
            Err(ValidationError::SchemaError { errors }) => assert!(errors.len() >= 2),
            other => panic!("expected schema errors, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_mapping_json_rejects_bad_json() {
        assert!(matches!(
            validate_mapping_json("{ not json"),
            Err(ValidationError::JsonError(_))
        ));
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
        assert!(validate(&schema, &json!({ "age": 42 })).is_err());
        assert!(!is_valid(&schema, &json!({ "age": 42 })));
    }
}
