//! Error types for the serialization core
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for tagpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema, store, and codec operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Field tag or name not declared in the schema
    #[error("unknown field {field} in schema {schema}")]
    UnknownField {
        /// Name of the schema that was consulted
        schema: String,
        /// Field name, or `#tag` for tag-based lookups
        field: String,
    },

    /// Value kind disagrees with the field's declared type
    #[error("type mismatch for field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Declared type of the field
        expected: String,
        /// Kind of the value that was supplied
        actual: String,
    },

    /// Symbolic name or integer value not declared in the enum
    #[error("unknown variant {variant} for enum {enum_name}")]
    UnknownEnumVariant {
        /// Name of the enum definition
        enum_name: String,
        /// Symbolic name, or decimal number for wire-side lookups
        variant: String,
    },

    /// Malformed binary stream or unparsable text document
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// Wire type incompatible with the schema's declared type for a tag
    #[error("schema mismatch for field {field}: {detail}")]
    SchemaMismatch {
        /// Field name
        field: String,
        /// What disagreed between wire and schema
        detail: String,
    },

    /// Schema or enum definition failed construction-time validation
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

impl Error {
    /// Build an `UnknownField` error for a name-based lookup
    pub fn unknown_field(schema: &str, field: &str) -> Self {
        Error::UnknownField {
            schema: schema.to_string(),
            field: field.to_string(),
        }
    }

    /// Build an `UnknownField` error for a tag-based lookup
    pub fn unknown_tag(schema: &str, tag: u32) -> Self {
        Error::UnknownField {
            schema: schema.to_string(),
            field: format!("#{}", tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_field() {
        let err = Error::unknown_field("Event", "missing");
        let msg = err.to_string();
        assert!(msg.contains("unknown field"));
        assert!(msg.contains("missing"));
        assert!(msg.contains("Event"));
    }

    #[test]
    fn test_error_display_unknown_tag() {
        let err = Error::unknown_tag("Event", 9);
        assert!(err.to_string().contains("#9"));
    }

    #[test]
    fn test_error_display_type_mismatch() {
        let err = Error::TypeMismatch {
            field: "name".to_string(),
            expected: "string".to_string(),
            actual: "int".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("type mismatch"));
        assert!(msg.contains("expected string"));
        assert!(msg.contains("got int"));
    }

    #[test]
    fn test_error_display_unknown_enum_variant() {
        let err = Error::UnknownEnumVariant {
            enum_name: "Type".to_string(),
            variant: "DELETED".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("unknown variant"));
        assert!(msg.contains("DELETED"));
        assert!(msg.contains("Type"));
    }

    #[test]
    fn test_error_display_corrupt_data() {
        let err = Error::CorruptData("varint overruns buffer at offset 12".to_string());
        let msg = err.to_string();
        assert!(msg.contains("corrupt data"));
        assert!(msg.contains("offset 12"));
    }

    #[test]
    fn test_error_display_schema_mismatch() {
        let err = Error::SchemaMismatch {
            field: "id".to_string(),
            detail: "expected varint, got length-delimited".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("schema mismatch"));
        assert!(msg.contains("length-delimited"));
    }

    #[test]
    fn test_error_display_invalid_schema() {
        let err = Error::InvalidSchema("duplicate tag 3".to_string());
        let msg = err.to_string();
        assert!(msg.contains("invalid schema"));
        assert!(msg.contains("duplicate tag 3"));
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = Error::TypeMismatch {
            field: "id".to_string(),
            expected: "enum Type".to_string(),
            actual: "string".to_string(),
        };

        match err {
            Error::TypeMismatch { field, expected, .. } => {
                assert_eq!(field, "id");
                assert_eq!(expected, "enum Type");
            }
            _ => panic!("Wrong error variant"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        fn returns_error() -> Result<i32> {
            Err(Error::CorruptData("test".to_string()))
        }

        assert_eq!(returns_result().unwrap(), 42);
        assert!(returns_error().is_err());
    }
}
