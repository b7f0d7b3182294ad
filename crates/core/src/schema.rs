//! Schema model
//!
//! This module defines the in-memory description of a message type:
//! - FieldType: closed set of value types a field can declare
//! - FieldDef: a named, tagged field with a type and repeated modifier
//! - EnumDef: a named enumeration of symbolic variants
//! - Schema: an ordered sequence of field definitions
//!
//! Schemas are immutable after construction and shared read-only via `Arc`.
//! All construction-time validation (tag range, uniqueness) happens in
//! `Schema::new` and `EnumDef::new`; violations return `InvalidSchema`.
//!
//! ## Tag Contract
//!
//! Tags are stable small integers in `1..=MAX_FIELD_TAG`. On the wire the tag
//! shares a varint with a 3-bit wire type discriminant, so the ceiling is
//! 2^29 - 1. Once assigned, a tag must never be reused for a different type
//! across schema evolution.

use crate::error::{Error, Result};
use crate::store::ValueStore;
use crate::value::{EnumValue, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Highest permitted field tag (2^29 - 1)
///
/// The encoded field key is `tag << 3 | wire_type`, and keys are limited to
/// 32-bit varints.
pub const MAX_FIELD_TAG: u32 = (1 << 29) - 1;

/// A single declared variant of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumVariant {
    /// Symbolic name, unique within the enum
    pub name: String,
    /// Integer value, unique within the enum
    pub number: i32,
}

/// A named enumeration definition
///
/// The first declared variant is the default. Variant names and numbers are
/// unique; both directions of lookup are supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    name: String,
    variants: Vec<EnumVariant>,
}

impl EnumDef {
    /// Create an enum definition from `(name, number)` pairs
    ///
    /// Fails with `InvalidSchema` if the name is empty, no variants are
    /// given, or a variant name or number repeats.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = (S, i32)>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidSchema("enum name is empty".to_string()));
        }

        let variants: Vec<EnumVariant> = variants
            .into_iter()
            .map(|(n, number)| EnumVariant {
                name: n.into(),
                number,
            })
            .collect();

        if variants.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "enum {} has no variants",
                name
            )));
        }

        for (i, v) in variants.iter().enumerate() {
            if v.name.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "enum {} has a variant with an empty name",
                    name
                )));
            }
            for earlier in &variants[..i] {
                if earlier.name == v.name {
                    return Err(Error::InvalidSchema(format!(
                        "enum {} declares variant {} twice",
                        name, v.name
                    )));
                }
                if earlier.number == v.number {
                    return Err(Error::InvalidSchema(format!(
                        "enum {} reuses number {} for {}",
                        name, v.number, v.name
                    )));
                }
            }
        }

        Ok(EnumDef { name, variants })
    }

    /// Enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared variants in declaration order
    pub fn variants(&self) -> &[EnumVariant] {
        &self.variants
    }

    /// Look up a variant by symbolic name
    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Look up a variant by integer number
    pub fn variant_by_number(&self, number: i32) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.number == number)
    }

    /// The default variant (first declared)
    pub fn default_variant(&self) -> &EnumVariant {
        // new() rejects empty variant lists
        &self.variants[0]
    }

    /// Resolve a symbolic name to a value, failing with `UnknownEnumVariant`
    pub fn value(&self, name: &str) -> Result<EnumValue> {
        let variant = self
            .variant(name)
            .ok_or_else(|| Error::UnknownEnumVariant {
                enum_name: self.name.clone(),
                variant: name.to_string(),
            })?;
        Ok(EnumValue::new(&variant.name, variant.number))
    }
}

/// Declared type of a field
///
/// Enumerated and nested-message fields carry their definition directly, so
/// a field cannot declare an enum type without an enum definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Signed 64-bit integer
    Int,
    /// Unsigned 64-bit integer
    UInt,
    /// IEEE-754 binary64 floating point
    Float,
    /// Boolean
    Bool,
    /// UTF-8 text
    String,
    /// Raw byte sequence
    Bytes,
    /// Enumerated value drawn from the referenced definition
    Enum(Arc<EnumDef>),
    /// Nested message conforming to the referenced schema
    Message(Arc<Schema>),
}

impl FieldType {
    /// Human-readable type name, used in error messages
    pub fn name(&self) -> String {
        match self {
            FieldType::Int => "int".to_string(),
            FieldType::UInt => "uint".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::String => "string".to_string(),
            FieldType::Bytes => "bytes".to_string(),
            FieldType::Enum(def) => format!("enum {}", def.name()),
            FieldType::Message(schema) => format!("message {}", schema.name()),
        }
    }
}

/// A single field declaration within a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name, unique within the schema
    pub name: String,
    /// Stable wire tag, unique within the schema
    pub tag: u32,
    /// Declared value type
    pub ty: FieldType,
    /// Whether the field holds an ordered sequence of values
    pub repeated: bool,
}

impl FieldDef {
    /// Create a singular field
    pub fn new(name: impl Into<String>, tag: u32, ty: FieldType) -> Self {
        FieldDef {
            name: name.into(),
            tag,
            ty,
            repeated: false,
        }
    }

    /// Mark this field as repeated
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Human-readable type name including the repeated modifier
    pub fn type_name(&self) -> String {
        if self.repeated {
            format!("repeated {}", self.ty.name())
        } else {
            self.ty.name()
        }
    }

    /// The default value for this field
    ///
    /// Zero, empty, or first enum variant per type; repeated fields default
    /// to an empty list.
    pub fn default_value(&self) -> Value {
        if self.repeated {
            return Value::List(Vec::new());
        }
        match &self.ty {
            FieldType::Int => Value::Int(0),
            FieldType::UInt => Value::UInt(0),
            FieldType::Float => Value::Float(0.0),
            FieldType::Bool => Value::Bool(false),
            FieldType::String => Value::String(String::new()),
            FieldType::Bytes => Value::Bytes(Vec::new()),
            FieldType::Enum(def) => {
                let v = def.default_variant();
                Value::Enum(EnumValue::new(&v.name, v.number))
            }
            FieldType::Message(schema) => Value::Message(ValueStore::new(schema.clone())),
        }
    }
}

/// A message schema: a name and an ordered sequence of field definitions
///
/// Construction validates tag range and tag/name uniqueness. Lookups by tag
/// and by name never return silent defaults; absence is an explicit `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDef>,
}

impl Schema {
    /// Create a schema from field definitions
    ///
    /// Fails with `InvalidSchema` if the name is empty, a tag is outside
    /// `1..=MAX_FIELD_TAG`, or a tag or field name repeats.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidSchema("schema name is empty".to_string()));
        }

        for (i, f) in fields.iter().enumerate() {
            if f.name.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "schema {} has a field with an empty name (tag {})",
                    name, f.tag
                )));
            }
            if f.tag == 0 || f.tag > MAX_FIELD_TAG {
                return Err(Error::InvalidSchema(format!(
                    "schema {} field {} has tag {} outside 1..={}",
                    name, f.name, f.tag, MAX_FIELD_TAG
                )));
            }
            for earlier in &fields[..i] {
                if earlier.tag == f.tag {
                    return Err(Error::InvalidSchema(format!(
                        "schema {} reuses tag {} for {}",
                        name, f.tag, f.name
                    )));
                }
                if earlier.name == f.name {
                    return Err(Error::InvalidSchema(format!(
                        "schema {} declares field {} twice",
                        name, f.name
                    )));
                }
            }
        }

        Ok(Schema { name, fields })
    }

    /// Schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field definitions in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Resolve a field by wire tag
    pub fn field(&self, tag: u32) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Resolve a field by name
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}
