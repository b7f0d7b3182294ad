//! Value store
//!
//! This module defines `ValueStore`, an in-memory instance of a message: a
//! mapping from field tag to value with presence tracking.
//!
//! ## Presence
//!
//! Presence ("explicitly set") is tracked in a companion set of tags rather
//! than by sentinel values, so a field explicitly set to its default is
//! distinguishable from a field never set. Both codecs rely on this to omit
//! absent fields.
//!
//! ## Invariants
//!
//! - Every stored tag corresponds to a FieldDef of the associated schema
//! - Stored values conform to the declared field type (checked in `set`)
//! - Two stores are equal iff they share a schema name, the same present
//!   tags, and equal values for each present tag

use crate::error::{Error, Result};
use crate::schema::{FieldDef, FieldType, Schema};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// An in-memory instance of a message
///
/// Created empty or by a codec decode path; each decode produces a fresh
/// store. The schema is shared read-only.
#[derive(Debug, Clone)]
pub struct ValueStore {
    schema: Arc<Schema>,
    values: BTreeMap<u32, Value>,
    present: BTreeSet<u32>,
}

impl ValueStore {
    /// Create an empty store over a schema
    pub fn new(schema: Arc<Schema>) -> Self {
        ValueStore {
            schema,
            values: BTreeMap::new(),
            present: BTreeSet::new(),
        }
    }

    /// The schema this store conforms to
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Store a value and mark the tag present
    ///
    /// Fails with `UnknownField` if the tag is not declared, `TypeMismatch`
    /// if the value kind disagrees with the declared type, and
    /// `UnknownEnumVariant` if an enum selection is not declared. The store
    /// is unchanged on failure.
    pub fn set(&mut self, tag: u32, value: Value) -> Result<()> {
        let field = self
            .schema
            .field(tag)
            .ok_or_else(|| Error::unknown_tag(self.schema.name(), tag))?;
        check_value(field, &value)?;
        self.values.insert(tag, value);
        self.present.insert(tag);
        Ok(())
    }

    /// Read a field's effective value
    ///
    /// Returns the stored value if present, else the declared type's default.
    /// Fails with `UnknownField` only when the tag is not in the schema.
    pub fn get(&self, tag: u32) -> Result<Value> {
        let field = self
            .schema
            .field(tag)
            .ok_or_else(|| Error::unknown_tag(self.schema.name(), tag))?;
        match self.values.get(&tag) {
            Some(v) => Ok(v.clone()),
            None => Ok(field.default_value()),
        }
    }

    /// Borrow a field's stored value, if present
    ///
    /// Codec encode paths use this to walk present fields without cloning.
    pub fn value(&self, tag: u32) -> Option<&Value> {
        self.values.get(&tag)
    }

    /// Whether the tag was explicitly set
    ///
    /// Distinguishes default-valued-but-unset from explicitly-set-to-default.
    pub fn is_present(&self, tag: u32) -> bool {
        self.present.contains(&tag)
    }

    /// Remove a value and its presence flag
    pub fn clear(&mut self, tag: u32) {
        self.values.remove(&tag);
        self.present.remove(&tag);
    }

    /// Present tags in ascending order
    pub fn present_tags(&self) -> impl Iterator<Item = u32> + '_ {
        self.present.iter().copied()
    }

    /// Number of present fields
    pub fn len(&self) -> usize {
        self.present.len()
    }

    /// Whether no field is present
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }
}

impl PartialEq for ValueStore {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name()
            && self.present == other.present
            && self
                .present
                .iter()
                .all(|tag| self.values.get(tag) == other.values.get(tag))
    }
}

/// Check a value against a field's declared type
///
/// Repeated fields require a `List` whose elements each conform to the
/// element type; a list is never valid inside another list.
fn check_value(field: &FieldDef, value: &Value) -> Result<()> {
    if field.repeated {
        let items = value.as_list().ok_or_else(|| Error::TypeMismatch {
            field: field.name.clone(),
            expected: field.type_name(),
            actual: value.kind().to_string(),
        })?;
        for item in items {
            check_scalar(field, item)?;
        }
        return Ok(());
    }
    check_scalar(field, value)
}

fn check_scalar(field: &FieldDef, value: &Value) -> Result<()> {
    match (&field.ty, value) {
        (FieldType::Int, Value::Int(_))
        | (FieldType::UInt, Value::UInt(_))
        | (FieldType::Float, Value::Float(_))
        | (FieldType::Bool, Value::Bool(_))
        | (FieldType::String, Value::String(_))
        | (FieldType::Bytes, Value::Bytes(_)) => Ok(()),
        (FieldType::Enum(def), Value::Enum(ev)) => match def.variant(&ev.name) {
            Some(declared) if declared.number == ev.number => Ok(()),
            Some(_) => Err(Error::UnknownEnumVariant {
                enum_name: def.name().to_string(),
                variant: format!("{}={}", ev.name, ev.number),
            }),
            None => Err(Error::UnknownEnumVariant {
                enum_name: def.name().to_string(),
                variant: ev.name.clone(),
            }),
        },
        (FieldType::Message(schema), Value::Message(store)) => {
            if store.schema().name() == schema.name() {
                Ok(())
            } else {
                Err(Error::TypeMismatch {
                    field: field.name.clone(),
                    expected: format!("message {}", schema.name()),
                    actual: format!("message {}", store.schema().name()),
                })
            }
        }
        _ => Err(Error::TypeMismatch {
            field: field.name.clone(),
            expected: field.ty.name(),
            actual: value.kind().to_string(),
        }),
    }
}
