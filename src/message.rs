//! Message facade
//!
//! The typed, ergonomic surface an application uses: construct by named
//! fields, read and write by field name, and move to and from the binary and
//! text encodings. Every call desugars to one schema lookup plus one store
//! or codec call.

use std::sync::Arc;
use tagpack_codec::text::TextOptions;
use tagpack_codec::{binary, text};
use tagpack_core::{DecodeLimits, Error, Result, Schema, Value, ValueStore};

/// A message instance bound to a schema
///
/// ## Example
///
/// ```ignore
/// use tagpack::{EnumDef, FieldDef, FieldType, Message, Schema, Value};
///
/// let event = Message::with_fields(schema, [
///     ("id", Value::Enum(ty.value("CREATED")?)),
///     ("name", Value::from("test")),
/// ])?;
/// let bytes = event.to_binary()?;
/// let text = event.to_text()?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    store: ValueStore,
}

impl Message {
    /// Create an empty message over a schema
    pub fn new(schema: Arc<Schema>) -> Self {
        Message {
            store: ValueStore::new(schema),
        }
    }

    /// Construct a message from named field values
    ///
    /// Every pair is validated against the schema; the first unknown name or
    /// mismatched value fails the whole construction.
    pub fn with_fields<S: AsRef<str>>(
        schema: Arc<Schema>,
        fields: impl IntoIterator<Item = (S, Value)>,
    ) -> Result<Self> {
        let mut message = Message::new(schema);
        for (name, value) in fields {
            message.set(name.as_ref(), value)?;
        }
        Ok(message)
    }

    /// The schema this message conforms to
    pub fn schema(&self) -> &Arc<Schema> {
        self.store.schema()
    }

    /// The underlying value store
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    /// Consume the message, returning the underlying store
    pub fn into_store(self) -> ValueStore {
        self.store
    }

    /// Read a field's effective value by name
    ///
    /// Returns the stored value if present, else the declared default.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.store.get(self.resolve(name)?)
    }

    /// Set a field by name
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let tag = self.resolve(name)?;
        self.store.set(tag, value.into())
    }

    /// Whether a field was explicitly set
    pub fn is_present(&self, name: &str) -> Result<bool> {
        Ok(self.store.is_present(self.resolve(name)?))
    }

    /// Remove a field's value and presence flag
    pub fn clear(&mut self, name: &str) -> Result<()> {
        let tag = self.resolve(name)?;
        self.store.clear(tag);
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<u32> {
        self.store
            .schema()
            .field_by_name(name)
            .map(|f| f.tag)
            .ok_or_else(|| Error::unknown_field(self.store.schema().name(), name))
    }

    /// Encode to the compact binary wire format
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        binary::encode(&self.store)
    }

    /// Decode from the binary wire format with default limits
    pub fn from_binary(bytes: &[u8], schema: Arc<Schema>) -> Result<Self> {
        Ok(Message {
            store: binary::decode(bytes, schema)?,
        })
    }

    /// Decode from the binary wire format with explicit limits
    pub fn from_binary_with(
        bytes: &[u8],
        schema: Arc<Schema>,
        limits: &DecodeLimits,
    ) -> Result<Self> {
        Ok(Message {
            store: binary::decode_with(bytes, schema, limits)?,
        })
    }

    /// Encode to a compact JSON string
    pub fn to_text(&self) -> Result<String> {
        text::to_string(&self.store)
    }

    /// Encode to a compact JSON string with options
    pub fn to_text_with(&self, opts: &TextOptions) -> Result<String> {
        text::to_string_with(&self.store, opts)
    }

    /// Encode to a JSON value
    pub fn to_json(&self) -> Result<serde_json::Value> {
        text::to_json(&self.store)
    }

    /// Decode from a JSON string with default limits
    pub fn from_text(text: &str, schema: Arc<Schema>) -> Result<Self> {
        Ok(Message {
            store: text::from_str(text, schema)?,
        })
    }

    /// Decode from a JSON string with explicit limits
    pub fn from_text_with(input: &str, schema: Arc<Schema>, limits: &DecodeLimits) -> Result<Self> {
        Ok(Message {
            store: text::from_str_with(input, schema, limits)?,
        })
    }

    /// Decode from a JSON value with default limits
    pub fn from_json(json: &serde_json::Value, schema: Arc<Schema>) -> Result<Self> {
        Ok(Message {
            store: text::from_json(json, schema)?,
        })
    }
}

impl From<ValueStore> for Message {
    fn from(store: ValueStore) -> Self {
        Message { store }
    }
}
