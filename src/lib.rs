//! Tagpack - schema-driven structured message serialization
//!
//! Tagpack turns a runtime schema description (named, tagged, typed fields,
//! including enumerations) into three things: type-checked in-memory message
//! values, a compact binary wire encoding, and a JSON-compatible text
//! encoding. The two codecs agree on value identity under round-trip.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tagpack::{EnumDef, FieldDef, FieldType, Message, Schema, Value};
//!
//! let ty = Arc::new(EnumDef::new("Type", [("CREATED", 0), ("UPDATED", 1)])?);
//! let schema = Arc::new(Schema::new("Event", vec![
//!     FieldDef::new("id", 1, FieldType::Enum(ty.clone())),
//!     FieldDef::new("name", 2, FieldType::String),
//!     FieldDef::new("description", 3, FieldType::String),
//! ])?);
//!
//! let event = Message::with_fields(schema.clone(), [
//!     ("id", Value::Enum(ty.value("CREATED")?)),
//!     ("name", Value::from("test")),
//!     ("description", Value::from("created event!")),
//! ])?;
//!
//! let bytes = event.to_binary()?;
//! let restored = Message::from_binary(&bytes, schema)?;
//! assert_eq!(restored, event);
//! ```
//!
//! # Architecture
//!
//! One generic codec pair operates over any [`Schema`] value at runtime; no
//! per-schema code generation. Schemas are immutable after construction and
//! shared via `Arc`, so concurrent encode and decode calls need no locking.
//! The [`Message`] facade is sugar over [`ValueStore`] plus the codec entry
//! points in [`binary`] and [`text`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod message;

pub use message::Message;

// Re-export the core model
pub use tagpack_core::{
    DecodeLimits, EnumDef, EnumValue, EnumVariant, Error, FieldDef, FieldType, Result, Schema,
    Value, ValueStore, MAX_FIELD_TAG,
};

// Re-export the codec surface
pub use tagpack_codec::text::TextOptions;
pub use tagpack_codec::{binary, text};
