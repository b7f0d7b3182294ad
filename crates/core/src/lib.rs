//! Core types for tagpack
//!
//! This crate defines the foundational types used throughout the system:
//! - Schema, FieldDef, FieldType, EnumDef: in-memory schema descriptions
//! - Value, EnumValue: the runtime value union
//! - ValueStore: a message instance with presence tracking
//! - Error: error type hierarchy
//! - DecodeLimits: size limits enforced by the codecs
//!
//! Schemas are immutable after construction and shared read-only via `Arc`,
//! so concurrent encode/decode calls need no locking. A `ValueStore` is
//! owned by a single logical operation at a time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod schema;
pub mod store;
pub mod value;

// Re-export commonly used types
pub use error::{Error, Result};
pub use limits::DecodeLimits;
pub use schema::{EnumDef, EnumVariant, FieldDef, FieldType, Schema, MAX_FIELD_TAG};
pub use store::ValueStore;
pub use value::{EnumValue, Value};
