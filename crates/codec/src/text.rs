//! Text codec
//!
//! Maps a `ValueStore` to a JSON object keyed by field name, in schema
//! declaration order, and back. The text form is meant for humans and
//! JSON-speaking peers, so it renders enums as their symbolic names, bytes
//! as base64, and nested messages as nested objects.
//!
//! ## Number Fidelity
//!
//! JSON consumers commonly parse numbers as IEEE-754 doubles, which hold
//! integers exactly only up to 2^53. Integers beyond that magnitude render
//! as decimal strings; decoding accepts either form for any integer field.
//! Non-finite floats render as the strings "NaN", "Infinity", "-Infinity".
//!
//! Only present fields are emitted by default; `TextOptions` can request
//! default values for absent fields as well. Decoding treats JSON `null`
//! as absence.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::Arc;
use tagpack_core::error::{Error, Result};
use tagpack_core::limits::DecodeLimits;
use tagpack_core::schema::{FieldDef, FieldType, Schema};
use tagpack_core::store::ValueStore;
use tagpack_core::value::{EnumValue, Value};
use tracing::trace;

/// Largest integer magnitude exactly representable in an IEEE-754 double
const MAX_SAFE_JSON_INT: u64 = 1 << 53;

/// Text encoding options
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    /// Emit absent fields with their default values instead of omitting them
    pub emit_default_fields: bool,
}

/// Encode a store as a JSON value with default options
pub fn to_json(store: &ValueStore) -> Result<serde_json::Value> {
    to_json_with(store, &TextOptions::default())
}

/// Encode a store as a JSON value
pub fn to_json_with(store: &ValueStore, opts: &TextOptions) -> Result<serde_json::Value> {
    Ok(serde_json::Value::Object(object_from_store(store, opts)?))
}

/// Encode a store as a compact JSON string with default options
pub fn to_string(store: &ValueStore) -> Result<String> {
    to_string_with(store, &TextOptions::default())
}

/// Encode a store as a compact JSON string
pub fn to_string_with(store: &ValueStore, opts: &TextOptions) -> Result<String> {
    Ok(to_json_with(store, opts)?.to_string())
}

fn object_from_store(
    store: &ValueStore,
    opts: &TextOptions,
) -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut map = serde_json::Map::new();
    for field in store.schema().fields() {
        if store.is_present(field.tag) {
            if let Some(value) = store.value(field.tag) {
                map.insert(field.name.clone(), json_from_field(field, value, opts)?);
            }
        } else if opts.emit_default_fields {
            let value = field.default_value();
            map.insert(field.name.clone(), json_from_field(field, &value, opts)?);
        }
    }
    Ok(map)
}

fn json_from_field(
    field: &FieldDef,
    value: &Value,
    opts: &TextOptions,
) -> Result<serde_json::Value> {
    if field.repeated {
        let items = value.as_list().ok_or_else(|| Error::TypeMismatch {
            field: field.name.clone(),
            expected: field.type_name(),
            actual: value.kind().to_string(),
        })?;
        let rendered = items
            .iter()
            .map(|item| json_from_scalar(field, item, opts))
            .collect::<Result<Vec<_>>>()?;
        return Ok(serde_json::Value::Array(rendered));
    }
    json_from_scalar(field, value, opts)
}

fn json_from_scalar(
    field: &FieldDef,
    value: &Value,
    opts: &TextOptions,
) -> Result<serde_json::Value> {
    match (&field.ty, value) {
        (FieldType::Int, Value::Int(i)) => Ok(if i.unsigned_abs() <= MAX_SAFE_JSON_INT {
            serde_json::Value::Number((*i).into())
        } else {
            serde_json::Value::String(i.to_string())
        }),
        (FieldType::UInt, Value::UInt(u)) => Ok(if *u <= MAX_SAFE_JSON_INT {
            serde_json::Value::Number((*u).into())
        } else {
            serde_json::Value::String(u.to_string())
        }),
        (FieldType::Float, Value::Float(f)) => Ok(match serde_json::Number::from_f64(*f) {
            Some(n) => serde_json::Value::Number(n),
            // from_f64 refuses exactly the non-finite values
            None => serde_json::Value::String(float_symbol(*f).to_string()),
        }),
        (FieldType::Bool, Value::Bool(b)) => Ok(serde_json::Value::Bool(*b)),
        (FieldType::String, Value::String(s)) => Ok(serde_json::Value::String(s.clone())),
        (FieldType::Bytes, Value::Bytes(b)) => {
            Ok(serde_json::Value::String(BASE64.encode(b)))
        }
        (FieldType::Enum(_), Value::Enum(ev)) => {
            Ok(serde_json::Value::String(ev.name.clone()))
        }
        (FieldType::Message(_), Value::Message(nested)) => Ok(serde_json::Value::Object(
            object_from_store(nested, opts)?,
        )),
        _ => Err(Error::TypeMismatch {
            field: field.name.clone(),
            expected: field.ty.name(),
            actual: value.kind().to_string(),
        }),
    }
}

fn float_symbol(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

/// Decode a JSON string into a fresh store with default limits
pub fn from_str(text: &str, schema: Arc<Schema>) -> Result<ValueStore> {
    from_str_with(text, schema, &DecodeLimits::default())
}

/// Decode a JSON string into a fresh store with explicit limits
pub fn from_str_with(text: &str, schema: Arc<Schema>, limits: &DecodeLimits) -> Result<ValueStore> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::CorruptData(format!("unparsable json document: {}", e)))?;
    from_json_with(&json, schema, limits)
}

/// Decode a JSON value into a fresh store with default limits
pub fn from_json(json: &serde_json::Value, schema: Arc<Schema>) -> Result<ValueStore> {
    from_json_with(json, schema, &DecodeLimits::default())
}

/// Decode a JSON value into a fresh store with explicit limits
pub fn from_json_with(
    json: &serde_json::Value,
    schema: Arc<Schema>,
    limits: &DecodeLimits,
) -> Result<ValueStore> {
    store_from_object(json, schema, limits, 0)
}

fn store_from_object(
    json: &serde_json::Value,
    schema: Arc<Schema>,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<ValueStore> {
    if depth > limits.max_nesting_depth {
        return Err(Error::CorruptData(format!(
            "document nesting exceeds depth {}",
            limits.max_nesting_depth
        )));
    }
    let map = json.as_object().ok_or_else(|| Error::TypeMismatch {
        field: schema.name().to_string(),
        expected: "object".to_string(),
        actual: json_kind(json).to_string(),
    })?;

    let mut store = ValueStore::new(schema.clone());
    for (key, value) in map {
        let field = schema
            .field_by_name(key)
            .ok_or_else(|| Error::unknown_field(schema.name(), key))?;
        if value.is_null() {
            trace!(target: "tagpack::codec", field = key.as_str(), "null field treated as absent");
            continue;
        }
        let value = value_from_json(field, value, limits, depth)?;
        store.set(field.tag, value)?;
    }
    Ok(store)
}

fn value_from_json(
    field: &FieldDef,
    json: &serde_json::Value,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<Value> {
    if field.repeated {
        let items = json
            .as_array()
            .ok_or_else(|| shape_mismatch(field, &field.type_name(), json))?;
        let values = items
            .iter()
            .map(|item| scalar_from_json(field, item, limits, depth))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Value::List(values));
    }
    scalar_from_json(field, json, limits, depth)
}

fn scalar_from_json(
    field: &FieldDef,
    json: &serde_json::Value,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<Value> {
    match &field.ty {
        FieldType::Int => match json {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| shape_mismatch(field, "integer", json)),
            serde_json::Value::String(s) => s
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| shape_mismatch(field, "integer", json)),
            _ => Err(shape_mismatch(field, "integer", json)),
        },
        FieldType::UInt => match json {
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(Value::UInt)
                .ok_or_else(|| shape_mismatch(field, "unsigned integer", json)),
            serde_json::Value::String(s) => s
                .parse::<u64>()
                .map(Value::UInt)
                .map_err(|_| shape_mismatch(field, "unsigned integer", json)),
            _ => Err(shape_mismatch(field, "unsigned integer", json)),
        },
        FieldType::Float => match json {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| shape_mismatch(field, "number", json)),
            serde_json::Value::String(s) => match s.as_str() {
                "NaN" => Ok(Value::Float(f64::NAN)),
                "Infinity" => Ok(Value::Float(f64::INFINITY)),
                "-Infinity" => Ok(Value::Float(f64::NEG_INFINITY)),
                _ => Err(shape_mismatch(field, "number", json)),
            },
            _ => Err(shape_mismatch(field, "number", json)),
        },
        FieldType::Bool => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| shape_mismatch(field, "bool", json)),
        FieldType::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| shape_mismatch(field, "string", json)),
        FieldType::Bytes => {
            let s = json
                .as_str()
                .ok_or_else(|| shape_mismatch(field, "base64 string", json))?;
            BASE64
                .decode(s)
                .map(Value::Bytes)
                .map_err(|_| Error::TypeMismatch {
                    field: field.name.clone(),
                    expected: "base64 string".to_string(),
                    actual: "unparsable base64".to_string(),
                })
        }
        FieldType::Enum(def) => match json {
            serde_json::Value::String(s) => def.value(s).map(Value::Enum),
            serde_json::Value::Number(n) => {
                let number = n
                    .as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(|| Error::UnknownEnumVariant {
                        enum_name: def.name().to_string(),
                        variant: n.to_string(),
                    })?;
                let variant =
                    def.variant_by_number(number)
                        .ok_or_else(|| Error::UnknownEnumVariant {
                            enum_name: def.name().to_string(),
                            variant: number.to_string(),
                        })?;
                Ok(Value::Enum(EnumValue::new(&variant.name, variant.number)))
            }
            _ => Err(shape_mismatch(field, "enum name", json)),
        },
        FieldType::Message(nested) => {
            store_from_object(json, nested.clone(), limits, depth + 1).map(Value::Message)
        }
    }
}

fn shape_mismatch(field: &FieldDef, expected: &str, json: &serde_json::Value) -> Error {
    Error::TypeMismatch {
        field: field.name.clone(),
        expected: expected.to_string(),
        actual: json_kind(json).to_string(),
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
