//! Binary codec
//!
//! Encodes a `ValueStore` to a compact tag-length-value byte sequence and
//! decodes such a sequence back against a schema.
//!
//! ## Field Format
//!
//! ```text
//! [key: varint(tag << 3 | wire_type)][payload]
//! ```
//!
//! - Varint payloads: unsigned integers and booleans as-is, signed integers
//!   and enum numbers zig-zag transformed
//! - Fixed64 payloads: IEEE-754 bits, little-endian
//! - Length-delimited payloads: varint byte length, then raw bytes; nested
//!   messages recursively encoded
//! - Repeated fields: one key and payload per element, in element order
//!
//! Absent fields are omitted entirely; decode reconstructs them as defaults
//! on read. Unknown tags are skipped using the wire type's length
//! information, so data written with a newer schema still decodes.
//!
//! ## Failure Semantics
//!
//! Decode builds into a fresh store and publishes it only on full success;
//! encode accumulates into a local buffer. Truncated varints, overlong
//! lengths, and undefined wire types are `CorruptData`; a wire type that
//! contradicts the schema's declared field type is `SchemaMismatch`.

use crate::varint::{read_varint, write_varint, zigzag_decode, zigzag_encode};
use crate::wire::{field_key, split_key, wire_type_of, WireType};
use std::collections::BTreeMap;
use std::sync::Arc;
use tagpack_core::error::{Error, Result};
use tagpack_core::limits::DecodeLimits;
use tagpack_core::schema::{FieldDef, FieldType, Schema};
use tagpack_core::store::ValueStore;
use tagpack_core::value::{EnumValue, Value};
use tracing::trace;

/// Encode a store to bytes
///
/// Walks the schema's fields in declaration order and emits every field with
/// `is_present = true`, including fields explicitly set to their default.
pub fn encode(store: &ValueStore) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_into(store, &mut buf)?;
    Ok(buf)
}

fn encode_into(store: &ValueStore, buf: &mut Vec<u8>) -> Result<()> {
    for field in store.schema().fields() {
        if !store.is_present(field.tag) {
            continue;
        }
        let value = match store.value(field.tag) {
            Some(v) => v,
            None => continue,
        };
        if field.repeated {
            let items = value.as_list().ok_or_else(|| mismatch(field, value))?;
            for item in items {
                encode_field(field, item, buf)?;
            }
        } else {
            encode_field(field, value, buf)?;
        }
    }
    Ok(())
}

fn encode_field(field: &FieldDef, value: &Value, buf: &mut Vec<u8>) -> Result<()> {
    let key = field_key(field.tag, wire_type_of(&field.ty));
    match (&field.ty, value) {
        (FieldType::Int, Value::Int(i)) => {
            write_varint(buf, key);
            write_varint(buf, zigzag_encode(*i));
        }
        (FieldType::UInt, Value::UInt(u)) => {
            write_varint(buf, key);
            write_varint(buf, *u);
        }
        (FieldType::Bool, Value::Bool(b)) => {
            write_varint(buf, key);
            write_varint(buf, *b as u64);
        }
        (FieldType::Enum(_), Value::Enum(ev)) => {
            write_varint(buf, key);
            write_varint(buf, zigzag_encode(ev.number as i64));
        }
        (FieldType::Float, Value::Float(f)) => {
            write_varint(buf, key);
            buf.extend_from_slice(&f.to_le_bytes());
        }
        (FieldType::String, Value::String(s)) => {
            write_varint(buf, key);
            write_varint(buf, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        (FieldType::Bytes, Value::Bytes(b)) => {
            write_varint(buf, key);
            write_varint(buf, b.len() as u64);
            buf.extend_from_slice(b);
        }
        (FieldType::Message(_), Value::Message(nested)) => {
            let mut inner = Vec::new();
            encode_into(nested, &mut inner)?;
            write_varint(buf, key);
            write_varint(buf, inner.len() as u64);
            buf.extend_from_slice(&inner);
        }
        _ => return Err(mismatch(field, value)),
    }
    Ok(())
}

fn mismatch(field: &FieldDef, value: &Value) -> Error {
    Error::TypeMismatch {
        field: field.name.clone(),
        expected: field.type_name(),
        actual: value.kind().to_string(),
    }
}

/// Decode bytes into a fresh store with default limits
pub fn decode(bytes: &[u8], schema: Arc<Schema>) -> Result<ValueStore> {
    decode_with(bytes, schema, &DecodeLimits::default())
}

/// Decode bytes into a fresh store with explicit limits
pub fn decode_with(
    bytes: &[u8],
    schema: Arc<Schema>,
    limits: &DecodeLimits,
) -> Result<ValueStore> {
    let mut decoder = Decoder {
        buf: bytes,
        pos: 0,
        limits,
    };
    decoder.read_message(schema, bytes.len(), 0)
}

struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    limits: &'a DecodeLimits,
}

impl<'a> Decoder<'a> {
    fn read_message(
        &mut self,
        schema: Arc<Schema>,
        end: usize,
        depth: usize,
    ) -> Result<ValueStore> {
        if depth > self.limits.max_nesting_depth {
            return Err(Error::CorruptData(format!(
                "message nesting exceeds depth {} at offset {}",
                self.limits.max_nesting_depth, self.pos
            )));
        }

        let mut fields: BTreeMap<u32, Value> = BTreeMap::new();
        while self.pos < end {
            let key_offset = self.pos;
            let key = self.read_varint(end)?;
            let (tag, wire) = split_key(key, key_offset)?;

            let field = match schema.field(tag) {
                Some(f) => f,
                None => {
                    // Forward compatibility: measure the payload via the wire
                    // type and move on
                    trace!(
                        target: "tagpack::codec",
                        tag,
                        wire = wire.name(),
                        offset = key_offset,
                        "skipping unknown field"
                    );
                    self.skip(wire, end)?;
                    continue;
                }
            };

            let expected = wire_type_of(&field.ty);
            if wire != expected {
                return Err(Error::SchemaMismatch {
                    field: field.name.clone(),
                    detail: format!(
                        "expected {}, got {} at offset {}",
                        expected.name(),
                        wire.name(),
                        key_offset
                    ),
                });
            }

            let value = self.read_value(field, end, depth)?;
            if field.repeated {
                if let Value::List(items) =
                    fields.entry(tag).or_insert_with(|| Value::List(Vec::new()))
                {
                    items.push(value);
                }
            } else {
                // A repeated occurrence of a singular field takes the last
                // value
                fields.insert(tag, value);
            }
        }

        let mut store = ValueStore::new(schema);
        for (tag, value) in fields {
            store.set(tag, value)?;
        }
        Ok(store)
    }

    fn read_value(&mut self, field: &FieldDef, end: usize, depth: usize) -> Result<Value> {
        match &field.ty {
            FieldType::Int => {
                let raw = self.read_varint(end)?;
                Ok(Value::Int(zigzag_decode(raw)))
            }
            FieldType::UInt => Ok(Value::UInt(self.read_varint(end)?)),
            FieldType::Bool => {
                let offset = self.pos;
                match self.read_varint(end)? {
                    0 => Ok(Value::Bool(false)),
                    1 => Ok(Value::Bool(true)),
                    raw => Err(Error::SchemaMismatch {
                        field: field.name.clone(),
                        detail: format!("bool value {} out of range at offset {}", raw, offset),
                    }),
                }
            }
            FieldType::Enum(def) => {
                let offset = self.pos;
                let raw = zigzag_decode(self.read_varint(end)?);
                let number = i32::try_from(raw).map_err(|_| Error::SchemaMismatch {
                    field: field.name.clone(),
                    detail: format!(
                        "enum value {} outside 32-bit range at offset {}",
                        raw, offset
                    ),
                })?;
                let variant =
                    def.variant_by_number(number)
                        .ok_or_else(|| Error::UnknownEnumVariant {
                            enum_name: def.name().to_string(),
                            variant: number.to_string(),
                        })?;
                Ok(Value::Enum(EnumValue::new(&variant.name, variant.number)))
            }
            FieldType::Float => {
                let bytes = self.read_fixed64(end)?;
                Ok(Value::Float(f64::from_le_bytes(bytes)))
            }
            FieldType::String => {
                let offset = self.pos;
                let payload = self.read_length_delimited(end)?;
                let s = std::str::from_utf8(payload).map_err(|_| {
                    Error::CorruptData(format!(
                        "invalid utf-8 in string payload at offset {}",
                        offset
                    ))
                })?;
                Ok(Value::String(s.to_string()))
            }
            FieldType::Bytes => Ok(Value::Bytes(self.read_length_delimited(end)?.to_vec())),
            FieldType::Message(nested) => {
                let len = self.read_length(end)?;
                let payload_end = self.pos + len;
                let store = self.read_message(nested.clone(), payload_end, depth + 1)?;
                Ok(Value::Message(store))
            }
        }
    }

    fn read_varint(&mut self, end: usize) -> Result<u64> {
        let (value, consumed) = read_varint(&self.buf[..end], self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    fn read_fixed64(&mut self, end: usize) -> Result<[u8; 8]> {
        if self.pos + 8 > end {
            return Err(Error::CorruptData(format!(
                "fixed64 overruns buffer at offset {}",
                self.pos
            )));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(bytes)
    }

    /// Read and validate a length prefix; the payload itself is not consumed
    fn read_length(&mut self, end: usize) -> Result<usize> {
        let offset = self.pos;
        let raw = self.read_varint(end)?;
        if raw > self.limits.max_payload_bytes as u64 {
            return Err(Error::CorruptData(format!(
                "declared length {} exceeds limit {} at offset {}",
                raw, self.limits.max_payload_bytes, offset
            )));
        }
        let len = raw as usize;
        if len > end - self.pos {
            return Err(Error::CorruptData(format!(
                "declared length {} exceeds remaining {} bytes at offset {}",
                len,
                end - self.pos,
                offset
            )));
        }
        Ok(len)
    }

    fn read_length_delimited(&mut self, end: usize) -> Result<&'a [u8]> {
        let len = self.read_length(end)?;
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    fn skip(&mut self, wire: WireType, end: usize) -> Result<()> {
        match wire {
            WireType::Varint => {
                self.read_varint(end)?;
            }
            WireType::Fixed64 => {
                self.read_fixed64(end)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited(end)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagpack_core::schema::EnumDef;

    fn event_type() -> Arc<EnumDef> {
        Arc::new(EnumDef::new("Type", [("CREATED", 0), ("UPDATED", 1)]).unwrap())
    }

    fn event_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "Event",
                vec![
                    FieldDef::new("id", 1, FieldType::Enum(event_type())),
                    FieldDef::new("name", 2, FieldType::String),
                    FieldDef::new("description", 3, FieldType::String),
                ],
            )
            .unwrap(),
        )
    }

    fn scalar_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "Scalars",
                vec![
                    FieldDef::new("i", 1, FieldType::Int),
                    FieldDef::new("u", 2, FieldType::UInt),
                    FieldDef::new("f", 3, FieldType::Float),
                    FieldDef::new("b", 4, FieldType::Bool),
                    FieldDef::new("s", 5, FieldType::String),
                    FieldDef::new("raw", 6, FieldType::Bytes),
                ],
            )
            .unwrap(),
        )
    }

    // ====================================================================
    // Round trips
    // ====================================================================

    #[test]
    fn test_roundtrip_all_scalar_kinds() {
        let mut store = ValueStore::new(scalar_schema());
        store.set(1, Value::Int(-42)).unwrap();
        store.set(2, Value::UInt(u64::MAX)).unwrap();
        store.set(3, Value::Float(-2.5)).unwrap();
        store.set(4, Value::Bool(true)).unwrap();
        store.set(5, Value::from("héllo")).unwrap();
        store.set(6, Value::Bytes(vec![0, 255, 1])).unwrap();

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes, scalar_schema()).unwrap();
        assert_eq!(decoded, store);
    }

    #[test]
    fn test_roundtrip_preserves_explicit_defaults() {
        let mut store = ValueStore::new(scalar_schema());
        store.set(1, Value::Int(0)).unwrap();

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes, scalar_schema()).unwrap();
        assert!(decoded.is_present(1));
        assert_eq!(decoded, store);
    }

    #[test]
    fn test_roundtrip_enum_keeps_name_and_number() {
        let mut store = ValueStore::new(event_schema());
        store
            .set(1, Value::Enum(EnumValue::new("UPDATED", 1)))
            .unwrap();

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes, event_schema()).unwrap();
        let ev = decoded.get(1).unwrap();
        let ev = ev.as_enum().unwrap();
        assert_eq!(ev.name, "UPDATED");
        assert_eq!(ev.number, 1);
    }

    #[test]
    fn test_empty_store_encodes_to_empty_buffer() {
        let store = ValueStore::new(event_schema());
        let bytes = encode(&store).unwrap();
        assert!(bytes.is_empty());

        let decoded = decode(&bytes, event_schema()).unwrap();
        assert!(decoded.is_empty());
    }

    // ====================================================================
    // Exact wire layout
    // ====================================================================

    #[test]
    fn test_single_field_wire_layout() {
        // Only "name" set: one key byte, one length byte, four payload bytes
        let mut store = ValueStore::new(event_schema());
        store.set(2, Value::from("test")).unwrap();

        let bytes = encode(&store).unwrap();
        assert_eq!(bytes, [0x12, 0x04, b't', b'e', b's', b't']);
    }

    #[test]
    fn test_event_scenario_wire_layout() {
        let mut store = ValueStore::new(event_schema());
        store
            .set(1, Value::Enum(EnumValue::new("CREATED", 0)))
            .unwrap();
        store.set(2, Value::from("test")).unwrap();
        store.set(3, Value::from("created event!")).unwrap();

        let bytes = encode(&store).unwrap();
        // id: key 0x08, zigzag(0) = 0x00
        assert_eq!(&bytes[..2], [0x08, 0x00]);
        // name: key 0x12, length 4
        assert_eq!(&bytes[2..4], [0x12, 0x04]);
        // description: key 0x1a, length 14
        assert_eq!(bytes[8], 0x1a);
        assert_eq!(bytes[9], 14);
        assert_eq!(bytes.len(), 2 + 2 + 4 + 2 + 14);

        let decoded = decode(&bytes, event_schema()).unwrap();
        assert_eq!(decoded, store);
    }

    #[test]
    fn test_fields_emitted_in_declaration_order() {
        let mut store = ValueStore::new(event_schema());
        store.set(3, Value::from("d")).unwrap();
        store.set(1, Value::Enum(EnumValue::new("CREATED", 0))).unwrap();

        let bytes = encode(&store).unwrap();
        // Tag 1 comes first even though tag 3 was set first
        assert_eq!(bytes[0], 0x08);
    }

    // ====================================================================
    // Forward compatibility: unknown tags are skipped
    // ====================================================================

    fn older_schema() -> Arc<Schema> {
        // The Event schema without "description"
        Arc::new(
            Schema::new(
                "Event",
                vec![
                    FieldDef::new("id", 1, FieldType::Enum(event_type())),
                    FieldDef::new("name", 2, FieldType::String),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_unknown_length_delimited_tag_skipped() {
        let mut store = ValueStore::new(event_schema());
        store.set(2, Value::from("test")).unwrap();
        store.set(3, Value::from("dropped")).unwrap();

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes, older_schema()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get(2).unwrap(), Value::String("test".to_string()));
        assert!(!decoded.is_present(3) || decoded.get(3).is_err());
    }

    #[test]
    fn test_unknown_varint_and_fixed64_tags_skipped() {
        let extended = Arc::new(
            Schema::new(
                "Event",
                vec![
                    FieldDef::new("name", 2, FieldType::String),
                    FieldDef::new("count", 7, FieldType::UInt),
                    FieldDef::new("score", 8, FieldType::Float),
                ],
            )
            .unwrap(),
        );
        let mut store = ValueStore::new(extended);
        store.set(2, Value::from("x")).unwrap();
        store.set(7, Value::UInt(300)).unwrap();
        store.set(8, Value::Float(1.5)).unwrap();

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes, older_schema()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get(2).unwrap(), Value::String("x".to_string()));
    }

    // ====================================================================
    // Corruption
    // ====================================================================

    #[test]
    fn test_truncated_by_one_byte_is_corrupt() {
        let mut store = ValueStore::new(event_schema());
        store.set(2, Value::from("test")).unwrap();
        store.set(3, Value::from("created event!")).unwrap();

        let bytes = encode(&store).unwrap();
        let err = decode(&bytes[..bytes.len() - 1], event_schema()).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
    }

    #[test]
    fn test_length_exceeding_remaining_is_corrupt() {
        // key for tag 2 (length-delimited), declared length 5, one byte left
        let bytes = [0x12, 0x05, b'x'];
        let err = decode(&bytes, event_schema()).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
        assert!(err.to_string().contains("exceeds remaining"));
    }

    #[test]
    fn test_unterminated_varint_is_corrupt() {
        let bytes = [0x08, 0x80];
        let err = decode(&bytes, event_schema()).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
    }

    #[test]
    fn test_undefined_wire_type_is_corrupt() {
        // tag 2 with wire discriminant 5
        let bytes = [(2 << 3) | 5, 0x00];
        let err = decode(&bytes, event_schema()).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
    }

    #[test]
    fn test_invalid_utf8_in_string_is_corrupt() {
        let bytes = [0x12, 0x02, 0xff, 0xfe];
        let err = decode(&bytes, event_schema()).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
        assert!(err.to_string().contains("utf-8"));
    }

    #[test]
    fn test_declared_length_over_limit_is_corrupt() {
        let mut store = ValueStore::new(event_schema());
        store.set(2, Value::from("a string over sixty four bytes long, which is well past the cap")).unwrap();
        let bytes = encode(&store).unwrap();

        let limits = DecodeLimits::with_small_limits();
        let err = decode_with(&bytes, event_schema(), &limits).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
        assert!(err.to_string().contains("exceeds limit"));
    }

    // ====================================================================
    // Schema mismatches
    // ====================================================================

    #[test]
    fn test_wire_type_contradicting_schema_is_mismatch() {
        // Encode "name" as a string, decode with a schema declaring tag 2 as
        // uint: length-delimited against varint
        let mut store = ValueStore::new(event_schema());
        store.set(2, Value::from("test")).unwrap();
        let bytes = encode(&store).unwrap();

        let conflicting = Arc::new(
            Schema::new("Event", vec![FieldDef::new("name", 2, FieldType::UInt)]).unwrap(),
        );
        let err = decode(&bytes, conflicting).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_undeclared_enum_number_is_unknown_variant() {
        // id = zigzag(7), not declared in Type
        let bytes = [0x08, 14];
        let err = decode(&bytes, event_schema()).unwrap_err();
        assert!(matches!(err, Error::UnknownEnumVariant { .. }));
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_enum_number_outside_i32_is_mismatch() {
        let mut bytes = vec![0x08];
        write_varint(&mut bytes, zigzag_encode(1_i64 << 40));
        let err = decode(&bytes, event_schema()).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_bool_out_of_range_is_mismatch() {
        let schema = scalar_schema();
        // tag 4 varint, value 2
        let bytes = [(4 << 3), 0x02];
        let err = decode(&bytes, schema).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    // ====================================================================
    // Repeated fields
    // ====================================================================

    fn repeated_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "Tags",
                vec![FieldDef::new("tags", 1, FieldType::String).repeated()],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_repeated_roundtrip_preserves_order() {
        let mut store = ValueStore::new(repeated_schema());
        store
            .set(
                1,
                Value::List(vec![Value::from("b"), Value::from("a"), Value::from("c")]),
            )
            .unwrap();

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes, repeated_schema()).unwrap();
        let items = decoded.get(1).unwrap();
        let items = items.as_list().unwrap().to_vec();
        assert_eq!(
            items,
            vec![Value::from("b"), Value::from("a"), Value::from("c")]
        );
    }

    #[test]
    fn test_repeated_emits_one_key_per_element() {
        let mut store = ValueStore::new(repeated_schema());
        store
            .set(1, Value::List(vec![Value::from("x"), Value::from("y")]))
            .unwrap();

        let bytes = encode(&store).unwrap();
        assert_eq!(bytes, [0x0a, 0x01, b'x', 0x0a, 0x01, b'y']);
    }

    #[test]
    fn test_repeated_empty_list_encodes_to_nothing() {
        // An empty list has no elements to carry its presence on the wire
        let mut store = ValueStore::new(repeated_schema());
        store.set(1, Value::List(vec![])).unwrap();
        assert!(encode(&store).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_singular_field_takes_last() {
        // "name" appears twice; the second occurrence wins
        let bytes = [0x12, 0x01, b'a', 0x12, 0x01, b'b'];
        let decoded = decode(&bytes, event_schema()).unwrap();
        assert_eq!(decoded.get(2).unwrap(), Value::String("b".to_string()));
        assert_eq!(decoded.len(), 1);
    }

    // ====================================================================
    // Nested messages
    // ====================================================================

    fn envelope_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "Envelope",
                vec![
                    FieldDef::new("event", 1, FieldType::Message(event_schema())),
                    FieldDef::new("source", 2, FieldType::String),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_nested_message_roundtrip() {
        let mut inner = ValueStore::new(event_schema());
        inner.set(2, Value::from("nested")).unwrap();

        let mut store = ValueStore::new(envelope_schema());
        store.set(1, Value::Message(inner)).unwrap();
        store.set(2, Value::from("origin")).unwrap();

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes, envelope_schema()).unwrap();
        assert_eq!(decoded, store);

        let event = decoded.get(1).unwrap();
        let event = event.as_message().unwrap().clone();
        assert_eq!(event.get(2).unwrap(), Value::String("nested".to_string()));
    }

    #[test]
    fn test_empty_nested_message_roundtrip() {
        let mut store = ValueStore::new(envelope_schema());
        store
            .set(1, Value::Message(ValueStore::new(event_schema())))
            .unwrap();

        let bytes = encode(&store).unwrap();
        // key + zero length
        assert_eq!(bytes, [0x0a, 0x00]);

        let decoded = decode(&bytes, envelope_schema()).unwrap();
        assert!(decoded.is_present(1));
        let nested = decoded.get(1).unwrap();
        assert!(nested.as_message().unwrap().is_empty());
    }

    #[test]
    fn test_nesting_depth_limit_enforced() {
        // Node{child: Node, label: string} nested eight levels deep
        let mut schema = Arc::new(
            Schema::new("Node", vec![FieldDef::new("label", 2, FieldType::String)]).unwrap(),
        );
        for _ in 0..8 {
            schema = Arc::new(
                Schema::new(
                    "Node",
                    vec![
                        FieldDef::new("child", 1, FieldType::Message(schema)),
                        FieldDef::new("label", 2, FieldType::String),
                    ],
                )
                .unwrap(),
            );
        }

        // Build the matching value chain from the leaf outward
        let mut schemas = vec![schema.clone()];
        let mut s = schema.clone();
        while let Some(FieldType::Message(child)) = s.field(1).map(|f| f.ty.clone()) {
            schemas.push(child.clone());
            s = child;
        }
        let mut nested = ValueStore::new(schemas.pop().unwrap());
        while let Some(parent_schema) = schemas.pop() {
            let mut parent = ValueStore::new(parent_schema);
            parent.set(1, Value::Message(nested)).unwrap();
            nested = parent;
        }

        let bytes = encode(&nested).unwrap();
        let limits = DecodeLimits::with_small_limits();
        let err = decode_with(&bytes, schema.clone(), &limits).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
        assert!(err.to_string().contains("nesting"));

        // The same input decodes fine under default limits
        assert!(decode(&bytes, schema).is_ok());
    }
}
