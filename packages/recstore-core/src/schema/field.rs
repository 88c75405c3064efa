//! Field descriptors and schema-driven dynamic decoding.

use serde::{Deserialize, Serialize};

use crate::codec::{CompactTimestamp, Encodable, Reader};
use crate::error::CodecError;

/// Wire layout of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    /// Platform-width size, stored as 8 bytes
    Size,
    /// Length-prefixed byte string
    Bytes,
    /// Length-prefixed UTF-8 text
    Text,
    /// Packed seconds + nanoseconds
    Timestamp,
    /// Fixed-size raw bytes (e.g. a 16-byte GUID)
    Blob { len: usize },
    /// `count` repetitions of `element`, no count prefix
    Array { element: Box<FieldKind>, count: usize },
    /// Nested value whose fields are encoded in order
    Composite(Vec<FieldDescriptor>),
}

impl FieldKind {
    /// Encoded size when it does not depend on the value.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            FieldKind::U8 | FieldKind::I8 => Some(1),
            FieldKind::U16 | FieldKind::I16 => Some(2),
            FieldKind::U32 | FieldKind::I32 => Some(4),
            FieldKind::U64 | FieldKind::I64 | FieldKind::Size | FieldKind::Timestamp => Some(8),
            FieldKind::Bytes | FieldKind::Text => None,
            FieldKind::Blob { len } => Some(*len),
            FieldKind::Array { element, count } => element.fixed_len().map(|n| n * count),
            FieldKind::Composite(fields) => fields.iter().map(|f| f.kind.fixed_len()).sum(),
        }
    }

    /// Decodes one value of this kind without knowing the Rust type.
    pub fn decode_value(&self, r: &mut Reader<'_>) -> Result<Value, CodecError> {
        Ok(match self {
            FieldKind::U8 => Value::Unsigned(u8::decode(r)? as u64),
            FieldKind::U16 => Value::Unsigned(u16::decode(r)? as u64),
            FieldKind::U32 => Value::Unsigned(u32::decode(r)? as u64),
            FieldKind::U64 => Value::Unsigned(u64::decode(r)?),
            FieldKind::I8 => Value::Signed(i8::decode(r)? as i64),
            FieldKind::I16 => Value::Signed(i16::decode(r)? as i64),
            FieldKind::I32 => Value::Signed(i32::decode(r)? as i64),
            FieldKind::I64 => Value::Signed(i64::decode(r)?),
            FieldKind::Size => Value::Unsigned(u64::decode(r)?),
            FieldKind::Bytes => Value::Bytes(r.take_len_prefixed()?.to_vec()),
            FieldKind::Text => Value::Text(String::decode(r)?),
            FieldKind::Timestamp => Value::Timestamp(CompactTimestamp::decode(r)?),
            FieldKind::Blob { len } => Value::Blob(r.take(*len)?.to_vec()),
            FieldKind::Array { element, count } => Value::Array(
                (0..*count)
                    .map(|_| element.decode_value(r))
                    .collect::<Result<_, _>>()?,
            ),
            FieldKind::Composite(fields) => Value::Composite(decode_fields(fields, r)?),
        })
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::U8 => f.write_str("u8"),
            FieldKind::U16 => f.write_str("u16"),
            FieldKind::U32 => f.write_str("u32"),
            FieldKind::U64 => f.write_str("u64"),
            FieldKind::I8 => f.write_str("i8"),
            FieldKind::I16 => f.write_str("i16"),
            FieldKind::I32 => f.write_str("i32"),
            FieldKind::I64 => f.write_str("i64"),
            FieldKind::Size => f.write_str("size"),
            FieldKind::Bytes => f.write_str("bytes"),
            FieldKind::Text => f.write_str("text"),
            FieldKind::Timestamp => f.write_str("timestamp"),
            FieldKind::Blob { len } => write!(f, "blob[{len}]"),
            FieldKind::Array { element, count } => write!(f, "[{element}; {count}]"),
            FieldKind::Composite(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.kind)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A named field in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Dynamically decoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Bytes(Vec<u8>),
    Text(String),
    Timestamp(CompactTimestamp),
    Blob(Vec<u8>),
    Array(Vec<Value>),
    Composite(Vec<(String, Value)>),
}

pub(crate) fn decode_fields(
    fields: &[FieldDescriptor],
    r: &mut Reader<'_>,
) -> Result<Vec<(String, Value)>, CodecError> {
    fields
        .iter()
        .map(|f| Ok((f.name.clone(), f.kind.decode_value(r)?)))
        .collect()
}
