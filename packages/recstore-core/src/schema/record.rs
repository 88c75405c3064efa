use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::field::{decode_fields, FieldDescriptor, FieldKind, Value};
use crate::codec::{Encodable, Reader};
use crate::error::{CodecError, SchemaError};

/// Ordered field list of one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl RecordSchema {
    /// Derives the schema of `R` from its encoding descriptor.
    ///
    /// A non-composite `R` becomes a single field named `value`.
    pub fn of<R: Encodable>(name: impl Into<String>) -> Result<Self, SchemaError> {
        let fields = match R::field_kind() {
            FieldKind::Composite(fields) => fields,
            kind => vec![FieldDescriptor::new("value", kind)],
        };
        Self::new(name, fields)
    }

    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let name = name.into();
        if let Some(dup) = first_duplicate(fields.iter().map(|f| f.name.as_str())) {
            return Err(SchemaError::DuplicateField {
                record: name,
                field: dup.to_string(),
            });
        }
        Ok(Self { name, fields })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Decodes a stored record value into `(field name, value)` pairs.
    pub fn decode_values(&self, bytes: &[u8]) -> Result<Vec<(String, Value)>, CodecError> {
        let mut r = Reader::new(bytes);
        let values = decode_fields(&self.fields, &mut r)?;
        if !r.is_empty() {
            return Err(CodecError::TrailingBytes(r.remaining()));
        }
        Ok(values)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}
