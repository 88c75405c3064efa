//! Key schemas: named ordered subsets of a record's fields.

use serde::Serialize;

use super::field::{FieldDescriptor, FieldKind};
use super::record::{first_duplicate, RecordSchema};
use crate::codec::{encode_into, Encodable};
use crate::error::{CodecError, SchemaError};

/// Resolved key layout: which record fields form the key and where it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySchema {
    /// Key name (`pk` or the index name)
    pub name: String,
    /// Physical table holding entries for this key
    pub table: String,
    /// Record fields in key order
    pub fields: Vec<FieldDescriptor>,
    /// Descriptor of the Rust key type
    pub key_kind: FieldKind,
}

impl KeySchema {
    /// Checks that `K` is exactly the named record fields, in order.
    ///
    /// A composite `K` must carry the same field names and kinds as the
    /// record; a scalar `K` stands for a single named field.
    pub fn resolve<K: Encodable>(
        record: &RecordSchema,
        name: &str,
        table: String,
        field_names: &[&str],
    ) -> Result<Self, SchemaError> {
        let mismatch = |message: String| SchemaError::KeyMismatch {
            record: record.name.clone(),
            key: name.to_string(),
            message,
        };

        if field_names.is_empty() {
            return Err(mismatch("key has no fields".to_string()));
        }
        if let Some(dup) = first_duplicate(field_names.iter().copied()) {
            return Err(mismatch(format!("field '{dup}' listed twice")));
        }

        let fields = field_names
            .iter()
            .map(|field| {
                record
                    .field(field)
                    .cloned()
                    .ok_or_else(|| SchemaError::UnknownField {
                        record: record.name.clone(),
                        key: name.to_string(),
                        field: field.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let key_kind = K::field_kind();
        let key_fields = match &key_kind {
            FieldKind::Composite(key_fields) => key_fields.clone(),
            kind if fields.len() == 1 => vec![FieldDescriptor::new(fields[0].name.clone(), kind.clone())],
            kind => {
                return Err(mismatch(format!(
                    "scalar key type {kind} cannot cover {} fields",
                    fields.len()
                )))
            }
        };

        if key_fields.len() != fields.len() {
            return Err(mismatch(format!(
                "key type has {} fields, {} named",
                key_fields.len(),
                fields.len()
            )));
        }
        for (declared, actual) in fields.iter().zip(&key_fields) {
            if declared != actual {
                return Err(mismatch(format!(
                    "record field {}: {} does not match key field {}: {}",
                    declared.name, declared.kind, actual.name, actual.kind
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            table,
            fields,
            key_kind,
        })
    }
}

/// Primary key of record type `R` with key type `P`.
pub struct PrimaryKey<R, P> {
    pub(crate) schema: KeySchema,
    extract: Box<dyn Fn(&R) -> P + Send + Sync>,
}

impl<R, P: Encodable> PrimaryKey<R, P> {
    pub(crate) fn new<F>(schema: KeySchema, extract: F) -> Self
    where
        F: Fn(&R) -> P + Send + Sync + 'static,
    {
        Self {
            schema,
            extract: Box::new(extract),
        }
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.schema.table
    }

    /// Copies the key fields out of a record.
    pub fn extract(&self, record: &R) -> P {
        (self.extract)(record)
    }

    pub fn encode(&self, record: &R, out: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_into(&self.extract(record), out)
    }
}

impl<R, P> std::fmt::Debug for PrimaryKey<R, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimaryKey")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

type KeyEncoder<R> = Box<dyn Fn(&R, &mut Vec<u8>) -> Result<(), CodecError> + Send + Sync>;

/// Secondary index of record type `R`. The key type is erased after
/// validation; only its descriptor is kept for lookup checks.
pub struct SecondaryIndex<R> {
    pub(crate) schema: KeySchema,
    encode: KeyEncoder<R>,
}

impl<R> SecondaryIndex<R> {
    pub(crate) fn new<K, F>(schema: KeySchema, extract: F) -> Self
    where
        R: 'static,
        K: Encodable + 'static,
        F: Fn(&R) -> K + Send + Sync + 'static,
    {
        Self {
            schema,
            encode: Box::new(move |record, out| encode_into(&extract(record), out)),
        }
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn table(&self) -> &str {
        &self.schema.table
    }

    /// Appends the encoded index key of `record` to `out`.
    pub fn encode(&self, record: &R, out: &mut Vec<u8>) -> Result<(), CodecError> {
        (self.encode)(record, out)
    }

    /// Encoded index key of `record`.
    pub fn key_bytes(&self, record: &R) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        self.encode(record, &mut out)?;
        Ok(out)
    }
}

impl<R> std::fmt::Debug for SecondaryIndex<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryIndex")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
