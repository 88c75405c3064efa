//! Schema descriptors: record layouts, key layouts and key snapshots.
//!
//! A [`StoreSchema`] ties a record type to its primary key and secondary
//! indices. It is built once through [`StoreSchemaBuilder`], which checks
//! every key against the record's field list and resolves physical table
//! names through [`TableNames`].

mod field;
mod key;
mod record;
mod snapshot;

pub use field::{FieldDescriptor, FieldKind, Value};
pub use key::{KeySchema, PrimaryKey, SecondaryIndex};
pub use record::RecordSchema;
pub use snapshot::{KeySnapshot, SnapshotKeys};

use std::collections::HashSet;

use serde::Serialize;

use crate::codec::Encodable;
use crate::config::TableNames;
use crate::error::SchemaError;

/// Full description of one record type: layout, primary key, secondary indices.
#[derive(Debug)]
pub struct StoreSchema<R, P> {
    record: RecordSchema,
    primary: PrimaryKey<R, P>,
    secondary: Vec<SecondaryIndex<R>>,
}

impl<R: Encodable + 'static, P: Encodable + 'static> StoreSchema<R, P> {
    #[must_use]
    pub fn builder(record_name: impl Into<String>) -> StoreSchemaBuilder<R, P> {
        StoreSchemaBuilder::new(record_name.into())
    }
}

impl<R, P> StoreSchema<R, P> {
    pub fn record(&self) -> &RecordSchema {
        &self.record
    }

    pub fn primary(&self) -> &PrimaryKey<R, P> {
        &self.primary
    }

    /// Secondary indices in declaration order (the snapshot order).
    pub fn secondary(&self) -> &[SecondaryIndex<R>] {
        &self.secondary
    }

    pub fn index(&self, name: &str) -> Option<&SecondaryIndex<R>> {
        self.secondary.iter().find(|index| index.name() == name)
    }

    /// Every physical table this schema writes to, primary first.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.schema.table.as_str())
            .chain(self.secondary.iter().map(|index| index.table()))
    }

    /// JSON description of the record layout and every key, for tooling.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            record: &'a RecordSchema,
            primary: &'a KeySchema,
            secondary: Vec<&'a KeySchema>,
        }

        serde_json::to_string_pretty(&View {
            record: &self.record,
            primary: &self.primary.schema,
            secondary: self.secondary.iter().map(|index| &index.schema).collect(),
        })
    }
}

type PendingPrimary<R, P> =
    Box<dyn FnOnce(&RecordSchema, &TableNames) -> Result<PrimaryKey<R, P>, SchemaError>>;
type PendingIndex<R> =
    Box<dyn FnOnce(&RecordSchema, &TableNames) -> Result<SecondaryIndex<R>, SchemaError>>;

/// Declares the keys of a record type; validation happens in [`build`](Self::build).
pub struct StoreSchemaBuilder<R, P> {
    record_name: String,
    table_names: TableNames,
    primary: Option<PendingPrimary<R, P>>,
    index_names: Vec<String>,
    secondary: Vec<PendingIndex<R>>,
}

impl<R: Encodable + 'static, P: Encodable + 'static> StoreSchemaBuilder<R, P> {
    fn new(record_name: String) -> Self {
        Self {
            record_name,
            table_names: TableNames::default(),
            primary: None,
            index_names: Vec::new(),
            secondary: Vec::new(),
        }
    }

    /// Physical table naming; defaults to `<record>_<key>`.
    #[must_use]
    pub fn table_names(mut self, table_names: &TableNames) -> Self {
        self.table_names = table_names.clone();
        self
    }

    /// Declares the primary key as the named fields, extracted by `extract`.
    #[must_use]
    pub fn primary_key<F>(mut self, fields: &[&str], extract: F) -> Self
    where
        F: Fn(&R) -> P + Send + Sync + 'static,
    {
        let fields = owned(fields);
        self.primary = Some(Box::new(move |record: &RecordSchema, names: &TableNames| {
            let table = names.resolve(&record.name, TableNames::PRIMARY);
            let schema = KeySchema::resolve::<P>(record, TableNames::PRIMARY, table, &borrowed(&fields))?;
            Ok(PrimaryKey::new(schema, extract))
        }));
        self
    }

    /// Declares a secondary index with key type `K` over the named fields.
    #[must_use]
    pub fn secondary_index<K, F>(mut self, name: &str, fields: &[&str], extract: F) -> Self
    where
        K: Encodable + 'static,
        F: Fn(&R) -> K + Send + Sync + 'static,
    {
        let fields = owned(fields);
        let index_name = name.to_string();
        self.index_names.push(index_name.clone());
        self.secondary.push(Box::new(move |record: &RecordSchema, names: &TableNames| {
            let table = names.resolve(&record.name, &index_name);
            let schema = KeySchema::resolve::<K>(record, &index_name, table, &borrowed(&fields))?;
            Ok(SecondaryIndex::new(schema, extract))
        }));
        self
    }

    pub fn build(self) -> Result<StoreSchema<R, P>, SchemaError> {
        let record = RecordSchema::of::<R>(self.record_name)?;

        let mut seen = HashSet::new();
        for name in &self.index_names {
            if name == TableNames::PRIMARY || !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateIndex {
                    record: record.name.clone(),
                    index: name.clone(),
                });
            }
        }

        let pending = self
            .primary
            .ok_or_else(|| SchemaError::MissingPrimaryKey(record.name.clone()))?;
        let primary = pending(&record, &self.table_names)?;
        let secondary = self
            .secondary
            .into_iter()
            .map(|pending| pending(&record, &self.table_names))
            .collect::<Result<Vec<_>, _>>()?;

        let schema = StoreSchema {
            record,
            primary,
            secondary,
        };
        check_tables(&schema)?;
        Ok(schema)
    }
}

impl<R, P> std::fmt::Debug for StoreSchemaBuilder<R, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSchemaBuilder")
            .field("record_name", &self.record_name)
            .field("has_primary", &self.primary.is_some())
            .field("index_names", &self.index_names)
            .finish_non_exhaustive()
    }
}

fn check_tables<R, P>(schema: &StoreSchema<R, P>) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for table in schema.tables() {
        if table.is_empty() || !seen.insert(table) {
            return Err(SchemaError::InvalidTableName {
                record: schema.record.name.clone(),
                table: table.to_string(),
            });
        }
    }
    Ok(())
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

fn borrowed(fields: &[String]) -> Vec<&str> {
    fields.iter().map(String::as_str).collect()
}
