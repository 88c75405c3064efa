//! Record store: keeps a primary table and its secondary indices in step.
//!
//! The primary table maps `encode(primary key) -> encode(record)`; each
//! secondary table maps `encode(index key) -> encode(primary key)`. All
//! operations run inside a caller-owned backend transaction.
//!
//! An update passes the [`KeySnapshot`] captured when the record was read.
//! If the primary key changed, every old entry is removed and the record is
//! inserted fresh. Otherwise the primary row is overwritten in place and
//! only the indices whose key bytes changed are touched.
//!
//! Index entries are single-valued: two records with equal index keys
//! share one entry, owned by whichever was written last. An update deletes
//! its old index entries outright, so it also drops an entry that another
//! record has since taken over.

mod cursor;

pub use cursor::{IndexCursor, PrimaryCursor, TypedCursor};

use crate::backend::Transaction;
use crate::codec::{decode_from_slice, encode_to_vec, Encodable};
use crate::error::{Result, StoreError};
use crate::schema::{KeySchema, KeySnapshot, StoreSchema};

/// Typed access to one record type through any [`Transaction`].
#[derive(Debug)]
pub struct RecordStore<R, P> {
    schema: StoreSchema<R, P>,
}

impl<R: Encodable, P: Encodable> RecordStore<R, P> {
    pub fn new(schema: StoreSchema<R, P>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &StoreSchema<R, P> {
        &self.schema
    }

    fn primary_table(&self) -> &str {
        self.schema.primary().table()
    }

    /// Writes `record` and maintains every index.
    ///
    /// # Arguments
    /// * `previous` - Snapshot captured by [`get`](Self::get) before the
    ///   record was modified; `None` or an empty snapshot means insert
    ///
    /// # Returns
    /// `InvalidInput` for a malformed snapshot or a `Codec` error for an
    /// oversized field (both checked before any write), or the first
    /// backend error. A failure part-way through leaves the
    /// indices stale until the transaction is aborted.
    pub fn put<T: Transaction>(
        &self,
        txn: &mut T,
        record: &R,
        previous: Option<&KeySnapshot>,
    ) -> Result<()> {
        let mut new_pk = Vec::new();
        self.schema.primary().encode(record, &mut new_pk)?;
        let value = encode_to_vec(record)?;
        let new_keys = self
            .schema
            .secondary()
            .iter()
            .map(|index| index.key_bytes(record))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let Some(snapshot) = previous.filter(|s| !s.is_empty()) else {
            return self.write_all(txn, &new_pk, &value, &new_keys);
        };
        let old = snapshot.keys(self.schema.secondary().len())?;

        if old.primary != new_pk.as_slice() {
            tracing::debug!(
                record = %self.schema.record().name,
                "Primary key changed; replacing all entries"
            );
            if !txn.delete(self.primary_table(), old.primary)? {
                tracing::trace!(table = self.primary_table(), "Old primary row already absent");
            }
            for (index, old_key) in self.schema.secondary().iter().zip(&old.secondary) {
                delete_index_entry(txn, index.table(), old_key)?;
            }
            return self.write_all(txn, &new_pk, &value, &new_keys);
        }

        txn.put(self.primary_table(), &new_pk, &value)?;
        for ((index, old_key), new_key) in self
            .schema
            .secondary()
            .iter()
            .zip(&old.secondary)
            .zip(&new_keys)
        {
            if *old_key == new_key.as_slice() {
                continue;
            }
            tracing::debug!(index = index.name(), "Index key changed");
            delete_index_entry(txn, index.table(), old_key)?;
            txn.put(index.table(), new_key, &new_pk)?;
        }
        Ok(())
    }

    /// Like [`put`](Self::put) without a snapshot, but fails with
    /// `AlreadyExists` if the primary key is taken.
    pub fn insert<T: Transaction>(&self, txn: &mut T, record: &R) -> Result<()> {
        let pk = encode_to_vec(&self.schema.primary().extract(record))?;
        if txn.get(self.primary_table(), &pk)?.is_some() {
            return Err(StoreError::AlreadyExists {
                table: self.primary_table().to_string(),
            });
        }
        self.put(txn, record, None)
    }

    /// Reads the record stored under `key`.
    ///
    /// When `snapshot` is given it is cleared and refilled with the keys
    /// derived from the decoded record, ready for a later [`put`](Self::put).
    pub fn get<T: Transaction>(
        &self,
        txn: &T,
        key: &P,
        snapshot: Option<&mut KeySnapshot>,
    ) -> Result<R> {
        let pk = encode_to_vec(key)?;
        let bytes = txn
            .get(self.primary_table(), &pk)?
            .ok_or_else(|| self.not_found(self.primary_table()))?;
        let record = decode_from_slice::<R>(bytes)?;
        if let Some(snapshot) = snapshot {
            self.snapshot_of(&record, snapshot)?;
        }
        Ok(record)
    }

    /// Fills `snapshot` with the primary and secondary keys of `record`.
    ///
    /// On failure the snapshot is left empty.
    pub fn snapshot_of(&self, record: &R, snapshot: &mut KeySnapshot) -> Result<()> {
        snapshot.clear();
        let filled = self.fill_snapshot(record, snapshot);
        if filled.is_err() {
            snapshot.clear();
        }
        filled
    }

    fn fill_snapshot(&self, record: &R, snapshot: &mut KeySnapshot) -> Result<()> {
        snapshot.push_encoded(|buf| self.schema.primary().encode(record, buf))?;
        for index in self.schema.secondary() {
            snapshot.push_encoded(|buf| index.encode(record, buf))?;
        }
        Ok(())
    }

    /// Removes the primary row only; index entries are left in place.
    pub fn delete<T: Transaction>(&self, txn: &mut T, key: &P) -> Result<()> {
        let pk = encode_to_vec(key)?;
        if !txn.delete(self.primary_table(), &pk)? {
            return Err(self.not_found(self.primary_table()));
        }
        Ok(())
    }

    /// Removes the primary row and every index entry that still points at it.
    ///
    /// Unlike an update, an entry another record has taken over is kept.
    pub fn delete_with_all_indices<T: Transaction>(&self, txn: &mut T, key: &P) -> Result<()> {
        let record = self.get(txn, key, None)?;
        let pk = encode_to_vec(key)?;
        for index in self.schema.secondary() {
            remove_owned_index_entry(txn, index.table(), &index.key_bytes(&record)?, &pk)?;
        }
        txn.delete(self.primary_table(), &pk)?;
        Ok(())
    }

    /// Primary key stored under `key` in the index `index`.
    ///
    /// `K` must be the index's declared key type, else `InvalidInput`.
    pub fn lookup<T: Transaction, K: Encodable>(&self, txn: &T, index: &str, key: &K) -> Result<P> {
        let table = self.index_table::<K>(index)?;
        let sk = encode_to_vec(key)?;
        let pk = txn
            .get(table, &sk)?
            .ok_or_else(|| self.not_found(table))?;
        Ok(decode_from_slice(pk)?)
    }

    /// Record reached through the index `index`.
    pub fn get_by_index<T: Transaction, K: Encodable>(
        &self,
        txn: &T,
        index: &str,
        key: &K,
        snapshot: Option<&mut KeySnapshot>,
    ) -> Result<R> {
        let pk = self.lookup(txn, index, key)?;
        self.get(txn, &pk, snapshot)
    }

    /// Scans the primary table in ascending key order from `start`.
    pub fn cursor<'t, T: Transaction>(
        &self,
        txn: &'t T,
        start: Option<&P>,
    ) -> Result<PrimaryCursor<T::Cursor<'t>, P, R>> {
        let start = start.map(encode_to_vec).transpose()?;
        let inner = txn.cursor(self.primary_table(), start.as_deref())?;
        Ok(TypedCursor::new(inner))
    }

    /// Scans an index in ascending key order from `start`.
    pub fn index_cursor<'t, T: Transaction, K: Encodable>(
        &self,
        txn: &'t T,
        index: &str,
        start: Option<&K>,
    ) -> Result<IndexCursor<T::Cursor<'t>, K, P>> {
        let table = self.index_table::<K>(index)?;
        let start = start.map(encode_to_vec).transpose()?;
        let inner = txn.cursor(table, start.as_deref())?;
        Ok(TypedCursor::new(inner))
    }

    fn write_all<T: Transaction>(
        &self,
        txn: &mut T,
        pk: &[u8],
        value: &[u8],
        index_keys: &[Vec<u8>],
    ) -> Result<()> {
        txn.put(self.primary_table(), pk, value)?;
        for (index, key) in self.schema.secondary().iter().zip(index_keys) {
            txn.put(index.table(), key, pk)?;
        }
        Ok(())
    }

    fn index_table<K: Encodable>(&self, name: &str) -> Result<&str> {
        let index = self
            .schema
            .index(name)
            .ok_or_else(|| StoreError::InvalidInput(format!("unknown index '{name}'")))?;
        check_key_type::<K>(index.schema())?;
        Ok(index.table())
    }

    fn not_found(&self, table: &str) -> StoreError {
        StoreError::NotFound {
            table: table.to_string(),
        }
    }
}

/// Deletes a stale index entry; one that is already gone is not an error.
fn delete_index_entry<T: Transaction>(txn: &mut T, table: &str, key: &[u8]) -> Result<()> {
    if !txn.delete(table, key)? {
        tracing::trace!(table, "Old index entry already absent");
    }
    Ok(())
}

/// Deletes `key` from an index table only while it still maps to `owner`.
fn remove_owned_index_entry<T: Transaction>(
    txn: &mut T,
    table: &str,
    key: &[u8],
    owner: &[u8],
) -> Result<()> {
    if txn.get(table, key)?.is_some_and(|pk| pk == owner) {
        txn.delete(table, key)?;
    } else {
        tracing::trace!(table, "Index entry absent or owned by another record");
    }
    Ok(())
}

fn check_key_type<K: Encodable>(schema: &KeySchema) -> Result<()> {
    let kind = K::field_kind();
    if kind != schema.key_kind {
        return Err(StoreError::InvalidInput(format!(
            "index '{}' expects key {}, got {kind}",
            schema.name, schema.key_kind
        )));
    }
    Ok(())
}
