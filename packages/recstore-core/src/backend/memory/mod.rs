//! Ordered in-memory backend.
//!
//! Each table is a [`MemTable`]: a vector of `(key, value)` pairs sorted by
//! key bytes. With [`WriteMode::Direct`] a read-write transaction writes
//! straight into the shared tables and abort cannot undo those writes.
//! With [`WriteMode::Staged`] the first write to a table copies it into the
//! transaction; commit swaps the copies in and abort drops them.

mod cursor;
mod table;

pub use cursor::MemoryCursor;
pub use table::MemTable;

use std::collections::HashMap;

use crate::backend::{Backend, Transaction, TxnMode};
use crate::config::{MemoryConfig, WriteMode};
use crate::error::{Result, StoreError};

/// Database handle owning every table.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: HashMap<String, MemTable>,
    config: MemoryConfig,
}

impl MemoryBackend {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            tables: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Committed entry count of a table, `None` if it was never written.
    pub fn table_len(&self, name: &str) -> Option<usize> {
        self.tables.get(name).map(MemTable::len)
    }

    /// Names of all created tables, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Backend for MemoryBackend {
    type Config = MemoryConfig;
    type Txn<'db> = MemoryTxn<'db>;

    fn open(config: MemoryConfig) -> Result<Self> {
        tracing::debug!(write_mode = ?config.write_mode, "Opening in-memory backend");
        Ok(Self::new(config))
    }

    fn begin(&mut self, mode: TxnMode) -> Result<MemoryTxn<'_>> {
        tracing::debug!(?mode, "Beginning transaction");
        Ok(MemoryTxn::new(self, mode))
    }

    fn close(self) -> Result<()> {
        tracing::debug!(tables = self.tables.len(), "Closing in-memory backend");
        Ok(())
    }
}

/// Transaction over a [`MemoryBackend`]; aborts on drop unless committed.
#[derive(Debug)]
pub struct MemoryTxn<'db> {
    backend: &'db mut MemoryBackend,
    mode: TxnMode,
    /// Table copies written by this transaction (staged mode only)
    staged: HashMap<String, MemTable>,
    /// Writes applied so far
    writes: usize,
    auto_abort: bool,
}

impl<'db> MemoryTxn<'db> {
    fn new(backend: &'db mut MemoryBackend, mode: TxnMode) -> Self {
        Self {
            backend,
            mode,
            staged: HashMap::new(),
            writes: 0,
            auto_abort: true,
        }
    }

    fn write_mode(&self) -> WriteMode {
        self.backend.config.write_mode
    }

    /// Table as this transaction sees it: the staged copy if there is one.
    fn table(&self, name: &str) -> Option<&MemTable> {
        self.staged
            .get(name)
            .or_else(|| self.backend.tables.get(name))
    }

    /// Writable table, created on first use.
    fn table_mut(&mut self, name: &str) -> Result<&mut MemTable> {
        if self.mode == TxnMode::ReadOnly {
            return Err(StoreError::ReadOnlyTransaction);
        }
        self.writes += 1;
        let capacity = self.backend.config.initial_table_capacity;
        let table = match self.backend.config.write_mode {
            WriteMode::Direct => self
                .backend
                .tables
                .entry(name.to_string())
                .or_insert_with(|| MemTable::with_capacity(capacity)),
            WriteMode::Staged => {
                let committed = &self.backend.tables;
                self.staged.entry(name.to_string()).or_insert_with(|| {
                    committed
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| MemTable::with_capacity(capacity))
                })
            }
        };
        Ok(table)
    }

    fn discard(&mut self) {
        self.auto_abort = false;
        if self.write_mode() == WriteMode::Direct && self.writes > 0 {
            tracing::warn!(
                writes = self.writes,
                "Aborting transaction in direct write mode; applied writes are kept"
            );
        } else {
            tracing::debug!(
                staged_tables = self.staged.len(),
                "Aborting transaction"
            );
        }
        self.staged.clear();
    }
}

impl<'db> Transaction for MemoryTxn<'db> {
    type Cursor<'t>
        = MemoryCursor<'t>
    where
        Self: 't;

    fn mode(&self) -> TxnMode {
        self.mode
    }

    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<()> {
        tracing::trace!(table, key_len = key.len(), value_len = value.len(), "put");
        self.table_mut(table)?.insert(key, value);
        Ok(())
    }

    fn get(&self, table: &str, key: &[u8]) -> Result<Option<&[u8]>> {
        tracing::trace!(table, key_len = key.len(), "get");
        Ok(self.table(table).and_then(|t| t.get(key)))
    }

    fn delete(&mut self, table: &str, key: &[u8]) -> Result<bool> {
        tracing::trace!(table, key_len = key.len(), "delete");
        if self.mode == TxnMode::ReadOnly {
            return Err(StoreError::ReadOnlyTransaction);
        }
        // a miss is not a write: no staged copy, no abort warning
        if self.table(table).and_then(|t| t.get(key)).is_none() {
            return Ok(false);
        }
        Ok(self.table_mut(table)?.delete(key))
    }

    fn cursor(&self, table: &str, start: Option<&[u8]>) -> Result<MemoryCursor<'_>> {
        Ok(MemoryCursor::open(self.table(table), start))
    }

    fn commit(mut self) -> Result<()> {
        self.auto_abort = false;
        let staged = std::mem::take(&mut self.staged);
        tracing::debug!(
            writes = self.writes,
            staged_tables = staged.len(),
            "Committing transaction"
        );
        self.backend.tables.extend(staged);
        Ok(())
    }

    fn abort(mut self) {
        self.discard();
    }
}

impl Drop for MemoryTxn<'_> {
    fn drop(&mut self) {
        if self.auto_abort {
            self.discard();
        }
    }
}
