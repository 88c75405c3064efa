//! Storage backend contract.
//!
//! The record store only talks to storage through these traits. A backend
//! must order cursor keys by unsigned byte-wise comparison, let a
//! transaction read its own writes, and make `put` replace an existing
//! value as one step from the caller's point of view. Tables are created
//! lazily on first write; reading an unknown table behaves like reading
//! an empty one.

pub mod memory;

use crate::error::Result;

/// Access mode requested at `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    ReadOnly,
    ReadWrite,
}

/// A database handle that hands out one transaction at a time.
pub trait Backend: Sized {
    type Config;
    type Txn<'db>: Transaction
    where
        Self: 'db;

    fn open(config: Self::Config) -> Result<Self>;

    fn begin(&mut self, mode: TxnMode) -> Result<Self::Txn<'_>>;

    fn close(self) -> Result<()> {
        Ok(())
    }
}

/// Table-scoped operations on opaque byte keys and values.
///
/// `commit` and `abort` consume the transaction; dropping it without
/// either aborts.
pub trait Transaction {
    type Cursor<'t>: Cursor
    where
        Self: 't;

    fn mode(&self) -> TxnMode;

    /// Inserts or overwrites `key` in `table`.
    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<()>;

    fn get(&self, table: &str, key: &[u8]) -> Result<Option<&[u8]>>;

    /// Removes `key`; returns whether it was present.
    fn delete(&mut self, table: &str, key: &[u8]) -> Result<bool>;

    /// Opens a cursor at the first key `>= start`, or at the first key.
    fn cursor(&self, table: &str, start: Option<&[u8]>) -> Result<Self::Cursor<'_>>;

    fn commit(self) -> Result<()>;

    fn abort(self);
}

/// Forward cursor over one table in ascending key order.
pub trait Cursor {
    /// Entry under the cursor, `None` once exhausted.
    fn current(&self) -> Option<(&[u8], &[u8])>;

    /// Moves to the next entry; returns false when that exhausts the cursor.
    fn advance(&mut self) -> bool;
}
