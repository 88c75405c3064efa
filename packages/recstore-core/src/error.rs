//! Store error types.

use thiserror::Error;

/// Errors raised while encoding or decoding field values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer ended before the value was complete
    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// Timestamp component outside the packed 34-bit seconds / 30-bit nanoseconds range
    #[error("Timestamp out of range: sec={sec}, nsec={nsec}")]
    TimestampOutOfRange { sec: i64, nsec: u32 },

    /// Stored size value does not fit the host `usize`
    #[error("Size value {0} exceeds host usize")]
    SizeOverflow(u64),

    /// Byte string, text or snapshot section longer than a 4-byte length prefix can express
    #[error("Length {0} exceeds the u32 length prefix")]
    LengthOverflow(usize),

    /// Text field holds bytes that are not UTF-8
    #[error("Invalid UTF-8 in text field")]
    InvalidUtf8,

    /// Value decoded but bytes were left over
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),
}

/// Errors raised while building or checking a store schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Record type declares the same field twice
    #[error("Field '{field}' declared twice in record '{record}'")]
    DuplicateField { record: String, field: String },

    /// Key names a field the record does not have
    #[error("Key '{key}' references unknown field '{field}' of record '{record}'")]
    UnknownField {
        record: String,
        key: String,
        field: String,
    },

    /// Key type does not line up with the named record fields
    #[error("Key '{key}' does not match record '{record}': {message}")]
    KeyMismatch {
        record: String,
        key: String,
        message: String,
    },

    /// Two secondary indices share a name
    #[error("Index '{index}' declared twice for record '{record}'")]
    DuplicateIndex { record: String, index: String },

    /// Schema built without a primary key
    #[error("Record '{0}' has no primary key")]
    MissingPrimaryKey(String),

    /// Physical table name is empty or shared between two keys
    #[error("Invalid table name '{table}' for record '{record}'")]
    InvalidTableName { record: String, table: String },
}

/// Record store operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key absent on get, lookup or delete
    #[error("Key not found in table '{table}'")]
    NotFound { table: String },

    /// Primary key already present on insert
    #[error("Key already exists in table '{table}'")]
    AlreadyExists { table: String },

    /// Failure reported by the storage backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// Write attempted through a read-only transaction
    #[error("Transaction is read-only")]
    ReadOnlyTransaction,

    /// Malformed caller input (snapshot, key type)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored bytes failed to decode
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Schema validation failure
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl StoreError {
    /// Returns true for the `NotFound` outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
