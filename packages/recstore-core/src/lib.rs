//! Schema-driven record store over pluggable ordered key-value backends.
//!
//! Provides an order-preserving binary codec, record and key schemas,
//! secondary index maintenance, and an in-memory reference backend.

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod schema;
pub mod store;

pub use codec::{CompactTimestamp, Encodable, Guid};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use schema::{KeySnapshot, StoreSchema};
pub use store::RecordStore;
