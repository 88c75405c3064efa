//! Integration tests for the record store over the in-memory backend.
//!
//! 1. Index maintenance (insert, update, primary key change)
//! 2. Cursor ordering
//! 3. Delete and transaction lifecycle
//! 4. Randomized consistency checks
//! 5. Configuration loaded from JSON

pub mod helpers;
pub mod index_maintenance_tests;
pub mod lifecycle_tests;
