//! Shared record types and fixtures.

use recstore_core::backend::memory::MemoryBackend;
use recstore_core::backend::{Backend, Transaction};
use recstore_core::config::{MemoryConfig, WriteMode};
use recstore_core::{impl_encodable, CompactTimestamp, Guid, RecordStore, StoreSchema};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u32,
    pub email: String,
    pub name: String,
    pub created: CompactTimestamp,
    pub tag: Guid,
}

impl_encodable!(User {
    id: u32,
    email: String,
    name: String,
    created: CompactTimestamp,
    tag: Guid,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserPk {
    pub id: u32,
}

impl_encodable!(UserPk { id: u32 });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailKey {
    pub email: String,
}

impl_encodable!(EmailKey { email: String });

pub fn email(address: &str) -> EmailKey {
    EmailKey {
        email: address.to_string(),
    }
}

pub fn pk(id: u32) -> UserPk {
    UserPk { id }
}

pub fn user_store() -> RecordStore<User, UserPk> {
    let schema = StoreSchema::builder("user")
        .primary_key(&["id"], |u: &User| UserPk { id: u.id })
        .secondary_index("by_email", &["email"], |u: &User| EmailKey {
            email: u.email.clone(),
        })
        .secondary_index("by_created", &["created"], |u: &User| u.created)
        .build()
        .unwrap();
    RecordStore::new(schema)
}

pub fn user(id: u32, address: &str) -> User {
    User {
        id,
        email: address.to_string(),
        name: format!("user {id}"),
        created: CompactTimestamp::new(1_700_000_000 + i64::from(id), 0).unwrap(),
        tag: Guid([id as u8; 16]),
    }
}

pub fn memory_backend(write_mode: WriteMode) -> MemoryBackend {
    MemoryBackend::open(MemoryConfig {
        write_mode,
        ..MemoryConfig::default()
    })
    .unwrap()
}

/// Every primary row is reachable through each of its current index keys.
pub fn assert_indices_consistent<T: Transaction>(store: &RecordStore<User, UserPk>, txn: &T) {
    for entry in store.cursor(txn, None).unwrap() {
        let (key, record) = entry.unwrap();
        let by_email = store
            .lookup(txn, "by_email", &email(&record.email))
            .unwrap();
        assert_eq!(by_email, key, "by_email entry for {record:?}");
        let by_created = store.lookup(txn, "by_created", &record.created).unwrap();
        assert_eq!(by_created, key, "by_created entry for {record:?}");
    }
}
