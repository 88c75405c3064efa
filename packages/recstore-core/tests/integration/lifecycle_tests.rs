//! Deletes and transaction commit/abort behavior.

use ntest::timeout;

use recstore_core::backend::{Backend, Transaction, TxnMode};
use recstore_core::config::WriteMode;
use recstore_core::{KeySnapshot, StoreError};

use super::helpers::{assert_indices_consistent, email, memory_backend, pk, user, user_store};

#[timeout(1000)]
#[test]
fn test_delete_missing_key_is_not_found() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1002, "bob@example.com"), None).unwrap();
    txn.commit().unwrap();

    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    let err = store.delete(&mut txn, &pk(1003)).unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            table: "user_pk".to_string()
        }
    );
    txn.commit().unwrap();
    assert_eq!(db.table_len("user_pk"), Some(1));
}

#[timeout(1000)]
#[test]
fn test_delete_leaves_index_entries() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "a@example.com"), None).unwrap();
    store.delete(&mut txn, &pk(1)).unwrap();

    assert!(store.get(&txn, &pk(1), None).unwrap_err().is_not_found());
    // the stale entry still resolves to the deleted key
    assert_eq!(
        store.lookup(&txn, "by_email", &email("a@example.com")).unwrap(),
        pk(1)
    );
}

#[timeout(1000)]
#[test]
fn test_delete_with_all_indices() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "a@example.com"), None).unwrap();
    store.put(&mut txn, &user(2, "b@example.com"), None).unwrap();

    store.delete_with_all_indices(&mut txn, &pk(1)).unwrap();
    let err = store
        .lookup(&txn, "by_email", &email("a@example.com"))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(store
        .delete_with_all_indices(&mut txn, &pk(1))
        .unwrap_err()
        .is_not_found());
    assert_indices_consistent(&store, &txn);
    txn.commit().unwrap();

    assert_eq!(db.table_len("user_pk"), Some(1));
    assert_eq!(db.table_len("user_by_email"), Some(1));
    assert_eq!(db.table_len("user_by_created"), Some(1));
}

#[timeout(1000)]
#[test]
fn test_delete_with_all_indices_spares_shared_entry() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "shared@example.com"), None).unwrap();
    store.put(&mut txn, &user(2, "shared@example.com"), None).unwrap();

    store.delete_with_all_indices(&mut txn, &pk(1)).unwrap();
    assert_eq!(
        store
            .lookup(&txn, "by_email", &email("shared@example.com"))
            .unwrap(),
        pk(2)
    );
}

#[timeout(1000)]
#[test]
fn test_staged_abort_restores_indices() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Staged);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "a@example.com"), None).unwrap();
    txn.commit().unwrap();

    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    let mut snap = KeySnapshot::new();
    let mut record = store.get(&txn, &pk(1), Some(&mut snap)).unwrap();
    record.id = 2;
    record.email = "moved@example.com".to_string();
    store.put(&mut txn, &record, Some(&snap)).unwrap();
    assert_eq!(
        store
            .lookup(&txn, "by_email", &email("moved@example.com"))
            .unwrap(),
        pk(2)
    );
    txn.abort();

    let txn = db.begin(TxnMode::ReadOnly).unwrap();
    assert_eq!(store.get(&txn, &pk(1), None).unwrap(), user(1, "a@example.com"));
    assert!(store.get(&txn, &pk(2), None).unwrap_err().is_not_found());
    assert!(store
        .lookup(&txn, "by_email", &email("moved@example.com"))
        .unwrap_err()
        .is_not_found());
    assert_indices_consistent(&store, &txn);
}

#[timeout(1000)]
#[test]
fn test_direct_abort_keeps_applied_writes() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "a@example.com"), None).unwrap();
    txn.abort();

    let txn = db.begin(TxnMode::ReadOnly).unwrap();
    assert!(store.get(&txn, &pk(1), None).is_ok());
}

#[timeout(1000)]
#[test]
fn test_read_only_transaction_rejects_put() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Staged);
    let mut txn = db.begin(TxnMode::ReadOnly).unwrap();
    let err = store
        .put(&mut txn, &user(1, "a@example.com"), None)
        .unwrap_err();
    assert_eq!(err, StoreError::ReadOnlyTransaction);
}

#[timeout(1000)]
#[test]
fn test_malformed_snapshot_rejected() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "a@example.com"), None).unwrap();

    let mut snap = KeySnapshot::new();
    store.get(&txn, &pk(1), Some(&mut snap)).unwrap();
    let mut bytes = snap.as_bytes().to_vec();
    bytes.truncate(bytes.len() - 2);
    let err = store
        .put(&mut txn, &user(1, "b@example.com"), Some(&KeySnapshot::from_bytes(bytes)))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput(_)));
    assert_eq!(
        store.lookup(&txn, "by_email", &email("a@example.com")).unwrap(),
        pk(1)
    );
}
