//! Insert, update and primary-key change through a key snapshot.

use ntest::timeout;

use recstore_core::backend::{Backend, Transaction, TxnMode};
use recstore_core::config::WriteMode;
use recstore_core::KeySnapshot;

use super::helpers::{assert_indices_consistent, email, memory_backend, pk, user, user_store};

#[timeout(1000)]
#[test]
fn test_insert_then_lookup_by_email() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();

    store
        .put(&mut txn, &user(1002, "bob@example.com"), None)
        .unwrap();

    let found = store
        .lookup(&txn, "by_email", &email("bob@example.com"))
        .unwrap();
    assert_eq!(found, pk(1002));
    txn.commit().unwrap();
}

#[timeout(1000)]
#[test]
fn test_update_secondary_key() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store
        .put(&mut txn, &user(1002, "bob@example.com"), None)
        .unwrap();

    let mut snap = KeySnapshot::new();
    let mut bob = store.get(&txn, &pk(1002), Some(&mut snap)).unwrap();
    bob.email = "bob_new@example.com".to_string();
    store.put(&mut txn, &bob, Some(&snap)).unwrap();

    let err = store
        .lookup(&txn, "by_email", &email("bob@example.com"))
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        store
            .lookup(&txn, "by_email", &email("bob_new@example.com"))
            .unwrap(),
        pk(1002)
    );
    assert_eq!(store.get(&txn, &pk(1002), None).unwrap(), bob);
    txn.commit().unwrap();

    assert_eq!(db.table_len("user_pk"), Some(1));
    assert_eq!(db.table_len("user_by_email"), Some(1));
}

#[timeout(1000)]
#[test]
fn test_update_primary_key() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store
        .put(&mut txn, &user(1002, "bob@example.com"), None)
        .unwrap();

    let mut snap = KeySnapshot::new();
    let mut bob = store.get(&txn, &pk(1002), Some(&mut snap)).unwrap();
    bob.id = 9999;
    store.put(&mut txn, &bob, Some(&snap)).unwrap();

    assert!(store.get(&txn, &pk(1002), None).unwrap_err().is_not_found());
    assert_eq!(store.get(&txn, &pk(9999), None).unwrap(), bob);
    assert_eq!(
        store
            .lookup(&txn, "by_email", &email("bob@example.com"))
            .unwrap(),
        pk(9999)
    );
    assert_eq!(store.lookup(&txn, "by_created", &bob.created).unwrap(), pk(9999));
    assert_indices_consistent(&store, &txn);
    txn.commit().unwrap();

    assert_eq!(db.table_len("user_pk"), Some(1));
    assert_eq!(db.table_len("user_by_email"), Some(1));
    assert_eq!(db.table_len("user_by_created"), Some(1));
}

#[timeout(1000)]
#[test]
fn test_update_without_key_change_rewrites_value() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(7, "g@example.com"), None).unwrap();

    let mut snap = KeySnapshot::new();
    let mut record = store.get(&txn, &pk(7), Some(&mut snap)).unwrap();
    record.name = "renamed".to_string();
    store.put(&mut txn, &record, Some(&snap)).unwrap();

    assert_eq!(store.get(&txn, &pk(7), None).unwrap().name, "renamed");
    assert_indices_consistent(&store, &txn);
}

#[timeout(1000)]
#[test]
fn test_same_primary_key_overwrites() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "a@example.com"), None).unwrap();
    let mut second = user(1, "b@example.com");
    second.name = "second".to_string();
    store.put(&mut txn, &second, None).unwrap();
    txn.commit().unwrap();

    assert_eq!(db.table_len("user_pk"), Some(1));
    let txn = db.begin(TxnMode::ReadOnly).unwrap();
    assert_eq!(store.get(&txn, &pk(1), None).unwrap(), second);
}

#[timeout(1000)]
#[test]
fn test_snapshot_reused_across_reads() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "a@example.com"), None).unwrap();
    store.put(&mut txn, &user(2, "b@example.com"), None).unwrap();

    let mut snap = KeySnapshot::new();
    store.get(&txn, &pk(1), Some(&mut snap)).unwrap();
    let first_len = snap.len();
    let mut second = store.get(&txn, &pk(2), Some(&mut snap)).unwrap();
    assert_eq!(snap.len(), first_len);

    second.email = "b2@example.com".to_string();
    store.put(&mut txn, &second, Some(&snap)).unwrap();
    assert_eq!(
        store.lookup(&txn, "by_email", &email("a@example.com")).unwrap(),
        pk(1)
    );
    assert_indices_consistent(&store, &txn);
}

#[timeout(1000)]
#[test]
fn test_primary_key_change_drops_shared_email() {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite).unwrap();
    store.put(&mut txn, &user(1, "shared@example.com"), None).unwrap();
    store.put(&mut txn, &user(2, "shared@example.com"), None).unwrap();
    assert_eq!(
        store
            .lookup(&txn, "by_email", &email("shared@example.com"))
            .unwrap(),
        pk(2)
    );

    let mut snap = KeySnapshot::new();
    let mut first = store.get(&txn, &pk(1), Some(&mut snap)).unwrap();
    first.id = 3;
    first.email = "moved@example.com".to_string();
    store.put(&mut txn, &first, Some(&snap)).unwrap();

    // the shared entry is deleted outright, even though user 2 wrote it last
    assert!(store
        .lookup(&txn, "by_email", &email("shared@example.com"))
        .unwrap_err()
        .is_not_found());
    assert_eq!(
        store
            .lookup(&txn, "by_email", &email("moved@example.com"))
            .unwrap(),
        pk(3)
    );
    assert_eq!(store.get(&txn, &pk(2), None).unwrap(), user(2, "shared@example.com"));
}

#[timeout(1000)]
#[test]
fn test_get_by_index() -> anyhow::Result<()> {
    let store = user_store();
    let mut db = memory_backend(WriteMode::Direct);
    let mut txn = db.begin(TxnMode::ReadWrite)?;
    let carol = user(3, "carol@example.com");
    store.insert(&mut txn, &carol)?;

    let found = store.get_by_index(&txn, "by_email", &email("carol@example.com"), None)?;
    assert_eq!(found, carol);
    txn.commit()?;
    Ok(())
}
