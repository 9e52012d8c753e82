use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use tracker_core::db::migrations::latest_version;
use tracker_core::db::open_db_in_memory;
use tracker_core::{Parcel, ParcelRepository, ParcelStatus, RepoError, SqliteParcelRepository};

fn test_parcel() -> Parcel {
    Parcel {
        number: 0,
        client: 1000,
        status: ParcelStatus::Registered,
        address: "test".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

#[test]
fn add_get_delete_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let parcel = test_parcel();
    let number = store.add(&parcel).unwrap();
    assert!(number > 0);

    let loaded = store.get(number).unwrap();
    assert_eq!(loaded, parcel.clone().with_number(number));

    store.delete(number).unwrap();
    let err = store.get(number).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == number));
    assert!(err.is_not_found());
}

#[test]
fn add_ignores_caller_supplied_number() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let first = store.add(&test_parcel()).unwrap();
    let spoofed = test_parcel().with_number(first);
    let second = store.add(&spoofed).unwrap();

    assert_ne!(first, second);
    assert_eq!(store.get(first).unwrap().number, first);
    assert_eq!(store.get(second).unwrap().number, second);
}

#[test]
fn add_preserves_non_default_initial_status() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let mut parcel = test_parcel();
    parcel.status = ParcelStatus::Sent;
    let number = store.add(&parcel).unwrap();

    assert_eq!(store.get(number).unwrap().status, ParcelStatus::Sent);
}

#[test]
fn add_rejects_invalid_created_at() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let mut parcel = test_parcel();
    parcel.created_at = "01.01.2024".to_string();

    let err = store.add(&parcel).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(store.get_by_client(parcel.client).unwrap().is_empty());
}

#[test]
fn numbers_are_unique_and_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let first = store.add(&test_parcel()).unwrap();
    let second = store.add(&test_parcel()).unwrap();
    assert_ne!(first, second);

    store.delete(second).unwrap();
    let third = store.add(&test_parcel()).unwrap();
    assert_ne!(third, first);
    assert_ne!(third, second);
}

#[test]
fn delete_missing_parcel_is_noop() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    store.delete(424_242).unwrap();

    let number = store.add(&test_parcel()).unwrap();
    store.delete(number).unwrap();
    store.delete(number).unwrap();
}

#[test]
fn get_missing_parcel_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    assert!(matches!(store.get(1), Err(RepoError::NotFound(1))));
}

#[test]
fn set_address_updates_only_address() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let parcel = test_parcel();
    let number = store.add(&parcel).unwrap();

    store.set_address(number, "new test address").unwrap();

    let mut expected = parcel.with_number(number);
    expected.address = "new test address".to_string();
    assert_eq!(store.get(number).unwrap(), expected);
}

#[test]
fn set_address_is_rejected_once_parcel_left_registered() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let number = store.add(&test_parcel()).unwrap();
    for status in [ParcelStatus::Sent, ParcelStatus::Delivered] {
        store.set_status(number, status).unwrap();

        let err = store.set_address(number, "too late").unwrap_err();
        assert!(matches!(
            err,
            RepoError::AddressLocked { number: locked, status: current }
                if locked == number && current == status
        ));
        assert_eq!(store.get(number).unwrap().address, "test");
    }
}

#[test]
fn set_address_on_missing_parcel_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let err = store.set_address(99, "anywhere").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(99)));
}

#[test]
fn set_status_updates_only_status() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let parcel = test_parcel();
    let number = store.add(&parcel).unwrap();

    store.set_status(number, ParcelStatus::Sent).unwrap();

    let mut expected = parcel.with_number(number);
    expected.status = ParcelStatus::Sent;
    assert_eq!(store.get(number).unwrap(), expected);
}

#[test]
fn set_status_does_not_enforce_transition_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let number = store.add(&test_parcel()).unwrap();
    store.set_status(number, ParcelStatus::Delivered).unwrap();
    store.set_status(number, ParcelStatus::Registered).unwrap();

    assert_eq!(store.get(number).unwrap().status, ParcelStatus::Registered);
}

#[test]
fn set_status_on_missing_parcel_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let err = store.set_status(5, ParcelStatus::Sent).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(5)));
}

#[test]
fn full_lifecycle_scenario() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let parcel = test_parcel();
    let number = store.add(&parcel).unwrap();
    let mut expected = parcel.with_number(number);
    assert_eq!(store.get(number).unwrap(), expected);

    store.set_address(number, "new test address").unwrap();
    expected.address = "new test address".to_string();
    assert_eq!(store.get(number).unwrap(), expected);

    store.set_status(number, ParcelStatus::Sent).unwrap();
    expected.status = ParcelStatus::Sent;
    assert_eq!(store.get(number).unwrap(), expected);

    store.delete(number).unwrap();
    assert!(store.get(number).unwrap_err().is_not_found());
}

#[test]
fn get_by_client_returns_exactly_the_clients_parcels() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let mut added = HashMap::new();
    for address in ["first", "second", "third"] {
        let mut parcel = test_parcel();
        parcel.client = 42;
        parcel.address = address.to_string();
        let number = store.add(&parcel).unwrap();
        added.insert(number, parcel.with_number(number));
    }

    let mut other = test_parcel();
    other.client = 43;
    let other_number = store.add(&other).unwrap();

    let stored = store.get_by_client(42).unwrap();
    assert_eq!(stored.len(), added.len());
    for parcel in &stored {
        let expected = added
            .get(&parcel.number)
            .unwrap_or_else(|| panic!("unexpected parcel {parcel:?}"));
        assert_eq!(parcel, expected);
    }

    let numbers: HashSet<_> = stored.iter().map(|parcel| parcel.number).collect();
    assert!(!numbers.contains(&other_number));
}

#[test]
fn get_by_client_without_parcels_returns_empty() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    store.add(&test_parcel()).unwrap();
    assert!(store.get_by_client(7).unwrap().is_empty());
}

#[test]
fn reads_reject_corrupted_rows() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelRepository::try_new(&conn).unwrap();

    let number = store.add(&test_parcel()).unwrap();
    conn.execute(
        "UPDATE parcel SET created_at = 'not a timestamp' WHERE number = ?1;",
        [number],
    )
    .unwrap();

    assert!(matches!(store.get(number), Err(RepoError::Validation(_))));
    assert!(store.get_by_client(1000).is_err());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteParcelRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_parcel_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteParcelRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("parcel"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER PRIMARY KEY AUTOINCREMENT,
            client INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteParcelRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "parcel",
            column: "address"
        })
    ));
}
