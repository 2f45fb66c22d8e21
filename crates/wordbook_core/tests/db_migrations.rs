use std::time::Duration;
use wordbook_core::db::migrations::latest_version;
use wordbook_core::db::{open_db, open_db_in_memory, open_db_with_retry, DbError, RetryPolicy};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "word_records");
    assert_index_exists(&conn, "uq_word_records_word");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wordbook.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "word_records");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn retry_does_not_retry_unsupported_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let policy = RetryPolicy {
        attempts: 5,
        delay: Duration::from_secs(60),
    };
    let err = open_db_with_retry(&path, policy).unwrap_err();
    assert!(matches!(err, DbError::UnsupportedSchemaVersion { .. }));
}

#[test]
fn retry_gives_up_after_bounded_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-parent").join("wordbook.db");

    let policy = RetryPolicy {
        attempts: 2,
        delay: Duration::from_millis(1),
    };
    let err = open_db_with_retry(&path, policy).unwrap_err();
    match err {
        DbError::ConnectionFailed {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last_error, DbError::Sqlite(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn retry_opens_reachable_database_on_first_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wordbook.db");

    let conn = open_db_with_retry(&path, RetryPolicy::default()).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object_exists(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object_exists(conn, "index", index_name);
}

fn assert_schema_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
