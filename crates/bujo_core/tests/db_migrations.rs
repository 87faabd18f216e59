use bujo_core::db::migrations::latest_version;
use bujo_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "collections");
    assert_table_exists(&conn, "bullets");
    assert_table_exists(&conn, "collection_users");
    assert_table_exists(&conn, "user_preferences");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bujo.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "bullets");
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
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_migration_names_its_version_and_keeps_previous_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conflict.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
        .unwrap();
    conn.execute_batch("CREATE TABLE collection_users (legacy TEXT); PRAGMA user_version = 1;")
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 2),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 1);
    let preferences: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'user_preferences';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(preferences, 0);
}

#[test]
fn file_connections_enforce_foreign_keys_and_wal() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("pragmas.db")).unwrap();

    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
    assert_eq!(journal_mode, "wal");
}

#[test]
fn bullet_positions_are_unique_per_scope() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (id, name, email) VALUES ('u1', 'Ada', 'ada@example.com');
         INSERT INTO collections (id, owner_id, name) VALUES ('c1', 'u1', 'Inbox');
         INSERT INTO collections (id, owner_id, name) VALUES ('c2', 'u1', 'Later');
         INSERT INTO bullets (id, collection_id, kind, content, state, position, created_by)
         VALUES ('b1', 'c1', 'task', 'one', 'open', 1024, 'u1');
         INSERT INTO bullets (id, collection_id, kind, content, state, position, created_by)
         VALUES ('b2', 'c2', 'task', 'two', 'open', 1024, 'u1');",
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO bullets (id, collection_id, kind, content, state, position, created_by)
         VALUES ('b3', 'c1', 'task', 'three', 'open', 1024, 'u1');",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn bullet_rows_need_exactly_one_scope() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (id, name, email) VALUES ('u1', 'Ada', 'ada@example.com');
         INSERT INTO collections (id, owner_id, name) VALUES ('c1', 'u1', 'Inbox');",
    )
    .unwrap();

    let both = conn.execute(
        "INSERT INTO bullets (id, collection_id, log_user_id, log_date, kind, content, state, position, created_by)
         VALUES ('b1', 'c1', 'u1', '2024-01-01', 'task', 'x', 'open', 1024, 'u1');",
        [],
    );
    assert!(both.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
