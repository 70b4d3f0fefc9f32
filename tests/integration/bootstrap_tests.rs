//! Integration tests for the backend bootstrap
//!
//! These tests require a reachable PostgreSQL server with permission to
//! create databases; they skip themselves when none is available. Each test
//! uses its own database so they can run in parallel.

use crate::common::{db_client, reset_database, test_dsn};
use kinegres::backend::new_backend;
use kinegres::config::PoolConfig;
use kinegres::error::EngineError;

const KINE_INDEXES: [&str; 5] = [
    "kine_name_index",
    "kine_name_id_index",
    "kine_id_deleted_index",
    "kine_prev_revision_index",
    "kine_name_prev_revision_uindex",
];

#[tokio::test]
async fn test_bootstrap_creates_database_and_schema() {
    let db = "kinegres_test_boot";
    if !reset_database(db).await {
        return;
    }

    // The database does not exist yet; bootstrap must create everything.
    let backend = new_backend(&test_dsn(db), None, PoolConfig::default()).await;
    assert!(backend.is_ok(), "bootstrap failed: {:?}", backend.err());

    let client = db_client(db).await.expect("database should now exist");
    let row = client
        .query_one(
            "SELECT COUNT(*) FROM pg_indexes WHERE tablename = 'kine' \
             AND indexname = ANY($1::text[])",
            &[&KINE_INDEXES.as_slice()],
        )
        .await
        .unwrap();
    let count: i64 = row.get(0);
    assert_eq!(count, 5, "all five kine indexes should exist");
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let db = "kinegres_test_idem";
    if !reset_database(db).await {
        return;
    }

    let backend = new_backend(&test_dsn(db), None, PoolConfig::default())
        .await
        .expect("first bootstrap");
    let rev = backend
        .engine()
        .append("idem-key", 1, 0, 0, 0, 0, b"v1", b"")
        .await
        .expect("append");
    drop(backend);

    // Repeating construction against the now-existing target succeeds and
    // leaves existing data untouched.
    let backend = new_backend(&test_dsn(db), None, PoolConfig::default())
        .await
        .expect("second bootstrap");
    assert_eq!(backend.current_revision().await.unwrap(), rev);
}

#[tokio::test]
async fn test_conflict_translates_to_key_exists() {
    let db = "kinegres_test_conflict";
    if !reset_database(db).await {
        return;
    }

    let backend = new_backend(&test_dsn(db), None, PoolConfig::default())
        .await
        .expect("bootstrap");
    let engine = backend.engine();

    engine
        .append("clash", 1, 0, 0, 7, 0, b"a", b"")
        .await
        .expect("first append");
    // Same (name, prev_revision): unique index violation, translated.
    let err = engine
        .append("clash", 1, 0, 0, 7, 0, b"b", b"")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyExists), "got {:?}", err);
}

#[tokio::test]
async fn test_compaction_removes_superseded_and_tombstones() {
    let db = "kinegres_test_compact";
    if !reset_database(db).await {
        return;
    }

    let backend = new_backend(&test_dsn(db), None, PoolConfig::default())
        .await
        .expect("bootstrap");
    let engine = backend.engine();

    let r1 = engine.append("k", 1, 0, 0, 0, 0, b"v1", b"").await.unwrap();
    let r2 = engine.append("k", 0, 0, r1, r1, 0, b"v2", b"v1").await.unwrap();
    let r3 = engine.append("k", 0, 0, r1, r2, 0, b"v3", b"v2").await.unwrap();
    let dead = engine.append("gone", 0, 1, 0, 0, 0, b"", b"").await.unwrap();

    let removed = backend.compact(dead).await.unwrap();
    // r1 superseded by r2, r2 superseded by r3, tombstone removed; the
    // live head r3 survives.
    assert_eq!(removed, 3);

    let client = db_client(db).await.unwrap();
    let rows = client
        .query("SELECT id FROM kine ORDER BY id", &[])
        .await
        .unwrap();
    let remaining: Vec<i64> = rows.iter().map(|r| r.get(0)).collect();
    assert_eq!(remaining, vec![r3]);
}

#[tokio::test]
async fn test_size_query_reports_bytes() {
    let db = "kinegres_test_size";
    if !reset_database(db).await {
        return;
    }

    let backend = new_backend(&test_dsn(db), None, PoolConfig::default())
        .await
        .expect("bootstrap");
    backend
        .engine()
        .append("sized", 1, 0, 0, 0, 0, &[0u8; 1024], b"")
        .await
        .unwrap();

    let size = backend.size().await.unwrap();
    assert!(size > 0, "table with data should report a positive size");
}

#[tokio::test]
async fn test_default_database_bootstrap() {
    // DSN without a database component: normalization picks "kubernetes".
    if !reset_database("kubernetes").await {
        return;
    }

    let host = std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("TEST_DB_PORT").unwrap_or_else(|_| "5432".to_string());
    let user = std::env::var("TEST_DB_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "postgres".to_string());
    let dsn = format!("postgres://{user}:{password}@{host}:{port}?sslmode=disable");

    let backend = new_backend(&dsn, None, PoolConfig::default()).await;
    assert!(backend.is_ok(), "bootstrap failed: {:?}", backend.err());

    let client = db_client("kubernetes").await;
    assert!(client.is_some(), "default database should have been created");
}
