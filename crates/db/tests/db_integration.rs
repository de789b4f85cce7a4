//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `atelier_test`)
//!   `TEST_DB_PASSWORD` (default: `atelier_test`)
//!   `TEST_DB_NAME` (default: `atelier_test`)

#![allow(clippy::unwrap_used)]

use atelier_db::test_utils::{TestDatabase, TestDbConfig};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_cleanup() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_apply() {
    let db = TestDatabase::create_unique()
        .await
        .expect("Failed to create database");

    let result = atelier_db::migrate(db.connection()).await;
    assert!(result.is_ok(), "Migration failed: {:?}", result.err());

    db.drop_database().await.expect("Failed to drop database");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_execute_query() {
    let db = TestDatabase::new().await.expect("Failed to connect");

    use sea_orm::ConnectionTrait;
    let result = db
        .connection()
        .execute(sea_orm::Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await;

    assert!(result.is_ok(), "Query failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_chat_pair_is_unique() {
    use sea_orm::ConnectionTrait;

    let db = TestDatabase::create_unique()
        .await
        .expect("Failed to create database");
    atelier_db::migrate(db.connection())
        .await
        .expect("Migration failed");

    let exec = |sql: String| {
        let conn = db.connection();
        async move {
            conn.execute(sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await
        }
    };

    exec("INSERT INTO \"user\" (id, username, username_lower, created_at) \
          VALUES ('u1', 'alice', 'alice', now()), ('u2', 'bob', 'bob', now())"
        .to_string())
    .await
    .expect("Failed to insert users");

    exec(
        "INSERT INTO chat (id, participant1_id, participant2_id) VALUES ('c1', 'u1', 'u2')"
            .to_string(),
    )
    .await
    .expect("Failed to insert first chat");

    // A second chat for the same ordered pair must hit the unique index
    let duplicate = exec(
        "INSERT INTO chat (id, participant1_id, participant2_id) VALUES ('c2', 'u1', 'u2')"
            .to_string(),
    )
    .await;
    assert!(duplicate.is_err(), "Duplicate chat pair was accepted");

    db.drop_database().await.expect("Failed to drop database");
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
