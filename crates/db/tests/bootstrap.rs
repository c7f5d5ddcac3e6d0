//! Integration tests for the in-memory database bootstrap.

use std::str::FromStr;

use assert_matches::assert_matches;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use workitem_db::bootstrap::{BootstrapError, DatabaseInstance, EmbeddedDatabase, SQL_DIR};

fn unique_name() -> String {
    format!("boot_{}", uuid::Uuid::new_v4().simple())
}

async fn connect(url: &str) -> SqliteConnection {
    let options = SqliteConnectOptions::from_str(url).unwrap();
    SqliteConnection::connect_with(&options).await.unwrap()
}

#[tokio::test]
async fn seeded_database_is_visible_to_other_connections() {
    let instance = DatabaseInstance::new(unique_name())
        .with_migrations()
        .with_init_script("init.sql");
    let url = instance.url();
    let name = instance.name.clone();

    let db = EmbeddedDatabase::start(SQL_DIR, vec![instance]).await.unwrap();
    assert!(db.is_running(&name));
    assert_eq!(db.names().collect::<Vec<_>>(), vec![name.as_str()]);
    assert!(format!("{db:?}").contains(&name));

    let mut conn = connect(&url).await;
    let row: (i64, String) = sqlx::query_as("SELECT id, name FROM person")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(row, (1, "John Doe".to_string()));
    conn.close().await.unwrap();

    db.shutdown().await;
}

#[tokio::test]
async fn database_disappears_after_shutdown() {
    let instance = DatabaseInstance::new(unique_name()).with_migrations();
    let url = instance.url();

    let db = EmbeddedDatabase::start(SQL_DIR, vec![instance]).await.unwrap();
    db.shutdown().await;

    let mut conn = connect(&url).await;
    let result = sqlx::query("SELECT COUNT(*) FROM person")
        .fetch_one(&mut conn)
        .await;
    assert!(result.is_err(), "schema should be gone with the last connection");
    conn.close().await.unwrap();
}

#[tokio::test]
async fn missing_script_is_reported() {
    let instance = DatabaseInstance::new(unique_name())
        .with_migrations()
        .with_init_script("does_not_exist.sql");

    let result = EmbeddedDatabase::start(SQL_DIR, vec![instance]).await;

    assert_matches!(result, Err(BootstrapError::Script { path, .. }) if path.ends_with("does_not_exist.sql"));
}

#[tokio::test]
async fn failing_seed_is_reported() {
    // init.sql without the migrations has no table to insert into.
    let instance = DatabaseInstance::new(unique_name()).with_init_script("init.sql");

    let result = EmbeddedDatabase::start(SQL_DIR, vec![instance]).await;

    assert_matches!(result, Err(BootstrapError::Database { .. }));
}

#[tokio::test]
async fn migrations_are_recorded() {
    let instance = DatabaseInstance::new(unique_name()).with_migrations();
    let url = instance.url();

    let db = EmbeddedDatabase::start(SQL_DIR, vec![instance]).await.unwrap();

    let mut conn = connect(&url).await;
    let (applied,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(applied as usize, workitem_db::MIGRATOR.iter().count());
    conn.close().await.unwrap();

    db.shutdown().await;
}
