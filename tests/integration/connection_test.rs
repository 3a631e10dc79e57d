//! Database load/unload lifecycle against real files.

use super::create_shop_db;
use db_questionnaire::config::DatabaseConfig;
use db_questionnaire::connection::{ConnectionManager, ConnectionState};
use db_questionnaire::db::DatabaseClient;
use db_questionnaire::error::QuestionnaireError;
use tempfile::tempdir;

#[tokio::test]
async fn test_load_query_unload() {
    let dir = tempdir().unwrap();
    let path = create_shop_db(dir.path()).await;
    let mut manager = ConnectionManager::new();

    manager.load(&DatabaseConfig::for_path(&path)).await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Loaded);
    assert_eq!(manager.path(), Some(path.as_path()));

    let result = manager
        .require_db()
        .unwrap()
        .execute_query("SELECT count(*) AS n FROM orders")
        .await
        .unwrap();
    assert_eq!(result.rows[0][0].to_display_string(), "3");

    assert!(manager.unload().await.unwrap());
    assert_eq!(manager.state(), ConnectionState::Unloaded);
    assert!(manager.require_db().is_err());

    manager.load(&DatabaseConfig::for_path(&path)).await.unwrap();
    assert!(manager.is_loaded());
    manager.unload().await.unwrap();
}

#[tokio::test]
async fn test_load_nonexistent_path_stays_unloaded() {
    let dir = tempdir().unwrap();
    let mut manager = ConnectionManager::new();

    let err = manager
        .load(&DatabaseConfig::for_path(dir.path().join("nope.db")))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Database file not found.");
    assert_eq!(manager.state(), ConnectionState::Unloaded);
    assert!(!dir.path().join("nope.db").exists());
}

#[tokio::test]
async fn test_load_non_database_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.db");
    std::fs::write(&path, "this is not a database file\n".repeat(200)).unwrap();
    let mut manager = ConnectionManager::new();

    let err = manager
        .load(&DatabaseConfig::for_path(&path))
        .await
        .unwrap_err();

    assert!(matches!(err, QuestionnaireError::Connection(_)));
    assert!(err.message().starts_with("Failed to connect to database:"));
    assert_eq!(manager.state(), ConnectionState::Unloaded);
}

#[tokio::test]
async fn test_load_while_loaded_keeps_first_database() {
    let dir = tempdir().unwrap();
    let first = create_shop_db(dir.path()).await;
    let other_dir = tempdir().unwrap();
    let second = create_shop_db(other_dir.path()).await;
    let mut manager = ConnectionManager::new();

    manager.load(&DatabaseConfig::for_path(&first)).await.unwrap();
    let err = manager
        .load(&DatabaseConfig::for_path(&second))
        .await
        .unwrap_err();

    assert!(matches!(err, QuestionnaireError::Connection(_)));
    assert_eq!(manager.path(), Some(first.as_path()));
    manager.unload().await.unwrap();
}

#[tokio::test]
async fn test_read_only_database_rejects_writes() {
    let dir = tempdir().unwrap();
    let path = create_shop_db(dir.path()).await;
    let mut manager = ConnectionManager::new();

    let config = DatabaseConfig {
        path: Some(path),
        read_only: true,
    };
    manager.load(&config).await.unwrap();

    let db = manager.require_db().unwrap();
    assert!(db.execute_query("DELETE FROM orders").await.is_err());
    let count = db
        .execute_query("SELECT count(*) FROM orders")
        .await
        .unwrap();
    assert_eq!(count.rows[0][0].to_display_string(), "3");

    manager.unload().await.unwrap();
}
