//! Integration tests against real SQLite files.

pub mod connection_test;
pub mod persistence_test;
pub mod query_test;
pub mod session_test;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::{Path, PathBuf};

/// Creates `shop.db` in `dir` with an `orders` table:
///
/// | id | region | amount | note |
/// |----|--------|--------|------|
/// | 1  | north  | 10.5   | NULL |
/// | 2  | south  | 20.0   | gift |
/// | 3  | north  | 7.25   | NULL |
pub async fn create_shop_db(dir: &Path) -> PathBuf {
    let path = dir.join("shop.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, region TEXT NOT NULL, amount REAL, note TEXT)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO orders (id, region, amount, note) VALUES \
         (1, 'north', 10.5, NULL), (2, 'south', 20.0, 'gift'), (3, 'north', 7.25, NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();

    pool.close().await;
    path
}
