//! Database abstraction layer.
//!
//! Provides a trait-based interface for database operations so the session
//! can run against the SQLite client or an in-memory mock interchangeably.

mod mock;
mod sqlite;
mod types;

pub use mock::{ExecutedQuery, MockDatabaseClient};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::DatabaseConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Opens a database client for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = SqliteClient::connect(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with QuestionnaireError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.execute_with_params(sql, &[]).await
    }

    /// Executes a SQL query with numbered parameters (`?1`, `?2`, ...) bound
    /// in order.
    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
