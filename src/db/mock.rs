//! Mock database client for testing.
//!
//! Returns scripted results per SQL text and records every statement it is
//! asked to run, so resolver and runner behavior can be checked without a
//! database file.

use super::{ColumnInfo, DatabaseClient, QueryResult, Value};
use crate::error::{QuestionnaireError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A statement executed against the mock, with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

enum Scripted {
    Rows(QueryResult),
    Error(String),
}

/// A mock database client that returns predefined results.
#[derive(Default)]
pub struct MockDatabaseClient {
    scripted: HashMap<String, Scripted>,
    executed: Mutex<Vec<ExecutedQuery>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no scripted results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful result for the exact SQL text.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.scripted.insert(sql.into(), Scripted::Rows(result));
        self
    }

    /// Scripts a query error for the exact SQL text.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.scripted
            .insert(sql.into(), Scripted::Error(message.into()));
        self
    }

    /// Returns every statement executed so far, in order.
    pub fn executed(&self) -> Vec<ExecutedQuery> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(ExecutedQuery {
                sql: sql.to_string(),
                params: params.to_vec(),
            });
        }

        match self.scripted.get(sql) {
            Some(Scripted::Rows(result)) => Ok(result.clone()),
            Some(Scripted::Error(message)) => Err(QuestionnaireError::query(message.clone())),
            None if sql.to_uppercase().starts_with("SELECT") => {
                let columns = vec![ColumnInfo::new("result", "TEXT")];
                let rows = vec![vec![Value::String(format!("Mock result for: {}", sql))]];
                Ok(QueryResult::with_data(columns, rows)
                    .with_execution_time(Duration::from_millis(1)))
            }
            None => Ok(QueryResult::new().with_execution_time(Duration::from_millis(1))),
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
