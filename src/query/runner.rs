//! Question execution.
//!
//! Runs resolved questions against the active database. A failing question
//! becomes an error table in its result slot and never stops the batch; only
//! a cancelled input prompt does.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use super::resolver::{InputPrompt, InputResolver, Resolution, ResolvedQuery};
use crate::db::{DatabaseClient, QueryResult};
use crate::error::{QuestionnaireError, Result};
use crate::question::{Question, QuestionStore};

/// The outcome of running one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    /// Question name.
    pub question: String,
    /// Question description, shown with the table.
    pub description: String,
    /// Finalized SQL as displayed (values inlined).
    pub sql: String,
    /// Placeholder values used for this run.
    pub inputs: Vec<(String, String)>,
    /// Result rows, or the one-cell error table.
    pub table: QueryResult,
    /// Error text when the question failed.
    pub error: Option<String>,
}

impl QuestionResult {
    fn failed(
        name: &str,
        question: &Question,
        sql: String,
        inputs: Vec<(String, String)>,
        message: String,
    ) -> Self {
        Self {
            question: name.to_string(),
            description: question.description.clone(),
            sql,
            inputs,
            table: QueryResult::error_table(message.clone()),
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Label used to pick the result in a list: the name, marked on error.
    pub fn label(&self) -> String {
        if self.is_error() {
            format!("{} (Error)", self.question)
        } else {
            self.question.clone()
        }
    }
}

/// Where a batch stopped because the user cancelled an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cancellation {
    pub question: String,
    pub placeholder: String,
}

/// Results of a batch run, in run order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub results: Vec<QuestionResult>,
    pub cancelled: Option<Cancellation>,
}

impl RunReport {
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_error()).count()
    }
}

/// Outcome of running a single question through resolution and execution.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(QuestionResult),
    Cancelled { placeholder: String },
}

/// Executes questions against one database client.
pub struct QueryRunner<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> QueryRunner<'a> {
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// Executes an already resolved query. Failures become an error table.
    pub async fn execute(
        &self,
        name: &str,
        question: &Question,
        resolved: ResolvedQuery,
    ) -> QuestionResult {
        let start = Instant::now();
        let result = self
            .db
            .execute_with_params(&resolved.sql, &resolved.params)
            .await;
        let elapsed = start.elapsed();

        match result {
            Ok(table) => {
                info!(
                    "Question '{}' returned {} rows in {:?}",
                    name, table.row_count, elapsed
                );
                QuestionResult {
                    question: name.to_string(),
                    description: question.description.clone(),
                    sql: resolved.display_sql,
                    inputs: resolved.inputs,
                    table,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Question '{}' failed: {}", name, e);
                QuestionResult::failed(
                    name,
                    question,
                    resolved.display_sql,
                    resolved.inputs,
                    format!(
                        "Error executing query for question '{}':\n{}",
                        name,
                        e.message()
                    ),
                )
            }
        }
    }

    /// Resolves inputs for one question and runs it.
    pub async fn run_question(
        &self,
        name: &str,
        question: &Question,
        prompt: &mut dyn InputPrompt,
    ) -> RunOutcome {
        let resolution = InputResolver::new(self.db)
            .resolve(name, question, prompt)
            .await;

        match resolution {
            Ok(Resolution::Resolved(resolved)) => {
                RunOutcome::Completed(self.execute(name, question, resolved).await)
            }
            Ok(Resolution::Cancelled { placeholder }) => RunOutcome::Cancelled { placeholder },
            Err(e) => {
                warn!("Inputs for question '{}' rejected: {}", name, e);
                RunOutcome::Completed(QuestionResult::failed(
                    name,
                    question,
                    question.sql.clone(),
                    Vec::new(),
                    format!(
                        "Error resolving inputs for question '{}':\n{}",
                        name,
                        e.message()
                    ),
                ))
            }
        }
    }

    /// Runs the named questions in order.
    ///
    /// Every name must exist before anything runs. A cancelled prompt stops
    /// the batch and keeps the results gathered so far.
    pub async fn run_batch(
        &self,
        store: &QuestionStore,
        names: &[String],
        prompt: &mut dyn InputPrompt,
    ) -> Result<RunReport> {
        if names.is_empty() {
            return Err(QuestionnaireError::validation(
                "Please select at least one question to run.",
            ));
        }

        let questions = names
            .iter()
            .map(|name| store.require(name).map(|q| (name.as_str(), q)))
            .collect::<Result<Vec<_>>>()?;

        let mut report = RunReport::default();

        for (name, question) in questions {
            match self.run_question(name, question, prompt).await {
                RunOutcome::Completed(result) => report.results.push(result),
                RunOutcome::Cancelled { placeholder } => {
                    info!("Run cancelled at question '{}' input {}", name, placeholder);
                    report.cancelled = Some(Cancellation {
                        question: name.to_string(),
                        placeholder,
                    });
                    break;
                }
            }
        }

        Ok(report)
    }
}
