//! Dynamic input resolution.
//!
//! Turns a question template into an executable query by asking an
//! [`InputPrompt`] for a value per declared placeholder. Values are bound as
//! parameters when the query runs; the quoted rendering is kept for display.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::db::{DatabaseClient, Value};
use crate::error::{QuestionnaireError, Result};
use crate::question::Question;

/// What the prompt is asked for one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRequest<'a> {
    /// Question being resolved.
    pub question: &'a str,
    /// Placeholder name, without braces.
    pub placeholder: &'a str,
    /// Column used to enumerate candidates.
    pub column: &'a str,
    /// Distinct values to choose from. `None` means free-form entry.
    pub candidates: Option<Vec<String>>,
    /// Why candidates could not be listed, when the lookup failed.
    pub lookup_error: Option<String>,
}

/// Source of placeholder values.
pub trait InputPrompt {
    /// Returns the chosen or typed value, or `None` to cancel.
    fn prompt(&mut self, request: &InputRequest<'_>) -> Option<String>;
}

/// Prompt backed by values supplied up front, keyed by placeholder name.
/// A missing value cancels.
#[derive(Debug, Clone, Default)]
pub struct PresetInputs {
    values: HashMap<String, String>,
}

impl PresetInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(placeholder.into(), value.into());
        self
    }

    /// Parses `name=value` pairs.
    pub fn parse_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut preset = Self::new();
        for pair in pairs {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                QuestionnaireError::config(format!("Expected name=value, got '{pair}'"))
            })?;
            if name.trim().is_empty() {
                return Err(QuestionnaireError::config(format!(
                    "Missing input name in '{pair}'"
                )));
            }
            preset.values.insert(name.trim().to_string(), value.to_string());
        }
        Ok(preset)
    }
}

impl InputPrompt for PresetInputs {
    fn prompt(&mut self, request: &InputRequest<'_>) -> Option<String> {
        self.values.get(request.placeholder).cloned()
    }
}

/// A query ready to run, with every placeholder resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    /// SQL with values inlined as quoted literals, for display.
    pub display_sql: String,
    /// SQL with numbered bind parameters, for execution.
    pub sql: String,
    /// Parameter values in bind order.
    pub params: Vec<Value>,
    /// Placeholder name -> value, in declaration order.
    pub inputs: Vec<(String, String)>,
}

impl ResolvedQuery {
    /// Resolves a question without dynamic inputs.
    pub fn from_static(question: &Question) -> Self {
        Self {
            display_sql: question.sql.clone(),
            sql: question.sql.clone(),
            params: Vec::new(),
            inputs: Vec::new(),
        }
    }

    /// Builds the query from placeholder values given in declaration order.
    pub fn from_values(question: &Question, inputs: Vec<(String, String)>) -> Self {
        Self {
            display_sql: question.render_with_values(&inputs),
            sql: question.parameterized_sql(),
            params: inputs
                .iter()
                .map(|(_, value)| Value::String(value.clone()))
                .collect(),
            inputs,
        }
    }

    /// The finalized SQL as shown to the user.
    pub fn finalized_sql(&self) -> &str {
        &self.display_sql
    }
}

/// Outcome of resolving one question.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedQuery),
    /// The prompt was cancelled for this placeholder; nothing should run.
    Cancelled { placeholder: String },
}

/// Resolves dynamic inputs against the active database.
pub struct InputResolver<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> InputResolver<'a> {
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// Lists the distinct values of `column` over the question's template.
    pub async fn candidates(&self, question: &Question, column: &str) -> Result<Vec<String>> {
        let sql = format!("SELECT DISTINCT {column} FROM ({})", question.sql);
        let result = self.db.execute_query(&sql).await?;

        Ok(result
            .rows
            .iter()
            .filter_map(|row| row.first())
            .map(Value::to_display_string)
            .collect())
    }

    /// Asks for every placeholder value in declaration order.
    pub async fn resolve(
        &self,
        name: &str,
        question: &Question,
        prompt: &mut dyn InputPrompt,
    ) -> Result<Resolution> {
        if !question.is_dynamic() {
            return Ok(Resolution::Resolved(ResolvedQuery::from_static(question)));
        }

        let mut inputs = Vec::with_capacity(question.dynamic_inputs.len());

        for (placeholder, column) in question.dynamic_inputs.iter() {
            let (candidates, lookup_error) = match self.candidates(question, column).await {
                Ok(values) if values.is_empty() => (None, None),
                Ok(values) => (Some(values), None),
                Err(e) => {
                    warn!("Failed to fetch values for {placeholder}: {e}");
                    (None, Some(e.message().to_string()))
                }
            };

            let request = InputRequest {
                question: name,
                placeholder,
                column,
                candidates,
                lookup_error,
            };

            let Some(value) = prompt.prompt(&request) else {
                debug!("Input for {placeholder} cancelled; skipping '{name}'");
                return Ok(Resolution::Cancelled {
                    placeholder: placeholder.to_string(),
                });
            };

            if let Some(candidates) = &request.candidates {
                if !candidates.contains(&value) {
                    return Err(QuestionnaireError::validation(format!(
                        "'{value}' is not one of the values of {column} for {placeholder}."
                    )));
                }
            }

            inputs.push((placeholder.to_string(), value));
        }

        Ok(Resolution::Resolved(ResolvedQuery::from_values(
            question, inputs,
        )))
    }
}
