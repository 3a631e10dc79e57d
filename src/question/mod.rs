//! Question definitions and the question store.
//!
//! A question is a named SELECT template with `{name}` placeholders and, for
//! each placeholder, the column whose distinct values are offered as
//! candidates when the question runs.

mod dynamic_inputs;
mod store;

pub use dynamic_inputs::{
    format_dynamic_inputs, parse_dynamic_inputs, placeholder, quote_literal, scan_placeholders,
    substitute_placeholders, DynamicInputs,
};
pub use store::QuestionStore;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{QuestionnaireError, Result};
use crate::safety::classify_sql;

/// A saved question, as persisted in questionnaire files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub description: String,

    /// SELECT template with `{name}` placeholders.
    pub sql: String,

    #[serde(default)]
    pub dynamic_inputs: DynamicInputs,
}

impl Question {
    /// Returns the template with declared placeholders replaced by numbered
    /// bind parameters (`?1`, `?2`, ...) in declaration order.
    pub fn parameterized_sql(&self) -> String {
        let replacements: Vec<(String, String)> = self
            .dynamic_inputs
            .keys()
            .enumerate()
            .map(|(i, name)| (name.to_string(), format!("?{}", i + 1)))
            .collect();
        substitute_placeholders(&self.sql, &replacements)
    }

    /// Returns the template with placeholders replaced by quoted literals.
    pub fn render_with_values(&self, values: &[(String, String)]) -> String {
        let replacements: Vec<(String, String)> = values
            .iter()
            .map(|(name, value)| (name.clone(), quote_literal(value)))
            .collect();
        substitute_placeholders(&self.sql, &replacements)
    }

    /// Returns a copy with the given values baked into the SQL and no dynamic
    /// inputs left.
    pub fn materialize(&self, values: &[(String, String)]) -> Question {
        Question {
            description: self.description.clone(),
            sql: self.render_with_values(values),
            dynamic_inputs: DynamicInputs::new(),
        }
    }

    /// Returns true if the question asks for input when run.
    pub fn is_dynamic(&self) -> bool {
        !self.dynamic_inputs.is_empty()
    }

    /// Renders the details shown for a question.
    pub fn details(&self, name: &str) -> String {
        let mut out = format!(
            "Question: {name}\n\nDescription: {}\n\nSQL: {}",
            self.description, self.sql
        );
        if self.is_dynamic() {
            out.push_str("\n\nDynamic inputs:\n");
            out.push_str(&format_dynamic_inputs(&self.dynamic_inputs));
        }
        out
    }
}

/// Input to question creation, validated before it enters the store.
#[derive(Debug, Clone, Default)]
pub struct QuestionDraft {
    pub name: String,
    pub description: String,
    pub sql: String,
    pub dynamic_inputs: DynamicInputs,
}

impl QuestionDraft {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dynamic_input(mut self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.dynamic_inputs.insert(name.into(), column.into());
        self
    }

    /// Adds dynamic inputs from their `input_name|column_name` text form.
    pub fn with_dynamic_inputs_text(mut self, text: &str) -> Result<Self> {
        self.dynamic_inputs.extend(parse_dynamic_inputs(text)?);
        Ok(self)
    }

    /// Checks the draft against the creation rules.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.sql.is_empty() {
            return Err(QuestionnaireError::validation(
                "Question and SQL are required.",
            ));
        }

        if !self.sql.to_lowercase().starts_with("select") {
            return Err(QuestionnaireError::validation(
                "Only SELECT queries are allowed.",
            ));
        }

        for name in self.dynamic_inputs.keys() {
            if !self.sql.contains(&placeholder(name)) {
                return Err(QuestionnaireError::validation(format!(
                    "Input {name} is not used in the SQL query."
                )));
            }
        }

        let question = self.to_question();
        match classify_sql(&question.parameterized_sql()) {
            Ok(classification) if !classification.is_single_read_only() => {
                return Err(QuestionnaireError::validation(format!(
                    "Only a single read-only SELECT statement is allowed (found {}).",
                    classification.statement_type
                )));
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping statement classification: {e}"),
        }

        let undeclared: Vec<String> = scan_placeholders(&self.sql)
            .into_iter()
            .filter(|name| !self.dynamic_inputs.contains_key(name))
            .collect();
        if !undeclared.is_empty() {
            warn!(
                "Question '{}' has placeholders with no dynamic input: {}",
                self.name.trim(),
                undeclared.join(", ")
            );
        }

        Ok(())
    }

    /// Validates the draft and returns the store key and question.
    pub fn into_question(self) -> Result<(String, Question)> {
        self.validate()?;
        let question = self.to_question();
        Ok((self.name.trim().to_string(), question))
    }

    fn to_question(&self) -> Question {
        Question {
            description: self.description.clone(),
            sql: self.sql.clone(),
            dynamic_inputs: self.dynamic_inputs.clone(),
        }
    }
}
