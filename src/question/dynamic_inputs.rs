//! Dynamic input declarations and placeholder substitution.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{QuestionnaireError, Result};

/// Placeholder name -> source column, in declaration order.
pub type DynamicInputs = IndexMap<String, String>;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}\s]+)\}").expect("placeholder pattern is valid")
});

/// Returns the literal token a placeholder takes in SQL text: `{name}`.
pub fn placeholder(name: &str) -> String {
    format!("{{{name}}}")
}

/// Parses the text form of dynamic inputs: one `input_name|column_name` per
/// line. Lines without a `|` are skipped.
pub fn parse_dynamic_inputs(text: &str) -> Result<DynamicInputs> {
    let mut inputs = DynamicInputs::new();

    for (number, line) in text.lines().enumerate() {
        if !line.contains('|') {
            continue;
        }

        let parts: Vec<&str> = line.split('|').map(str::trim).collect();
        match parts.as_slice() {
            [name, column] if !name.is_empty() && !column.is_empty() => {
                inputs.insert(name.to_string(), column.to_string());
            }
            _ => {
                return Err(QuestionnaireError::validation(format!(
                    "Line {}: expected input_name|column_name, got '{}'",
                    number + 1,
                    line.trim()
                )));
            }
        }
    }

    Ok(inputs)
}

/// Renders dynamic inputs back into their text form.
pub fn format_dynamic_inputs(inputs: &DynamicInputs) -> String {
    inputs
        .iter()
        .map(|(name, column)| format!("{name}|{column}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns the distinct `{...}` placeholder names found in the SQL text, in
/// order of first appearance.
pub fn scan_placeholders(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in PLACEHOLDER_RE.captures_iter(sql) {
        let name = &capture[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Replaces each `{name}` token with its replacement text in a single pass,
/// so replacement text is never itself scanned for placeholders.
pub fn substitute_placeholders(template: &str, replacements: &[(String, String)]) -> String {
    let tokens: Vec<(String, &str)> = replacements
        .iter()
        .map(|(name, value)| (placeholder(name), value.as_str()))
        .collect();

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        match tokens.iter().find(|(token, _)| rest.starts_with(token.as_str())) {
            Some((token, value)) => {
                out.push_str(value);
                rest = &rest[token.len()..];
            }
            None => {
                out.push('{');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Wraps a value as a SQL string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
