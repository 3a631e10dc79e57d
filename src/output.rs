//! Rendering of questions and run results for the terminal.

use db_questionnaire::config::DisplayConfig;
use db_questionnaire::query::{QuestionResult, RunReport};
use db_questionnaire::question::QuestionStore;
use serde::Serialize;

use crate::cli::OutputFormat;

/// Renders a run report in the requested format.
pub fn format_report(
    report: &RunReport,
    display: &DisplayConfig,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => format_report_text(report, display),
        OutputFormat::Json => format_report_json(report),
    }
}

fn format_report_text(report: &RunReport, display: &DisplayConfig) -> String {
    let mut sections: Vec<String> = report
        .results
        .iter()
        .map(|result| format_result(result, display))
        .collect();

    if let Some(cancelled) = &report.cancelled {
        sections.push(format!(
            "Run cancelled at question '{}' (input {}).",
            cancelled.question, cancelled.placeholder
        ));
    }

    sections.join("\n\n")
}

/// Renders one result: label, description, finalized SQL, then the table.
pub fn format_result(result: &QuestionResult, display: &DisplayConfig) -> String {
    let mut out = format!("== {} ==\n", result.label());
    if !result.description.is_empty() {
        out.push_str(&result.description);
        out.push('\n');
    }
    out.push_str(&format!("SQL: {}\n\n", result.sql));

    if let Some(error) = &result.error {
        out.push_str(error);
        return out;
    }

    let headers: Vec<String> = result
        .table
        .columns
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let rows: Vec<Vec<String>> = result
        .table
        .rows
        .iter()
        .take(display.max_rows)
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();

    out.push_str(&format_table(&headers, &rows, display.max_column_width));
    out.push('\n');

    let total = result.table.row_count;
    if total > rows.len() {
        out.push_str(&format!(
            "({} rows, showing first {}, {} ms)",
            total,
            rows.len(),
            result.table.execution_time.as_millis()
        ));
    } else {
        out.push_str(&format!(
            "({} rows, {} ms)",
            total,
            result.table.execution_time.as_millis()
        ));
    }
    out
}

/// Formats a table with columns padded to their widest cell.
fn format_table(headers: &[String], rows: &[Vec<String>], max_width: usize) -> String {
    if headers.is_empty() {
        return "(no columns)".to_string();
    }

    let headers: Vec<String> = headers.iter().map(|h| cell(h, max_width)).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| cell(c, max_width)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, value) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(value.chars().count());
            }
        }
    }

    let mut output = String::new();
    output.push_str(&join_padded(&headers, &widths));
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&separator.join("─┼─"));

    for row in &rows {
        output.push('\n');
        output.push_str(&join_padded(row, &widths));
    }

    output
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let width = widths.get(i).copied().unwrap_or(0);
            format!("{:width$}", c, width = width)
        })
        .collect::<Vec<_>>()
        .join(" │ ")
        .trim_end()
        .to_string()
}

/// Flattens a value to one line and truncates it to `max_width` characters.
fn cell(value: &str, max_width: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_width {
        flat
    } else if max_width <= 3 {
        flat.chars().take(max_width).collect()
    } else {
        let head: String = flat.chars().take(max_width - 3).collect();
        format!("{head}...")
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: Vec<JsonResult<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cancelled: Option<JsonCancelled<'a>>,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    question: &'a str,
    label: String,
    description: &'a str,
    sql: &'a str,
    inputs: Vec<JsonInput<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    columns: Vec<&'a str>,
    rows: Vec<Vec<serde_json::Value>>,
    execution_time_ms: u64,
}

#[derive(Serialize)]
struct JsonInput<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct JsonCancelled<'a> {
    question: &'a str,
    input: &'a str,
}

fn format_report_json(report: &RunReport) -> String {
    let json = JsonReport {
        results: report
            .results
            .iter()
            .map(|r| JsonResult {
                question: &r.question,
                label: r.label(),
                description: &r.description,
                sql: &r.sql,
                inputs: r
                    .inputs
                    .iter()
                    .map(|(name, value)| JsonInput { name, value })
                    .collect(),
                error: r.error.as_deref(),
                columns: r.table.column_names(),
                rows: r
                    .table
                    .rows
                    .iter()
                    .map(|row| row.iter().map(|v| v.to_json()).collect())
                    .collect(),
                execution_time_ms: r.table.execution_time.as_millis() as u64,
            })
            .collect(),
        cancelled: report.cancelled.as_ref().map(|c| JsonCancelled {
            question: &c.question,
            input: &c.placeholder,
        }),
    };

    serde_json::to_string_pretty(&json)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
}

/// Lists questions with their descriptions, under group headings when
/// groups exist.
pub fn format_question_list(store: &QuestionStore) -> String {
    if store.is_empty() {
        return "No questions defined.".to_string();
    }

    let line = |name: &str, indent: &str| -> String {
        match store.get(name) {
            Some(q) if !q.description.is_empty() => {
                format!("{indent}{name}: {}", q.description)
            }
            Some(_) => format!("{indent}{name}"),
            None => format!("{indent}{name} (missing)"),
        }
    };

    if !store.has_groups() {
        return store
            .names()
            .into_iter()
            .map(|name| line(name, ""))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut lines = Vec::new();
    for (group, members) in store.groups().iter() {
        lines.push(format!("{group}:"));
        lines.extend(members.iter().map(|name| line(name.as_str(), "  ")));
    }

    let ungrouped = store.ungrouped();
    if !ungrouped.is_empty() {
        lines.push("Ungrouped:".to_string());
        lines.extend(ungrouped.into_iter().map(|name| line(name, "  ")));
    }

    lines.join("\n")
}
