//! Rendering of dashboard results for the terminal.
//!
//! Every renderer returns a string; printing is left to the caller. Text
//! output is meant for people, JSON output for scripts.

use std::fmt::Write as _;

use serde::Serialize;

use crate::dashboard::{FormOptions, Insight};
use crate::db::QueryResult;
use crate::error::{Result, SecureCheckError};
use crate::predict::PredictionSummary;
use crate::query::CatalogEntry;
use crate::stops::FormColumn;

/// Shown in place of a table with no rows.
pub const NO_DATA_MESSAGE: &str = "No data found for this query.";

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain text tables.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Renders a result table. A table with no rows renders as [`NO_DATA_MESSAGE`].
pub fn render_result(result: &QueryResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text if result.is_empty() => Ok(NO_DATA_MESSAGE.to_string()),
        OutputFormat::Text => Ok(render_table(result)),
        OutputFormat::Json => to_json(&result.to_records()),
    }
}

/// Renders a catalog question followed by its table.
pub fn render_insight(insight: &Insight, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "{}\n\n{}",
            insight.entry.question,
            render_result(&insight.result, format)?
        )),
        OutputFormat::Json => to_json(&serde_json::json!({
            "question": insight.entry.question,
            "category": insight.entry.category,
            "rows": insight.result.to_records(),
        })),
    }
}

/// Lists catalog questions with their 1-based positions, grouped by category.
pub fn render_questions(entries: &[CatalogEntry], format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        let listed: Vec<_> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                serde_json::json!({
                    "position": i + 1,
                    "category": entry.category.to_string(),
                    "question": entry.question,
                })
            })
            .collect();
        return to_json(&listed);
    }

    let mut out = String::new();
    let mut current = None;
    for (i, entry) in entries.iter().enumerate() {
        if current != Some(entry.category) {
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", entry.category);
            current = Some(entry.category);
        }
        let _ = writeln!(out, "  {:>2}. {}", i + 1, entry.question);
    }
    Ok(out.trim_end().to_string())
}

/// Renders the four prediction form option lists.
pub fn render_options(options: &FormOptions, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(options);
    }

    let sections: Vec<String> = FormColumn::ALL
        .into_iter()
        .map(|column| {
            let values = options.get(column);
            let listed = if values.is_empty() {
                "  (none)".to_string()
            } else {
                values
                    .iter()
                    .map(|v| if v.is_empty() { "  (blank)".to_string() } else { format!("  {v}") })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            format!("{column}:\n{listed}")
        })
        .collect();
    Ok(sections.join("\n\n"))
}

/// Renders a prediction summary.
pub fn render_summary(summary: &PredictionSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(summary.to_string()),
        OutputFormat::Json => to_json(summary),
    }
}

/// Formats a result as an aligned text table with a header row.
pub fn render_table(result: &QueryResult) -> String {
    let headers: Vec<String> = result.columns.iter().map(|c| c.name.clone()).collect();
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(&headers));
    let _ = writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &cells {
        let _ = writeln!(out, "{}", line(row));
    }
    let _ = write!(
        out,
        "({} row{})",
        result.row_count,
        if result.row_count == 1 { "" } else { "s" }
    );
    out
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| SecureCheckError::internal(format!("Failed to encode JSON output: {e}")))
}
