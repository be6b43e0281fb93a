// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering of response envelopes, one style per response kind.

use colored::Colorize;

use sequin_core::{ResponseData, ResponseEnvelope, ResponseKind, Row};

pub fn render_envelope(envelope: &ResponseEnvelope) -> String {
    if !envelope.success {
        return format!("{} {}", "!".red().bold(), envelope.answer);
    }
    match (&envelope.kind, &envelope.data) {
        (ResponseKind::Table, ResponseData::Rows(rows)) => {
            format!("{}\n\n{}", envelope.answer, render_table(rows))
        }
        (ResponseKind::Sql, ResponseData::Text(sql)) => sql.yellow().to_string(),
        (ResponseKind::Download, ResponseData::Text(reference)) => {
            format!("{} {}", "saved:".green().bold(), reference)
        }
        _ => envelope.answer.clone(),
    }
}

/// Fixed-width text table over the sorted union of row keys.
fn render_table(rows: &[Row]) -> String {
    let mut columns: Vec<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();
    columns.sort_unstable();
    columns.dedup();

    let cell = |row: &Row, col: &str| -> String {
        match row.get(col) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    };

    let mut widths: Vec<usize> = columns.iter().map(|col| col.len()).collect();
    for row in rows {
        for (i, col) in columns.iter().enumerate() {
            widths[i] = widths[i].max(cell(row, col).len());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(widths.iter().copied())
        .map(|(col, width)| format!("{col:<width$}"))
        .collect();
    out.push_str(&header.join("  ").bold().to_string());
    out.push('\n');
    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .zip(widths.iter().copied())
            .map(|(col, width)| format!("{:<width$}", cell(row, col)))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out.pop();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        let mut row = Row::new();
        for (key, value) in pairs {
            row.insert(key.to_string(), value.clone());
        }
        row
    }

    #[test]
    fn table_aligns_columns() {
        colored::control::set_override(false);
        let rows = vec![
            row(&[("app_name", json!("Weather Now")), ("installs", json!(1200))]),
            row(&[("app_name", json!("Maps")), ("installs", json!(90))]),
        ];
        let table = render_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "app_name     installs");
        assert_eq!(lines[1], "Weather Now  1200");
        assert_eq!(lines[2], "Maps         90");
    }

    #[test]
    fn failure_renders_answer_only() {
        colored::control::set_override(false);
        let mut envelope = ResponseEnvelope::new("q", "s");
        envelope.answer = "Sorry.".into();
        assert_eq!(render_envelope(&envelope), "! Sorry.");
    }

    #[test]
    fn sql_renders_query_text() {
        colored::control::set_override(false);
        let mut envelope = ResponseEnvelope::new("q", "s");
        envelope.success = true;
        envelope.kind = ResponseKind::Sql;
        envelope.data = ResponseData::Text("SELECT 1".into());
        assert_eq!(render_envelope(&envelope), "SELECT 1");
    }
}
