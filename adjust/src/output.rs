//! Output formatting: plain text (human-readable) and JSON.

use clap::ValueEnum;
use serde_json::Value;
use std::fmt::Write;

/// Widest a plain table column may get before values are truncated.
const MAX_COLUMN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables and key-value
    #[default]
    Plain,
    /// JSON (pretty-printed)
    Json,
}

/// Print a value to stdout in the chosen format.
pub fn print(value: &Value, format: OutputFormat) -> Result<(), String> {
    match format {
        OutputFormat::Plain => print!("{}", format_plain(value)),
        OutputFormat::Json => println!("{}", format_json(value).map_err(|e| e.to_string())?),
    }
    Ok(())
}

/// Format value as plain text (tables for arrays of objects, key-value for objects).
pub fn format_plain(value: &Value) -> String {
    let mut out = String::new();
    write_plain(value, &mut out, 0);
    out
}

fn write_plain(v: &Value, out: &mut String, indent: usize) {
    let pad = "  ".repeat(indent);
    match v {
        Value::Array(arr) if arr.is_empty() => {
            let _ = writeln!(out, "{}<empty>", pad);
        }
        Value::Array(arr) if arr.iter().all(Value::is_object) => write_table(arr, out, &pad),
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                if item.is_object() || item.is_array() {
                    let _ = writeln!(out, "{}[{}]", pad, i + 1);
                    write_plain(item, out, indent + 1);
                } else {
                    let _ = writeln!(out, "{}{}", pad, cell(item));
                }
            }
        }
        Value::Object(map) => {
            for (k, val) in map {
                if val.is_object() || val.is_array() {
                    let _ = writeln!(out, "{}{}:", pad, k);
                    write_plain(val, out, indent + 1);
                } else {
                    let _ = writeln!(out, "{}{}: {}", pad, k, cell(val));
                }
            }
        }
        scalar => {
            let _ = writeln!(out, "{}{}", pad, cell(scalar));
        }
    }
}

/// Table with one column per key seen in any row, in first-seen order.
fn write_table(rows: &[Value], out: &mut String, pad: &str) {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows.iter().filter_map(Value::as_object) {
        for k in row.keys() {
            if !columns.contains(&k.as_str()) {
                columns.push(k);
            }
        }
    }
    let cells: Vec<Vec<String>> = rows
        .iter()
        .filter_map(Value::as_object)
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(*c).map(cell).unwrap_or_else(|| "-".to_string()))
                .map(|s| truncate(&s, MAX_COLUMN))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count().min(MAX_COLUMN)))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", truncate(c, MAX_COLUMN), w = *w))
        .collect();
    let header = header.join("  ");
    let _ = writeln!(out, "{}{}", pad, header.trim_end());
    let _ = writeln!(out, "{}{}", pad, "-".repeat(header.trim_end().chars().count()));
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(s, w)| format!("{:<w$}", s, w = *w))
            .collect();
        let _ = writeln!(out, "{}{}", pad, line.join("  ").trim_end());
    }
}

fn cell(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max {
        s
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// Format value as JSON (pretty).
pub fn format_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
