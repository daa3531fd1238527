//! Client-side export of fetched data: pretty JSON of a whole payload, or a
//! CSV of selected fields. Nothing here talks to the server.

use anyhow::{Result, anyhow};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

pub fn to_json<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(payload)?;
    out.push('\n');
    Ok(out)
}

/// Flattens `records` into CSV with one column per entry in `columns`.
///
/// A column may name a nested field with dots (`department.name`). Missing
/// fields and nulls become empty cells; arrays are joined with `; `.
pub fn to_csv<T: Serialize>(records: &[T], columns: &[&str]) -> Result<String> {
    if columns.is_empty() {
        return Err(anyhow!("csv export needs at least one column"));
    }

    let mut lines: Vec<String> = Vec::with_capacity(records.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| escape_cell(c))
            .collect::<Vec<_>>()
            .join(","),
    );

    for record in records {
        let value = serde_json::to_value(record)?;
        let row: Vec<String> = columns
            .iter()
            .map(|column| escape_cell(&cell_text(lookup(&value, column))))
            .collect();
        lines.push(row.join(","));
    }

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    Ok(out)
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| cell_text(Some(item)))
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
    }
}

fn escape_cell(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// `<stem>-<YYYY-MM-DD>.<ext>`
pub fn default_file_name(stem: &str, format: ExportFormat, today: OffsetDateTime) -> Result<String> {
    let date = today.format(format_description!("[year]-[month]-[day]"))?;
    Ok(format!("{stem}-{date}.{}", format.extension()))
}

/// Writes `contents` to `out` if given, else to a dated file in `dir`.
/// Returns the path written.
pub fn write_export(
    contents: &str,
    stem: &str,
    format: ExportFormat,
    out: Option<&Path>,
    dir: &Path,
) -> Result<PathBuf> {
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => dir.join(default_file_name(stem, format, OffsetDateTime::now_utc())?),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(path)
}
