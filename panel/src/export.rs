//! CSV and JSON export/import
//!
//! Exports are written as files into the configured download directory.
//! CSV follows the usual quoting rule: a cell containing a comma, a quote or
//! a newline is wrapped in quotes with inner quotes doubled, objects and
//! arrays are JSON-encoded and always quoted, nulls become empty cells.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::ExportError;

/// One CSV row keyed by header, in header order
pub type CsvRow = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct Exporter {
    download_dir: PathBuf,
}

impl Exporter {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.download_dir)
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Write `rows` as CSV. Columns default to the first row's keys.
    pub async fn export_csv<T: Serialize>(
        &self,
        rows: &[T],
        filename: &str,
        columns: Option<&[&str]>,
    ) -> Result<PathBuf, ExportError> {
        let rows = to_values(rows)?;
        let content = to_csv(&rows, columns)?;
        self.write(&with_extension(filename, "csv"), &content).await
    }

    /// Write `data` as pretty-printed JSON
    pub async fn export_json<T: Serialize>(
        &self,
        data: &T,
        filename: &str,
    ) -> Result<PathBuf, ExportError> {
        let content = to_json(data)?;
        self.write(&with_extension(filename, "json"), &content).await
    }

    async fn write(&self, filename: &str, content: &str) -> Result<PathBuf, ExportError> {
        let path = self.download_dir.join(filename);
        fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| io_error(&self.download_dir, e))?;
        fs::write(&path, content)
            .await
            .map_err(|e| io_error(&path, e))?;

        info!("Exported {} bytes to {}", content.len(), path.display());
        Ok(path)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn with_extension(filename: &str, extension: &str) -> String {
    let suffix = format!(".{}", extension);
    if filename.ends_with(&suffix) {
        filename.to_string()
    } else {
        format!("{}{}", filename, suffix)
    }
}

fn to_values<T: Serialize>(rows: &[T]) -> Result<Vec<Value>, ExportError> {
    rows.iter()
        .map(|row| {
            serde_json::to_value(row).map_err(|e| ExportError::Parse {
                reason: e.to_string(),
            })
        })
        .collect()
}

pub fn to_csv(rows: &[Value], columns: Option<&[&str]>) -> Result<String, ExportError> {
    let first = match rows.first() {
        Some(first) => first,
        None => {
            warn!("No data to export");
            return Err(ExportError::Empty);
        }
    };

    let headers: Vec<String> = match columns {
        Some(columns) => columns.iter().map(|c| c.to_string()).collect(),
        None => first
            .as_object()
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default(),
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|header| csv_cell(row.get(header).unwrap_or(&Value::Null)))
            .collect();
        lines.push(cells.join(","));
    }
    Ok(lines.join("\n"))
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Object(_) | Value::Array(_) => quote(&value.to_string()),
        Value::String(text) => {
            if text.contains([',', '"', '\n']) {
                quote(text)
            } else {
                text.clone()
            }
        }
        other => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Two-space indented JSON; null and empty arrays count as nothing to export
pub fn to_json<T: Serialize>(data: &T) -> Result<String, ExportError> {
    let value = serde_json::to_value(data).map_err(|e| ExportError::Parse {
        reason: e.to_string(),
    })?;
    let empty = match &value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        warn!("No data to export");
        return Err(ExportError::Empty);
    }

    serde_json::to_string_pretty(&value).map_err(|e| ExportError::Parse {
        reason: e.to_string(),
    })
}

/// Parse CSV text produced by `to_csv` (or any RFC 4180-style file).
///
/// Every cell comes back as a string; short rows are padded with empty cells.
pub fn parse_csv(text: &str) -> Result<Vec<CsvRow>, ExportError> {
    let mut records = split_records(text)?.into_iter();
    let headers: Vec<String> = match records.next() {
        Some(header) => header.into_iter().map(|h| h.trim().to_string()).collect(),
        None => {
            return Err(ExportError::Parse {
                reason: "empty file".to_string(),
            })
        }
    };

    Ok(records
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = cells.get(i).cloned().unwrap_or_default();
                    (header.clone(), Value::String(cell))
                })
                .collect()
        })
        .collect())
}

fn split_records(text: &str) -> Result<Vec<Vec<String>>, ExportError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                _ => cell.push(ch),
            }
            continue;
        }

        match ch {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut cell));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => cell.push(ch),
        }
    }

    if in_quotes {
        return Err(ExportError::Parse {
            reason: "unterminated quoted cell".to_string(),
        });
    }
    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        push_record(&mut records, record);
    }
    Ok(records)
}

// blank lines carry no data
fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}

pub async fn import_csv(path: impl AsRef<Path>) -> Result<Vec<CsvRow>, ExportError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| io_error(path, e))?;
    parse_csv(&text)
}

pub async fn import_json(path: impl AsRef<Path>) -> Result<Value, ExportError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| io_error(path, e))?;
    serde_json::from_str(&text).map_err(|_| ExportError::Parse {
        reason: "Invalid JSON file".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_csv_quoting_rules() {
        let rows = vec![json!({
            "name": "edge, primary",
            "note": "say \"hi\"",
            "port": 8080,
            "owner": null,
            "capabilities": {"http": true}
        })];
        let csv = to_csv(&rows, None).unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines[0], "name,note,port,owner,capabilities");
        assert_eq!(
            lines[1],
            r#""edge, primary","say ""hi""",8080,,"{""http"":true}""#
        );
    }

    #[test]
    fn test_explicit_columns_and_missing_keys() {
        let rows = vec![json!({"a": 1, "b": 2}), json!({"a": 3})];
        let csv = to_csv(&rows, Some(&["b", "a"])).unwrap();
        assert_eq!(csv, "b,a\n2,1\n,3");
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(to_csv(&[], None), Err(ExportError::Empty)));
        assert!(matches!(to_json(&Vec::<u8>::new()), Err(ExportError::Empty)));
        assert!(matches!(to_json(&Value::Null), Err(ExportError::Empty)));
    }

    #[test]
    fn test_json_is_two_space_indented() {
        let json = to_json(&json!({"a": [1]})).unwrap();
        assert_eq!(json, "{\n  \"a\": [\n    1\n  ]\n}");
    }

    #[test]
    fn test_parse_csv_reads_exported_content() {
        let rows = vec![
            json!({"description": "line one\nline two", "user": "admin"}),
            json!({"description": "Created \"edge\", ok", "user": "ops"}),
        ];
        let parsed = parse_csv(&to_csv(&rows, None).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["description"], "line one\nline two");
        assert_eq!(parsed[1]["description"], "Created \"edge\", ok");
        assert_eq!(parsed[1]["user"], "ops");
    }

    #[test]
    fn test_parse_csv_errors() {
        assert!(parse_csv("").is_err());
        assert!(parse_csv("a,b\n\"open,1").is_err());
        let rows = parse_csv("a,b\r\n1\r\n\r\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["b"], "");
    }

    #[tokio::test]
    async fn test_export_writes_into_download_dir() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path().join("downloads"));

        let path = exporter
            .export_csv(&[json!({"id": "1"})], "audit-logs", None)
            .await
            .unwrap();
        assert!(path.ends_with("downloads/audit-logs.csv"));
        assert_eq!(import_csv(&path).await.unwrap()[0]["id"], "1");

        let path = exporter
            .export_json(&json!({"stats": {}}), "analytics-full.json")
            .await
            .unwrap();
        assert!(path.ends_with("analytics-full.json"));
        assert_eq!(import_json(&path).await.unwrap()["stats"], json!({}));
    }

    #[tokio::test]
    async fn test_import_json_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, "{nope").await.unwrap();
        assert!(matches!(
            import_json(&path).await,
            Err(ExportError::Parse { .. })
        ));
    }
}
