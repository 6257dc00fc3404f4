//! Dataset ingestion from CSV and JSON sources.
//!
//! Parsing of the source text is delegated to the `csv` and `serde_json`
//! crates; this module only maps parsed records into a [`Dataset`] and
//! enforces the input contract: the entry point must be an array of flat
//! records, and it must not be empty. Shape violations surface as
//! [`ImportError`] so callers can distinguish an unsupported format from
//! malformed content from an empty dataset.

use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::data::{Dataset, Value};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("malformed content: {0}")]
    MalformedContent(String),
    #[error("dataset is empty")]
    EmptyDataset,
}

/// Builds a dataset from parsed JSON. The value must be a non-empty array
/// of objects; the column list comes from the first object's keys and later
/// objects are projected onto it (extra keys dropped, absent keys `None`).
pub fn from_json_value(value: &JsonValue) -> Result<Dataset, ImportError> {
    let records = match value {
        JsonValue::Array(records) => records,
        other => {
            return Err(ImportError::UnsupportedFormat(format!(
                "expected a JSON array of records, got {}",
                json_kind(other)
            )));
        }
    };
    if records.is_empty() {
        return Err(ImportError::EmptyDataset);
    }

    let first = records[0].as_object().ok_or_else(|| {
        ImportError::MalformedContent("record 1 is not an object".to_string())
    })?;
    let columns = first.keys().cloned().collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or_else(|| {
            ImportError::MalformedContent(format!("record {} is not an object", idx + 1))
        })?;
        let row = columns
            .iter()
            .map(|column| object.get(column).and_then(json_to_cell))
            .collect();
        rows.push(row);
    }
    debug!("Ingested {} JSON record(s), {} column(s)", rows.len(), columns.len());
    Ok(Dataset::new(columns, rows))
}

pub fn from_json_str(text: &str) -> Result<Dataset, ImportError> {
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|err| ImportError::MalformedContent(err.to_string()))?;
    from_json_value(&value)
}

/// Reads a header row plus data rows from a CSV reader. Cell typing is by
/// literal coercion; the CSV library owns quoting and record splitting.
pub fn from_csv_reader<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Dataset, ImportError> {
    let columns = reader
        .headers()
        .map_err(|err| ImportError::MalformedContent(err.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| ImportError::MalformedContent(err.to_string()))?;
        let row = (0..columns.len())
            .map(|idx| record.get(idx).and_then(Value::from_literal))
            .collect();
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(ImportError::EmptyDataset);
    }
    debug!("Ingested {} CSV row(s), {} column(s)", rows.len(), columns.len());
    Ok(Dataset::new(columns, rows))
}

pub fn from_csv_str(text: &str) -> Result<Dataset, ImportError> {
    // Flexible: short rows pad with missing cells, long rows are truncated
    // to the header width.
    from_csv_reader(
        csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes()),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

/// CLI entry: picks the format from the extension unless overridden.
pub fn load_path(path: &Path, format: Option<SourceFormat>) -> Result<Dataset> {
    let format = match format {
        Some(format) => format,
        None => match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SourceFormat::Csv,
            other => {
                return Err(ImportError::UnsupportedFormat(format!(
                    "cannot tell CSV from JSON for extension {other:?}; pass --format"
                ))
                .into());
            }
        },
    };
    let text = fs::read_to_string(path).with_context(|| format!("Reading {path:?}"))?;
    let dataset = match format {
        SourceFormat::Csv => from_csv_str(&text)?,
        SourceFormat::Json => from_json_str(&text)?,
    };
    Ok(dataset)
}

fn json_to_cell(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Value::Bool(*b)),
        JsonValue::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(Value::Number),
        JsonValue::String(s) => {
            if s.is_empty() {
                None
            } else {
                Some(Value::Text(s.clone()))
            }
        }
        // Records are expected to be flat; a nested value is kept as its
        // JSON text rather than aborting the whole import.
        nested => Some(Value::Text(nested.to_string())),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
