use std::fmt;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single scalar cell. Missing, null, and empty-string cells are
/// represented as `None` in an `Option<Value>` slot, so every `Value`
/// carries observable content. `Number` never holds NaN or an infinity;
/// ingestion and coercion reject non-finite inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Eq for Value {}

impl Value {
    /// Coerces a raw literal into the most specific scalar it matches.
    /// Empty input yields `None`; `true`/`false` become booleans; finite
    /// numeric tokens become numbers; everything else stays text.
    /// `Infinity`/`NaN` tokens deliberately fail the numeric check.
    pub fn from_literal(raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Some(Value::Bool(true));
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Some(Value::Bool(false));
        }
        if let Some(parsed) = parse_finite_number(trimmed) {
            return Some(Value::Number(parsed));
        }
        Some(Value::Text(raw.to_string()))
    }

    /// Numeric coercion used by statistics, comparisons, and aggregation.
    /// Booleans are not numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.is_finite().then_some(*n),
            Value::Text(s) => parse_finite_number(s.trim()),
            Value::Bool(_) => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Number(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Text(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn variant_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::Text(_) => 2,
        }
    }
}

/// Parses a finite number from a trimmed token. `f64::from_str` accepts
/// `inf`/`NaN` spellings, which must not classify as numeric here.
fn parse_finite_number(trimmed: &str) -> Option<f64> {
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            // Heterogeneous columns are legal input; rank variants instead
            // of panicking.
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// `Option<Value>` with a total order: missing cells sort before present
/// ones. Backs distinct-value sets and structured group keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparableValue(pub Option<Value>);

impl Ord for ComparableValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (&self.0, &other.0) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(left), Some(right)) => left.cmp(right),
        }
    }
}

impl PartialOrd for ComparableValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// An immutable snapshot of imported rows over a fixed column list.
///
/// The column list is taken from the first ingested record; rows beyond the
/// first with extra keys are not reconciled. Every transformation (filter,
/// group, derive) produces a new `Dataset` and leaves the source untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<Value>>>) -> Self {
        Dataset { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)?.as_ref()
    }

    /// Iterates one column top to bottom; absent slots yield `None`.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = Option<&Value>> {
        self.rows
            .iter()
            .map(move |row| row.get(column).and_then(|cell| cell.as_ref()))
    }

    /// New dataset with the same columns and no rows.
    pub fn empty_like(&self) -> Self {
        Dataset {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }
}

/// Strict `YYYY-MM-DD` literal check: exactly four digits, dash, two digits,
/// dash, two digits. Partial matches and other date formats do not count.
pub fn is_iso_date_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    if !is_iso_date_literal(value) {
        return Err(anyhow!("'{value}' is not a YYYY-MM-DD date"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| anyhow!("Failed to parse '{value}' as date"))
}

pub fn normalize_column_name(name: &str) -> String {
    let mut canon = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => c,
            _ => '_',
        })
        .collect::<String>()
        .to_ascii_lowercase();
    if canon.is_empty() {
        return "column".to_string();
    }
    if canon.as_bytes()[0].is_ascii_digit() {
        canon.insert(0, '_');
    }
    canon
}

pub fn value_to_evalexpr(value: &Value) -> evalexpr::Value {
    match value {
        Value::Number(f) => evalexpr::Value::Float(*f),
        Value::Text(s) => evalexpr::Value::String(s.clone()),
        Value::Bool(b) => evalexpr::Value::Boolean(*b),
    }
}
