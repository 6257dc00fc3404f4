//! Row filtering. Rules combine with logical AND; a disabled rule is
//! vacuously true. Per-value coercion failures never error: a comparison
//! against a non-numeric side is simply false.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    Greater,
    Less,
    Range,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    Span { min: f64, max: f64 },
    Scalar(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    pub column: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl FilterRule {
    pub fn new(column: &str, operator: FilterOperator, value: FilterValue) -> Self {
        FilterRule {
            column: column.to_string(),
            operator,
            value,
            enabled: true,
        }
    }
}

/// Keeps rows for which every enabled rule matches. An empty (or fully
/// disabled) rule list is the identity. A rule naming an unknown column
/// or pairing `Range` with a scalar is an input error, not a silent skip.
pub fn apply_filters(dataset: &Dataset, rules: &[FilterRule]) -> Result<Dataset> {
    let mut active = Vec::new();
    for rule in rules.iter().filter(|rule| rule.enabled) {
        let idx = dataset
            .column_index(&rule.column)
            .ok_or_else(|| anyhow!("Column '{}' not found for filter", rule.column))?;
        match (rule.operator, &rule.value) {
            (FilterOperator::Range, FilterValue::Scalar(_)) => {
                return Err(anyhow!(
                    "Range filter on '{}' requires a min/max pair",
                    rule.column
                ));
            }
            (op, FilterValue::Span { .. }) if op != FilterOperator::Range => {
                return Err(anyhow!(
                    "Filter on '{}' pairs a min/max value with operator {op:?}",
                    rule.column
                ));
            }
            _ => {}
        }
        active.push((idx, rule));
    }

    let rows = dataset
        .rows
        .iter()
        .filter(|row| {
            active.iter().all(|(idx, rule)| {
                rule_matches(rule, row.get(*idx).and_then(|cell| cell.as_ref()))
            })
        })
        .cloned()
        .collect();
    Ok(Dataset::new(dataset.columns.clone(), rows))
}

fn rule_matches(rule: &FilterRule, cell: Option<&Value>) -> bool {
    match (&rule.operator, &rule.value) {
        // Strict equality, no cross-type coercion; a missing cell matches
        // nothing.
        (FilterOperator::Equals, FilterValue::Scalar(expected)) => cell == Some(expected),
        (FilterOperator::Contains, FilterValue::Scalar(expected)) => cell.is_some_and(|value| {
            value
                .as_display()
                .to_lowercase()
                .contains(&expected.as_display().to_lowercase())
        }),
        (FilterOperator::Greater, FilterValue::Scalar(expected)) => {
            match (cell.and_then(Value::as_number), expected.as_number()) {
                (Some(left), Some(right)) => left > right,
                _ => false,
            }
        }
        (FilterOperator::Less, FilterValue::Scalar(expected)) => {
            match (cell.and_then(Value::as_number), expected.as_number()) {
                (Some(left), Some(right)) => left < right,
                _ => false,
            }
        }
        (FilterOperator::Range, FilterValue::Span { min, max }) => cell
            .and_then(Value::as_number)
            .is_some_and(|v| *min <= v && v <= *max),
        // Shape mismatches are rejected in apply_filters.
        _ => false,
    }
}

/// Parses CLI filter expressions: `col=value`, `col>n`, `col<n`,
/// `col contains text`, `col in lo..hi`.
pub fn parse_filters(specs: &[String]) -> Result<Vec<FilterRule>> {
    specs.iter().map(|spec| parse_filter(spec)).collect()
}

fn parse_filter(spec: &str) -> Result<FilterRule> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }

    let lowered = trimmed.to_ascii_lowercase();
    if let Some(idx) = lowered.find(" contains ") {
        let column = trimmed[..idx].trim();
        let needle = unquote(trimmed[idx + " contains ".len()..].trim());
        return Ok(FilterRule::new(
            column,
            FilterOperator::Contains,
            FilterValue::Scalar(Value::Text(needle.to_string())),
        ));
    }
    if let Some(idx) = lowered.find(" in ") {
        let column = trimmed[..idx].trim();
        let span = trimmed[idx + " in ".len()..].trim();
        let (lo, hi) = span
            .split_once("..")
            .ok_or_else(|| anyhow!("Range filter '{trimmed}' expects 'column in lo..hi'"))?;
        let min = lo
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("Invalid range bound '{lo}' in '{trimmed}'"))?;
        let max = hi
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("Invalid range bound '{hi}' in '{trimmed}'"))?;
        return Ok(FilterRule::new(
            column,
            FilterOperator::Range,
            FilterValue::Span { min, max },
        ));
    }

    for (needle, op) in [
        (">", FilterOperator::Greater),
        ("<", FilterOperator::Less),
        ("=", FilterOperator::Equals),
    ] {
        if let Some(idx) = trimmed.find(needle) {
            let column = trimmed[..idx].trim();
            let raw = trimmed[idx + needle.len()..].trim();
            let value = parse_rule_value(raw)
                .ok_or_else(|| anyhow!("Filter '{trimmed}' is missing a comparison value"))?;
            return Ok(FilterRule::new(column, op, FilterValue::Scalar(value)));
        }
    }

    Err(anyhow!("Failed to parse filter expression '{trimmed}'"))
}

/// Quoted values stay text; bare tokens coerce like any other literal.
fn parse_rule_value(raw: &str) -> Option<Value> {
    if raw.len() >= 2 {
        let bytes = raw.as_bytes();
        if (bytes[0] == b'"' && bytes[raw.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[raw.len() - 1] == b'\'')
        {
            return Some(Value::Text(raw[1..raw.len() - 1].to_string()));
        }
    }
    Value::from_literal(raw)
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_filter_recognizes_each_operator() {
        let eq = parse_filter("status=shipped").unwrap();
        assert_eq!(eq.operator, FilterOperator::Equals);
        assert_eq!(
            eq.value,
            FilterValue::Scalar(Value::Text("shipped".to_string()))
        );

        let gt = parse_filter("amount > 100").unwrap();
        assert_eq!(gt.operator, FilterOperator::Greater);
        assert_eq!(gt.value, FilterValue::Scalar(Value::Number(100.0)));

        let contains = parse_filter("name contains smith").unwrap();
        assert_eq!(contains.operator, FilterOperator::Contains);

        let range = parse_filter("score in 10..20").unwrap();
        assert_eq!(
            range.value,
            FilterValue::Span {
                min: 10.0,
                max: 20.0
            }
        );
    }

    #[test]
    fn parse_filter_keeps_quoted_values_as_text() {
        let rule = parse_filter("code='42'").unwrap();
        assert_eq!(rule.value, FilterValue::Scalar(Value::Text("42".to_string())));
    }

    #[test]
    fn parse_filter_rejects_garbage() {
        assert!(parse_filter("").is_err());
        assert!(parse_filter("no operator here").is_err());
        assert!(parse_filter("score in 1..x").is_err());
    }
}
