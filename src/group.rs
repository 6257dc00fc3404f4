//! Group-by and aggregation. Groups are keyed by a structured composite
//! key (one [`ComparableValue`] per group column) rather than a joined
//! string, so column values containing any would-be separator cannot
//! collide. Output rows come back in key order, which is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::data::{ComparableValue, Dataset, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Count => "count",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for AggregateFunction {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregateFunction::Sum),
            "avg" | "average" | "mean" => Ok(AggregateFunction::Avg),
            "count" => Ok(AggregateFunction::Count),
            "min" => Ok(AggregateFunction::Min),
            "max" => Ok(AggregateFunction::Max),
            other => Err(anyhow!("Unknown aggregate function '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    pub column: String,
    pub function: AggregateFunction,
}

impl Aggregation {
    /// Parses the CLI form `column:function`, e.g. `amount:sum`.
    pub fn parse(spec: &str) -> Result<Self> {
        let (column, function) = spec
            .split_once(':')
            .ok_or_else(|| anyhow!("Aggregation '{spec}' expects 'column:function'"))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(anyhow!("Aggregation '{spec}' is missing a column"));
        }
        Ok(Aggregation {
            column: column.to_string(),
            function: function.parse()?,
        })
    }
}

pub fn parse_aggregations(specs: &[String]) -> Result<Vec<Aggregation>> {
    specs.iter().map(|spec| Aggregation::parse(spec)).collect()
}

/// One output row per distinct combination of group-column values: the
/// group values first, then one `{column}_{function}` cell per aggregation.
///
/// Numeric coercion drops non-numeric cells from every aggregate. `count`
/// therefore counts numeric-coercible values, not rows. `min`/`max` over
/// an all-excluded column emit a null cell.
pub fn group_and_aggregate(
    dataset: &Dataset,
    group_columns: &[String],
    aggregations: &[Aggregation],
) -> Result<Dataset> {
    let key_indexes = group_columns
        .iter()
        .map(|name| {
            dataset
                .column_index(name)
                .ok_or_else(|| anyhow!("Column '{name}' not found for grouping"))
        })
        .collect::<Result<Vec<_>>>()?;
    let value_indexes = aggregations
        .iter()
        .map(|agg| {
            dataset
                .column_index(&agg.column)
                .ok_or_else(|| anyhow!("Column '{}' not found for aggregation", agg.column))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<Vec<ComparableValue>, Vec<&Vec<Option<Value>>>> = BTreeMap::new();
    for row in &dataset.rows {
        let key = key_indexes
            .iter()
            .map(|idx| ComparableValue(row.get(*idx).cloned().flatten()))
            .collect::<Vec<_>>();
        groups.entry(key).or_default().push(row);
    }

    let mut columns = group_columns.to_vec();
    for agg in aggregations {
        columns.push(format!("{}_{}", agg.column, agg.function.name()));
    }

    let mut rows = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let mut row = key.into_iter().map(|cv| cv.0).collect::<Vec<_>>();
        for (agg, idx) in aggregations.iter().zip(&value_indexes) {
            let numbers = members
                .iter()
                .filter_map(|member| {
                    member
                        .get(*idx)
                        .and_then(|cell| cell.as_ref())
                        .and_then(Value::as_number)
                })
                .collect::<Vec<_>>();
            row.push(apply_function(agg.function, &numbers));
        }
        rows.push(row);
    }
    Ok(Dataset::new(columns, rows))
}

fn apply_function(function: AggregateFunction, numbers: &[f64]) -> Option<Value> {
    match function {
        AggregateFunction::Sum => Some(Value::Number(numbers.iter().sum())),
        AggregateFunction::Avg => {
            if numbers.is_empty() {
                Some(Value::Number(0.0))
            } else {
                Some(Value::Number(
                    numbers.iter().sum::<f64>() / numbers.len() as f64,
                ))
            }
        }
        AggregateFunction::Count => Some(Value::Number(numbers.len() as f64)),
        AggregateFunction::Min => numbers.iter().copied().reduce(f64::min).map(Value::Number),
        AggregateFunction::Max => numbers.iter().copied().reduce(f64::max).map(Value::Number),
    }
}
