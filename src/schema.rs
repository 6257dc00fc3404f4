//! Column type inference and per-column metadata.
//!
//! [`infer_column_type()`] classifies a column from its non-empty values
//! only; [`analyze()`] builds the [`ColumnInfo`] sequence consumed by chart
//! configuration and by the insight generator. Schema is derived state:
//! it is recomputed whenever the dataset changes and never persisted.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{ComparableValue, Dataset, Value, is_iso_date_literal};

/// Distinct values kept per column. A display and payload-size bound,
/// not a statistical sample.
pub const DISTINCT_VALUE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Date,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Date => "date",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    pub distinct_values: Vec<Value>,
}

/// Classifies a value sequence. Empty cells are excluded up front; a column
/// with nothing left defaults to categorical. The date check runs before the
/// numeric check so `YYYY-MM-DD` literals are never read as arithmetic.
pub fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    let mut seen_any = false;
    let mut all_dates = true;
    let mut all_numeric = true;

    for value in values.into_iter().flatten() {
        seen_any = true;
        if all_dates && !is_iso_date_literal(&value.as_display()) {
            all_dates = false;
        }
        if all_numeric && value.as_number().is_none() {
            all_numeric = false;
        }
        if !all_dates && !all_numeric {
            return ColumnType::Categorical;
        }
    }

    if !seen_any {
        return ColumnType::Categorical;
    }
    if all_dates {
        ColumnType::Date
    } else if all_numeric {
        ColumnType::Numeric
    } else {
        ColumnType::Categorical
    }
}

/// Builds per-column metadata for every column of the dataset. An empty
/// dataset yields an empty sequence.
pub fn analyze(dataset: &Dataset) -> Vec<ColumnInfo> {
    if dataset.rows.is_empty() {
        return Vec::new();
    }
    dataset
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let column_type = infer_column_type(dataset.column_values(idx));
            let mut distinct = BTreeSet::new();
            for value in dataset.column_values(idx).flatten() {
                distinct.insert(ComparableValue(Some(value.clone())));
                if distinct.len() >= DISTINCT_VALUE_LIMIT {
                    break;
                }
            }
            ColumnInfo {
                name: name.clone(),
                column_type,
                distinct_values: distinct.into_iter().filter_map(|cv| cv.0).collect(),
            }
        })
        .collect()
}
