//! Statistical primitives: Pearson correlation and z-score outlier
//! detection. Pure functions over dataset snapshots; degenerate inputs
//! (too few pairs, zero variance) return defined neutral values instead
//! of failing.

use chrono::{Datelike, NaiveDate};

use crate::data::{Dataset, Value};

pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 3.0;

/// Pearson product-moment correlation between two columns, in [-1, 1].
///
/// Rows where either side fails numeric coercion are dropped pairwise.
/// Fewer than two valid pairs, an unknown column, or a zero denominator
/// all yield `0.0`.
pub fn correlation(dataset: &Dataset, column_a: &str, column_b: &str) -> f64 {
    let (Some(a), Some(b)) = (
        dataset.column_index(column_a),
        dataset.column_index(column_b),
    ) else {
        return 0.0;
    };
    let pairs = dataset
        .rows
        .iter()
        .filter_map(|row| {
            let x = row.get(a)?.as_ref()?.as_number()?;
            let y = row.get(b)?.as_ref()?.as_number()?;
            Some((x, y))
        })
        .collect::<Vec<_>>();
    pearson_r(&pairs)
}

/// Sum-based Pearson formula over pre-extracted pairs.
pub fn pearson_r(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    for (x, y) in pairs {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }
    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator_sq = (n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y);
    if denominator_sq <= 0.0 {
        return 0.0;
    }
    (numerator / denominator_sq.sqrt()).clamp(-1.0, 1.0)
}

/// Rows whose column value sits more than `threshold` population standard
/// deviations from the column mean. Non-coercible rows are excluded from
/// both the statistics and the result; a constant or empty column yields
/// no outliers. Output preserves row order and carries full rows.
pub fn find_outliers(dataset: &Dataset, column: &str, threshold: f64) -> Dataset {
    let Some(idx) = dataset.column_index(column) else {
        return dataset.empty_like();
    };
    let values = dataset
        .column_values(idx)
        .flatten()
        .filter_map(Value::as_number)
        .collect::<Vec<_>>();
    if values.is_empty() {
        return dataset.empty_like();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return dataset.empty_like();
    }

    let rows = dataset
        .rows
        .iter()
        .filter(|row| {
            row.get(idx)
                .and_then(|cell| cell.as_ref())
                .and_then(Value::as_number)
                .is_some_and(|v| ((v - mean) / std_dev).abs() > threshold)
        })
        .cloned()
        .collect();
    Dataset::new(dataset.columns.clone(), rows)
}

/// Maps a date onto a linear axis (days from the common era) so date
/// columns can feed the correlation machinery.
pub fn date_metric(date: &NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}
