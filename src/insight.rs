//! Ranked, human-readable findings over a dataset snapshot.
//!
//! Four independent passes (correlation, outliers, dominant categories,
//! time trends) are concatenated, sorted by descending confidence, and
//! capped at [`MAX_INSIGHTS`]. Each call analyzes the snapshot fresh;
//! nothing is cached or mutated.

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Dataset, parse_iso_date},
    schema::{self, ColumnInfo, ColumnType},
    stats,
};

pub const MAX_INSIGHTS: usize = 5;

const CORRELATION_FLOOR: f64 = 0.5;
const TREND_FLOOR: f64 = 0.6;
const OUTLIER_CONFIDENCE: f64 = 0.8;
const CATEGORICAL_CONFIDENCE: f64 = 0.7;
const DOMINANT_SHARE: f64 = 0.4;
// Outlier findings are suppressed once the flagged rows stop being rare;
// a bimodal column is not an outlier story.
const OUTLIER_SHARE_CEILING: f64 = 0.1;
const CATEGORICAL_DISTINCT_MAX: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Correlation,
    Outlier,
    Trend,
    Categorical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub kind: InsightKind,
}

pub fn generate_insights(dataset: &Dataset) -> Vec<Insight> {
    let columns = schema::analyze(dataset);
    let mut insights = Vec::new();
    insights.extend(correlation_pass(dataset, &columns));
    insights.extend(outlier_pass(dataset, &columns));
    insights.extend(categorical_pass(dataset, &columns));
    insights.extend(trend_pass(dataset, &columns));
    insights.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    insights.truncate(MAX_INSIGHTS);
    debug!("Generated {} insight(s)", insights.len());
    insights
}

fn column_names(columns: &[ColumnInfo], wanted: ColumnType) -> Vec<&str> {
    columns
        .iter()
        .filter(|info| info.column_type == wanted)
        .map(|info| info.name.as_str())
        .collect()
}

fn correlation_pass(dataset: &Dataset, columns: &[ColumnInfo]) -> Vec<Insight> {
    column_names(columns, ColumnType::Numeric)
        .into_iter()
        .tuple_combinations()
        .filter_map(|(a, b)| {
            let r = stats::correlation(dataset, a, b);
            if r.abs() <= CORRELATION_FLOOR {
                return None;
            }
            let direction = if r > 0.0 { "Positive" } else { "Negative" };
            Some(Insight {
                title: format!("{a} and {b} are correlated"),
                description: format!("{direction} correlation of {r:.2} between {a} and {b}"),
                confidence: r.abs(),
                kind: InsightKind::Correlation,
            })
        })
        .collect()
}

fn outlier_pass(dataset: &Dataset, columns: &[ColumnInfo]) -> Vec<Insight> {
    let total = dataset.row_count();
    column_names(columns, ColumnType::Numeric)
        .into_iter()
        .filter_map(|name| {
            let outliers =
                stats::find_outliers(dataset, name, stats::DEFAULT_OUTLIER_THRESHOLD);
            let count = outliers.row_count();
            if count == 0 || count as f64 >= total as f64 * OUTLIER_SHARE_CEILING {
                return None;
            }
            Some(Insight {
                title: format!("Outliers in {name}"),
                description: format!(
                    "{count} row(s) sit more than 3 standard deviations from the mean of {name}"
                ),
                confidence: OUTLIER_CONFIDENCE,
                kind: InsightKind::Outlier,
            })
        })
        .collect()
}

/// Frequencies are counted over the (possibly truncated) distinct-value
/// list from the schema, so values beyond the distinct cap are never
/// candidates for the mode. Inherited approximation, kept as-is.
fn categorical_pass(dataset: &Dataset, columns: &[ColumnInfo]) -> Vec<Insight> {
    let total = dataset.row_count();
    columns
        .iter()
        .filter(|info| info.column_type == ColumnType::Categorical)
        .filter(|info| {
            info.distinct_values.len() > 1 && info.distinct_values.len() < CATEGORICAL_DISTINCT_MAX
        })
        .filter_map(|info| {
            let idx = dataset.column_index(&info.name)?;
            let mode = info
                .distinct_values
                .iter()
                .map(|candidate| {
                    let count = dataset
                        .column_values(idx)
                        .filter(|cell| *cell == Some(candidate))
                        .count();
                    (candidate, count)
                })
                .max_by_key(|(_, count)| *count)?;
            let share = mode.1 as f64 / total as f64;
            if share <= DOMINANT_SHARE {
                return None;
            }
            Some(Insight {
                title: format!("Dominant value in {}", info.name),
                description: format!(
                    "'{}' accounts for {:.1}% of rows in {}",
                    mode.0.as_display(),
                    share * 100.0,
                    info.name
                ),
                confidence: CATEGORICAL_CONFIDENCE,
                kind: InsightKind::Categorical,
            })
        })
        .collect()
}

/// Correlates each numeric column against the day-axis of each date column.
/// Discounted below a same-strength correlation finding so column-vs-column
/// relationships rank first.
fn trend_pass(dataset: &Dataset, columns: &[ColumnInfo]) -> Vec<Insight> {
    let date_columns = column_names(columns, ColumnType::Date);
    let numeric_columns = column_names(columns, ColumnType::Numeric);
    let mut insights = Vec::new();
    for date_column in &date_columns {
        let Some(date_idx) = dataset.column_index(date_column) else {
            continue;
        };
        for numeric_column in &numeric_columns {
            let Some(numeric_idx) = dataset.column_index(numeric_column) else {
                continue;
            };
            let pairs = dataset
                .rows
                .iter()
                .filter_map(|row| {
                    let date = row.get(date_idx)?.as_ref()?;
                    let date = parse_iso_date(&date.as_display()).ok()?;
                    let value = row.get(numeric_idx)?.as_ref()?.as_number()?;
                    Some((stats::date_metric(&date), value))
                })
                .collect::<Vec<_>>();
            let r = stats::pearson_r(&pairs);
            if r.abs() <= TREND_FLOOR {
                continue;
            }
            let direction = if r > 0.0 { "rises" } else { "falls" };
            insights.push(Insight {
                title: format!("{numeric_column} trend over {date_column}"),
                description: format!(
                    "{numeric_column} {direction} over time across {date_column} (r = {r:.2})"
                ),
                confidence: r.abs() * 0.9,
                kind: InsightKind::Trend,
            });
        }
    }
    insights
}
