//! Computed fields: per-row derived columns defined by a user-supplied
//! arithmetic expression.
//!
//! Expressions run inside `evalexpr` with only the row's cells bound as
//! variables: there is no path from an expression to host code, the
//! filesystem, or anything beyond arithmetic, comparisons, and the
//! evaluator's builtin math. Each column is bound under its normalized
//! identifier and a positional `c{idx}` alias. Any evaluation failure
//! yields a null cell for that row's field only; the batch never aborts.

use anyhow::{Result, anyhow};
use evalexpr::{
    ContextWithMutableVariables, HashMapContext, Value as EvalValue, eval_with_context,
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Value, normalize_column_name, value_to_evalexpr};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedField {
    pub name: String,
    pub expression: String,
}

impl ComputedField {
    /// Parses the CLI form `name=expression`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.splitn(2, '=');
        let name = parts
            .next()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Computed field is missing a name"))?;
        let expression = parts
            .next()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Computed field '{name}' is missing an expression"))?;
        Ok(ComputedField {
            name: name.to_string(),
            expression: expression.to_string(),
        })
    }

    fn evaluate(&self, columns: &[String], row: &[Option<Value>]) -> Option<Value> {
        let mut context = HashMapContext::new();
        for (idx, column) in columns.iter().enumerate() {
            if let Some(Some(value)) = row.get(idx) {
                let bound = value_to_evalexpr(value);
                context
                    .set_value(normalize_column_name(column), bound.clone())
                    .ok()?;
                context.set_value(format!("c{idx}"), bound).ok()?;
            }
        }
        match eval_with_context(&self.expression, &context) {
            Ok(result) => eval_result_to_value(result),
            Err(err) => {
                debug!("Computed field '{}' failed: {err}", self.name);
                None
            }
        }
    }
}

fn eval_result_to_value(result: EvalValue) -> Option<Value> {
    match result {
        EvalValue::Int(i) => Some(Value::Number(i as f64)),
        EvalValue::Float(f) => f.is_finite().then_some(Value::Number(f)),
        EvalValue::Boolean(b) => Some(Value::Bool(b)),
        EvalValue::String(s) => Some(Value::Text(s)),
        EvalValue::Tuple(_) | EvalValue::Empty => None,
    }
}

pub fn parse_computed_fields(specs: &[String]) -> Result<Vec<ComputedField>> {
    specs.iter().map(|spec| ComputedField::parse(spec)).collect()
}

/// Appends one column per field. Fields are evaluated in order and each
/// sees the columns computed before it, so fields can chain.
pub fn add_computed_fields(dataset: &Dataset, fields: &[ComputedField]) -> Dataset {
    let mut columns = dataset.columns.clone();
    columns.extend(fields.iter().map(|field| field.name.clone()));

    let base = dataset.columns.len();
    let rows = dataset
        .rows
        .iter()
        .map(|row| {
            let mut out = row.clone();
            for (offset, field) in fields.iter().enumerate() {
                let value = field.evaluate(&columns[..base + offset], &out);
                out.push(value);
            }
            out
        })
        .collect();
    Dataset::new(columns, rows)
}
