use datascope::data::{Dataset, Value};
use datascope::derive::{self, ComputedField};
use datascope::filter::{self, FilterOperator, FilterRule, FilterValue};
use datascope::group::{self, AggregateFunction, Aggregation};
use datascope::ingest;
use proptest::prelude::*;

fn orders() -> Dataset {
    ingest::from_json_str(
        r#"[
            {"id":1,"status":"shipped","amount":120,"city":"Oslo"},
            {"id":2,"status":"pending","amount":80,"city":"Bergen"},
            {"id":3,"status":"Shipped","amount":200,"city":"Oslo"},
            {"id":4,"status":"cancelled","amount":"n/a","city":"Bergen"},
            {"id":5,"status":"shipped","amount":60,"city":null}
        ]"#,
    )
    .expect("valid input")
}

fn scalar_rule(column: &str, operator: FilterOperator, value: Value) -> FilterRule {
    FilterRule::new(column, operator, FilterValue::Scalar(value))
}

#[test]
fn no_rules_is_the_identity() {
    let dataset = orders();
    let filtered = filter::apply_filters(&dataset, &[]).expect("no rules");
    assert_eq!(filtered, dataset);
}

#[test]
fn disabled_rules_never_exclude_rows() {
    let dataset = orders();
    let mut rule = scalar_rule("status", FilterOperator::Equals, Value::Text("nope".into()));
    rule.enabled = false;
    let filtered = filter::apply_filters(&dataset, &[rule]).expect("disabled rule");
    assert_eq!(filtered.row_count(), dataset.row_count());
}

#[test]
fn equals_is_strict_about_types() {
    let dataset = ingest::from_json_str(r#"[{"v":10},{"v":"10"}]"#).expect("valid");
    let rule = scalar_rule("v", FilterOperator::Equals, Value::Number(10.0));
    let filtered = filter::apply_filters(&dataset, &[rule]).expect("filter");
    assert_eq!(filtered.row_count(), 1);
    assert_eq!(filtered.cell(0, 0), Some(&Value::Number(10.0)));
}

#[test]
fn contains_matches_case_insensitively() {
    let dataset = orders();
    let rule = scalar_rule("status", FilterOperator::Contains, Value::Text("SHIP".into()));
    let filtered = filter::apply_filters(&dataset, &[rule]).expect("filter");
    assert_eq!(filtered.row_count(), 3);
}

#[test]
fn greater_coerces_and_fails_closed() {
    let dataset = orders();
    let rule = scalar_rule("amount", FilterOperator::Greater, Value::Number(100.0));
    let filtered = filter::apply_filters(&dataset, &[rule]).expect("filter");
    // "n/a" cannot coerce, so that row is out rather than erroring.
    assert_eq!(filtered.row_count(), 2);

    let rule = scalar_rule("amount", FilterOperator::Less, Value::Text("abc".into()));
    let filtered = filter::apply_filters(&dataset, &[rule]).expect("filter");
    assert_eq!(filtered.row_count(), 0);
}

#[test]
fn range_is_inclusive_on_both_ends() {
    let dataset = orders();
    let rule = FilterRule::new(
        "amount",
        FilterOperator::Range,
        FilterValue::Span {
            min: 60.0,
            max: 120.0,
        },
    );
    let filtered = filter::apply_filters(&dataset, &[rule]).expect("filter");
    assert_eq!(filtered.row_count(), 3);
}

#[test]
fn rules_combine_with_and() {
    let dataset = orders();
    let rules = vec![
        scalar_rule("city", FilterOperator::Equals, Value::Text("Oslo".into())),
        scalar_rule("amount", FilterOperator::Greater, Value::Number(150.0)),
    ];
    let filtered = filter::apply_filters(&dataset, &rules).expect("filter");
    assert_eq!(filtered.row_count(), 1);
    assert_eq!(filtered.cell(0, 0), Some(&Value::Number(3.0)));
}

#[test]
fn unknown_filter_column_is_an_error() {
    let dataset = orders();
    let rule = scalar_rule("nope", FilterOperator::Equals, Value::Number(1.0));
    let err = filter::apply_filters(&dataset, &[rule]).expect_err("unknown column");
    assert!(err.to_string().contains("nope"));
}

#[test]
fn range_with_scalar_value_is_an_error() {
    let dataset = orders();
    let rule = scalar_rule("amount", FilterOperator::Range, Value::Number(1.0));
    assert!(filter::apply_filters(&dataset, &[rule]).is_err());
}

#[test]
fn grouped_sums_match_by_key() {
    let dataset =
        ingest::from_json_str(r#"[{"g":"a","v":1},{"g":"a","v":3},{"g":"b","v":5}]"#).expect("valid");
    let grouped = group::group_and_aggregate(
        &dataset,
        &["g".to_string()],
        &[Aggregation {
            column: "v".to_string(),
            function: AggregateFunction::Sum,
        }],
    )
    .expect("group");
    assert_eq!(grouped.columns, vec!["g", "v_sum"]);
    assert_eq!(grouped.row_count(), 2);
    assert_eq!(grouped.cell(0, 0), Some(&Value::Text("a".to_string())));
    assert_eq!(grouped.cell(0, 1), Some(&Value::Number(4.0)));
    assert_eq!(grouped.cell(1, 0), Some(&Value::Text("b".to_string())));
    assert_eq!(grouped.cell(1, 1), Some(&Value::Number(5.0)));
}

#[test]
fn count_counts_numeric_values_not_rows() {
    let dataset = ingest::from_json_str(
        r#"[{"g":"a","v":1},{"g":"a","v":"x"},{"g":"a","v":null},{"g":"a","v":"7"}]"#,
    )
    .expect("valid");
    let grouped = group::group_and_aggregate(
        &dataset,
        &["g".to_string()],
        &[Aggregation {
            column: "v".to_string(),
            function: AggregateFunction::Count,
        }],
    )
    .expect("group");
    // Numeric strings coerce; text and missing cells do not.
    assert_eq!(grouped.cell(0, 1), Some(&Value::Number(2.0)));
}

#[test]
fn aggregates_over_excluded_columns_have_defined_values() {
    let dataset =
        ingest::from_json_str(r#"[{"g":"a","v":"x"},{"g":"a","v":"y"}]"#).expect("valid");
    let aggregations = ["sum", "avg", "count", "min", "max"]
        .iter()
        .map(|f| Aggregation {
            column: "v".to_string(),
            function: f.parse().expect("function"),
        })
        .collect::<Vec<_>>();
    let grouped =
        group::group_and_aggregate(&dataset, &["g".to_string()], &aggregations).expect("group");
    assert_eq!(grouped.cell(0, 1), Some(&Value::Number(0.0)));
    assert_eq!(grouped.cell(0, 2), Some(&Value::Number(0.0)));
    assert_eq!(grouped.cell(0, 3), Some(&Value::Number(0.0)));
    // min/max have no defined value without numeric input: null cell.
    assert_eq!(grouped.rows[0][4], None);
    assert_eq!(grouped.rows[0][5], None);
}

#[test]
fn group_keys_with_missing_cells_stay_distinct() {
    let dataset = ingest::from_json_str(
        r#"[{"g":"a","v":1},{"g":null,"v":2},{"g":null,"v":3}]"#,
    )
    .expect("valid");
    let grouped = group::group_and_aggregate(
        &dataset,
        &["g".to_string()],
        &[Aggregation {
            column: "v".to_string(),
            function: AggregateFunction::Sum,
        }],
    )
    .expect("group");
    assert_eq!(grouped.row_count(), 2);
    // Missing keys sort first.
    assert_eq!(grouped.rows[0][0], None);
    assert_eq!(grouped.cell(0, 1), Some(&Value::Number(5.0)));
}

#[test]
fn multi_column_keys_do_not_collide() {
    // With string-joined keys "a|b" + "c" would collide with "a" + "b|c".
    let dataset = ingest::from_json_str(
        r#"[{"x":"a|b","y":"c","v":1},{"x":"a","y":"b|c","v":10}]"#,
    )
    .expect("valid");
    let grouped = group::group_and_aggregate(
        &dataset,
        &["x".to_string(), "y".to_string()],
        &[Aggregation {
            column: "v".to_string(),
            function: AggregateFunction::Sum,
        }],
    )
    .expect("group");
    assert_eq!(grouped.row_count(), 2);
}

#[test]
fn unknown_group_column_is_an_error() {
    let dataset = orders();
    assert!(group::group_and_aggregate(&dataset, &["nope".to_string()], &[]).is_err());
}

#[test]
fn computed_fields_append_columns() {
    let dataset =
        ingest::from_json_str(r#"[{"price":2.5,"qty":4},{"price":10,"qty":2}]"#).expect("valid");
    let fields = vec![ComputedField::parse("total=price * qty").expect("parse")];
    let derived = derive::add_computed_fields(&dataset, &fields);
    assert_eq!(derived.columns, vec!["price", "qty", "total"]);
    assert_eq!(derived.cell(0, 2), Some(&Value::Number(10.0)));
    assert_eq!(derived.cell(1, 2), Some(&Value::Number(20.0)));
}

#[test]
fn computed_fields_can_chain() {
    let dataset = ingest::from_json_str(r#"[{"v":3}]"#).expect("valid");
    let fields = vec![
        ComputedField::parse("doubled=v * 2").expect("parse"),
        ComputedField::parse("quadrupled=doubled * 2").expect("parse"),
    ];
    let derived = derive::add_computed_fields(&dataset, &fields);
    assert_eq!(derived.cell(0, 2), Some(&Value::Number(12.0)));
}

#[test]
fn one_failing_field_does_not_poison_siblings_or_other_rows() {
    let dataset =
        ingest::from_json_str(r#"[{"v":2},{"v":"text"},{"v":5}]"#).expect("valid");
    let fields = vec![
        ComputedField::parse("squared=v * v").expect("parse"),
        ComputedField::parse("broken=no_such_column + 1").expect("parse"),
    ];
    let derived = derive::add_computed_fields(&dataset, &fields);
    // Sibling stays intact on every row.
    assert_eq!(derived.cell(0, 1), Some(&Value::Number(4.0)));
    assert_eq!(derived.cell(2, 1), Some(&Value::Number(25.0)));
    // The text row fails only its own arithmetic cell.
    assert_eq!(derived.rows[1][1], None);
    // The broken field is null everywhere without aborting the batch.
    assert!(derived.rows.iter().all(|row| row[2].is_none()));
}

#[test]
fn comparison_expressions_yield_booleans() {
    let dataset = ingest::from_json_str(r#"[{"v":2},{"v":9}]"#).expect("valid");
    let fields = vec![ComputedField::parse("high=v > 5").expect("parse")];
    let derived = derive::add_computed_fields(&dataset, &fields);
    assert_eq!(derived.cell(0, 1), Some(&Value::Bool(false)));
    assert_eq!(derived.cell(1, 1), Some(&Value::Bool(true)));
}

proptest! {
    #[test]
    fn filtering_never_grows_the_dataset(
        values in prop::collection::vec(-1000i32..1000, 0..40),
        bound in -1000i32..1000
    ) {
        let rows = values
            .iter()
            .map(|v| vec![Some(Value::Number(f64::from(*v)))])
            .collect();
        let dataset = Dataset::new(vec!["v".to_string()], rows);
        let rule = scalar_rule("v", FilterOperator::Greater, Value::Number(f64::from(bound)));
        let filtered = filter::apply_filters(&dataset, &[rule]).expect("filter");
        prop_assert!(filtered.row_count() <= dataset.row_count());
        let expected = values.iter().filter(|v| **v > bound).count();
        prop_assert_eq!(filtered.row_count(), expected);
    }

    #[test]
    fn grouping_emits_one_row_per_distinct_key(
        keys in prop::collection::vec(0u8..6, 1..60)
    ) {
        let rows = keys
            .iter()
            .map(|k| vec![Some(Value::Text(format!("k{k}"))), Some(Value::Number(1.0))])
            .collect();
        let dataset = Dataset::new(vec!["g".to_string(), "v".to_string()], rows);
        let grouped = group::group_and_aggregate(
            &dataset,
            &["g".to_string()],
            &[Aggregation { column: "v".to_string(), function: AggregateFunction::Count }],
        )
        .expect("group");
        let distinct = keys.iter().collect::<std::collections::BTreeSet<_>>();
        prop_assert_eq!(grouped.row_count(), distinct.len());
    }
}
