use datascope::data::Value;
use datascope::ingest::{self, ImportError};

#[test]
fn json_array_of_objects_becomes_dataset() {
    let dataset = ingest::from_json_str(
        r#"[{"name":"Ada","score":92.5,"active":true},{"name":"Grace","score":88,"active":false}]"#,
    )
    .expect("valid input");
    assert_eq!(dataset.columns, vec!["name", "score", "active"]);
    assert_eq!(dataset.row_count(), 2);
    assert_eq!(dataset.cell(0, 1), Some(&Value::Number(92.5)));
    assert_eq!(dataset.cell(1, 2), Some(&Value::Bool(false)));
}

#[test]
fn json_rejects_non_array_input() {
    let err = ingest::from_json_str(r#"{"name":"Ada"}"#).expect_err("object is not an array");
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    assert!(err.to_string().contains("unsupported format"));

    let err = ingest::from_json_str("42").expect_err("scalar is not an array");
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
}

#[test]
fn json_rejects_empty_array() {
    let err = ingest::from_json_str("[]").expect_err("empty input");
    assert!(matches!(err, ImportError::EmptyDataset));
    assert_eq!(err.to_string(), "dataset is empty");
}

#[test]
fn json_rejects_broken_text_and_non_object_records() {
    let err = ingest::from_json_str("[{").expect_err("broken json");
    assert!(matches!(err, ImportError::MalformedContent(_)));

    let err = ingest::from_json_str(r#"[{"a":1}, 7]"#).expect_err("scalar record");
    assert!(matches!(err, ImportError::MalformedContent(_)));
    assert!(err.to_string().contains("record 2"));
}

#[test]
fn json_columns_come_from_first_record_only() {
    let dataset = ingest::from_json_str(
        r#"[{"a":1,"b":2},{"a":3,"c":99},{"b":4}]"#,
    )
    .expect("valid input");
    assert_eq!(dataset.columns, vec!["a", "b"]);
    // Extra key "c" is dropped; absent keys are missing cells.
    assert_eq!(dataset.cell(1, 1), None);
    assert_eq!(dataset.cell(2, 0), None);
    assert_eq!(dataset.cell(2, 1), Some(&Value::Number(4.0)));
}

#[test]
fn json_null_and_empty_string_are_missing_cells() {
    let dataset =
        ingest::from_json_str(r#"[{"v":null,"w":""},{"v":1,"w":"x"}]"#).expect("valid input");
    assert_eq!(dataset.cell(0, 0), None);
    assert_eq!(dataset.cell(0, 1), None);
    assert_eq!(dataset.cell(1, 1), Some(&Value::Text("x".to_string())));
}

#[test]
fn json_nested_values_are_kept_as_text() {
    let dataset =
        ingest::from_json_str(r#"[{"v":{"x":1},"w":[1,2]}]"#).expect("valid input");
    assert_eq!(dataset.cell(0, 0), Some(&Value::Text(r#"{"x":1}"#.to_string())));
    assert_eq!(dataset.cell(0, 1), Some(&Value::Text("[1,2]".to_string())));
}

#[test]
fn csv_cells_coerce_by_literal() {
    let dataset = ingest::from_csv_str("id,flag,score,label\n1,true,3.5,alpha\n2,false,,NaN\n")
        .expect("valid input");
    assert_eq!(dataset.columns, vec!["id", "flag", "score", "label"]);
    assert_eq!(dataset.cell(0, 0), Some(&Value::Number(1.0)));
    assert_eq!(dataset.cell(0, 1), Some(&Value::Bool(true)));
    assert_eq!(dataset.cell(0, 2), Some(&Value::Number(3.5)));
    assert_eq!(dataset.cell(1, 2), None);
    // NaN is not numeric; it survives as text.
    assert_eq!(dataset.cell(1, 3), Some(&Value::Text("NaN".to_string())));
}

#[test]
fn csv_with_only_a_header_is_empty() {
    let err = ingest::from_csv_str("a,b,c\n").expect_err("no data rows");
    assert!(matches!(err, ImportError::EmptyDataset));
}

#[test]
fn csv_short_rows_pad_with_missing_cells() {
    let dataset = ingest::from_csv_str("a,b,c\n1,2\n").expect("valid input");
    assert_eq!(dataset.cell(0, 2), None);
}
