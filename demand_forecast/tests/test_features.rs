mod common;

use common::{today_upload, today_upload_with, tomorrow_upload, training_row, TRAINING_HEADER};
use demand_forecast::features::{assemble_serving, label_examples, merge_uploads};
use demand_forecast::{DataLoader, ForecastError, FEATURE_NAMES};
use pretty_assertions::assert_eq;

fn merged(today: &str, tomorrow: &str) -> polars::prelude::DataFrame {
    let today = DataLoader::read_upload(today.as_bytes()).unwrap();
    let tomorrow = DataLoader::read_upload(tomorrow.as_bytes()).unwrap();
    merge_uploads(&today, &tomorrow).unwrap()
}

#[test]
fn test_training_and_serving_build_identical_vectors() {
    // Training side: a record with a next-day partner
    let csv = [
        TRAINING_HEADER.to_string(),
        training_row(1, 7, "2024-01-05", 3.0, 0.2),
        training_row(1, 7, "2024-01-06", 4.0, 0.2),
    ]
    .join("\n");
    let records = DataLoader::from_dataframe(&DataLoader::read_upload(csv.as_bytes()).unwrap())
        .unwrap();
    let examples = label_examples(&records);
    assert_eq!(examples.len(), 1);

    // Serving side: the same day uploaded as "today"
    let batch = assemble_serving(&merged(
        &today_upload(&[(1, 7, "2024-01-05", 3.0)]),
        &tomorrow_upload(&[(1, 7, "2024-01-06")]),
    ))
    .unwrap();

    assert!(batch.defaulted.is_empty());
    assert_eq!(batch.features[0].numeric, examples[0].features.numeric);
    assert_eq!(batch.features[0].categories, examples[0].features.categories);
    assert_eq!(batch.features[0].hours, examples[0].features.hours);
}

#[test]
fn test_forecast_day_calendar_fields() {
    // 2024-01-05 is a Friday, so the forecast day is Saturday
    let batch = assemble_serving(&merged(
        &today_upload(&[(1, 7, "2024-01-05", 3.0)]),
        &tomorrow_upload(&[(1, 7, "2024-01-06")]),
    ))
    .unwrap();

    let numeric = batch.features[0].numeric;
    assert_eq!(numeric.get("dow_tomorrow"), Some(5.0));
    assert_eq!(numeric.get("month_tomorrow"), Some(1.0));
    assert_eq!(numeric.get("is_weekend"), Some(1.0));
}

#[test]
fn test_missing_precpt_is_zero_filled() {
    let batch = assemble_serving(&merged(
        &today_upload_with(&[(1, 7, "2024-01-05", 3.0), (1, 8, "2024-01-05", 1.0)], false),
        &tomorrow_upload(&[(1, 7, "2024-01-06"), (1, 8, "2024-01-06")]),
    ))
    .unwrap();

    assert_eq!(batch.defaulted, vec!["precpt"]);
    for features in &batch.features {
        assert_eq!(features.numeric.get("precpt"), Some(0.0));
        assert_eq!(features.numeric.values().len(), FEATURE_NAMES.len());
    }
}

#[test]
fn test_non_numeric_precpt_is_not_zero_filled() {
    let today = today_upload(&[(1, 7, "2024-01-05", 3.0), (1, 8, "2024-01-05", 1.0)]);
    let (head, tail) = today.rsplit_once(",0.5,").unwrap();
    let today = format!("{},n/a,{}", head, tail);

    let err = assemble_serving(&merged(
        &today,
        &tomorrow_upload(&[(1, 7, "2024-01-06"), (1, 8, "2024-01-06")]),
    ))
    .unwrap_err();
    match err {
        ForecastError::Schema(message) => {
            assert!(message.contains("'precpt'"));
            assert!(message.contains("row 1"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_calendar_from_tomorrow_date_when_today_has_none() {
    let today = "store_id,product_id,hours_sale_today,first_category_id,second_category_id,third_category_id\n\
                 1,7,\"[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]\",1,2,3\n";
    let tomorrow = "dt\n2024-02-10\n";
    let batch = assemble_serving(&merged(today, tomorrow)).unwrap();

    // 2024-02-10 is a Saturday
    let numeric = batch.features[0].numeric;
    assert_eq!(numeric.get("dow_tomorrow"), Some(5.0));
    assert_eq!(numeric.get("month_tomorrow"), Some(2.0));
    assert_eq!(numeric.get("mean_today"), Some(1.0));
    assert_eq!(numeric.get("discount"), Some(0.0));
}

#[test]
fn test_serving_requires_entity_keys() {
    let today = "product_id,hours_sale_today,first_category_id,second_category_id,third_category_id\n\
                 7,\"[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]\",1,2,3\n";
    let err = assemble_serving(&merged(today, "dt\n2024-02-10\n")).unwrap_err();
    assert!(matches!(err, ForecastError::MissingEntityKey(_)));
}

#[test]
fn test_serving_reports_malformed_row() {
    let today = "store_id,product_id,hours_sale_today,first_category_id,second_category_id,third_category_id\n\
                 1,7,\"[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]\",1,2,3\n\
                 1,8,\"[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]\",1,2,3\n";
    let err = assemble_serving(&merged(today, "dt\n2024-02-10\n2024-02-10\n")).unwrap_err();
    match err {
        ForecastError::MalformedSequence { row, .. } => assert_eq!(row, Some(1)),
        other => panic!("unexpected error: {}", other),
    }
}
