//! Feature assembly
//!
//! Every model input, at training and at serving time, is built here:
//!
//! - a [`FeatureVector`] of twelve numeric fields in [`FEATURE_NAMES`] order,
//! - a [`CategoryVector`] of the three raw category ids,
//! - the day's [`HourlySales`], fed to the model as a (24, 1) sequence.
//!
//! Training examples come from pairs of calendar-adjacent records of one
//! entity ([`label_examples`]). Serving rows come from a "today" upload and a
//! "tomorrow" upload merged side by side ([`merge_uploads`] then
//! [`assemble_serving`]). In both modes the numeric fields are resolved by the
//! same names, so the positional scaler parameters line up.

use crate::calendar::{derive_tomorrow, next_day, TomorrowCalendar};
use crate::data::{self, DATE_COLUMN};
use crate::error::{ForecastError, Result};
use crate::record::{CategoryIds, DayContext, EntityKey, SalesRecord};
use crate::sequence::HourlySales;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Number of numeric features
pub const NUM_FEATURES: usize = 12;

/// Number of categorical ids
pub const NUM_CATEGORIES: usize = 3;

/// Numeric feature names, in the order the scaler and model expect them
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "discount",
    "holiday_flag",
    "activity_flag",
    "precpt",
    "avg_temperature",
    "avg_humidity",
    "avg_wind_level",
    "stock_hour6_22_cnt",
    "mean_today",
    "dow_tomorrow",
    "month_tomorrow",
    "is_weekend",
];

/// Suffix given to every column of the tomorrow upload except its sequence
pub const TOMORROW_SUFFIX: &str = "_tomorrow";

/// Sequence column of the today upload
pub const TODAY_SEQUENCE_COLUMN: &str = "hours_sale_today";

/// Sequence column of the tomorrow upload, never suffixed
pub const TOMORROW_SEQUENCE_COLUMN: &str = "hours_sale_tomorrow";

const MEAN_TODAY: usize = 8;
const DOW_TOMORROW: usize = 9;
const MONTH_TOMORROW: usize = 10;
const IS_WEEKEND: usize = 11;

/// Fixed-order numeric features of one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; NUM_FEATURES]);

/// Raw category ids, unscaled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryVector([f64; NUM_CATEGORIES]);

/// Everything the model consumes for one row
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFeatures {
    pub numeric: FeatureVector,
    pub categories: CategoryVector,
    pub hours: HourlySales,
}

/// A training example with its regression target
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub entity: EntityKey,
    /// Date of the "today" record
    pub dt: NaiveDate,
    pub features: AssembledFeatures,
    /// Mean hourly sales of the following day
    pub mean_tomorrow: f64,
}

/// Rows assembled from a pair of serving uploads
#[derive(Debug, Clone)]
pub struct ServingBatch {
    pub entities: Vec<EntityKey>,
    pub features: Vec<AssembledFeatures>,
    /// Feature names that could not be resolved and were filled with 0
    pub defaulted: Vec<&'static str>,
}

impl FeatureVector {
    /// Assemble from a day's context, its mean sales and the next day's calendar
    pub fn new(context: &DayContext, mean_today: f64, calendar: &TomorrowCalendar) -> Self {
        let mut values = [0.0; NUM_FEATURES];
        values[..DayContext::COLUMNS.len()].copy_from_slice(&context.to_array());
        values[MEAN_TODAY] = mean_today;
        values[DOW_TOMORROW] = calendar.dow as f64;
        values[MONTH_TOMORROW] = calendar.month as f64;
        values[IS_WEEKEND] = if calendar.is_weekend { 1.0 } else { 0.0 };
        Self(values)
    }

    pub fn from_array(values: [f64; NUM_FEATURES]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; NUM_FEATURES] {
        &self.0
    }

    /// Value of a named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }
}

impl CategoryVector {
    pub fn from_ids(ids: &CategoryIds) -> Self {
        let [first, second, third] = ids.to_array();
        Self([first as f64, second as f64, third as f64])
    }

    pub fn values(&self) -> &[f64; NUM_CATEGORIES] {
        &self.0
    }
}

impl AssembledFeatures {
    /// Features of a record, with `calendar` describing the day being forecast
    pub fn from_record(record: &SalesRecord, calendar: &TomorrowCalendar) -> Self {
        Self {
            numeric: FeatureVector::new(&record.context, record.hours_sale.mean(), calendar),
            categories: CategoryVector::from_ids(&record.categories),
            hours: record.hours_sale,
        }
    }
}

/// Pair each record with the same entity's record of the next calendar day
///
/// Records without a next-day counterpart produce no example. Input order does
/// not matter; output is ordered by entity then date.
pub fn label_examples(records: &[SalesRecord]) -> Vec<LabeledExample> {
    let mut sorted: Vec<&SalesRecord> = records.iter().collect();
    sorted.sort_by_key(|r| (r.entity, r.dt));

    let examples: Vec<LabeledExample> = sorted
        .windows(2)
        .filter_map(|pair| {
            let (today, tomorrow) = (pair[0], pair[1]);
            if today.entity != tomorrow.entity || next_day(today.dt) != Some(tomorrow.dt) {
                return None;
            }
            Some(LabeledExample {
                entity: today.entity,
                dt: today.dt,
                features: AssembledFeatures::from_record(today, &derive_tomorrow(today.dt)),
                mean_tomorrow: tomorrow.hours_sale.mean(),
            })
        })
        .collect();

    debug!(
        records = records.len(),
        examples = examples.len(),
        dropped = records.len() - examples.len(),
        "labelled next-day examples"
    );
    examples
}

/// Place the tomorrow upload beside the today upload
///
/// Rows are matched by position. Every tomorrow column except
/// [`TOMORROW_SEQUENCE_COLUMN`] is renamed with [`TOMORROW_SUFFIX`] so it
/// cannot shadow a today column of the same name.
pub fn merge_uploads(today: &DataFrame, tomorrow: &DataFrame) -> Result<DataFrame> {
    if today.height() != tomorrow.height() {
        return Err(ForecastError::Schema(format!(
            "today upload has {} rows but tomorrow upload has {}",
            today.height(),
            tomorrow.height()
        )));
    }

    let mut renamed = tomorrow.clone();
    let names: Vec<String> = tomorrow
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    for name in names {
        if name != TOMORROW_SEQUENCE_COLUMN {
            renamed.rename(&name, &format!("{}{}", name, TOMORROW_SUFFIX))?;
        }
    }

    today
        .hstack(renamed.get_columns())
        .map_err(|e| ForecastError::Schema(format!("cannot merge uploads: {}", e)))
}

/// Assemble serving rows from a merged today/tomorrow frame
///
/// Entity keys, the today sequence and the category ids are required.
/// Numeric features are looked up by exact name; the calendar fields fall back
/// to a `dt` (today) or `dt_tomorrow` column when present; anything still
/// unresolved is 0.
pub fn assemble_serving(merged: &DataFrame) -> Result<ServingBatch> {
    let entities = data::entity_keys(merged)?;
    let hours = data::parse_sequences(data::required_column(merged, TODAY_SEQUENCE_COLUMN)?)?;
    let categories = data::category_ids(merged)?;
    let calendars = serving_calendars(merged)?;

    let rows = merged.height();
    let mut numeric = vec![[0.0; NUM_FEATURES]; rows];
    let mut defaulted = Vec::new();

    for (idx, name) in FEATURE_NAMES.iter().enumerate() {
        if idx == MEAN_TODAY {
            for (row, values) in numeric.iter_mut().enumerate() {
                values[idx] = hours[row].mean();
            }
            continue;
        }

        if data::has_column(merged, name) {
            let column = data::column_as_f64(data::required_column(merged, name)?)?;
            for (row, values) in numeric.iter_mut().enumerate() {
                values[idx] = column[row].unwrap_or(0.0);
            }
            continue;
        }

        if let Some(calendars) = calendars.as_ref().filter(|_| idx >= DOW_TOMORROW) {
            for (row, values) in numeric.iter_mut().enumerate() {
                values[idx] = calendar_field(&calendars[row], idx);
            }
            continue;
        }

        defaulted.push(*name);
    }

    if !defaulted.is_empty() {
        warn!(fields = ?defaulted, "features missing from uploads were set to 0");
    }
    warn_on_key_disagreement(merged, &entities)?;

    let features = numeric
        .into_iter()
        .zip(categories.iter())
        .zip(hours)
        .map(|((values, ids), hours)| AssembledFeatures {
            numeric: FeatureVector(values),
            categories: CategoryVector::from_ids(ids),
            hours,
        })
        .collect();

    Ok(ServingBatch {
        entities,
        features,
        defaulted,
    })
}

fn calendar_field(calendar: &TomorrowCalendar, idx: usize) -> f64 {
    match idx {
        DOW_TOMORROW => calendar.dow as f64,
        MONTH_TOMORROW => calendar.month as f64,
        _ => {
            if calendar.is_weekend {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Forecast-day calendars from the today date, or the tomorrow upload's own date
fn serving_calendars(merged: &DataFrame) -> Result<Option<Vec<TomorrowCalendar>>> {
    let tomorrow_date = format!("{}{}", DATE_COLUMN, TOMORROW_SUFFIX);
    let (column, is_today) = if data::has_column(merged, DATE_COLUMN) {
        (DATE_COLUMN, true)
    } else if data::has_column(merged, &tomorrow_date) {
        (tomorrow_date.as_str(), false)
    } else {
        return Ok(None);
    };

    let cells = data::column_as_str(data::required_column(merged, column)?)?;
    let mut calendars = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        let date = match cell.as_deref().and_then(data::parse_date) {
            Some(date) => date,
            None => {
                return Err(ForecastError::Schema(format!(
                    "column '{}' has an invalid date at row {}",
                    column, row
                )))
            }
        };
        calendars.push(if is_today {
            derive_tomorrow(date)
        } else {
            TomorrowCalendar::of_day(date)
        });
    }

    Ok(Some(calendars))
}

/// Rows are aligned by position; flag uploads whose keys say otherwise
fn warn_on_key_disagreement(merged: &DataFrame, entities: &[EntityKey]) -> Result<()> {
    let store = format!("{}{}", data::STORE_COLUMN, TOMORROW_SUFFIX);
    let product = format!("{}{}", data::PRODUCT_COLUMN, TOMORROW_SUFFIX);
    if !data::has_column(merged, &store) || !data::has_column(merged, &product) {
        return Ok(());
    }

    let stores = data::column_as_i64(data::required_column(merged, &store)?)?;
    let products = data::column_as_i64(data::required_column(merged, &product)?)?;
    let mismatched: Vec<usize> = entities
        .iter()
        .enumerate()
        .filter(|(row, key)| {
            stores[*row] != Some(key.store_id) || products[*row] != Some(key.product_id)
        })
        .map(|(row, _)| row)
        .collect();

    if !mismatched.is_empty() {
        warn!(
            rows = ?mismatched,
            "today and tomorrow uploads name different entities on the same row"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;
    use pretty_assertions::assert_eq;

    fn sales(value: f64) -> HourlySales {
        HourlySales::from_values(&[value; 24]).unwrap()
    }

    fn record(product: i64, dt: &str, value: f64) -> SalesRecord {
        SalesRecord {
            entity: EntityKey::new(1, product),
            dt: NaiveDate::parse_from_str(dt, "%Y-%m-%d").unwrap(),
            hours_sale: sales(value),
            context: DayContext::from_array([0.5, 0.0, 1.0, 2.0, 18.0, 60.0, 3.0, 16.0]),
            categories: CategoryIds::new(1, 2, 3),
        }
    }

    #[test]
    fn test_feature_vector_order() {
        let calendar = TomorrowCalendar {
            dow: 5,
            month: 1,
            is_weekend: true,
        };
        let context = DayContext::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let vector = FeatureVector::new(&context, 9.0, &calendar);
        assert_eq!(
            vector.values(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 5.0, 1.0, 1.0]
        );
        assert_eq!(vector.get("precpt"), Some(4.0));
        assert_eq!(vector.get("unknown"), None);
    }

    #[test]
    fn test_label_examples_requires_next_calendar_day() {
        let records = vec![
            record(7, "2024-01-06", 4.0),
            record(7, "2024-01-05", 2.0),
            // gap: 01-08 has no 01-07 predecessor, 01-06 has no 01-07 successor
            record(7, "2024-01-08", 6.0),
            record(8, "2024-01-09", 1.0),
        ];
        let examples = label_examples(&records);

        assert_eq!(examples.len(), 1);
        let example = &examples[0];
        assert_eq!(example.dt, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(example.mean_tomorrow, 4.0);
        assert_eq!(example.features.numeric.get("mean_today"), Some(2.0));
        assert_eq!(example.features.numeric.get("dow_tomorrow"), Some(5.0));
        assert_eq!(example.features.numeric.get("is_weekend"), Some(1.0));
    }

    #[test]
    fn test_label_examples_never_crosses_entities() {
        let records = vec![record(1, "2024-01-05", 2.0), record(2, "2024-01-06", 4.0)];
        assert!(label_examples(&records).is_empty());
    }

    #[test]
    fn test_merge_suffixes_tomorrow_columns() {
        let today = DataLoader::read_upload(b"store_id,discount\n1,0.5\n").unwrap();
        let tomorrow =
            DataLoader::read_upload(b"discount,dow,hours_sale_tomorrow\n0.7,5,x\n").unwrap();
        let merged = merge_uploads(&today, &tomorrow).unwrap();
        let mut names: Vec<&str> = merged.get_column_names();
        names.sort();
        assert_eq!(
            names,
            vec![
                "discount",
                "discount_tomorrow",
                "dow_tomorrow",
                "hours_sale_tomorrow",
                "store_id"
            ]
        );
    }

    #[test]
    fn test_merge_rejects_row_count_mismatch() {
        let today = DataLoader::read_upload(b"a\n1\n2\n").unwrap();
        let tomorrow = DataLoader::read_upload(b"b\n1\n").unwrap();
        let err = merge_uploads(&today, &tomorrow).unwrap_err();
        assert!(matches!(err, ForecastError::Schema(_)));
    }
}
