//! Tabular data handling for training datasets and serving uploads

use crate::error::{ForecastError, Result};
use crate::record::{CategoryIds, DayContext, EntityKey, SalesRecord};
use crate::sequence::HourlySales;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Store key column
pub const STORE_COLUMN: &str = "store_id";
/// Product key column
pub const PRODUCT_COLUMN: &str = "product_id";
/// Observation date column
pub const DATE_COLUMN: &str = "dt";
/// Hourly sales column of the training dataset
pub const SEQUENCE_COLUMN: &str = "hours_sale";

/// Data loader for sales tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load training records from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<SalesRecord>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        info!(path = %path.display(), rows = df.height(), "loaded training table");
        Self::from_dataframe(&df)
    }

    /// Read an uploaded CSV table into a DataFrame
    pub fn read_upload(bytes: &[u8]) -> Result<DataFrame> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ForecastError::Schema("uploaded table is empty".to_string()));
        }

        let df = CsvReader::new(Cursor::new(bytes.to_vec()))
            .infer_schema(None)
            .has_header(true)
            .finish()
            .map_err(|e| ForecastError::Schema(format!("unreadable table: {}", e)))?;

        debug!(rows = df.height(), columns = df.width(), "parsed upload");
        Ok(df)
    }

    /// Convert a DataFrame with the training columns into records
    ///
    /// Entity keys, the date and the hourly sequence are required for every
    /// row. Empty contextual cells are read as 0, the same degradation the
    /// serving path applies; non-numeric ones are a schema error.
    pub fn from_dataframe(df: &DataFrame) -> Result<Vec<SalesRecord>> {
        let entities = entity_keys(df)?;

        let dates = required_column(df, DATE_COLUMN)?;
        let dates = column_as_str(dates)?;

        let sequences = required_column(df, SEQUENCE_COLUMN)?;
        let sequences = parse_sequences(sequences)?;

        let mut context_columns = Vec::with_capacity(DayContext::COLUMNS.len());
        for name in DayContext::COLUMNS {
            let column = required_column(df, name)?;
            context_columns.push(column_as_f64(column)?);
        }

        let categories = category_ids(df)?;

        let mut records = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let dt = match dates[row].as_deref() {
                Some(text) => parse_date(text).ok_or_else(|| {
                    ForecastError::DataError(format!("invalid date '{}' at row {}", text, row))
                })?,
                None => {
                    return Err(ForecastError::DataError(format!(
                        "missing date at row {}",
                        row
                    )))
                }
            };

            let mut context = [0.0; 8];
            for (slot, column) in context_columns.iter().enumerate() {
                context[slot] = column[row].unwrap_or(0.0);
            }

            records.push(SalesRecord {
                entity: entities[row],
                dt,
                hours_sale: sequences[row],
                context: DayContext::from_array(context),
                categories: categories[row],
            });
        }

        Ok(records)
    }
}

/// Whether the frame carries a column
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| *c == name)
}

/// Fetch a column that must be present
pub fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| ForecastError::Schema(format!("required column '{}' is missing", name)))
}

/// Read a column as optional f64 values
///
/// Empty cells stay `None`. A present cell that is not a number is a
/// [`ForecastError::Schema`] naming the column and row.
pub fn column_as_f64(column: &Series) -> Result<Vec<Option<f64>>> {
    let cast = column.cast(&DataType::Float64)?;
    check_cast_kept_values(column, &cast, "numeric")?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Read a column as optional strings
pub fn column_as_str(column: &Series) -> Result<Vec<Option<String>>> {
    let cast = column.cast(&DataType::Utf8)?;
    Ok(cast
        .utf8()?
        .into_iter()
        .map(|value| value.map(|s| s.to_string()))
        .collect())
}

/// Read a column as optional integers
///
/// Fractional values are rejected rather than truncated.
pub fn column_as_i64(column: &Series) -> Result<Vec<Option<i64>>> {
    if column.dtype().is_float() {
        let floats = column.cast(&DataType::Float64)?;
        let fractional = floats
            .f64()?
            .into_iter()
            .position(|value| value.map_or(false, |v| v.fract() != 0.0));
        if let Some(row) = fractional {
            return Err(ForecastError::Schema(format!(
                "column '{}' has a non-integer value at row {}",
                column.name(),
                row
            )));
        }
    }

    let cast = column.cast(&DataType::Int64)?;
    check_cast_kept_values(column, &cast, "integer")?;
    Ok(cast.i64()?.into_iter().collect())
}

/// A non-cast cell came out null, so the source text was not a `kind` value
fn check_cast_kept_values(source: &Series, cast: &Series, kind: &str) -> Result<()> {
    let lost = source
        .is_null()
        .into_iter()
        .zip(cast.is_null().into_iter())
        .position(|(was_null, is_null)| was_null == Some(false) && is_null == Some(true));

    match lost {
        Some(row) => Err(ForecastError::Schema(format!(
            "column '{}' has a non-{} value at row {}",
            source.name(),
            kind,
            row
        ))),
        None => Ok(()),
    }
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time part
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let day = text.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Read the store/product keys of every row
pub fn entity_keys(df: &DataFrame) -> Result<Vec<EntityKey>> {
    let mut keys = Vec::with_capacity(2);
    for name in [STORE_COLUMN, PRODUCT_COLUMN] {
        let column = df.column(name).map_err(|_| {
            ForecastError::MissingEntityKey(format!("column '{}' is missing", name))
        })?;
        keys.push(column_as_i64(column)?);
    }

    (0..df.height())
        .map(|row| match (keys[0][row], keys[1][row]) {
            (Some(store_id), Some(product_id)) => Ok(EntityKey::new(store_id, product_id)),
            _ => Err(ForecastError::MissingEntityKey(format!(
                "row {} has no integer store/product id",
                row
            ))),
        })
        .collect()
}

/// Read the three category ids of every row
pub fn category_ids(df: &DataFrame) -> Result<Vec<CategoryIds>> {
    let mut columns = Vec::with_capacity(CategoryIds::COLUMNS.len());
    for name in CategoryIds::COLUMNS {
        columns.push(column_as_i64(required_column(df, name)?)?);
    }

    (0..df.height())
        .map(|row| match (columns[0][row], columns[1][row], columns[2][row]) {
            (Some(first), Some(second), Some(third)) => Ok(CategoryIds::new(first, second, third)),
            _ => Err(ForecastError::Schema(format!(
                "row {} has a missing or non-integer category id",
                row
            ))),
        })
        .collect()
}

/// Parse every cell of a sequence column, tagging failures with their row
pub fn parse_sequences(column: &Series) -> Result<Vec<HourlySales>> {
    column_as_str(column)?
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Some(text) => HourlySales::parse(text).map_err(|e| e.at_row(row)),
            None => Err(ForecastError::malformed("empty cell").at_row(row)),
        })
        .collect()
}
