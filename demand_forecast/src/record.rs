//! Raw sales observations

use crate::sequence::HourlySales;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifies one product's sales stream at one location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub store_id: i64,
    pub product_id: i64,
}

/// Contextual scalars recorded for a day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayContext {
    pub discount: f64,
    pub holiday_flag: f64,
    pub activity_flag: f64,
    pub precpt: f64,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_wind_level: f64,
    pub stock_hour6_22_cnt: f64,
}

/// The three product category ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryIds {
    pub first_category_id: i64,
    pub second_category_id: i64,
    pub third_category_id: i64,
}

/// One observation for a (store, product, date) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub entity: EntityKey,
    pub dt: NaiveDate,
    pub hours_sale: HourlySales,
    pub context: DayContext,
    pub categories: CategoryIds,
}

impl EntityKey {
    pub fn new(store_id: i64, product_id: i64) -> Self {
        Self {
            store_id,
            product_id,
        }
    }
}

impl DayContext {
    /// Column names of the contextual scalars, in feature order
    pub const COLUMNS: [&'static str; 8] = [
        "discount",
        "holiday_flag",
        "activity_flag",
        "precpt",
        "avg_temperature",
        "avg_humidity",
        "avg_wind_level",
        "stock_hour6_22_cnt",
    ];

    /// Build from values given in [`DayContext::COLUMNS`] order
    pub fn from_array(values: [f64; 8]) -> Self {
        Self {
            discount: values[0],
            holiday_flag: values[1],
            activity_flag: values[2],
            precpt: values[3],
            avg_temperature: values[4],
            avg_humidity: values[5],
            avg_wind_level: values[6],
            stock_hour6_22_cnt: values[7],
        }
    }

    /// Values in [`DayContext::COLUMNS`] order
    pub fn to_array(&self) -> [f64; 8] {
        [
            self.discount,
            self.holiday_flag,
            self.activity_flag,
            self.precpt,
            self.avg_temperature,
            self.avg_humidity,
            self.avg_wind_level,
            self.stock_hour6_22_cnt,
        ]
    }
}

impl CategoryIds {
    /// Column names of the category ids
    pub const COLUMNS: [&'static str; 3] =
        ["first_category_id", "second_category_id", "third_category_id"];

    pub fn new(first: i64, second: i64, third: i64) -> Self {
        Self {
            first_category_id: first,
            second_category_id: second,
            third_category_id: third,
        }
    }

    pub fn to_array(&self) -> [i64; 3] {
        [
            self.first_category_id,
            self.second_category_id,
            self.third_category_id,
        ]
    }
}

impl SalesRecord {
    /// Mean hourly sales of the day
    pub fn mean_sales(&self) -> f64 {
        self.hours_sale.mean()
    }
}
