#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

pub const TRAINING_HEADER: &str = "store_id,product_id,dt,hours_sale,discount,holiday_flag,\
activity_flag,precpt,avg_temperature,avg_humidity,avg_wind_level,stock_hour6_22_cnt,\
first_category_id,second_category_id,third_category_id";

/// Quoted list cell holding 24 hourly values
pub fn sequence_cell(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("\"[{}]\"", items.join(", "))
}

/// Hourly profile with a midday peak, scaled so its mean is `mean`
pub fn profile(mean: f64) -> Vec<f64> {
    let shape: Vec<f64> = (0..24)
        .map(|hour| if (8..20).contains(&hour) { 1.5 } else { 0.5 })
        .collect();
    let shape_mean = shape.iter().sum::<f64>() / 24.0;
    shape.iter().map(|s| s * mean / shape_mean).collect()
}

/// One row of the training table
pub fn training_row(store: i64, product: i64, dt: &str, mean: f64, discount: f64) -> String {
    format!(
        "{},{},{},{},{},0,1,0.5,21.5,65,2,15,{},{},{}",
        store,
        product,
        dt,
        sequence_cell(&profile(mean)),
        discount,
        product % 3 + 1,
        product % 5 + 10,
        product + 100
    )
}

/// Training table covering `products` products of one store over `days` consecutive days
///
/// Demand follows discount, so the next-day target is learnable.
pub fn training_csv(products: i64, days: u32) -> String {
    let mut lines = vec![TRAINING_HEADER.to_string()];
    for product in 1..=products {
        for day in 1..=days {
            let discount = ((day + product as u32) % 4) as f64 * 0.1;
            let mean = 2.0 + product as f64 * 0.2 + discount * 5.0;
            let dt = format!("2024-03-{:02}", day);
            lines.push(training_row(1, product, &dt, mean, discount));
        }
    }
    lines.join("\n") + "\n"
}

pub fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

/// "Today" upload: context columns plus `hours_sale_today`
pub fn today_upload(rows: &[(i64, i64, &str, f64)]) -> String {
    today_upload_with(rows, true)
}

/// "Today" upload, optionally leaving out the `precpt` column
pub fn today_upload_with(rows: &[(i64, i64, &str, f64)], with_precpt: bool) -> String {
    let precpt_header = if with_precpt { "precpt," } else { "" };
    let precpt_value = if with_precpt { "0.5," } else { "" };
    let mut lines = vec![format!(
        "store_id,product_id,dt,hours_sale_today,discount,holiday_flag,activity_flag,{}\
avg_temperature,avg_humidity,avg_wind_level,stock_hour6_22_cnt,\
first_category_id,second_category_id,third_category_id",
        precpt_header
    )];
    for (store, product, dt, mean) in rows {
        lines.push(format!(
            "{},{},{},{},0.2,0,1,{}21.5,65,2,15,{},{},{}",
            store,
            product,
            dt,
            sequence_cell(&profile(*mean)),
            precpt_value,
            product % 3 + 1,
            product % 5 + 10,
            product + 100
        ));
    }
    lines.join("\n") + "\n"
}

/// "Tomorrow" upload describing the forecast day, without `precpt`
pub fn tomorrow_upload(rows: &[(i64, i64, &str)]) -> String {
    let mut lines = vec!["store_id,product_id,dt,discount,holiday_flag".to_string()];
    for (store, product, dt) in rows {
        lines.push(format!("{},{},{},0.3,0", store, product, dt));
    }
    lines.join("\n") + "\n"
}
