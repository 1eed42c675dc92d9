//! Full forecast run over on-disk CSV history and JSON models.

use std::fmt::Write as _;
use std::fs::File;

use approx::assert_relative_eq;
use chrono::{Datelike, Months, NaiveDate};

use demandcast_core::{Forecaster, Target};
use demandcast_store::{CsvHistorySource, JsonModelSource, LinearModel};

fn write_history(dir: &std::path::Path, region: &str, months: usize) {
    let mut csv = String::from(
        "date,primary_price_avg,secondary_price_avg,stock_var,price_diff,retail_sales,non_retail_sales\n",
    );
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    for i in 0..months {
        let date = start.checked_add_months(Months::new(i as u32)).unwrap();
        let t = i as f64;
        writeln!(
            csv,
            "{:02}-{:02}-{},{},{},{},{},{},{}",
            date.day(),
            date.month(),
            date.year(),
            100.0 + 2.0 * t,
            90.0 + t,
            50.0,
            10.0 + t,
            1000.0 + 10.0 * t,
            500.0 + 5.0 * t,
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{region}_pr.csv")), csv).unwrap();
}

fn write_model(dir: &std::path::Path, region: &str, target: Target, model: &LinearModel) {
    let path = dir.join(format!("{region}_{target}.json"));
    serde_json::to_writer(File::create(path).unwrap(), model).unwrap();
}

#[test]
fn forecast_from_files() {
    let data_dir = tempfile::tempdir().unwrap();
    let model_dir = tempfile::tempdir().unwrap();
    write_history(data_dir.path(), "mumbai", 24);
    write_model(
        model_dir.path(),
        "mumbai",
        Target::RetailSales,
        &LinearModel::new(
            vec!["retail_sales_lag_1".into(), "trend_index".into()],
            vec![1.0, 2.0],
            0.0,
        )
        .unwrap(),
    );

    let forecaster = Forecaster::new(
        CsvHistorySource::new(data_dir.path()),
        JsonModelSource::new(model_dir.path()),
    );
    let series = forecaster.forecast("mumbai", Target::RetailSales, 3).unwrap();

    assert_eq!(series.len(), 3);
    assert_eq!(
        series.records[0].date,
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    );
    // lag_1 of the first month is the observed 2024-12 value (1230);
    // trend_index continues at 25.
    assert_relative_eq!(series.records[0].value, 1230.0 + 50.0, epsilon = 1e-8);
}

#[test]
fn national_forecast_from_files() {
    let data_dir = tempfile::tempdir().unwrap();
    let model_dir = tempfile::tempdir().unwrap();
    for region in ["east", "west"] {
        write_history(data_dir.path(), region, 24);
        write_model(
            model_dir.path(),
            region,
            Target::RetailSales,
            &LinearModel::new(vec![], vec![], 150_000.0).unwrap(),
        );
        write_model(
            model_dir.path(),
            region,
            Target::NonRetailSales,
            &LinearModel::new(vec![], vec![], 30_000.0).unwrap(),
        );
        // No stock_var models: composites fall back to zero stock.
    }

    let forecaster = Forecaster::new(
        CsvHistorySource::new(data_dir.path()),
        JsonModelSource::new(model_dir.path()),
    );
    let national = forecaster.forecast_national(&["east", "west"], 2).unwrap();

    assert_eq!(national.len(), 2);
    // 360k per month clears the Rule 1 floor; zero stock never hits
    // the Rule 2 ceiling.
    assert_relative_eq!(national.months[0].total_sales, 360_000.0, epsilon = 1e-6);
    assert_relative_eq!(national.months[0].stock_var, 0.0, epsilon = 1e-6);
    assert_relative_eq!(national.months[1].stock_var, 0.0, epsilon = 1e-6);
}
