//! Feature-row synthesis for months that do not yet exist in history.
//!
//! The synthesizer receives a read-only view of the working history and
//! returns a fresh row; it never mutates the table. Lag features use
//! exact-date lookup rather than positional offsets: the working history
//! may contain gaps, and positional lags would silently misalign across
//! them.

use std::f64::consts::TAU;

use chrono::{Datelike, Months, NaiveDate};

use crate::model::Target;
use crate::schema;
use crate::simulate::DriverMonth;
use crate::table::{FeatureRow, HistoryTable};

/// Build the complete feature row for `date` from the working history
/// and this month's simulated driver values.
///
/// Features that cannot be computed (a lag date with no row, a rolling
/// window with too few observations) are left absent; the driver's
/// forward-fill pass decides what happens to them later.
pub fn synthesize_row(
    history: &HistoryTable,
    target: Target,
    drivers: &DriverMonth,
    date: NaiveDate,
) -> FeatureRow {
    let mut row = FeatureRow::new(date);

    row.set(schema::PRIMARY_PRICE_AVG, drivers.primary_price);
    row.set(schema::SECONDARY_PRICE_AVG, drivers.secondary_price);
    row.set(schema::STOCK_VAR, drivers.stock_var);
    row.set(
        schema::PRICE_DIFF,
        drivers.primary_price - drivers.secondary_price,
    );

    let month = f64::from(date.month());
    row.set(schema::MONTH_SIN, (TAU * month / 12.0).sin());
    row.set(schema::MONTH_COS, (TAU * month / 12.0).cos());
    row.set(schema::YEAR, f64::from(date.year()));
    row.set(schema::QUARTER, f64::from(date.month0() / 3 + 1));

    // Strictly increasing, never reused: one past the largest index
    // already in the working history.
    let trend_index = history
        .column_max(schema::TREND_INDEX)
        .map_or((history.len() + 1) as f64, |max| max + 1.0);
    row.set(schema::TREND_INDEX, trend_index);

    for lag in schema::LAG_MONTHS {
        let Some(lag_date) = date.checked_sub_months(Months::new(lag)) else {
            continue;
        };
        for column in schema::LAG_COLUMNS {
            if let Some(value) = history.value_at(column, lag_date) {
                row.set(schema::lag_column(column, lag), value);
            }
        }
    }

    for column in schema::ROLL_COLUMNS {
        if history.non_null_count(column) >= 3 {
            if let Some(mean) = history.tail_mean(column, 3) {
                row.set(schema::roll3_column(column), mean);
            }
        }
    }

    if history.non_null_count(schema::NON_RETAIL_SALES) > 0 {
        let avg = if history.len() >= 6 {
            history.tail_mean(schema::NON_RETAIL_SALES, 6)
        } else {
            history.column_mean(schema::NON_RETAIL_SALES)
        };
        if let Some(avg) = avg {
            row.set(schema::NON_RETAIL_SALES_CUSTOM_AVG, avg);
        }
    }

    // Yearly lag only for the column being forecast.
    if matches!(target, Target::RetailSales | Target::NonRetailSales) {
        if let Some(lag_date) = date.checked_sub_months(Months::new(12)) {
            if let Some(value) = history.value_at(target.column(), lag_date) {
                row.set(schema::lag_column(target.column(), 12), value);
            }
        }
    }

    row
}
