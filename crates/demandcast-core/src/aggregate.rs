//! National aggregation and cross-month reallocation.
//!
//! Per-region composites are merged into one national table, then two
//! business rules run in a single forward pass over the months:
//!
//! * Rule 1 — a month whose summed total sales falls below the floor
//!   carries the shortfall into the *next* month's stock variance.
//! * Rule 2 — a month whose summed stock variance (after any Rule 1
//!   addition) exceeds the ceiling redistributes the excess into the
//!   regions' non-retail sales, proportional to each region's share of
//!   the month's total sales.
//!
//! Both rules mutate the working rows, so later months see the updated
//! values. Inputs are merged in canonical (region, date) order to keep
//! the pass deterministic however the per-region forecasts were
//! computed.

use chrono::NaiveDate;
use tracing::info;

use crate::driver::Forecaster;
use crate::error::{ForecastError, Result};
use crate::model::{HistorySource, ModelSource};

/// Rule 1 floor: months selling below this carry the shortfall forward.
pub const TOTAL_SALES_FLOOR: f64 = 275_000.0;
/// Rule 2 ceiling: stock variance above this is redistributed.
pub const STOCK_VAR_CEILING: f64 = 250_000.0;

/// One region's composed forecast for one month, as a working row of
/// the national table.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMonth {
    pub region: String,
    pub date: NaiveDate,
    pub retail_sales: f64,
    pub non_retail_sales: f64,
    pub total_sales: f64,
    pub stock_var: f64,
}

/// National totals for one month, after reallocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedMonth {
    pub date: NaiveDate,
    pub total_sales: f64,
    pub retail_sales: f64,
    pub non_retail_sales: f64,
    pub stock_var: f64,
}

/// Chronological national forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSeries {
    pub months: Vec<AggregatedMonth>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Apply Rule 1 and Rule 2 in one forward pass over `rows`.
///
/// `rows` must already be in canonical (region, date) order; the pass
/// walks months chronologically over the union of dates present.
pub fn reallocate(rows: &mut [RegionMonth]) {
    let mut dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    dates.sort_unstable();
    dates.dedup();

    for (idx, &date) in dates.iter().enumerate() {
        let total_sales: f64 = rows
            .iter()
            .filter(|r| r.date == date)
            .map(|r| r.total_sales)
            .sum();

        // Rule 1: shortfall carries into the next month's stock
        // variance. Split equally over that month's region rows so the
        // month's stock sum grows by exactly the shortfall. No next
        // month, no carry.
        if total_sales < TOTAL_SALES_FLOOR && idx + 1 < dates.len() {
            let shortfall = TOTAL_SALES_FLOOR - total_sales;
            let next = dates[idx + 1];
            let n_next = rows.iter().filter(|r| r.date == next).count();
            if n_next > 0 {
                let share = shortfall / n_next as f64;
                info!(%date, shortfall, "total sales below floor, carrying into next month stock");
                for row in rows.iter_mut().filter(|r| r.date == next) {
                    row.stock_var += share;
                }
            }
        }

        // Rule 2: stock excess (including anything Rule 1 added to this
        // month on an earlier iteration) flows into non-retail sales,
        // proportional to total-sales share. A zero-sales month cannot
        // define shares, so the rule is a no-op there.
        let stock_sum: f64 = rows
            .iter()
            .filter(|r| r.date == date)
            .map(|r| r.stock_var)
            .sum();
        if stock_sum > STOCK_VAR_CEILING && total_sales > 0.0 {
            let excess = stock_sum - STOCK_VAR_CEILING;
            info!(%date, excess, "stock variance above ceiling, redistributing");
            for row in rows.iter_mut().filter(|r| r.date == date) {
                row.non_retail_sales += excess * row.total_sales / total_sales;
            }
        }
    }
}

/// Sum the working rows into one aggregate per month, chronologically.
pub fn summarize(rows: &[RegionMonth]) -> AggregatedSeries {
    let mut dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    dates.sort_unstable();
    dates.dedup();

    let months = dates
        .into_iter()
        .map(|date| {
            let mut month = AggregatedMonth {
                date,
                total_sales: 0.0,
                retail_sales: 0.0,
                non_retail_sales: 0.0,
                stock_var: 0.0,
            };
            for row in rows.iter().filter(|r| r.date == date) {
                month.total_sales += row.total_sales;
                month.retail_sales += row.retail_sales;
                month.non_retail_sales += row.non_retail_sales;
                month.stock_var += row.stock_var;
            }
            month
        })
        .collect();

    AggregatedSeries { months }
}

impl<H: HistorySource, M: ModelSource> Forecaster<H, M> {
    /// National forecast across `regions` over `months`.
    ///
    /// Refuses to run unless every region's history ends on the same
    /// date: aggregating regions observed through different months
    /// would silently skew the sums. Any single region's forecast
    /// failure aborts the whole national run for the same reason.
    pub fn forecast_national(&self, regions: &[&str], months: usize) -> Result<AggregatedSeries> {
        if regions.is_empty() {
            return Err(ForecastError::InvalidInput(
                "national forecast needs at least one region".to_string(),
            ));
        }

        // Canonical region order makes the merge and rule pass
        // deterministic regardless of caller ordering.
        let mut ordered: Vec<&str> = regions.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        // Sync gate before any forecasting work.
        let mut expected: Option<NaiveDate> = None;
        for &region in &ordered {
            let history = self.history_source().load_history(region)?;
            let latest = history.latest_date().ok_or_else(|| {
                ForecastError::DataMalformed(format!("region '{region}' has an empty history"))
            })?;
            match expected {
                None => expected = Some(latest),
                Some(exp) if exp != latest => {
                    return Err(ForecastError::RegionDateMismatch {
                        expected: exp,
                        region: region.to_string(),
                        found: latest,
                    });
                }
                Some(_) => {}
            }
        }

        info!(regions = ordered.len(), months, "starting national forecast");

        let mut rows: Vec<RegionMonth> = Vec::new();
        for &region in &ordered {
            let composite = self.forecast_totals(region, months)?;
            rows.extend(composite.records.iter().map(|r| RegionMonth {
                region: region.to_string(),
                date: r.date,
                retail_sales: r.retail_sales,
                non_retail_sales: r.non_retail_sales,
                total_sales: r.total_sales,
                stock_var: r.stock_var,
            }));
        }
        rows.sort_by(|a, b| (&a.region, a.date).cmp(&(&b.region, b.date)));

        reallocate(&mut rows);
        Ok(summarize(&rows))
    }
}
