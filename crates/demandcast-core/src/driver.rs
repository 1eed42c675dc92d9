//! Recursive month-by-month forecast driver.
//!
//! The driver owns the loop that makes multi-step forecasting work:
//! simulate future drivers, synthesize one feature row per horizon
//! month (each row's lags reading the rows synthesized before it),
//! forward-fill what is still missing, then run the frozen model over
//! the synthesized rows in order.
//!
//! Prediction deliberately happens *after* all rows are synthesized and
//! filled, matching the recorded behavior of the system this replaces:
//! a synthesized row's lag features reference earlier synthesized
//! feature values, not earlier prediction outputs.

use chrono::{Months, NaiveDate};
use tracing::{info, warn};

use crate::error::{ForecastError, Result};
use crate::features::synthesize_row;
use crate::model::{HistorySource, ModelInput, ModelSource, Target};
use crate::simulate::simulate_drivers;

/// One predicted month for a single target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub value: f64,
}

/// Chronological predictions for one (region, target) pair.
///
/// May be shorter than the requested horizon: months whose feature rows
/// stayed incomplete after substitution are skipped, not invented.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub region: String,
    pub target: Target,
    pub records: Vec<ForecastRecord>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Predicted value at an exact date, if that month was not skipped.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.date == date)
            .map(|r| r.value)
    }
}

/// Consecutive first-of-month dates: `start`, `start + 1 month`, ...
pub fn monthly_dates(start: NaiveDate, months: usize) -> Result<Vec<NaiveDate>> {
    (0..months)
        .map(|i| {
            start
                .checked_add_months(Months::new(i as u32))
                .ok_or_else(|| {
                    ForecastError::InvalidInput(format!(
                        "future date overflow from {start} + {i} months"
                    ))
                })
        })
        .collect()
}

/// Forecasting engine bound to a history source and a model source.
pub struct Forecaster<H, M> {
    history: H,
    models: M,
}

impl<H: HistorySource, M: ModelSource> Forecaster<H, M> {
    pub fn new(history: H, models: M) -> Self {
        Self { history, models }
    }

    pub(crate) fn history_source(&self) -> &H {
        &self.history
    }

    /// Forecast `months` future months of `target` for `region`.
    ///
    /// For the composed [`Target::TotalSales`] this delegates to the
    /// multi-target composer; the recursive loop itself only runs on
    /// directly-modelled targets.
    pub fn forecast(&self, region: &str, target: Target, months: usize) -> Result<ForecastSeries> {
        if target == Target::TotalSales {
            let composite = self.forecast_totals(region, months)?;
            return Ok(ForecastSeries {
                region: region.to_string(),
                target,
                records: composite
                    .records
                    .iter()
                    .map(|r| ForecastRecord {
                        date: r.date,
                        value: r.total_sales,
                    })
                    .collect(),
            });
        }

        if months == 0 {
            return Err(ForecastError::InvalidInput(
                "forecast horizon must be at least 1 month".to_string(),
            ));
        }

        info!(region, %target, months, "starting recursive forecast");

        let mut working = self.history.load_history(region)?;
        let latest = working
            .latest_date()
            .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;
        info!(region, %latest, "loaded history");

        let first_future = latest.checked_add_months(Months::new(1)).ok_or_else(|| {
            ForecastError::InvalidInput(format!("cannot advance past latest date {latest}"))
        })?;
        let future_dates = monthly_dates(first_future, months)?;

        let trend = simulate_drivers(&working, months)?;
        let model = self.models.load_model(region, target)?;

        // Synthesize every horizon row before any prediction. Month i+1
        // reads month i's synthesized features through the table.
        let history_len = working.len();
        for (i, &date) in future_dates.iter().enumerate() {
            let row = synthesize_row(&working, target, &trend.month(i), date);
            working.append(row)?;
        }

        // Repair lag cells that pointed at dates with no row. Runs once
        // over the full working history, after all rows exist.
        working.forward_fill();

        let required = model.required_features().to_vec();
        // Substitution source for features a synthesized row never got:
        // the last row before the forecast window, post-fill.
        let last_known = &working.rows()[history_len - 1];

        let mut records = Vec::with_capacity(months);
        for row in &working.rows()[history_len..] {
            let mut input = ModelInput::with_capacity(required.len());
            let mut unresolved: Vec<&str> = Vec::new();

            for name in &required {
                match row.get(name) {
                    Some(value) => {
                        input.insert(name.clone(), value);
                    }
                    None => match last_known.get(name) {
                        Some(value) => {
                            warn!(
                                date = %row.date(),
                                feature = %name,
                                value,
                                "missing feature, substituting last known value"
                            );
                            input.insert(name.clone(), value);
                        }
                        None => unresolved.push(name),
                    },
                }
            }

            if !unresolved.is_empty() {
                warn!(
                    date = %row.date(),
                    features = ?unresolved,
                    "skipping month: required features unavailable"
                );
                continue;
            }

            let value = model.predict(&input)?;
            info!(region, %target, date = %row.date(), value, "forecasted month");
            records.push(ForecastRecord {
                date: row.date(),
                value,
            });
        }

        info!(
            region,
            %target,
            predicted = records.len(),
            requested = months,
            "recursive forecast complete"
        );
        Ok(ForecastSeries {
            region: region.to_string(),
            target,
            records,
        })
    }
}
