//! Exogenous driver simulation.
//!
//! Future values of the driver variables (prices, stock variance) are
//! not observed, so they are extrapolated with a per-column OLS line
//! over the 0..n time index. Deterministic trend projection only: no
//! seasonality, no intervals.

use anofox_regression::prelude::*;
use tracing::{info, warn};

use crate::error::{ForecastError, Result};
use crate::schema;
use crate::table::HistoryTable;

/// Simulated driver values for a full forecast horizon, aligned 1:1
/// with the future date sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverTrend {
    pub primary_price: Vec<f64>,
    pub secondary_price: Vec<f64>,
    pub stock_var: Vec<f64>,
}

/// One month's slice of a [`DriverTrend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverMonth {
    pub primary_price: f64,
    pub secondary_price: f64,
    pub stock_var: f64,
}

impl DriverTrend {
    /// Horizon length in months.
    pub fn horizon(&self) -> usize {
        self.primary_price.len()
    }

    /// Driver values for horizon month `i` (0-based).
    pub fn month(&self, i: usize) -> DriverMonth {
        DriverMonth {
            primary_price: self.primary_price[i],
            secondary_price: self.secondary_price[i],
            stock_var: self.stock_var[i],
        }
    }
}

/// Extrapolate all driver columns `horizon` months past the end of
/// `history`.
///
/// Fails fast with [`ForecastError::SimulationFailed`] if any driver
/// column is absent or holds a null anywhere in the history: a partial
/// driver series cannot seed a trustworthy forecast.
pub fn simulate_drivers(history: &HistoryTable, horizon: usize) -> Result<DriverTrend> {
    if horizon == 0 {
        return Err(ForecastError::InvalidInput(
            "forecast horizon must be at least 1 month".to_string(),
        ));
    }
    if history.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: history.len(),
        });
    }

    info!(rows = history.len(), horizon, "simulating future driver values");

    let mut trends: Vec<Vec<f64>> = Vec::with_capacity(schema::DRIVER_COLUMNS.len());
    for column in schema::DRIVER_COLUMNS {
        let observed: Vec<f64> = history
            .column(column)
            .into_iter()
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| ForecastError::SimulationFailed {
                column: column.to_string(),
            })?;
        trends.push(extrapolate_trend(column, &observed, horizon));
    }

    let mut iter = trends.into_iter();
    Ok(DriverTrend {
        primary_price: iter.next().unwrap_or_default(),
        secondary_price: iter.next().unwrap_or_default(),
        stock_var: iter.next().unwrap_or_default(),
    })
}

/// Fit value ~ time_index by OLS and evaluate the line at the horizon
/// indices n..n+horizon-1.
fn extrapolate_trend(column: &str, values: &[f64], horizon: usize) -> Vec<f64> {
    let n = values.len();

    let x_mat = faer::Mat::from_fn(n, 1, |i, _| i as f64);
    let y_col = faer::Col::from_fn(n, |i| values[i]);

    let fit = OlsRegressor::builder()
        .with_intercept(true)
        .build()
        .fit(&x_mat, &y_col);

    match fit {
        Ok(fitted) => {
            let intercept = fitted.intercept().unwrap_or(0.0);
            let coeffs = fitted.coefficients();
            let slope = if coeffs.nrows() > 0 { coeffs[0] } else { 0.0 };
            (n..n + horizon)
                .map(|t| intercept + slope * t as f64)
                .collect()
        }
        Err(_) => {
            // Solver rejected the series; extend flat at the last
            // observed value instead of forecasting zeros.
            let last = values.last().copied().unwrap_or(0.0);
            warn!(column, last, "OLS fit failed, extending driver flat");
            vec![last; horizon]
        }
    }
}
