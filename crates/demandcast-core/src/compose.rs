//! Multi-target composition for a single region.
//!
//! Total sales is never modelled directly: it is the sum of the retail
//! and non-retail forecasts, joined on date. A stock-variance forecast
//! is attached when available; its absence degrades to zeros with the
//! cause recorded, never to an aborted composite.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::driver::Forecaster;
use crate::error::{ForecastError, Result};
use crate::model::{HistorySource, ModelSource, Target};

/// One composed month for a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeRecord {
    pub date: NaiveDate,
    pub retail_sales: f64,
    pub non_retail_sales: f64,
    pub total_sales: f64,
    pub stock_var: f64,
}

/// How the stock-variance column of a composite was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockVarOutcome {
    /// A stock-var model existed and its forecast was used.
    Forecast,
    /// No stock-var model for this region; zeros substituted.
    MissingModel,
    /// The stock-var forecast errored; zeros substituted. The message
    /// records which branch failed.
    Failed(String),
}

/// Composed retail + non-retail + stock forecast for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionComposite {
    pub region: String,
    pub records: Vec<CompositeRecord>,
    pub stock_var: StockVarOutcome,
}

impl<H: HistorySource, M: ModelSource> Forecaster<H, M> {
    /// Compose the total-sales forecast for `region` over `months`.
    ///
    /// Retail and non-retail are forecast independently and inner-joined
    /// on date, so only months predicted by both survive. Either of
    /// those failing fails the composite.
    pub fn forecast_totals(&self, region: &str, months: usize) -> Result<RegionComposite> {
        let retail = self.forecast(region, Target::RetailSales, months)?;
        let non_retail = self.forecast(region, Target::NonRetailSales, months)?;

        let (stock, stock_outcome) = match self.forecast(region, Target::StockVar, months) {
            Ok(series) => (Some(series), StockVarOutcome::Forecast),
            Err(ForecastError::DataNotFound(detail)) => {
                warn!(region, %detail, "no stock_var model, substituting zero");
                (None, StockVarOutcome::MissingModel)
            }
            Err(err) => {
                warn!(region, %err, "stock_var forecast failed, substituting zero");
                (None, StockVarOutcome::Failed(err.to_string()))
            }
        };

        let records: Vec<CompositeRecord> = retail
            .records
            .iter()
            .filter_map(|r| {
                let non_retail_value = non_retail.value_on(r.date)?;
                let stock_value = stock
                    .as_ref()
                    .and_then(|s| s.value_on(r.date))
                    .unwrap_or(0.0);
                Some(CompositeRecord {
                    date: r.date,
                    retail_sales: r.value,
                    non_retail_sales: non_retail_value,
                    total_sales: r.value + non_retail_value,
                    stock_var: stock_value,
                })
            })
            .collect();

        info!(region, months = records.len(), "composed total-sales forecast");
        Ok(RegionComposite {
            region: region.to_string(),
            records,
            stock_var: stock_outcome,
        })
    }
}
