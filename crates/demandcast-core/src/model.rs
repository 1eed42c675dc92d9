//! Forecast targets and collaborator interfaces.
//!
//! History and model persistence live outside the engine; the driver
//! talks to them through [`HistorySource`] and [`ModelSource`]. A
//! [`Model`] is a frozen, already-trained regressor: the engine only
//! runs inference.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ForecastError, Result};
use crate::schema;
use crate::table::HistoryTable;

/// The dependent variable being forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    RetailSales,
    NonRetailSales,
    StockVar,
    /// Retail plus non-retail; composed from the two underlying
    /// forecasts, never modelled directly.
    TotalSales,
}

impl Target {
    /// The three directly-modelled targets, in canonical order.
    pub const MODELLED: [Target; 3] = [Target::RetailSales, Target::NonRetailSales, Target::StockVar];

    /// Column name of this target in a history table.
    pub fn column(&self) -> &'static str {
        match self {
            Target::RetailSales => schema::RETAIL_SALES,
            Target::NonRetailSales => schema::NON_RETAIL_SALES,
            Target::StockVar => schema::STOCK_VAR,
            Target::TotalSales => schema::TOTAL_SALES,
        }
    }

    /// Column name used for this target in forecast output rows.
    pub fn predicted_column(&self) -> String {
        format!("predicted_{}", self.column())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Target {
    type Err = ForecastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "retail_sales" | "retail" => Ok(Target::RetailSales),
            "non_retail_sales" | "non_retail" => Ok(Target::NonRetailSales),
            "stock_var" | "stock" => Ok(Target::StockVar),
            "total_sales" | "total" => Ok(Target::TotalSales),
            _ => Err(ForecastError::InvalidInput(format!(
                "unknown forecast target: {s}"
            ))),
        }
    }
}

/// Named feature vector assembled by the driver for one prediction.
pub type ModelInput = HashMap<String, f64>;

/// A frozen trained regressor for one (region, target) pair.
pub trait Model: std::fmt::Debug {
    /// Feature names the model must be given, in declaration order.
    fn required_features(&self) -> &[String];

    /// Predict the target value from a complete named feature vector.
    fn predict(&self, input: &ModelInput) -> Result<f64>;
}

/// Collaborator that loads a region's observation history.
///
/// Implementations must return rows sorted by date ascending with
/// unique dates, or a typed `DataNotFound` / `DataMalformed` error.
pub trait HistorySource {
    fn load_history(&self, region: &str) -> Result<HistoryTable>;
}

/// Collaborator that loads the frozen model for a (region, target).
pub trait ModelSource {
    fn load_model(&self, region: &str, target: Target) -> Result<Box<dyn Model>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!("retail_sales".parse::<Target>().unwrap(), Target::RetailSales);
        assert_eq!("NON_RETAIL".parse::<Target>().unwrap(), Target::NonRetailSales);
        assert_eq!("stock_var".parse::<Target>().unwrap(), Target::StockVar);
        assert_eq!("total_sales".parse::<Target>().unwrap(), Target::TotalSales);
        assert!("margin".parse::<Target>().is_err());
    }

    #[test]
    fn test_predicted_column_names() {
        assert_eq!(Target::RetailSales.predicted_column(), "predicted_retail_sales");
        assert_eq!(Target::TotalSales.predicted_column(), "predicted_total_sales");
    }

    #[test]
    fn test_display_matches_column() {
        for target in Target::MODELLED {
            assert_eq!(target.to_string(), target.column());
        }
    }
}
