//! Error types for the forecasting engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Error types for forecast operations.
///
/// All fatal conditions surface as one of these variants; partial
/// failures (a single skipped month, a missing stock-var model) are
/// reported through result types instead of errors.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Data not found: {0}")]
    DataNotFound(String),

    #[error("Malformed data: {0}")]
    DataMalformed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Driver simulation failed: column '{column}' is missing or has null values")]
    SimulationFailed { column: String },

    #[error(
        "Region histories out of sync: expected latest date {expected}, \
         region '{region}' ends at {found}. Fill the missing months before \
         running a national forecast."
    )]
    RegionDateMismatch {
        expected: NaiveDate,
        region: String,
        found: NaiveDate,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForecastError::DataNotFound("data/mumbai_pr.csv".into());
        assert_eq!(format!("{}", err), "Data not found: data/mumbai_pr.csv");

        let err = ForecastError::SimulationFailed {
            column: "stock_var".into(),
        };
        assert_eq!(
            format!("{}", err),
            "Driver simulation failed: column 'stock_var' is missing or has null values"
        );

        let err = ForecastError::InsufficientData { needed: 2, got: 0 };
        assert_eq!(
            format!("{}", err),
            "Insufficient data: need at least 2 observations, got 0"
        );
    }

    #[test]
    fn test_region_mismatch_is_actionable() {
        let err = ForecastError::RegionDateMismatch {
            expected: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            region: "chennai".into(),
            found: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("chennai"));
        assert!(msg.contains("2024-05-01"));
        assert!(msg.contains("Fill the missing months"));
    }
}
