//! Feature schema contract.
//!
//! Every feature name used across the engine is declared here, so the
//! synthesizer, the forecast driver, and the stored models all agree on
//! one explicit naming contract instead of ad-hoc string matching.

/// Simulated exogenous driver: average primary-market price.
pub const PRIMARY_PRICE_AVG: &str = "primary_price_avg";
/// Simulated exogenous driver: average secondary-market price.
pub const SECONDARY_PRICE_AVG: &str = "secondary_price_avg";
/// Simulated exogenous driver: stock variance.
pub const STOCK_VAR: &str = "stock_var";
/// Derived: primary minus secondary price.
pub const PRICE_DIFF: &str = "price_diff";

/// Observed target: retail sales.
pub const RETAIL_SALES: &str = "retail_sales";
/// Observed target: non-retail sales.
pub const NON_RETAIL_SALES: &str = "non_retail_sales";
/// Composed target: retail plus non-retail sales.
pub const TOTAL_SALES: &str = "total_sales";

/// Calendar encodings.
pub const MONTH_SIN: &str = "month_sin";
pub const MONTH_COS: &str = "month_cos";
pub const YEAR: &str = "year";
pub const QUARTER: &str = "quarter";

/// Monotonically increasing per-row index, never reused.
pub const TREND_INDEX: &str = "trend_index";

/// Mean of the trailing six non-retail observations.
pub const NON_RETAIL_SALES_CUSTOM_AVG: &str = "non_retail_sales_custom_avg";

/// Driver columns that must be fully observed for trend simulation.
pub const DRIVER_COLUMNS: [&str; 3] = [PRIMARY_PRICE_AVG, SECONDARY_PRICE_AVG, STOCK_VAR];

/// Columns that get exact-date lag features.
pub const LAG_COLUMNS: [&str; 5] = [
    RETAIL_SALES,
    NON_RETAIL_SALES,
    PRIMARY_PRICE_AVG,
    SECONDARY_PRICE_AVG,
    PRICE_DIFF,
];

/// Lag offsets, in months, generated for every lag column.
pub const LAG_MONTHS: [u32; 3] = [1, 2, 3];

/// Columns that get trailing 3-row rolling means.
pub const ROLL_COLUMNS: [&str; 4] = [
    PRIMARY_PRICE_AVG,
    SECONDARY_PRICE_AVG,
    RETAIL_SALES,
    NON_RETAIL_SALES,
];

/// Name of the lag-`months` feature for `column`.
pub fn lag_column(column: &str, months: u32) -> String {
    format!("{column}_lag_{months}")
}

/// Name of the trailing 3-row rolling mean for `column`.
pub fn roll3_column(column: &str) -> String {
    format!("{column}_roll3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        assert_eq!(lag_column(RETAIL_SALES, 1), "retail_sales_lag_1");
        assert_eq!(lag_column(PRICE_DIFF, 12), "price_diff_lag_12");
        assert_eq!(roll3_column(NON_RETAIL_SALES), "non_retail_sales_roll3");
    }
}
