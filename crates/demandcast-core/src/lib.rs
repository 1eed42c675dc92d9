//! Core engine for the demandcast sales forecasting service.
//!
//! Forecasts monthly sales metrics for regional entities with frozen
//! per-region regression models: future driver variables are simulated
//! by linear trend, feature rows are synthesized recursively month by
//! month, and per-region forecasts compose into a national series with
//! cross-month reallocation rules.
//!
//! Persistence (history tables, serialized models) lives behind the
//! [`HistorySource`] and [`ModelSource`] traits; this crate performs no
//! file I/O of its own.

pub mod aggregate;
pub mod compose;
pub mod driver;
pub mod error;
pub mod features;
pub mod model;
pub mod schema;
pub mod simulate;
pub mod table;

// Re-exports for convenience
pub use aggregate::{
    reallocate, summarize, AggregatedMonth, AggregatedSeries, RegionMonth, STOCK_VAR_CEILING,
    TOTAL_SALES_FLOOR,
};
pub use compose::{CompositeRecord, RegionComposite, StockVarOutcome};
pub use driver::{monthly_dates, ForecastRecord, ForecastSeries, Forecaster};
pub use error::{ForecastError, Result};
pub use features::synthesize_row;
pub use model::{HistorySource, Model, ModelInput, ModelSource, Target};
pub use simulate::{simulate_drivers, DriverMonth, DriverTrend};
pub use table::{FeatureRow, HistoryTable};
