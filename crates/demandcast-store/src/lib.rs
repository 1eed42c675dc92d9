//! File-backed collaborators for the demandcast engine.
//!
//! Implements the core crate's [`HistorySource`] and [`ModelSource`]
//! traits over the flat-file layout the service uses: one
//! `<region>_pr.csv` history per region and one
//! `<region>_<target>.json` frozen model per (region, target) pair.
//!
//! [`HistorySource`]: demandcast_core::HistorySource
//! [`ModelSource`]: demandcast_core::ModelSource

pub mod history;
pub mod model;

pub use history::CsvHistorySource;
pub use model::{JsonModelSource, LinearModel};

use demandcast_core::{ForecastError, Result};

/// Validate a region identifier before it is spliced into a file name.
///
/// Region names are lowercase `[a-z0-9_]` and non-empty; anything else
/// is rejected rather than resolved against the filesystem.
pub fn validate_region(region: &str) -> Result<()> {
    let ok = !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ForecastError::InvalidInput(format!(
            "invalid region name: '{region}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_validation() {
        assert!(validate_region("mumbai").is_ok());
        assert!(validate_region("west_2").is_ok());
        assert!(validate_region("").is_err());
        assert!(validate_region("Mumbai").is_err());
        assert!(validate_region("../etc").is_err());
        assert!(validate_region("a b").is_err());
    }
}
