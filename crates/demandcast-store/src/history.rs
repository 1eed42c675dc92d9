//! CSV-backed history source.
//!
//! One file per region, `<data_dir>/<region>_pr.csv`, with a `date`
//! column in day-first format and any number of numeric columns. Blank
//! cells are missing values, not zeros.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use tracing::info;

use demandcast_core::{FeatureRow, ForecastError, HistorySource, HistoryTable, Result};

use crate::validate_region;

/// Date formats accepted in the `date` column, tried in order.
const DATE_FORMATS: [&str; 2] = ["%d-%m-%Y", "%Y-%m-%d"];

/// Loads region histories from a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvHistorySource {
    data_dir: PathBuf,
}

impl CsvHistorySource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the history file for `region`.
    pub fn history_path(&self, region: &str) -> PathBuf {
        self.data_dir.join(format!("{region}_pr.csv"))
    }
}

impl HistorySource for CsvHistorySource {
    fn load_history(&self, region: &str) -> Result<HistoryTable> {
        validate_region(region)?;
        let path = self.history_path(region);
        if !path.exists() {
            return Err(ForecastError::DataNotFound(path.display().to_string()));
        }
        let table = read_history_csv(&path)?;
        info!(region, rows = table.len(), path = %path.display(), "loaded history");
        Ok(table)
    }
}

fn read_history_csv(path: &Path) -> Result<HistoryTable> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| ForecastError::DataMalformed(format!("{}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| ForecastError::DataMalformed(format!("{}: {e}", path.display())))?
        .clone();
    let date_idx = headers.iter().position(|h| h == "date").ok_or_else(|| {
        ForecastError::DataMalformed(format!(
            "{}: expected a 'date' column, found: {:?}",
            path.display(),
            headers.iter().collect::<Vec<_>>()
        ))
    })?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| ForecastError::DataMalformed(format!("{}: {e}", path.display())))?;
        let date_cell = record.get(date_idx).unwrap_or("");
        let date = parse_date(date_cell).ok_or_else(|| {
            ForecastError::DataMalformed(format!(
                "{} row {}: unparseable date '{date_cell}'",
                path.display(),
                line + 2
            ))
        })?;

        let mut row = FeatureRow::new(date);
        for (idx, cell) in record.iter().enumerate() {
            if idx == date_idx || cell.is_empty() {
                continue;
            }
            let Some(name) = headers.get(idx) else {
                continue;
            };
            let value: f64 = cell.parse().map_err(|_| {
                ForecastError::DataMalformed(format!(
                    "{} row {}: column '{name}' has non-numeric value '{cell}'",
                    path.display(),
                    line + 2
                ))
            })?;
            // NaN spellings in the file stay missing.
            if value.is_nan() {
                continue;
            }
            row.set(name, value);
        }
        rows.push(row);
    }

    HistoryTable::new(rows)
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, region: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(format!("{region}_pr.csv"))).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_sorts_and_parses_dayfirst() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "mumbai",
            "date, retail_sales ,non_retail_sales\n\
             01-02-2024,1100,510\n\
             01-01-2024,1000,500\n",
        );
        let source = CsvHistorySource::new(dir.path());
        let table = source.load_history("mumbai").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.latest_date(),
            Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );
        // Header whitespace trimmed; rows sorted ascending.
        assert_eq!(
            table.value_at("retail_sales", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Some(1000.0)
        );
    }

    #[test]
    fn test_blank_cells_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "delhi",
            "date,retail_sales,stock_var\n\
             01-01-2024,1000,\n\
             01-02-2024,,75\n",
        );
        let table = CsvHistorySource::new(dir.path()).load_history("delhi").unwrap();
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(table.value_at("stock_var", jan), None);
        assert_eq!(table.value_at("retail_sales", feb), None);
        assert_eq!(table.value_at("stock_var", feb), Some(75.0));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvHistorySource::new(dir.path())
            .load_history("chennai")
            .unwrap_err();
        assert!(matches!(err, ForecastError::DataNotFound(_)));
    }

    #[test]
    fn test_missing_date_column_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "chennai", "month,retail_sales\njan,1\n");
        let err = CsvHistorySource::new(dir.path())
            .load_history("chennai")
            .unwrap_err();
        match err {
            ForecastError::DataMalformed(msg) => assert!(msg.contains("'date' column")),
            other => panic!("expected DataMalformed, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_cell_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "durgapur",
            "date,retail_sales\n01-01-2024,lots\n",
        );
        let err = CsvHistorySource::new(dir.path())
            .load_history("durgapur")
            .unwrap_err();
        assert!(matches!(err, ForecastError::DataMalformed(_)));
    }

    #[test]
    fn test_iso_dates_accepted() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "mumbai", "date,x\n2024-03-01,5\n");
        let table = CsvHistorySource::new(dir.path()).load_history("mumbai").unwrap();
        assert_eq!(
            table.latest_date(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_invalid_region_rejected_before_io() {
        let err = CsvHistorySource::new("/nonexistent")
            .load_history("../secrets")
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }
}
