//! JSON-backed frozen model source.
//!
//! Trained regressors are exported as flat JSON files, one per
//! (region, target): feature names, coefficients, and an intercept.
//! Inference is a dot product over the named features, so the engine
//! never depends on the training stack.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use demandcast_core::{ForecastError, Model, ModelInput, ModelSource, Result, Target};

use crate::validate_region;

/// A frozen linear regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Build a model, checking that names and coefficients line up.
    pub fn new(feature_names: Vec<String>, coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        if feature_names.len() != coefficients.len() {
            return Err(ForecastError::DataMalformed(format!(
                "model has {} feature names but {} coefficients",
                feature_names.len(),
                coefficients.len()
            )));
        }
        Ok(Self {
            feature_names,
            coefficients,
            intercept,
        })
    }

    fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| ForecastError::DataNotFound(format!("{}: {e}", path.display())))?;
        let raw: LinearModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ForecastError::DataMalformed(format!("{}: {e}", path.display())))?;
        // Re-run the construction check on deserialized data.
        Self::new(raw.feature_names, raw.coefficients, raw.intercept)
    }
}

impl Model for LinearModel {
    fn required_features(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, input: &ModelInput) -> Result<f64> {
        let mut value = self.intercept;
        for (name, coefficient) in self.feature_names.iter().zip(&self.coefficients) {
            let feature = input.get(name).ok_or_else(|| {
                ForecastError::InvalidInput(format!("model input missing feature '{name}'"))
            })?;
            value += coefficient * feature;
        }
        Ok(value)
    }
}

/// Loads frozen models from a directory of JSON files.
#[derive(Debug, Clone)]
pub struct JsonModelSource {
    model_dir: PathBuf,
}

impl JsonModelSource {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    /// Path of the model file for a (region, target) pair.
    pub fn model_path(&self, region: &str, target: Target) -> PathBuf {
        self.model_dir.join(format!("{region}_{target}.json"))
    }
}

impl ModelSource for JsonModelSource {
    fn load_model(&self, region: &str, target: Target) -> Result<Box<dyn Model>> {
        validate_region(region)?;
        let path = self.model_path(region, target);
        if !path.exists() {
            return Err(ForecastError::DataNotFound(path.display().to_string()));
        }
        let model = LinearModel::from_file(&path)?;
        info!(region, %target, features = model.feature_names.len(), "loaded model");
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_predict_is_dot_product() {
        let model = LinearModel::new(
            vec!["retail_sales_lag_1".into(), "trend_index".into()],
            vec![0.5, 2.0],
            10.0,
        )
        .unwrap();
        let input: ModelInput = [
            ("retail_sales_lag_1".to_string(), 1000.0),
            ("trend_index".to_string(), 25.0),
            ("ignored".to_string(), 1e9),
        ]
        .into_iter()
        .collect();
        assert_relative_eq!(model.predict(&input).unwrap(), 10.0 + 500.0 + 50.0, epsilon = 1e-10);
    }

    #[test]
    fn test_predict_requires_all_features() {
        let model =
            LinearModel::new(vec!["month_sin".into()], vec![1.0], 0.0).unwrap();
        let err = model.predict(&ModelInput::new()).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(matches!(
            LinearModel::new(vec!["a".into()], vec![], 0.0),
            Err(ForecastError::DataMalformed(_))
        ));
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonModelSource::new(dir.path());
        let model = LinearModel::new(
            vec!["retail_sales_lag_1".into()],
            vec![1.1],
            5.0,
        )
        .unwrap();
        let path = source.model_path("mumbai", Target::RetailSales);
        serde_json::to_writer(File::create(&path).unwrap(), &model).unwrap();

        let loaded = source.load_model("mumbai", Target::RetailSales).unwrap();
        assert_eq!(loaded.required_features(), ["retail_sales_lag_1".to_string()]);
        let input: ModelInput = [("retail_sales_lag_1".to_string(), 10.0)].into_iter().collect();
        assert_relative_eq!(loaded.predict(&input).unwrap(), 16.0, epsilon = 1e-10);
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonModelSource::new(dir.path())
            .load_model("mumbai", Target::StockVar)
            .unwrap_err();
        assert!(matches!(err, ForecastError::DataNotFound(_)));
    }

    #[test]
    fn test_malformed_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonModelSource::new(dir.path());
        std::fs::write(
            source.model_path("delhi", Target::RetailSales),
            b"not json at all",
        )
        .unwrap();
        let err = source.load_model("delhi", Target::RetailSales).unwrap_err();
        assert!(matches!(err, ForecastError::DataMalformed(_)));
    }
}
