//! Machine Learning Module
//!
//! Inference-side plumbing for the generation forecaster:
//! - Feature vectors handed to a regression model
//! - Model trait and the on-disk artifact formats
//! - The process-wide model handle, loaded once at startup
//!
//! Training happens elsewhere; this crate only loads and evaluates artifacts.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod inference;
pub mod models;

#[cfg(feature = "ml")]
pub mod smartcore;

pub use inference::{load_model, ModelHandle};
pub use models::{LinearRegressionModel, MLModel, ModelArtifact};

/// ML Model Type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    LinearRegression,
    RandomForest,
    GradientBoosting,
}

/// ML Model Metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub model_type: ModelType,
    pub version: String,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub training_samples: usize,
    #[serde(default)]
    pub validation_metrics: Option<ValidationMetrics>,
    /// Column order the model was trained on; empty means "not recorded"
    #[serde(default)]
    pub feature_names: Vec<String>,
}

/// Validation Metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub r2: f64,   // R-squared
}

/// Feature Vector for ML models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureVector {
    pub fn new(features: Vec<f64>, feature_names: Vec<String>) -> Result<Self> {
        if features.len() != feature_names.len() {
            anyhow::bail!(
                "Feature count mismatch: {} features, {} names",
                features.len(),
                feature_names.len()
            );
        }
        Ok(Self {
            features,
            feature_names,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// ML Prediction Result
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Prediction {
    pub value: f64,
}

impl Prediction {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_creation() {
        let features = vec![1.0, 2.0, 3.0];
        let names = vec!["f1".to_string(), "f2".to_string(), "f3".to_string()];

        let fv = FeatureVector::new(features, names).unwrap();
        assert_eq!(fv.len(), 3);
        assert!(!fv.is_empty());
    }

    #[test]
    fn test_feature_vector_rejects_mismatch() {
        let result = FeatureVector::new(vec![1.0, 2.0], vec!["f1".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_optional_fields_default() {
        let json = r#"{"model_id": "m", "model_type": "linear_regression", "version": "1"}"#;
        let metadata: ModelMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.model_type, ModelType::LinearRegression);
        assert!(metadata.trained_at.is_none());
        assert!(metadata.feature_names.is_empty());
    }
}
