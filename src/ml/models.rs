//! ML Model Definitions
//!
//! Concrete regression models and the serialized artifact that wraps them.

use super::{FeatureVector, ModelMetadata, ModelType, Prediction, ValidationMetrics};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Trait for ML models
///
/// Implementations must be pure with respect to `predict`: a loaded model is
/// shared read-only between concurrently served requests.
pub trait MLModel: Send + Sync {
    /// Predict a value from features
    fn predict(&self, features: &FeatureVector) -> Result<Prediction>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Get model type
    fn model_type(&self) -> ModelType {
        self.metadata().model_type
    }
}

/// Simple Linear Regression Model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub metadata: ModelMetadata,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, metadata: ModelMetadata) -> Self {
        Self {
            metadata,
            coefficients,
            intercept,
        }
    }

    /// Build a model over named features with default metadata
    pub fn with_features(feature_names: &[&str], coefficients: Vec<f64>, intercept: f64) -> Self {
        let metadata = ModelMetadata {
            model_id: "linear".to_string(),
            model_type: ModelType::LinearRegression,
            version: "0.1.0".to_string(),
            trained_at: None,
            training_samples: 0,
            validation_metrics: Some(ValidationMetrics {
                mae: 0.0,
                rmse: 0.0,
                r2: 1.0,
            }),
            feature_names: feature_names.iter().map(|name| name.to_string()).collect(),
        };

        Self::new(coefficients, intercept, metadata)
    }

    /// Reject artifacts that could never produce a finite prediction
    pub fn validate(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            anyhow::bail!("Linear model has no coefficients");
        }
        if !self.metadata.feature_names.is_empty()
            && self.metadata.feature_names.len() != self.coefficients.len()
        {
            anyhow::bail!(
                "Linear model declares {} features but has {} coefficients",
                self.metadata.feature_names.len(),
                self.coefficients.len()
            );
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            anyhow::bail!("Linear model has non-finite parameters");
        }
        Ok(())
    }
}

impl MLModel for LinearRegressionModel {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        if features.len() != self.coefficients.len() {
            anyhow::bail!(
                "Feature count mismatch: expected {}, got {}",
                self.coefficients.len(),
                features.len()
            );
        }

        let prediction: f64 = features
            .features
            .iter()
            .zip(self.coefficients.iter())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept;

        Ok(Prediction::new(prediction))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// Encoding of a model artifact on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Bincode,
}

impl ArtifactFormat {
    /// `.json` files are JSON, everything else is bincode
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Bincode,
        }
    }
}

/// A serialized, trained model
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArtifact {
    LinearRegression(LinearRegressionModel),
    #[cfg(feature = "ml")]
    RandomForest(super::smartcore::SmartcoreRandomForest),
}

impl ModelArtifact {
    pub fn metadata(&self) -> &ModelMetadata {
        match self {
            Self::LinearRegression(model) => &model.metadata,
            #[cfg(feature = "ml")]
            Self::RandomForest(model) => &model.metadata,
        }
    }

    pub fn decode(bytes: &[u8], format: ArtifactFormat) -> Result<Self> {
        match format {
            ArtifactFormat::Json => {
                serde_json::from_slice(bytes).context("Failed to decode JSON model artifact")
            }
            ArtifactFormat::Bincode => {
                bincode::deserialize(bytes).context("Failed to decode bincode model artifact")
            }
        }
    }

    pub fn encode(&self, format: ArtifactFormat) -> Result<Vec<u8>> {
        match format {
            ArtifactFormat::Json => {
                serde_json::to_vec_pretty(self).context("Failed to encode JSON model artifact")
            }
            ArtifactFormat::Bincode => {
                bincode::serialize(self).context("Failed to encode bincode model artifact")
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
        Self::decode(&bytes, ArtifactFormat::from_path(path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = self.encode(ArtifactFormat::from_path(path))?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write model artifact {}", path.display()))
    }

    /// Turn the artifact into a shareable predictor
    pub fn into_model(self) -> Result<Arc<dyn MLModel>> {
        match self {
            Self::LinearRegression(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
            #[cfg(feature = "ml")]
            Self::RandomForest(mut model) => {
                model.restore_from_serialization()?;
                Ok(Arc::new(model))
            }
        }
    }
}
