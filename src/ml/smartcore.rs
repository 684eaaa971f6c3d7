//! SmartCore ML Model Wrapper
//!
//! Wraps a trained SmartCore `RandomForestRegressor`. The regressor travels
//! inside the artifact as bincode bytes and is restored once at load time.

use super::{FeatureVector, ModelMetadata, Prediction};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// SmartCore RandomForest Model Wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct SmartcoreRandomForest {
    pub metadata: ModelMetadata,
    #[serde(skip)]
    model: Option<Forest>,
    /// Serialized regressor bytes (for persistence)
    model_bytes: Vec<u8>,
}

impl SmartcoreRandomForest {
    /// Wrap a trained regressor, capturing its bytes for persistence
    pub fn new(model: Forest, metadata: ModelMetadata) -> Result<Self> {
        let model_bytes = bincode::serialize(&model)
            .map_err(|e| anyhow::anyhow!("Failed to serialize model: {}", e))?;
        Ok(Self {
            metadata,
            model: Some(model),
            model_bytes,
        })
    }

    /// Restore model from serialized bytes
    pub fn restore_from_serialization(&mut self) -> Result<()> {
        if self.model_bytes.is_empty() {
            anyhow::bail!("Random forest artifact carries no model bytes");
        }
        let model: Forest = bincode::deserialize(&self.model_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to deserialize model: {}", e))?;
        self.model = Some(model);
        Ok(())
    }
}

impl super::models::MLModel for SmartcoreRandomForest {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Model not loaded"))?;

        // Convert feature vector to DenseMatrix (1 row, n features)
        let n_features = features.len();
        let x = DenseMatrix::new(1, n_features, features.features.clone(), false);

        let predictions = model
            .predict(&x)
            .map_err(|e| anyhow::anyhow!("Prediction failed: {:?}", e))?;

        let value = predictions
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Model returned empty predictions"))?;

        Ok(Prediction::new(value))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::{ArtifactFormat, MLModel, ModelArtifact};
    use crate::ml::ModelType;
    use smartcore::ensemble::random_forest_regressor::RandomForestRegressorParameters;

    fn trained_forest() -> SmartcoreRandomForest {
        // y = 2*x1 + 3*x2
        let x: Vec<Vec<f64>> = vec![
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![1.0, 2.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
            vec![4.0, 2.0],
            vec![2.0, 4.0],
            vec![3.0, 1.0],
            vec![1.0, 3.0],
            vec![4.0, 4.0],
        ];
        let y: Vec<f64> = vec![5.0, 7.0, 8.0, 10.0, 15.0, 14.0, 14.0, 9.0, 11.0, 20.0];

        let flat: Vec<f64> = x.iter().flatten().copied().collect();
        let matrix = DenseMatrix::new(x.len(), 2, flat, false);
        let params = RandomForestRegressorParameters::default().with_n_trees(10);
        let forest = RandomForestRegressor::fit(&matrix, &y, params).unwrap();

        let metadata = ModelMetadata {
            model_id: "rf_test".to_string(),
            model_type: ModelType::RandomForest,
            version: "1.0.0".to_string(),
            trained_at: None,
            training_samples: x.len(),
            validation_metrics: None,
            feature_names: vec![],
        };

        SmartcoreRandomForest::new(forest, metadata).unwrap()
    }

    #[test]
    fn test_predict_in_range() {
        let model = trained_forest();
        let features = FeatureVector::new(vec![3.0, 3.0], vec!["x1".into(), "x2".into()]).unwrap();

        let pred = model.predict(&features).unwrap();
        assert!(pred.value > 5.0 && pred.value < 20.0);
    }

    #[test]
    fn test_artifact_round_trip_restores_forest() {
        let artifact = ModelArtifact::RandomForest(trained_forest());
        let bytes = artifact.encode(ArtifactFormat::Bincode).unwrap();

        let model = ModelArtifact::decode(&bytes, ArtifactFormat::Bincode)
            .unwrap()
            .into_model()
            .unwrap();
        let features = FeatureVector::new(vec![2.0, 2.0], vec!["x1".into(), "x2".into()]).unwrap();
        assert!(model.predict(&features).is_ok());
    }

    #[test]
    fn test_empty_bytes_rejected() {
        let mut model = trained_forest();
        model.model_bytes.clear();
        assert!(model.restore_from_serialization().is_err());
    }
}
