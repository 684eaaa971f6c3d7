//! ML Model Inference
//!
//! The process-wide model handle. It is built once at startup and shared
//! read-only with every request; a failed load is recorded as an explicit
//! `Unavailable` state instead of aborting the process.

use super::{models::MLModel, FeatureVector, ModelArtifact, ModelMetadata, Prediction};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Loaded model, or the reason it could not be loaded
#[derive(Clone)]
pub enum ModelHandle {
    Available(Arc<dyn MLModel>),
    Unavailable { reason: String },
}

impl ModelHandle {
    pub fn available(model: impl MLModel + 'static) -> Self {
        Self::Available(Arc::new(model))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn model(&self) -> Option<&Arc<dyn MLModel>> {
        match self {
            Self::Available(model) => Some(model),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.model().map(|model| model.metadata())
    }

    /// Run one prediction; fails when the model is unavailable
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        match self {
            Self::Available(model) => model.predict(features),
            Self::Unavailable { reason } => anyhow::bail!("Model not loaded: {}", reason),
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(model) => f
                .debug_tuple("Available")
                .field(&model.metadata().model_id)
                .finish(),
            Self::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Read an artifact and check it was trained on `expected_features`.
pub fn try_load_model(path: &Path, expected_features: &[&str]) -> Result<Arc<dyn MLModel>> {
    let artifact = ModelArtifact::read(path)?;

    let declared = &artifact.metadata().feature_names;
    if !declared.is_empty() && declared.iter().map(String::as_str).ne(expected_features.iter().copied()) {
        anyhow::bail!(
            "Model features {:?} do not match expected {:?}",
            declared,
            expected_features
        );
    }

    artifact.into_model()
}

/// Load the model artifact at `path`, never failing.
pub fn load_model(path: &Path, expected_features: &[&str]) -> ModelHandle {
    match try_load_model(path, expected_features) {
        Ok(model) => {
            let metadata = model.metadata();
            info!(
                path = %path.display(),
                model_id = %metadata.model_id,
                version = %metadata.version,
                model_type = ?metadata.model_type,
                "model loaded"
            );
            ModelHandle::Available(model)
        }
        Err(e) => {
            error!(path = %path.display(), error = %format!("{e:#}"), "failed to load model");
            ModelHandle::unavailable(format!("{e:#}"))
        }
    }
}
