use std::sync::Arc;

use crate::config::Config;
use crate::forecast::{ForecastEngine, FEATURE_NAMES};
use crate::ml::{load_model, ModelHandle};

/// Shared, read-only state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: Arc<ForecastEngine>,
}

impl AppState {
    /// Load the model artifact named in the config. A failed load leaves the
    /// service running with the model marked unavailable.
    pub fn new(cfg: Config) -> Self {
        let model = load_model(&cfg.model.path, &FEATURE_NAMES);
        Self::with_model(cfg, model)
    }

    pub fn with_model(cfg: Config, model: ModelHandle) -> Self {
        Self {
            cfg: Arc::new(cfg),
            engine: Arc::new(ForecastEngine::new(model)),
        }
    }

    pub fn model(&self) -> &ModelHandle {
        self.engine.model()
    }
}
