use tracing::debug;

use super::{align, parse_series, AlignedRow, FeatureRow, ForecastError, WeatherIndex};
use crate::domain::{ForecastStep, RawPoint, SeriesKind};
use crate::ml::ModelHandle;

/// Rolls the model forward one hour at a time, feeding each prediction back
/// in as the next step's generation input.
pub struct RecursiveForecaster<'a> {
    model: &'a ModelHandle,
}

impl<'a> RecursiveForecaster<'a> {
    pub fn new(model: &'a ModelHandle) -> Self {
        Self { model }
    }

    /// Produce exactly `horizon` hourly steps after the terminal row.
    ///
    /// Either every step succeeds or the whole call fails.
    pub fn forecast(
        &self,
        terminal: &AlignedRow,
        weather: &WeatherIndex,
        horizon: usize,
    ) -> Result<Vec<ForecastStep>, ForecastError> {
        if let ModelHandle::Unavailable { reason } = self.model {
            return Err(ForecastError::ModelUnavailable(reason.clone()));
        }

        let mut steps = Vec::with_capacity(horizon);
        let mut dc_power = terminal.dc_power;

        for step in 1..=horizon {
            let target = i64::try_from(step)
                .ok()
                .and_then(|hours| terminal.timestamp.checked_add_hours(hours))
                .ok_or(ForecastError::TimeOverflow { step })?;

            let features = FeatureRow::for_step(terminal, target, dc_power, weather);
            let prediction = features
                .to_vector()
                .and_then(|vector| self.model.predict(&vector))
                .map_err(|e| ForecastError::Prediction {
                    step,
                    message: format!("{e:#}"),
                })?;

            if !prediction.value.is_finite() {
                return Err(ForecastError::Prediction {
                    step,
                    message: format!("non-finite prediction {}", prediction.value),
                });
            }

            steps.push(ForecastStep {
                timestamp: target,
                power: prediction.value,
            });
            dc_power = prediction.value;
        }

        Ok(steps)
    }
}

/// Request-level pipeline: validate, align, then forecast
pub struct ForecastEngine {
    model: ModelHandle,
}

impl ForecastEngine {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn forecast(
        &self,
        generation: &[RawPoint],
        weather: &[RawPoint],
        horizon: usize,
    ) -> Result<Vec<ForecastStep>, ForecastError> {
        if let ModelHandle::Unavailable { reason } = &self.model {
            return Err(ForecastError::ModelUnavailable(reason.clone()));
        }

        let generation = parse_series(SeriesKind::Generation, generation)?;
        let weather = parse_series(SeriesKind::Weather, weather)?;
        let aligned = align(&generation, &weather)?;
        let weather_index = WeatherIndex::new(&weather);

        let terminal = aligned.terminal();
        debug!(
            aligned_rows = aligned.row_count(),
            weather_hours = weather_index.hours(),
            terminal = %terminal.timestamp,
            dc_power = terminal.dc_power,
            irradiation = terminal.irradiation,
            horizon,
            "series aligned"
        );

        RecursiveForecaster::new(&self.model).forecast(terminal, &weather_index, horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::FEATURE_NAMES;
    use crate::ml::{FeatureVector, LinearRegressionModel, MLModel, ModelMetadata, ModelType, Prediction};
    use proptest::prelude::*;
    use std::sync::Mutex;

    /// Records every feature vector it sees; predicts `DC_POWER + 1`.
    struct RecordingModel {
        metadata: ModelMetadata,
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl RecordingModel {
        fn new() -> Self {
            Self {
                metadata: ModelMetadata {
                    model_id: "recording".to_string(),
                    model_type: ModelType::LinearRegression,
                    version: "test".to_string(),
                    trained_at: None,
                    training_samples: 0,
                    validation_metrics: None,
                    feature_names: vec![],
                },
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl MLModel for RecordingModel {
        fn predict(&self, features: &FeatureVector) -> anyhow::Result<Prediction> {
            self.seen.lock().unwrap().push(features.features.clone());
            Ok(Prediction::new(features.features[2] + 1.0))
        }

        fn metadata(&self) -> &ModelMetadata {
            &self.metadata
        }
    }

    /// Fails on the n-th call
    struct FailingModel {
        metadata: ModelMetadata,
        fail_at: usize,
        calls: Mutex<usize>,
    }

    impl MLModel for FailingModel {
        fn predict(&self, _features: &FeatureVector) -> anyhow::Result<Prediction> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == self.fail_at {
                anyhow::bail!("tree exploded");
            }
            Ok(Prediction::new(1.0))
        }

        fn metadata(&self) -> &ModelMetadata {
            &self.metadata
        }
    }

    fn raw(points: &[(&str, f64)]) -> Vec<RawPoint> {
        points.iter().map(|(ts, v)| RawPoint::new(*ts, *v)).collect()
    }

    fn passthrough() -> ModelHandle {
        // predicts DC_POWER * 0.5 + IRRADIATION * 10
        ModelHandle::available(LinearRegressionModel::with_features(
            &FEATURE_NAMES,
            vec![0.0, 0.0, 0.5, 10.0],
            0.0,
        ))
    }

    #[test]
    fn test_single_point_example() {
        let model = std::sync::Arc::new(RecordingModel::new());
        let engine = ForecastEngine::new(ModelHandle::Available(model.clone()));

        let steps = engine
            .forecast(
                &raw(&[("2024-01-01T00:00:00", 100.0)]),
                &raw(&[("2024-01-01T00:00:00", 0.5)]),
                2,
            )
            .unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].timestamp.to_string(), "2024-01-01T01:00:00");
        assert_eq!(steps[1].timestamp.to_string(), "2024-01-01T02:00:00");
        assert_eq!(steps[0].power, 101.0);
        assert_eq!(steps[1].power, 102.0);

        let seen = model.seen.lock().unwrap();
        // hour, dayofweek, DC_POWER, IRRADIATION (fallback)
        assert_eq!(seen[0], vec![1.0, 0.0, 100.0, 0.5]);
        assert_eq!(seen[1], vec![2.0, 0.0, 101.0, 0.5]);
    }

    #[test]
    fn test_future_weather_used_before_fallback() {
        let engine = ForecastEngine::new(passthrough());

        let steps = engine
            .forecast(
                &raw(&[("2024-01-01T10:00:00", 100.0)]),
                &raw(&[
                    ("2024-01-01T10:00:00", 1.0),
                    ("2024-01-01T11:00:00", 3.0),
                ]),
                2,
            )
            .unwrap();

        // step 1: 100 * 0.5 + 3.0 * 10 (observed)
        assert_eq!(steps[0].power, 80.0);
        // step 2: 80 * 0.5 + 1.0 * 10 (fallback to terminal irradiation)
        assert_eq!(steps[1].power, 50.0);
    }

    #[test]
    fn test_zero_horizon_is_empty() {
        let engine = ForecastEngine::new(passthrough());
        let steps = engine
            .forecast(
                &raw(&[("2024-01-01T00:00:00", 1.0)]),
                &raw(&[("2024-01-01T00:00:00", 1.0)]),
                0,
            )
            .unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn test_unavailable_model_fails_before_validation() {
        let engine = ForecastEngine::new(ModelHandle::unavailable("no artifact"));
        // invalid input would otherwise be reported first
        let err = engine.forecast(&[RawPoint::default()], &[], 3).unwrap_err();
        assert!(matches!(err, ForecastError::ModelUnavailable(_)));
    }

    #[test]
    fn test_prediction_failure_aborts_whole_forecast() {
        let model = FailingModel {
            metadata: RecordingModel::new().metadata,
            fail_at: 3,
            calls: Mutex::new(0),
        };
        let engine = ForecastEngine::new(ModelHandle::available(model));

        let err = engine
            .forecast(
                &raw(&[("2024-01-01T00:00:00", 1.0)]),
                &raw(&[("2024-01-01T00:00:00", 1.0)]),
                5,
            )
            .unwrap_err();

        match err {
            ForecastError::Prediction { step, message } => {
                assert_eq!(step, 3);
                assert!(message.contains("tree exploded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_prediction_rejected() {
        let model = LinearRegressionModel::with_features(&FEATURE_NAMES, vec![0.0, 0.0, 1e308, 0.0], 0.0);
        let engine = ForecastEngine::new(ModelHandle::available(model));

        let err = engine
            .forecast(
                &raw(&[("2024-01-01T00:00:00", 1e308)]),
                &raw(&[("2024-01-01T00:00:00", 0.0)]),
                1,
            )
            .unwrap_err();
        assert!(matches!(err, ForecastError::Prediction { step: 1, .. }));
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let engine = ForecastEngine::new(passthrough());
        let generation = raw(&[("2024-03-01T00:00:00", 10.0), ("2024-03-01T01:00:00", 12.0)]);
        let weather = raw(&[("2024-03-01T01:00:00", 0.2), ("2024-03-01T04:00:00", 0.9)]);

        let first = engine.forecast(&generation, &weather, 6).unwrap();
        let second = engine.forecast(&generation, &weather, 6).unwrap();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn prop_steps_are_hourly_after_last_shared_timestamp(
            shared_hours in prop::collection::vec(0i64..500, 1..20),
            horizon in 0usize..72,
        ) {
            let base = crate::domain::Timestamp::parse("2024-01-01T00:00:00").unwrap();
            let stamps: Vec<String> = shared_hours
                .iter()
                .map(|h| base.checked_add_hours(*h).unwrap().to_string())
                .collect();
            let generation: Vec<RawPoint> = stamps.iter().map(|ts| RawPoint::new(ts.clone(), 5.0)).collect();
            let weather: Vec<RawPoint> = stamps.iter().map(|ts| RawPoint::new(ts.clone(), 0.5)).collect();

            let steps = ForecastEngine::new(passthrough())
                .forecast(&generation, &weather, horizon)
                .unwrap();

            let last = shared_hours.iter().max().copied().unwrap();
            prop_assert_eq!(steps.len(), horizon);
            for (i, step) in steps.iter().enumerate() {
                let expected = base.checked_add_hours(last + i as i64 + 1).unwrap();
                prop_assert_eq!(step.timestamp, expected);
            }
        }
    }
}
