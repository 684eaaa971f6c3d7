//! Feature engineering for the generation model
//!
//! One feature row per forecast step: calendar features of the target hour,
//! the running generation value and the irradiation for that hour.

use std::collections::HashMap;
use tracing::debug;

use super::AlignedRow;
use crate::domain::{TimePoint, Timestamp};
use crate::ml::FeatureVector;

/// Column order the model is trained on
pub const FEATURE_NAMES: [&str; 4] = ["hour", "dayofweek", "DC_POWER", "IRRADIATION"];

/// Irradiation lookup by instant; the first record wins on duplicates
#[derive(Debug, Clone, Default)]
pub struct WeatherIndex {
    values: HashMap<Timestamp, f64>,
}

impl WeatherIndex {
    pub fn new(points: &[TimePoint]) -> Self {
        let mut values = HashMap::with_capacity(points.len());
        for point in points {
            values.entry(point.timestamp).or_insert(point.value);
        }
        Self { values }
    }

    pub fn irradiation_at(&self, timestamp: &Timestamp) -> Option<f64> {
        self.values.get(timestamp).copied()
    }

    /// Number of distinct instants with an irradiation record
    pub fn hours(&self) -> usize {
        self.values.len()
    }
}

/// Where a step's irradiation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrradiationSource {
    /// Weather series has a record at the target hour
    Observed,
    /// Past the weather horizon: the terminal row's irradiation is reused
    Fallback,
}

/// Model input for one forecast step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    /// Hour of day (0-23)
    pub hour: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub dayofweek: u32,
    pub dc_power: f64,
    pub irradiation: f64,
    pub irradiation_source: IrradiationSource,
}

impl FeatureRow {
    /// Build the row for `target`.
    ///
    /// When the weather series has no record at `target` the terminal row's
    /// irradiation is used instead. This keeps the forecast going past the
    /// end of the weather data at the cost of accuracy.
    pub fn for_step(
        terminal: &AlignedRow,
        target: Timestamp,
        dc_power: f64,
        weather: &WeatherIndex,
    ) -> Self {
        let (irradiation, irradiation_source) = match weather.irradiation_at(&target) {
            Some(value) => (value, IrradiationSource::Observed),
            None => {
                debug!(at = %target, fallback = terminal.irradiation, "irradiation fallback");
                (terminal.irradiation, IrradiationSource::Fallback)
            }
        };

        Self {
            hour: target.hour(),
            dayofweek: target.day_of_week(),
            dc_power,
            irradiation,
            irradiation_source,
        }
    }

    /// Flatten in `FEATURE_NAMES` order
    pub fn to_vector(&self) -> anyhow::Result<FeatureVector> {
        FeatureVector::new(
            vec![
                self.hour as f64,
                self.dayofweek as f64,
                self.dc_power,
                self.irradiation,
            ],
            FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
        )
    }
}
