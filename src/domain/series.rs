use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Timestamp;

/// Which of the two request series a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SeriesKind {
    Generation,
    Weather,
}

/// A series record as received over the wire.
///
/// Both fields are kept loose so that a missing or mistyped field becomes a
/// descriptive validation error instead of a generic decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPoint {
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl RawPoint {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: Some(Value::String(timestamp.into())),
            value: Some(Value::from(value)),
        }
    }
}

/// One validated observation: generation power or irradiation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    pub timestamp: Timestamp,
    pub value: f64,
}

/// One predicted hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastStep {
    pub timestamp: Timestamp,
    pub power: f64,
}
